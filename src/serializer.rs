//! Write a [`UdtType`] back to UDT source text.
//!
//! Output is what the [parser](crate::parser) reads: nesting is indented by four
//! spaces per level and comments follow the declaration as `   // text`.
//! Referenced types are written inline as nested `STRUCT`s.

use crate::field::{ArrayField, Field, PrimitiveField, StringField, StructField, UdtType};
use crate::primitive::PrimitiveType;
use std::borrow::Cow;
use std::fmt;

const INDENT: &str = "    ";

/// Serialize a complete type.
pub fn serialize(udt: &UdtType) -> String {
    let mut out = String::new();
    out.push_str(&format!("TYPE \"{}\"", udt.name()));
    push_comment(&mut out, udt.comment());
    out.push('\n');
    out.push_str(&format!("VERSION : {}\n", udt.version()));
    out.push_str(INDENT);
    out.push_str("STRUCT\n");
    push_fields(&mut out, udt.fields(), 2);
    out.push_str(INDENT);
    out.push_str("END_STRUCT;\n\nEND_TYPE\n");
    out
}

fn push_fields(out: &mut String, fields: &[Field], depth: usize) {
    for field in fields {
        out.push_str(&INDENT.repeat(depth));
        match field {
            Field::Primitive(p) => push_primitive(out, p),
            Field::String(s) => push_string(out, s),
            Field::Array(a) => push_array(out, a),
            Field::Struct(s) => push_struct(out, s, depth),
        }
    }
}

fn push_primitive(out: &mut String, field: &PrimitiveField) {
    out.push_str(&format!("{} : ", field_name(field.name())));
    push_type(out, field.ty(), field.default_value());
    push_comment(out, field.comment());
    out.push('\n');
}

fn push_string(out: &mut String, field: &StringField) {
    out.push_str(&format!("{} : STRING[{}];", field_name(field.name()), field.max_length()));
    push_comment(out, field.comment());
    out.push('\n');
}

fn push_array(out: &mut String, field: &ArrayField) {
    // text bounds are inclusive
    out.push_str(&format!(
        "{} : ARRAY[{}..{}] OF ",
        field_name(field.name()),
        field.start_index(),
        field.end_index() - 1
    ));
    push_type(out, field.element_type(), field.default_value());
    push_comment(out, field.comment());
    out.push('\n');
}

fn push_struct(out: &mut String, field: &StructField, depth: usize) {
    out.push_str(&format!("{} : STRUCT", field_name(field.name())));
    push_comment(out, field.comment());
    out.push('\n');
    push_fields(out, field.fields(), depth + 1);
    out.push_str(&INDENT.repeat(depth));
    out.push_str("END_STRUCT;\n");
}

/// Names the line grammar cannot read bare are written in quotes.
fn field_name(name: &str) -> Cow<'_, str> {
    let bare = !name.is_empty()
        && !name.contains("//")
        && !name.chars().any(|c| c.is_whitespace() || matches!(c, ':' | '{' | '"'));
    if bare {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name))
    }
}

fn push_type(out: &mut String, ty: PrimitiveType, default_value: Option<&str>) {
    match default_value {
        Some(value) => out.push_str(&format!("{} := {};", ty.name(), value)),
        None => out.push_str(&format!("{};", ty.name())),
    }
}

fn push_comment(out: &mut String, comment: &str) {
    if comment.trim().is_empty() {
        return;
    }
    out.push_str("   // ");
    out.push_str(comment.trim());
}

impl fmt::Display for UdtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}
