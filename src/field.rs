//! Field tree of a user-defined type.
//!
//! A [`UdtType`] owns an ordered list of [`Field`]s. Every field is one of four
//! variants: a scalar ([`PrimitiveField`]), a fixed-capacity string
//! ([`StringField`]), a fixed-range array of scalars ([`ArrayField`]) or a nested
//! struct ([`StructField`]). Trees are built through the constructors below (or by
//! the [parser](crate::parser)) and are not mutated afterwards; child order is
//! significant everywhere.

use crate::error::UdtError;
use crate::primitive::PrimitiveType;
use std::ops::{Bound, RangeBounds};

/// Separator used by paths; field names may not contain it.
pub const NAME_SEPARATOR: char = '.';

/// Largest byte size accepted for a single string or array field.
pub const MAX_FIELD_BYTES: usize = 16 * 1024 * 1024;

/// Names must be non-empty and fit on one line of source text; `"` is reserved
/// for quoting and `.` for paths.
pub(crate) fn validate_name(name: &str) -> Result<(), UdtError> {
    if name.is_empty()
        || name.contains(NAME_SEPARATOR)
        || name.contains('"')
        || name.contains(is_line_break)
    {
        return Err(UdtError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\r' | '\n')
}

/// Version text from its first digit on, e.g. `V1.0` -> `1.0`.
pub(crate) fn normalize_version(text: &str) -> String {
    let start = text.find(|c: char| c.is_ascii_digit()).unwrap_or(text.len());
    text[start..].trim().to_string()
}

/// Comments are stored on one line; line breaks become single spaces.
fn single_line(comment: String) -> String {
    comment
        .split(is_line_break)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Defaults end at `;` and at a trailing comment, so neither may appear inside one.
fn checked_default(value: String) -> Result<Option<String>, UdtError> {
    if value.contains(';') || value.contains("//") || value.contains(is_line_break) {
        return Err(UdtError::MalformedField {
            line: 0,
            message: format!("default '{}' cannot contain ';', '//' or line breaks", value.trim()),
        });
    }
    Ok(non_empty(value))
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn overflow(name: &str) -> UdtError {
    UdtError::InvalidRange(format!("'{}': bounds out of range", name))
}

fn require_sized(ty: PrimitiveType, name: &str) -> Result<(), UdtError> {
    if ty.is_string_marker() {
        return Err(UdtError::MalformedField {
            line: 0,
            message: format!("'{}': cannot create a {} field without a length", name, ty),
        });
    }
    Ok(())
}

/// One node of the field tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Primitive(PrimitiveField),
    String(StringField),
    Array(ArrayField),
    Struct(StructField),
}

impl Field {
    pub fn name(&self) -> &str {
        match self {
            Field::Primitive(f) => &f.name,
            Field::String(f) => &f.name,
            Field::Array(f) => &f.name,
            Field::Struct(f) => &f.name,
        }
    }

    pub fn comment(&self) -> &str {
        match self {
            Field::Primitive(f) => &f.comment,
            Field::String(f) => &f.comment,
            Field::Array(f) => &f.comment,
            Field::Struct(f) => &f.comment,
        }
    }

    /// Leaf fields (primitive or string) fit a single column.
    pub fn is_atomic(&self) -> bool {
        matches!(self, Field::Primitive(_) | Field::String(_))
    }

    /// True for a primitive `BOOL` field (the only fields packed into bits).
    pub fn is_bool(&self) -> bool {
        matches!(self, Field::Primitive(p) if p.ty.is_bool())
    }
}

impl From<PrimitiveField> for Field {
    fn from(f: PrimitiveField) -> Self {
        Field::Primitive(f)
    }
}

impl From<StringField> for Field {
    fn from(f: StringField) -> Self {
        Field::String(f)
    }
}

impl From<ArrayField> for Field {
    fn from(f: ArrayField) -> Self {
        Field::Array(f)
    }
}

impl From<StructField> for Field {
    fn from(f: StructField) -> Self {
        Field::Struct(f)
    }
}

/// A field that fits a single database cell.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicField {
    Primitive(PrimitiveField),
    String(StringField),
}

impl AtomicField {
    pub fn name(&self) -> &str {
        match self {
            AtomicField::Primitive(f) => &f.name,
            AtomicField::String(f) => &f.name,
        }
    }

    pub fn comment(&self) -> &str {
        match self {
            AtomicField::Primitive(f) => &f.comment,
            AtomicField::String(f) => &f.comment,
        }
    }
}

impl From<AtomicField> for Field {
    fn from(f: AtomicField) -> Self {
        match f {
            AtomicField::Primitive(p) => Field::Primitive(p),
            AtomicField::String(s) => Field::String(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveField {
    name: String,
    comment: String,
    ty: PrimitiveType,
    default_value: Option<String>,
}

impl PrimitiveField {
    pub fn new(name: impl Into<String>, ty: PrimitiveType) -> Result<Self, UdtError> {
        let name = name.into().trim().to_string();
        validate_name(&name)?;
        require_sized(ty, &name)?;
        Ok(PrimitiveField {
            name,
            comment: String::new(),
            ty,
            default_value: None,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = single_line(comment.into());
        self
    }

    /// Blank defaults are treated as absent.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Result<Self, UdtError> {
        self.default_value = checked_default(default_value.into())?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn ty(&self) -> PrimitiveType {
        self.ty
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }
}

/// Fixed-capacity string: one byte declared length, one byte actual length, then
/// `max_length` reserved bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct StringField {
    name: String,
    comment: String,
    max_length: usize,
}

impl StringField {
    pub fn new(name: impl Into<String>, max_length: usize) -> Result<Self, UdtError> {
        let name = name.into().trim().to_string();
        validate_name(&name)?;
        if max_length > MAX_FIELD_BYTES - 2 {
            return Err(UdtError::InvalidRange(format!(
                "'{}': string length {} exceeds {} bytes",
                name, max_length, MAX_FIELD_BYTES
            )));
        }
        Ok(StringField {
            name,
            comment: String::new(),
            max_length,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = single_line(comment.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

/// Array of scalars over `[start_index, end_index)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayField {
    name: String,
    comment: String,
    element_type: PrimitiveType,
    start_index: i64,
    end_index: i64,
    default_value: Option<String>,
}

impl ArrayField {
    /// Both ends of `range` must be bounded; there is no length to resolve an
    /// open end against. `0..=3` and `0..4` describe the same four elements.
    pub fn new(
        name: impl Into<String>,
        element_type: PrimitiveType,
        range: impl RangeBounds<i64>,
    ) -> Result<Self, UdtError> {
        let name = name.into().trim().to_string();
        validate_name(&name)?;
        require_sized(element_type, &name)?;
        let start_index = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.checked_add(1).ok_or_else(|| overflow(&name))?,
            Bound::Unbounded => {
                return Err(UdtError::InvalidRange(format!(
                    "'{}': cannot index from end with unknown length",
                    name
                )))
            }
        };
        let end_index = match range.end_bound() {
            Bound::Included(&e) => e.checked_add(1).ok_or_else(|| overflow(&name))?,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => {
                return Err(UdtError::InvalidRange(format!(
                    "'{}': cannot index from end with unknown length",
                    name
                )))
            }
        };
        let count = end_index.checked_sub(start_index).ok_or_else(|| overflow(&name))?;
        if count < 0 {
            return Err(UdtError::InvalidRange(format!(
                "'{}': range ends before it starts",
                name
            )));
        }
        let too_large = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(element_type.byte_size()))
            .map_or(true, |bytes| bytes > MAX_FIELD_BYTES);
        if too_large {
            return Err(UdtError::InvalidRange(format!(
                "'{}': {} elements of {} exceed {} bytes",
                name, count, element_type, MAX_FIELD_BYTES
            )));
        }
        Ok(ArrayField {
            name,
            comment: String::new(),
            element_type,
            start_index,
            end_index,
            default_value: None,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = single_line(comment.into());
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Result<Self, UdtError> {
        self.default_value = checked_default(default_value.into())?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn element_type(&self) -> PrimitiveType {
        self.element_type
    }

    pub fn start_index(&self) -> i64 {
        self.start_index
    }

    /// Exclusive.
    pub fn end_index(&self) -> i64 {
        self.end_index
    }

    pub fn count(&self) -> usize {
        (self.end_index - self.start_index) as usize
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// One primitive per index, named by the index.
    pub fn elements(&self) -> impl Iterator<Item = PrimitiveField> + '_ {
        (self.start_index..self.end_index).map(move |i| PrimitiveField {
            name: i.to_string(),
            comment: String::new(),
            ty: self.element_type,
            default_value: self.default_value.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    name: String,
    comment: String,
    fields: Vec<Field>,
}

impl StructField {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self, UdtError> {
        let name = name.into().trim().to_string();
        validate_name(&name)?;
        Ok(StructField {
            name,
            comment: String::new(),
            fields,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = single_line(comment.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a StructField {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// A complete named type as stored in one `.udt` file.
#[derive(Debug, Clone, PartialEq)]
pub struct UdtType {
    name: String,
    version: String,
    comment: String,
    fields: Vec<Field>,
}

impl UdtType {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        fields: Vec<Field>,
    ) -> Result<Self, UdtError> {
        let name = name.into().trim().to_string();
        validate_name(&name)?;
        let version = version.into();
        if version.contains(is_line_break) {
            return Err(UdtError::MalformedHeader(format!(
                "'{}': version must fit on one line",
                name
            )));
        }
        Ok(UdtType {
            name,
            version: normalize_version(&version),
            comment: String::new(),
            fields,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = single_line(comment.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The same tree as a plain struct named after the type.
    pub fn to_struct(&self) -> StructField {
        StructField {
            name: self.name.clone(),
            comment: self.comment.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Graft this type under another name (used for `Name : "Type";` references).
    pub(crate) fn into_struct_named(self, name: String, comment: String) -> StructField {
        let comment = if comment.is_empty() { self.comment } else { comment };
        StructField {
            name,
            comment,
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_with_separator_are_rejected() {
        assert!(matches!(
            PrimitiveField::new("a.b", PrimitiveType::Int),
            Err(UdtError::InvalidName(_))
        ));
        assert!(matches!(StringField::new("a.b", 4), Err(UdtError::InvalidName(_))));
        assert!(matches!(
            ArrayField::new("a.b", PrimitiveType::Int, 0..2),
            Err(UdtError::InvalidName(_))
        ));
        assert!(matches!(StructField::new("a.b", vec![]), Err(UdtError::InvalidName(_))));
        assert!(matches!(UdtType::new("a.b", "0.1", vec![]), Err(UdtError::InvalidName(_))));
    }

    #[test]
    fn array_bounds() {
        let inclusive = ArrayField::new("a", PrimitiveType::DWord, 0..=3).unwrap();
        let exclusive = ArrayField::new("a", PrimitiveType::DWord, 0..4).unwrap();
        assert_eq!(inclusive, exclusive);
        assert_eq!(inclusive.count(), 4);
        assert_eq!(inclusive.end_index(), 4);

        let negative = ArrayField::new("n", PrimitiveType::Int, -2..=1).unwrap();
        assert_eq!(negative.count(), 4);
        let names: Vec<String> = negative.elements().map(|e| e.name().to_string()).collect();
        assert_eq!(names, ["-2", "-1", "0", "1"]);

        let empty = ArrayField::new("e", PrimitiveType::Int, 3..3).unwrap();
        assert_eq!(empty.count(), 0);
    }

    #[test]
    fn open_or_reversed_ranges_are_rejected() {
        assert!(matches!(
            ArrayField::new("a", PrimitiveType::Int, 0..),
            Err(UdtError::InvalidRange(_))
        ));
        assert!(matches!(
            ArrayField::new("a", PrimitiveType::Int, ..4),
            Err(UdtError::InvalidRange(_))
        ));
        assert!(matches!(
            ArrayField::new("a", PrimitiveType::Int, 4..=1),
            Err(UdtError::InvalidRange(_))
        ));
    }

    #[test]
    fn string_marker_needs_length() {
        assert!(PrimitiveField::new("s", PrimitiveType::String).is_err());
        assert!(ArrayField::new("s", PrimitiveType::WString, 0..2).is_err());
    }

    #[test]
    fn blank_default_is_absent() {
        let f = PrimitiveField::new("x", PrimitiveType::Int)
            .unwrap()
            .with_default("  ")
            .unwrap();
        assert_eq!(f.default_value(), None);
        let f = f.with_default(" 5 ").unwrap();
        assert_eq!(f.default_value(), Some("5"));
    }

    #[test]
    fn names_that_cannot_be_written_are_rejected() {
        for name in ["", "   ", "say \"hi\"", "two\nlines"] {
            assert!(
                matches!(PrimitiveField::new(name, PrimitiveType::Int), Err(UdtError::InvalidName(_))),
                "{:?} should be rejected",
                name
            );
        }
        assert!(matches!(UdtType::new("", "0.1", vec![]), Err(UdtError::InvalidName(_))));
        assert!(PrimitiveField::new("my var", PrimitiveType::Int).is_ok());
    }

    #[test]
    fn defaults_that_end_a_line_are_rejected() {
        let f = PrimitiveField::new("x", PrimitiveType::Int).unwrap();
        for value in ["1; 2", "1 // one", "1\n2"] {
            assert!(
                matches!(f.clone().with_default(value), Err(UdtError::MalformedField { .. })),
                "{:?} should be rejected",
                value
            );
        }
        let arr = ArrayField::new("a", PrimitiveType::Int, 0..2).unwrap();
        assert!(arr.with_default("0;").is_err());
    }

    #[test]
    fn comments_are_kept_on_one_line() {
        let f = PrimitiveField::new("x", PrimitiveType::Int)
            .unwrap()
            .with_comment(" first\r\n  second \n");
        assert_eq!(f.comment(), "first second");
    }

    #[test]
    fn version_starts_at_first_digit() {
        let udt = UdtType::new("T", "V1.0", vec![]).unwrap();
        assert_eq!(udt.version(), "1.0");
        assert_eq!(UdtType::new("T", " 0.1 ", vec![]).unwrap().version(), "0.1");
        assert!(matches!(
            UdtType::new("T", "1.0\n2", vec![]),
            Err(UdtError::MalformedHeader(_))
        ));
    }

    #[test]
    fn oversized_fields_are_rejected() {
        assert!(matches!(
            ArrayField::new("a", PrimitiveType::LReal, 0..=4_611_686_018_427_387_904),
            Err(UdtError::InvalidRange(_))
        ));
        assert!(matches!(
            ArrayField::new("a", PrimitiveType::Bool, i64::MIN..=i64::MAX - 1),
            Err(UdtError::InvalidRange(_))
        ));
        assert!(matches!(
            ArrayField::new("a", PrimitiveType::Byte, 0..MAX_FIELD_BYTES as i64 + 1),
            Err(UdtError::InvalidRange(_))
        ));
        assert!(ArrayField::new("a", PrimitiveType::Byte, 0..MAX_FIELD_BYTES as i64).is_ok());
        assert!(matches!(StringField::new("s", usize::MAX), Err(UdtError::InvalidRange(_))));
        assert!(StringField::new("s", 254).is_ok());
    }

    #[test]
    fn array_elements_carry_type_and_default() {
        let arr = ArrayField::new("a", PrimitiveType::Bool, 1..=2)
            .unwrap()
            .with_default("true")
            .unwrap()
            .with_comment("flags");
        let elems: Vec<PrimitiveField> = arr.elements().collect();
        assert_eq!(elems.len(), 2);
        assert_eq!(elems[0].name(), "1");
        assert_eq!(elems[1].name(), "2");
        assert!(elems.iter().all(|e| e.ty() == PrimitiveType::Bool));
        assert!(elems.iter().all(|e| e.default_value() == Some("true")));
        assert!(elems.iter().all(|e| e.comment().is_empty()));
    }
}
