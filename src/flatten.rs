//! Flatten a field tree into its leaves.
//!
//! Leaves come out depth-first in declaration order; callers assign positional
//! meaning to that order (generated column order), so it must not change. Array
//! elements become synthetic primitives named by their index.

use crate::field::{AtomicField, Field, StructField, UdtType};
use crate::marker::{Marked, Marker};

/// Every leaf under `fields`, each tagged with `prefix` plus its path.
pub fn flatten(fields: &[Field], prefix: &Marker) -> Vec<Marked<AtomicField>> {
    let mut out = Vec::new();
    flatten_into(fields, prefix, &mut out);
    out
}

fn flatten_into(fields: &[Field], prefix: &Marker, out: &mut Vec<Marked<AtomicField>>) {
    for field in fields {
        match field {
            Field::Primitive(p) => {
                out.push(Marked::new(prefix.nest(p.name()), AtomicField::Primitive(p.clone())))
            }
            Field::String(s) => {
                out.push(Marked::new(prefix.nest(s.name()), AtomicField::String(s.clone())))
            }
            Field::Struct(s) => flatten_into(s.fields(), &prefix.nest(s.name()), out),
            Field::Array(a) => {
                let root = prefix.nest(a.name());
                out.extend(
                    a.elements()
                        .map(|e| Marked::new(root.nest(e.name()), AtomicField::Primitive(e))),
                );
            }
        }
    }
}

/// Same walk as [`flatten`] without the paths.
pub fn enumerate_flat(fields: &[Field]) -> Vec<AtomicField> {
    let mut out = Vec::new();
    enumerate_into(fields, &mut out);
    out
}

fn enumerate_into(fields: &[Field], out: &mut Vec<AtomicField>) {
    for field in fields {
        match field {
            Field::Primitive(p) => out.push(AtomicField::Primitive(p.clone())),
            Field::String(s) => out.push(AtomicField::String(s.clone())),
            Field::Array(a) => out.extend(a.elements().map(AtomicField::Primitive)),
            Field::Struct(s) => enumerate_into(s.fields(), out),
        }
    }
}

impl Field {
    /// Flatten with this field as the root segment (`prefix.Name...`).
    pub fn flatten(&self, prefix: &Marker) -> Vec<Marked<AtomicField>> {
        flatten(std::slice::from_ref(self), prefix)
    }
}

impl StructField {
    /// Leaves under this struct, paths starting with its name.
    pub fn flatten(&self) -> Vec<Marked<AtomicField>> {
        flatten(self.fields(), &Marker::single(self.name()))
    }
}

impl UdtType {
    /// Leaves under this type, paths starting with the type name.
    pub fn flatten(&self) -> Vec<Marked<AtomicField>> {
        flatten(self.fields(), &Marker::single(self.name()))
    }

    /// Leaves under this type, paths relative to the type (no type-name segment).
    pub fn flatten_relative(&self) -> Vec<Marked<AtomicField>> {
        flatten(self.fields(), &Marker::root())
    }

    pub fn enumerate_flat(&self) -> Vec<AtomicField> {
        enumerate_flat(self.fields())
    }
}
