//! Byte layout of a field tree.
//!
//! Two sizes are computed:
//!
//! - **Plain size** ([`plain_size`]): every field takes its natural byte size,
//!   booleans included (one byte each).
//! - **Packed size** ([`packed_size`]): the PLC data-block layout. Inside a struct,
//!   each run of consecutive `BOOL` fields is packed into bits and takes
//!   `ceil(n / 8) + 1` bytes; the run ends at the next non-boolean field or at the
//!   end of the struct. Nested structs pack their own runs before their total is
//!   added to the parent. Strings, arrays and scalars use their plain size.
//!
//! | Field | plain | packed |
//! |-------|-------|--------|
//! | scalar | `byte_size` | `byte_size` |
//! | `STRING[n]` | `2 + n` | `2 + n` |
//! | `ARRAY[a..b] OF T` | `byte_size(T) * count` | same |
//! | struct | sum of children | boolean runs packed |

use crate::field::{Field, StructField, UdtType};

/// Natural byte size of `field`.
pub fn plain_size(field: &Field) -> usize {
    match field {
        Field::Primitive(p) => p.ty().byte_size(),
        // both bounded by MAX_FIELD_BYTES at construction
        Field::String(s) => 2 + s.max_length(),
        Field::Array(a) => a.element_type().byte_size() * a.count(),
        Field::Struct(s) => plain_size_of(s.fields()),
    }
}

/// Packed byte size of `field`; only structs differ from [`plain_size`].
pub fn packed_size(field: &Field) -> usize {
    match field {
        Field::Struct(s) => packed_size_of(s.fields()),
        other => plain_size(other),
    }
}

/// Plain size of a sequence of sibling fields.
pub fn plain_size_of(fields: &[Field]) -> usize {
    fields
        .iter()
        .fold(0usize, |total, field| total.saturating_add(plain_size(field)))
}

/// Packed size of a sequence of sibling fields laid out as one struct body.
pub fn packed_size_of(fields: &[Field]) -> usize {
    let mut run = BoolRun::default();
    let mut total = 0usize;
    for field in fields {
        if field.is_bool() {
            run.pending += 1;
            continue;
        }
        total = total
            .saturating_add(run.flush())
            .saturating_add(packed_size(field));
    }
    total.saturating_add(run.flush())
}

/// Consecutive booleans waiting to be packed.
#[derive(Default)]
struct BoolRun {
    pending: usize,
}

impl BoolRun {
    /// Bytes taken by the pending run (one per 8 booleans plus one), then reset.
    fn flush(&mut self) -> usize {
        if self.pending == 0 {
            return 0;
        }
        let bytes = self.pending.div_ceil(8) + 1;
        self.pending = 0;
        bytes
    }
}

impl Field {
    pub fn plain_size(&self) -> usize {
        plain_size(self)
    }

    pub fn packed_size(&self) -> usize {
        packed_size(self)
    }
}

impl StructField {
    pub fn plain_size(&self) -> usize {
        plain_size_of(self.fields())
    }

    pub fn packed_size(&self) -> usize {
        packed_size_of(self.fields())
    }
}

impl UdtType {
    pub fn plain_size(&self) -> usize {
        plain_size_of(self.fields())
    }

    pub fn packed_size(&self) -> usize {
        packed_size_of(self.fields())
    }
}
