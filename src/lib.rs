//! # udtdef — PLC user-defined type (UDT) sources
//!
//! Parse the textual UDT format exported by PLC engineering tools into a field
//! tree, write it back, compute its byte layout and flatten it into uniquely
//! named leaves (e.g. for generating table columns).
//!
//! ## Source format
//!
//! ```text
//! TYPE "Motor"   // drive data
//! VERSION : 0.1
//!     STRUCT
//!         Enabled : BOOL := true;
//!         Speed : INT;   // rpm
//!         Label : STRING[20];
//!         Temps : ARRAY[0..3] OF REAL;
//!         Axis : STRUCT
//!             Pos : LREAL;
//!         END_STRUCT;
//!         Brake : "Brake";   // loads Brake.udt (or Brake.awl)
//!     END_STRUCT;
//!
//! END_TYPE
//! ```
//!
//! ## Field model
//!
//! - [`Field::Primitive`]: a scalar from the [`PrimitiveType`] registry
//! - [`Field::String`]: fixed-capacity string, `2 + max_length` bytes
//! - [`Field::Array`]: scalars over a concrete index range
//! - [`Field::Struct`]: ordered child fields
//!
//! ## Layout
//!
//! [`plain_size`] counts natural sizes; [`packed_size`] applies the PLC rule that
//! packs each run of consecutive booleans into `ceil(n / 8) + 1` bytes.
//!
//! ## Flattening
//!
//! [`flatten`] yields `(Marker, AtomicField)` pairs depth-first in declaration
//! order, e.g. `Motor.Axis.Pos`, `Motor.Temps.0`.

pub mod error;
pub mod field;
pub mod flatten;
pub mod layout;
pub mod marker;
pub mod parser;
pub mod primitive;
pub mod serializer;
pub mod sql;

pub use error::UdtError;
pub use field::{
    AtomicField, ArrayField, Field, PrimitiveField, StringField, StructField, UdtType, MAX_FIELD_BYTES,
};
pub use flatten::{enumerate_flat, flatten};
pub use layout::{packed_size, plain_size};
pub use marker::{Marked, Marker};
pub use parser::{parse, parse_file, parse_file_with_references, parse_reader};
pub use primitive::PrimitiveType;
pub use serializer::serialize;
