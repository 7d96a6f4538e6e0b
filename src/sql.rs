//! SQL Server column types for flattened leaves.

use crate::field::{AtomicField, UdtType};
use crate::marker::Marked;
use crate::primitive::PrimitiveType;

/// Column type for a scalar.
pub fn primitive_sql_type(ty: PrimitiveType) -> &'static str {
    match ty {
        PrimitiveType::Bool => "BIT",
        PrimitiveType::Byte => "BINARY(1)",
        PrimitiveType::Word => "BINARY(2)",
        PrimitiveType::DWord => "BINARY(4)",
        PrimitiveType::LWord => "BINARY(8)",
        PrimitiveType::SInt => "TINYINT",
        PrimitiveType::Int => "SMALLINT",
        PrimitiveType::DInt => "INT",
        PrimitiveType::LInt => "BIGINT",
        PrimitiveType::USInt => "TINYINT",
        PrimitiveType::UInt => "INT",
        PrimitiveType::UDInt => "BIGINT",
        PrimitiveType::ULInt => "DECIMAL(20, 0)",
        PrimitiveType::Real => "FLOAT(24)", // same as REAL
        PrimitiveType::LReal => "FLOAT(53)",
        PrimitiveType::Time => "INT",
        PrimitiveType::Date => "DATE",
        PrimitiveType::TimeOfDay => "TIME",
        PrimitiveType::DateAndTime => "DATETIME2", // DATETIME is obsolete
        PrimitiveType::Char | PrimitiveType::WChar => "NCHAR(1)",
        // default PLC string capacity
        PrimitiveType::String | PrimitiveType::WString => "NVARCHAR(254)",
    }
}

/// Column type for a leaf: strings become `nvarchar(<max length>)`.
pub fn sql_type(field: &AtomicField) -> String {
    match field {
        AtomicField::String(s) => format!("nvarchar({})", s.max_length()),
        AtomicField::Primitive(p) => primitive_sql_type(p.ty()).to_string(),
    }
}

/// `[Name] TYPE`
pub fn field_definition(field: &AtomicField) -> String {
    format!("[{}] {}", field.name(), sql_type(field))
}

/// `[Path.To.Leaf] TYPE`, path joined with `separator`.
pub fn column_definition(field: &Marked<AtomicField>, separator: char) -> String {
    format!("[{}] {}", field.marker.to_string_with(separator), sql_type(&field.field))
}

/// One column definition per leaf of `udt`, in flatten order. Paths are
/// relative to the type.
pub fn column_definitions(udt: &UdtType, separator: char) -> Vec<String> {
    udt.flatten_relative()
        .iter()
        .map(|m| column_definition(m, separator))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ArrayField, PrimitiveField, StringField, StructField};
    use crate::marker::Marker;

    #[test]
    fn leaf_types() {
        let s = AtomicField::String(StringField::new("Label", 20).unwrap());
        assert_eq!(sql_type(&s), "nvarchar(20)");
        let b = AtomicField::Primitive(PrimitiveField::new("On", PrimitiveType::Bool).unwrap());
        assert_eq!(field_definition(&b), "[On] BIT");
        let m = Marked::new(Marker::from_segments(["A", "On"]), b);
        assert_eq!(column_definition(&m, '_'), "[A_On] BIT");
    }

    #[test]
    fn definitions_follow_flatten_order() {
        let inner = StructField::new(
            "Axis",
            vec![PrimitiveField::new("Pos", PrimitiveType::LReal).unwrap().into()],
        )
        .unwrap();
        let udt = UdtType::new(
            "Robot",
            "1.0",
            vec![
                PrimitiveField::new("Id", PrimitiveType::DInt).unwrap().into(),
                inner.into(),
                ArrayField::new("Io", PrimitiveType::Byte, 0..=1).unwrap().into(),
            ],
        )
        .unwrap();
        assert_eq!(
            column_definitions(&udt, '.'),
            [
                "[Id] INT",
                "[Axis.Pos] FLOAT(53)",
                "[Io.0] BINARY(1)",
                "[Io.1] BINARY(1)",
            ]
        );
    }
}
