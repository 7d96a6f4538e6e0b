//! Registry of the scalar types a UDT field can be declared with.
//!
//! The registry is a fixed table built once on first lookup; names match
//! case-insensitively (`Bool`, `BOOL` and `bool` are the same type).

use crate::error::UdtError;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// A scalar type known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    Byte,
    Word,
    DWord,
    LWord,
    SInt,
    Int,
    DInt,
    LInt,
    USInt,
    UInt,
    UDInt,
    ULInt,
    Real,
    LReal,
    Time,
    Date,
    TimeOfDay,
    DateAndTime,
    Char,
    WChar,
    /// Marker only: string fields carry a length and use [`crate::field::StringField`].
    String,
    /// Marker only, see [`PrimitiveType::String`].
    WString,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 23] = [
        PrimitiveType::Bool,
        PrimitiveType::Byte,
        PrimitiveType::Word,
        PrimitiveType::DWord,
        PrimitiveType::LWord,
        PrimitiveType::SInt,
        PrimitiveType::Int,
        PrimitiveType::DInt,
        PrimitiveType::LInt,
        PrimitiveType::USInt,
        PrimitiveType::UInt,
        PrimitiveType::UDInt,
        PrimitiveType::ULInt,
        PrimitiveType::Real,
        PrimitiveType::LReal,
        PrimitiveType::Time,
        PrimitiveType::Date,
        PrimitiveType::TimeOfDay,
        PrimitiveType::DateAndTime,
        PrimitiveType::Char,
        PrimitiveType::WChar,
        PrimitiveType::String,
        PrimitiveType::WString,
    ];

    /// Canonical (upper-case) name as written in UDT sources.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "BOOL",
            PrimitiveType::Byte => "BYTE",
            PrimitiveType::Word => "WORD",
            PrimitiveType::DWord => "DWORD",
            PrimitiveType::LWord => "LWORD",
            PrimitiveType::SInt => "SINT",
            PrimitiveType::Int => "INT",
            PrimitiveType::DInt => "DINT",
            PrimitiveType::LInt => "LINT",
            PrimitiveType::USInt => "USINT",
            PrimitiveType::UInt => "UINT",
            PrimitiveType::UDInt => "UDINT",
            PrimitiveType::ULInt => "ULINT",
            PrimitiveType::Real => "REAL",
            PrimitiveType::LReal => "LREAL",
            PrimitiveType::Time => "TIME",
            PrimitiveType::Date => "DATE",
            PrimitiveType::TimeOfDay => "TIME_OF_DAY",
            PrimitiveType::DateAndTime => "DATE_AND_TIME",
            PrimitiveType::Char => "CHAR",
            PrimitiveType::WChar => "WCHAR",
            PrimitiveType::String => "STRING",
            PrimitiveType::WString => "WSTRING",
        }
    }

    pub fn bit_size(self) -> usize {
        match self {
            PrimitiveType::Bool => 1,
            PrimitiveType::Byte
            | PrimitiveType::SInt
            | PrimitiveType::USInt
            | PrimitiveType::Char
            | PrimitiveType::String => 8,
            PrimitiveType::Word
            | PrimitiveType::Int
            | PrimitiveType::UInt
            | PrimitiveType::Date
            | PrimitiveType::WChar
            | PrimitiveType::WString => 16,
            PrimitiveType::DWord
            | PrimitiveType::DInt
            | PrimitiveType::UDInt
            | PrimitiveType::Real
            | PrimitiveType::Time
            | PrimitiveType::TimeOfDay => 32,
            PrimitiveType::LWord
            | PrimitiveType::LInt
            | PrimitiveType::ULInt
            | PrimitiveType::LReal
            | PrimitiveType::DateAndTime => 64,
        }
    }

    /// `ceil(bit_size / 8)`.
    pub fn byte_size(self) -> usize {
        self.bit_size().div_ceil(8)
    }

    pub fn is_bool(self) -> bool {
        self == PrimitiveType::Bool
    }

    /// True for `STRING`/`WSTRING`, which need a declared length.
    pub fn is_string_marker(self) -> bool {
        matches!(self, PrimitiveType::String | PrimitiveType::WString)
    }

    /// Case-insensitive registry lookup.
    pub fn lookup(name: &str) -> Result<PrimitiveType, UdtError> {
        registry()
            .get(name.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| UdtError::UnknownType(name.trim().to_string()))
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn registry() -> &'static HashMap<&'static str, PrimitiveType> {
    static REGISTRY: OnceLock<HashMap<&'static str, PrimitiveType>> = OnceLock::new();
    REGISTRY.get_or_init(|| PrimitiveType::ALL.iter().map(|t| (t.name(), *t)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(PrimitiveType::lookup("bool").unwrap(), PrimitiveType::Bool);
        assert_eq!(PrimitiveType::lookup("DWord").unwrap(), PrimitiveType::DWord);
        assert_eq!(
            PrimitiveType::lookup("Date_And_Time").unwrap(),
            PrimitiveType::DateAndTime
        );
    }

    #[test]
    fn lookup_unknown_fails() {
        match PrimitiveType::lookup("S5TIME") {
            Err(UdtError::UnknownType(name)) => assert_eq!(name, "S5TIME"),
            other => panic!("expected UnknownType, got {:?}", other),
        }
    }

    #[test]
    fn byte_sizes_round_up() {
        assert_eq!(PrimitiveType::Bool.byte_size(), 1);
        assert_eq!(PrimitiveType::Int.byte_size(), 2);
        assert_eq!(PrimitiveType::Real.byte_size(), 4);
        assert_eq!(PrimitiveType::DateAndTime.byte_size(), 8);
    }

    #[test]
    fn every_entry_resolves_by_its_name() {
        for t in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::lookup(t.name()).unwrap(), t);
        }
    }
}
