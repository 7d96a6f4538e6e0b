//! Hierarchical field paths.
//!
//! A [`Marker`] is the ordered list of names leading from a root to a field,
//! e.g. `Outer.Inner.B`. Markers compare by content and are stored externally as
//! their joined string (column keys), so they round-trip through `Display` /
//! `FromStr` and serde.

use crate::field::NAME_SEPARATOR;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Marker {
    ids: Vec<String>,
}

impl Marker {
    /// The empty path. Renders as `""`.
    pub fn root() -> Self {
        Marker { ids: Vec::new() }
    }

    pub fn single(name: impl Into<String>) -> Self {
        Marker {
            ids: vec![name.into()],
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Marker {
            ids: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// New marker with `name` appended.
    pub fn nest(&self, name: impl Into<String>) -> Marker {
        let mut ids = Vec::with_capacity(self.ids.len() + 1);
        ids.extend(self.ids.iter().cloned());
        ids.push(name.into());
        Marker { ids }
    }

    /// New marker without the first segment. The root marker stays the root.
    pub fn pop_root(&self) -> Marker {
        Marker {
            ids: self.ids.iter().skip(1).cloned().collect(),
        }
    }

    pub fn to_string_with(&self, separator: char) -> String {
        let mut buf = [0u8; 4];
        self.ids.join(&*separator.encode_utf8(&mut buf))
    }

    /// Split `text` on `separator`. The empty string is the root marker.
    pub fn parse(text: &str, separator: char) -> Marker {
        if text.is_empty() {
            return Marker::root();
        }
        Marker {
            ids: text.split(separator).map(str::to_string).collect(),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(NAME_SEPARATOR))
    }
}

impl FromStr for Marker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Marker::parse(s, NAME_SEPARATOR))
    }
}

impl Serialize for Marker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Marker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Marker::parse(&s, NAME_SEPARATOR))
    }
}

/// A value tagged with the path it was found at.
#[derive(Debug, Clone, PartialEq)]
pub struct Marked<T> {
    pub marker: Marker,
    pub field: T,
}

impl<T> Marked<T> {
    pub fn new(marker: Marker, field: T) -> Self {
        Marked { marker, field }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nest_and_pop_root() {
        let m = Marker::root().nest("Outer").nest("Inner").nest("B");
        assert_eq!(m.to_string(), "Outer.Inner.B");
        assert_eq!(m.pop_root().to_string(), "Inner.B");
        assert_eq!(m.len(), 3);
        assert_eq!(Marker::root().pop_root(), Marker::root());
    }

    #[test]
    fn nest_leaves_original_untouched() {
        let base = Marker::single("A");
        let child = base.nest("B");
        assert_eq!(base.to_string(), "A");
        assert_eq!(child.to_string(), "A.B");
    }

    #[test]
    fn root_renders_empty() {
        assert_eq!(Marker::root().to_string(), "");
        assert_eq!(Marker::parse("", '.'), Marker::root());
        assert!(Marker::root().is_empty());
    }

    #[test]
    fn custom_separator() {
        let m = Marker::from_segments(["Motor", "Speed", "0"]);
        assert_eq!(m.to_string_with('_'), "Motor_Speed_0");
        assert_eq!(Marker::parse("Motor_Speed_0", '_'), m);
    }

    #[test]
    fn equality_is_by_content() {
        let a = Marker::single("X").nest("Y");
        let b = Marker::from_segments(["X", "Y"]);
        assert_eq!(a, b);
        assert_ne!(a, Marker::from_segments(["Y", "X"]));
    }

    #[test]
    fn json_as_string() {
        let m = Marker::from_segments(["Outer", "Arr", "1"]);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"Outer.Arr.1\"");
        let back: Marker = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        let parsed: Marker = "Outer.Arr.1".parse().unwrap();
        assert_eq!(parsed, m);
    }
}
