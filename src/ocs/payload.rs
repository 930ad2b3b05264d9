//! Response payloads.
//!
//! A payload is a tree of ordered mappings and sequences with scalar leaves.
//! The serializer walks it according to the envelope's [`Dimension`];
//! shape and dimension must agree (see `serializer.rs`).
//!
//! [`Dimension`]: crate::ocs::envelope::Dimension

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::borrow::Cow;

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Text form used inside XML elements: booleans render as `1`/empty,
    /// null as empty, numbers as plain decimal.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Null | Scalar::Bool(false) => Cow::Borrowed(""),
            Scalar::Bool(true) => Cow::Borrowed("1"),
            Scalar::Int(i) => Cow::Owned(i.to_string()),
            Scalar::Float(f) => Cow::Owned(f.to_string()),
            Scalar::Text(s) => Cow::Borrowed(s),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_none(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// A nested response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scalar(Scalar),
    /// Named fields in insertion order.
    Map(Vec<(String, Payload)>),
    /// Positional entries.
    List(Vec<Payload>),
}

/// Key of a child inside a [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Named(&'a str),
    Position(usize),
}

impl<'a> Key<'a> {
    /// Element name for this key, using `fallback` for positions.
    pub fn name_or(self, fallback: &'a str) -> &'a str {
        match self {
            Key::Named(name) => name,
            Key::Position(_) => fallback,
        }
    }
}

impl Payload {
    /// The empty payload, rendered as `[]` in JSON.
    pub fn empty() -> Self {
        Payload::List(Vec::new())
    }

    /// Build a mapping from `(key, value)` pairs, preserving their order.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Payload>,
        I: IntoIterator<Item = (K, V)>,
    {
        Payload::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a sequence.
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<Payload>,
        I: IntoIterator<Item = V>,
    {
        Payload::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_nested(&self) -> bool {
        !matches!(self, Payload::Scalar(_))
    }

    /// Scalar text of this payload; nested payloads have none.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Payload::Scalar(s) => s.to_text(),
            Payload::Map(_) | Payload::List(_) => Cow::Borrowed(""),
        }
    }

    /// Children with their keys. Scalars have no children.
    pub fn children(&self) -> Vec<(Key<'_>, &Payload)> {
        match self {
            Payload::Scalar(_) => Vec::new(),
            Payload::Map(entries) => entries
                .iter()
                .map(|(k, v)| (Key::Named(k.as_str()), v))
                .collect(),
            Payload::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Key::Position(i), v))
                .collect(),
        }
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        match self {
            Payload::Scalar(_) => 0,
            Payload::Map(entries) => entries.len(),
            Payload::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::empty()
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Scalar(s) => s.serialize(serializer),
            Payload::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Payload::List(items) => serializer.collect_seq(items),
        }
    }
}

impl From<Scalar> for Payload {
    fn from(s: Scalar) -> Self {
        Payload::Scalar(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Scalar(Scalar::Text(s.to_string()))
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Scalar(Scalar::Text(s))
    }
}

impl From<Option<String>> for Payload {
    fn from(s: Option<String>) -> Self {
        Payload::Scalar(s.map_or(Scalar::Null, Scalar::Text))
    }
}

impl From<i64> for Payload {
    fn from(i: i64) -> Self {
        Payload::Scalar(Scalar::Int(i))
    }
}

impl From<u64> for Payload {
    fn from(u: u64) -> Self {
        Payload::Scalar(i64::try_from(u).map_or(Scalar::Float(u as f64), Scalar::Int))
    }
}

impl From<f64> for Payload {
    fn from(f: f64) -> Self {
        Payload::Scalar(Scalar::Float(f))
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Scalar(Scalar::Bool(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_text() {
        assert_eq!(Scalar::Null.to_text(), "");
        assert_eq!(Scalar::Bool(true).to_text(), "1");
        assert_eq!(Scalar::Bool(false).to_text(), "");
        assert_eq!(Scalar::Int(-3).to_text(), "-3");
        assert_eq!(Scalar::Float(12.34).to_text(), "12.34");
        assert_eq!(Scalar::Float(0.0).to_text(), "0");
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let p = Payload::map([("zeta", "1"), ("alpha", "2")]);
        let keys: Vec<_> = p.children().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![Key::Named("zeta"), Key::Named("alpha")]);
        assert_eq!(
            serde_json::to_string(&p).unwrap(),
            r#"{"zeta":"1","alpha":"2"}"#
        );
    }

    #[test]
    fn test_json_shapes() {
        assert_eq!(serde_json::to_string(&Payload::empty()).unwrap(), "[]");
        let p = Payload::list([Payload::map([("n", Payload::from(1i64))])]);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"[{"n":1}]"#);
        assert_eq!(serde_json::to_string(&Payload::from(None)).unwrap(), "null");
    }

    #[test]
    fn test_list_children_are_positional() {
        let p = Payload::list(["a", "b"]);
        let keys: Vec<_> = p.children().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![Key::Position(0), Key::Position(1)]);
        assert_eq!(Key::Position(1).name_or("entry"), "entry");
        assert_eq!(Key::Named("x").name_or("entry"), "x");
    }
}
