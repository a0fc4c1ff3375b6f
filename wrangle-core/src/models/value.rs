//! Record values
//!
//! Records from either store are represented as [`Fields`]: an ordered
//! mapping from field name to [`FieldValue`]. Order is the order in which
//! the store (or the request body) produced the keys.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
            Self::Map(fields) => fields.serialize(serializer),
        }
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, boolean, null, list or mapping")
    }

    fn visit_unit<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<FieldValue, D::Error> {
        FieldValue::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Int(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<FieldValue, E> {
        Ok(i64::try_from(n)
            .map(FieldValue::Int)
            .unwrap_or(FieldValue::Float(n as f64)))
    }

    fn visit_f64<E: de::Error>(self, x: f64) -> Result<FieldValue, E> {
        Ok(FieldValue::Float(x))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FieldValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(FieldValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<FieldValue, A::Error> {
        FieldsVisitor.visit_map(map).map(FieldValue::Map)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(FieldValueVisitor)
    }
}

/// Ordered field map. Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: IndexMap<String, FieldValue>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Insert or replace. Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `patch` onto `self`: supplied keys change, others stay.
    pub fn merge(&mut self, patch: Fields) {
        for (key, value) in patch {
            self.insert(key, value);
        }
    }

    /// Apply HTML-form style type hints.
    ///
    /// A key `foo_type` holding `number`, `boolean` or `string` controls how
    /// the text value under `foo` is converted. Hint keys are dropped, as are
    /// null values and empty strings. Non-text values pass through unchanged.
    pub fn apply_type_hints(self) -> Fields {
        let hints: IndexMap<String, FieldKind> = self
            .iter()
            .filter_map(|(k, v)| {
                let target = k.strip_suffix("_type")?;
                Some((target.to_owned(), FieldKind::parse(v.as_text()?)))
            })
            .collect();

        let mut out = Fields::new();
        for (key, value) in self.entries {
            if key.ends_with("_type") {
                continue;
            }
            let kind = hints.get(&key).copied().unwrap_or(FieldKind::String);
            match value {
                FieldValue::Null => {}
                FieldValue::Text(ref s) if s.is_empty() => {}
                FieldValue::Text(s) => {
                    out.insert(key, kind.coerce(&s));
                }
                other => {
                    out.insert(key, other);
                }
            }
        }
        out
    }
}

/// Equal when the same keys hold the same values in the same order.
impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct FieldsVisitor;

impl<'de> Visitor<'de> for FieldsVisitor {
    type Value = Fields;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of field names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Fields, A::Error> {
        let mut fields = Fields::with_capacity(map.size_hint().unwrap_or(0).min(4096));
        while let Some((key, value)) = map.next_entry::<String, FieldValue>()? {
            fields.insert(key, value);
        }
        Ok(fields)
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_map(FieldsVisitor)
    }
}

/// Type hint for form-submitted text values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
}

impl FieldKind {
    /// Unknown hints fall back to `String`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            _ => Self::String,
        }
    }

    /// Convert a raw text value. Numbers try integer first, then float,
    /// and stay text when neither parses.
    pub fn coerce(self, raw: &str) -> FieldValue {
        match self {
            Self::String => FieldValue::Text(raw.to_owned()),
            Self::Number => raw
                .trim()
                .parse::<i64>()
                .map(FieldValue::Int)
                .or_else(|_| raw.trim().parse::<f64>().map(FieldValue::Float))
                .unwrap_or_else(|_| FieldValue::Text(raw.to_owned())),
            Self::Boolean => FieldValue::Bool(matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_key_order_from_json() {
        let fields: Fields =
            serde_json::from_str(r#"{"zeta":1,"alpha":"a","mid":null}"#).unwrap();
        let keys: Vec<_> = fields.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            serde_json::to_string(&fields).unwrap(),
            r#"{"zeta":1,"alpha":"a","mid":null}"#
        );
    }

    #[test]
    fn nested_values_deserialize() {
        let fields: Fields =
            serde_json::from_str(r#"{"tags":["a",2,true],"addr":{"city":"Oslo"},"pi":3.5}"#)
                .unwrap();
        assert_eq!(
            fields.get("tags"),
            Some(&FieldValue::List(vec![
                FieldValue::Text("a".into()),
                FieldValue::Int(2),
                FieldValue::Bool(true)
            ]))
        );
        let addr = match fields.get("addr") {
            Some(FieldValue::Map(m)) => m,
            other => panic!("expected map, got {other:?}"),
        };
        assert_eq!(addr.get("city"), Some(&FieldValue::Text("Oslo".into())));
        assert_eq!(fields.get("pi"), Some(&FieldValue::Float(3.5)));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut fields: Fields = [("a", 1i64), ("b", 2)].into_iter().collect();
        assert_eq!(fields.insert("a", 10i64), Some(FieldValue::Int(1)));
        let keys: Vec<_> = fields.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(fields.get("a"), Some(&FieldValue::Int(10)));
    }

    #[test]
    fn merge_only_touches_supplied_keys() {
        let mut record: Fields = [("name", "Ada"), ("email", "ada@example.com")]
            .into_iter()
            .collect();
        let patch: Fields = [("email", "ada.l@example.com")].into_iter().collect();
        record.merge(patch);
        assert_eq!(record.get("name"), Some(&FieldValue::Text("Ada".into())));
        assert_eq!(
            record.get("email"),
            Some(&FieldValue::Text("ada.l@example.com".into()))
        );
    }

    #[test]
    fn type_hints_coerce_form_values() {
        let form: Fields = serde_json::from_str(
            r#"{"age":"42","age_type":"number","ratio":"2.5","ratio_type":"number",
                "active":"on","active_type":"boolean","nick":"","title":"Dr"}"#,
        )
        .unwrap();
        let doc = form.apply_type_hints();

        assert_eq!(doc.get("age"), Some(&FieldValue::Int(42)));
        assert_eq!(doc.get("ratio"), Some(&FieldValue::Float(2.5)));
        assert_eq!(doc.get("active"), Some(&FieldValue::Bool(true)));
        assert_eq!(doc.get("title"), Some(&FieldValue::Text("Dr".into())));
        assert!(!doc.contains_key("nick"));
        assert!(!doc.contains_key("age_type"));
    }

    #[test]
    fn unparseable_number_stays_text() {
        assert_eq!(
            FieldKind::Number.coerce("forty"),
            FieldValue::Text("forty".into())
        );
        assert_eq!(FieldKind::Boolean.coerce("no"), FieldValue::Bool(false));
        assert_eq!(FieldKind::parse("whatever"), FieldKind::String);
    }

    #[test]
    fn remove_keeps_order() {
        let mut fields: Fields = [("a", 1i64), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(fields.remove("b"), Some(FieldValue::Int(2)));
        assert_eq!(fields.remove("b"), None);
        let keys: Vec<_> = fields.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn wide_payload_keeps_order_and_count() {
        let pairs: Vec<String> = (0..50_000).map(|i| format!("\"col_{i}\":{i}")).collect();
        let json = format!("{{{}}}", pairs.join(","));
        let mut fields: Fields = serde_json::from_str(&json).unwrap();
        assert_eq!(fields.len(), 50_000);
        assert_eq!(fields.keys().nth(49_999), Some("col_49999"));
        assert_eq!(fields.get("col_123"), Some(&FieldValue::Int(123)));

        fields.insert("col_0", "replaced");
        assert_eq!(fields.keys().next(), Some("col_0"));
        fields.remove("col_1");
        assert_eq!(fields.keys().nth(1), Some("col_2"));
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a: Fields = [("x", 1i64), ("y", 2)].into_iter().collect();
        let b: Fields = [("y", 2i64), ("x", 1)].into_iter().collect();
        assert_ne!(a, b);
    }
}
