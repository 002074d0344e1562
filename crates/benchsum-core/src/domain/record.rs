//! Per-run result records and their scalar field values.

use std::fmt;
use std::path::Path;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use super::error::{BenchsumError, Result};

/// A scalar JSON value as found in a result file.
///
/// Booleans are their own variant so they never take part in averaging.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// The value as an averaging input: a finite number, nothing else.
    pub fn as_finite_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Value equality for consistency checks. Unlike `==`, two NaNs match.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Null => serializer.serialize_unit(),
        }
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar value (number, string, boolean or null)")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

/// Bare non-finite tokens accepted in result files, longest first.
const NON_FINITE_TOKENS: [(&str, f64); 3] = [
    ("-Infinity", f64::NEG_INFINITY),
    ("Infinity", f64::INFINITY),
    ("NaN", f64::NAN),
];

/// Quote bare `NaN`, `Infinity` and `-Infinity` tokens so strict JSON can
/// parse the text. Each token becomes a string `<marker><token>`, where the
/// marker does not occur anywhere in the input.
///
/// Returns `None` when the text has no such token outside a string.
fn quote_non_finite(json: &str) -> Option<(String, String)> {
    if !json.contains("NaN") && !json.contains("Infinity") {
        return None;
    }

    let mut marker = String::from("benchsum:non-finite:");
    while json.contains(marker.as_str()) {
        marker.insert(0, '~');
    }

    let mut out = String::with_capacity(json.len() + 64);
    let mut rest = json;
    let mut in_string = false;
    let mut escaped = false;
    let mut replaced = false;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some((token, _)) = NON_FINITE_TOKENS.iter().find(|(token, _)| {
            rest.starts_with(token)
                && !rest[token.len()..].starts_with(|n: char| n.is_alphanumeric() || n == '_')
        }) {
            out.push('"');
            out.push_str(&marker);
            out.push_str(token);
            out.push('"');
            rest = &rest[token.len()..];
            replaced = true;
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    replaced.then_some((out, marker))
}

/// Turn marker strings left by [`quote_non_finite`] back into numbers.
fn restore_non_finite(fields: &mut [(String, FieldValue)], marker: &str) {
    for (_, value) in fields.iter_mut() {
        let Some(token) = value.as_str().and_then(|s| s.strip_prefix(marker)) else {
            continue;
        };
        if let Some((_, n)) = NON_FINITE_TOKENS.iter().find(|(t, _)| *t == token) {
            *value = FieldValue::Number(*n);
        }
    }
}

/// Fields of a flat JSON object in document order.
struct OrderedFields(Vec<(String, FieldValue)>);

struct OrderedFieldsVisitor;

impl<'de> Visitor<'de> for OrderedFieldsVisitor {
    type Value = OrderedFields;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a flat JSON object of scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<OrderedFields, A::Error> {
        let mut fields: Vec<(String, FieldValue)> = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, FieldValue>()? {
            // Duplicate keys keep their first position and the last value.
            match fields.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => fields.push((key, value)),
            }
        }
        Ok(OrderedFields(fields))
    }
}

impl<'de> Deserialize<'de> for OrderedFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedFieldsVisitor)
    }
}

/// One run's result record: an ordered field mapping plus the name of the
/// file (or run) it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    source_id: String,
    fields: Vec<(String, FieldValue)>,
}

impl ResultRecord {
    /// Create an empty record for the given source identifier.
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            fields: Vec::new(),
        }
    }

    /// Add or replace a field, keeping the original position on replace.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Parse a record from JSON text. The top level must be an object whose
    /// values are all scalars. Bare `NaN`, `Infinity` and `-Infinity` values
    /// are accepted and read as non-finite numbers.
    pub fn from_json_str(source_id: impl Into<String>, json: &str) -> Result<Self> {
        let source_id = source_id.into();
        let quoted = quote_non_finite(json);
        let text = quoted.as_ref().map_or(json, |(text, _)| text.as_str());

        let OrderedFields(mut fields) = serde_json::from_str(text)
            .map_err(|e| BenchsumError::malformed(source_id.clone(), e))?;
        if let Some((_, marker)) = &quoted {
            restore_non_finite(&mut fields, marker);
        }
        Ok(Self { source_id, fields })
    }

    /// Read a record from disk. The file name becomes the source identifier.
    pub fn read(path: &Path) -> Result<Self> {
        let source_id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content = std::fs::read_to_string(path)
            .map_err(|e| BenchsumError::malformed(source_id.clone(), e))?;
        Self::from_json_str(source_id, &content)
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Fields in document order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
