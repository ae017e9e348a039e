//! JSON decoding with key and date conventions.
//!
//! # Design
//! Bodies are parsed into a `serde_json::Value` first and then fed to the
//! target type through [`CamelCaseKeys`], a deserializer that rewrites object
//! keys on the way through. Because serde hands `deserialize_struct` the
//! target's declared field names, a converted key can be matched against them
//! case-insensitively without any schema beyond the type's own `Deserialize`
//! impl. The rewrite is applied recursively: nested structs, sequences,
//! options, newtypes and enum payloads all see converted keys.
//!
//! When two body keys convert to the same field name, the first one in map
//! order (keys sort lexicographically) is decoded and the rest are skipped.
//!
//! Targets declare camelCase fields with `#[serde(rename_all = "camelCase")]`.
//! Date fields use [`Timestamp`], which reads ISO-8601 text.

use std::collections::HashSet;

use serde::de::value::{MapAccessDeserializer, MapDeserializer, SeqDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer, Visitor};
use serde::{forward_to_deserialize_any, Deserializer};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Instant decoded from ISO-8601 text.
///
/// The plain `Deserialize` impl is chrono's and is lenient: it also accepts a
/// space instead of `T` and fractional seconds (`2024-07-06 00:00:00Z`,
/// `2024-07-06T00:00:00.5Z`). Fields that must reject those forms use
/// [`iso8601`].
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// How object keys in a response body map onto the target's field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyDecoding {
    /// Keys must match field names exactly.
    UseDefaultKeys,
    /// `snake_case` keys become `camelCase`, then match fields ignoring case.
    #[default]
    ConvertFromSnakeCase,
}

/// Decodes response bodies into caller-declared types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoder {
    keys: KeyDecoding,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(mut self, keys: KeyDecoding) -> Self {
        self.keys = keys;
        self
    }

    pub fn keys(&self) -> KeyDecoding {
        self.keys
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ApiError> {
        let value: Value = serde_json::from_slice(bytes).map_err(ApiError::ErrorDecoding)?;
        self.decode_value(value)
    }

    pub fn decode_value<T: DeserializeOwned>(&self, value: Value) -> Result<T, ApiError> {
        let decoded = match self.keys {
            KeyDecoding::UseDefaultKeys => serde_json::from_value(value),
            KeyDecoding::ConvertFromSnakeCase => T::deserialize(CamelCaseKeys(value)),
        };
        decoded.map_err(ApiError::ErrorDecoding)
    }
}

/// Convert a `snake_case` key to `camelCase`.
///
/// Leading and trailing underscores survive, runs of interior underscores
/// collapse, and a key with no interior underscore is returned unchanged.
pub fn snake_to_camel(key: &str) -> String {
    let Some(start) = key.find(|c: char| c != '_') else {
        return key.to_string();
    };
    let end = key.trim_end_matches('_').len();
    let (leading, core, trailing) = (&key[..start], &key[start..end], &key[end..]);

    let words: Vec<&str> = core.split('_').filter(|w| !w.is_empty()).collect();
    if words.len() <= 1 {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len());
    out.push_str(leading);
    out.push_str(&words[0].to_lowercase());
    for word in &words[1..] {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out.push_str(trailing);
    out
}

fn match_field(key: String, fields: &'static [&'static str]) -> String {
    let converted = snake_to_camel(&key);
    if fields.contains(&converted.as_str()) {
        return converted;
    }
    fields
        .iter()
        .find(|f| f.eq_ignore_ascii_case(&converted))
        .map(|f| f.to_string())
        .unwrap_or(converted)
}

/// Deserializer over a JSON value that converts object keys as it descends.
#[derive(Debug)]
pub struct CamelCaseKeys(pub Value);

impl CamelCaseKeys {
    fn visit_object<'de, V: Visitor<'de>>(
        map: Map<String, Value>,
        fields: Option<&'static [&'static str]>,
        visitor: V,
    ) -> Result<V::Value, serde_json::Error> {
        let mut seen = HashSet::new();
        let entries = map.into_iter().filter_map(|(k, v)| {
            let key = match fields {
                Some(fields) => match_field(k, fields),
                None => snake_to_camel(&k),
            };
            seen.insert(key.clone()).then(|| (key, CamelCaseKeys(v)))
        });
        let mut de = MapDeserializer::<_, serde_json::Error>::new(entries);
        let value = visitor.visit_map(&mut de)?;
        de.end()?;
        Ok(value)
    }

    fn visit_array<'de, V: Visitor<'de>>(
        items: Vec<Value>,
        visitor: V,
    ) -> Result<V::Value, serde_json::Error> {
        let mut de =
            SeqDeserializer::<_, serde_json::Error>::new(items.into_iter().map(CamelCaseKeys));
        let value = visitor.visit_seq(&mut de)?;
        de.end()?;
        Ok(value)
    }
}

impl<'de> IntoDeserializer<'de, serde_json::Error> for CamelCaseKeys {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

impl<'de> Deserializer<'de> for CamelCaseKeys {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => Self::visit_object(map, None, visitor),
            Value::Array(items) => Self::visit_array(items, visitor),
            scalar => scalar.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(CamelCaseKeys(other)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => Self::visit_object(map, Some(fields), visitor),
            other => CamelCaseKeys(other).deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            // Externally tagged: the single key names the variant and is left as-is.
            Value::Object(map) if map.len() == 1 => {
                let entries = map.into_iter().map(|(k, v)| (k, CamelCaseKeys(v)));
                let map = MapDeserializer::<_, serde_json::Error>::new(entries);
                visitor.visit_enum(MapAccessDeserializer::new(map))
            }
            other => other.deserialize_enum(name, variants, visitor),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
        ignored_any
    }
}

/// Strict ISO-8601 internet date-time serde helpers for [`Timestamp`] fields.
///
/// Accepts exactly `YYYY-MM-DDTHH:MM:SS` followed by `Z` or a `±HH:MM`
/// offset; no space separator and no fractional seconds. Use
/// `#[serde(with = "network_caller::iso8601")]` on the field.
pub mod iso8601 {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Timestamp;

    const DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn parse(text: &str) -> Result<Timestamp, chrono::ParseError> {
        match text.strip_suffix('Z') {
            Some(utc) => NaiveDateTime::parse_from_str(utc, DATE_TIME).map(|dt| dt.and_utc()),
            None => DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%:z")
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Whole seconds, UTC, with a `Z` suffix.
    pub fn format(ts: &Timestamp) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(|e| de::Error::custom(format!("invalid ISO-8601 date {text:?}: {e}")))
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::Timestamp;

        pub fn serialize<S: Serializer>(
            ts: &Option<Timestamp>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_some(&super::format(ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Timestamp>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(deserialize_with = "super::deserialize")] Timestamp);

            let wrapped = Option::<Wrapped>::deserialize(deserializer)?;
            Ok(wrapped.map(|Wrapped(ts)| ts))
        }
    }
}
