//! Query string and url-encoded form parsing.

use serde_json::{Map, Value};

use crate::error::{ExtractionError, ExtractionSource};

/// Decoded `key=value` pairs in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs {
    pairs: Vec<(String, String)>,
}

impl QueryPairs {
    /// Parses a url-encoded string (`a=1&b=2`). `+` decodes to a space.
    pub fn parse(raw: &str, origin: ExtractionSource) -> Result<Self, ExtractionError> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(raw)
            .map_err(|e| ExtractionError::invalid_encoding(origin, raw, e))?;
        Ok(Self { pairs })
    }

    /// First value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value for `name`.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs as a JSON object. Repeated keys collect into an array.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.pairs {
            let value = Value::String(value.clone());
            match map.get_mut(key) {
                None => {
                    map.insert(key.clone(), value);
                }
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }
        Value::Object(map)
    }
}
