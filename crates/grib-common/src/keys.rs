//! GRIB key/value metadata as exposed by the decoder.
//!
//! Decoders expose a layer's section metadata as named keys
//! (`Nx`, `DxInMetres`, `latitudeOfFirstGridPointInDegrees`, ...) and its map
//! projection as a proj-style parameter set (`proj=lcc`, `lat_1=...`).
//! Several keys have aliases depending on the grid template (`Nx`/`Ni`,
//! `DxInMetres`/`DiInMetres`), so lookups accept a list of candidate names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl KeyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            KeyValue::Int(v) => Some(*v as f64),
            KeyValue::Float(v) => Some(*v),
            KeyValue::Str(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            KeyValue::Int(v) => Some(*v),
            KeyValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            KeyValue::Float(_) => None,
            KeyValue::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyValue::Int(v) => write!(f, "{}", v),
            KeyValue::Float(v) => write!(f, "{}", v),
            KeyValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Int(v)
    }
}

impl From<f64> for KeyValue {
    fn from(v: f64) -> Self {
        KeyValue::Float(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        KeyValue::Str(v.to_string())
    }
}

/// Named metadata keys of one decoded layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GribKeys(BTreeMap<String, KeyValue>);

impl GribKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<KeyValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&KeyValue> {
        self.0.get(name)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(KeyValue::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(KeyValue::as_i64)
    }

    /// First present key among `aliases`, parsed as a float.
    pub fn first_f64(&self, aliases: &[&str]) -> Option<f64> {
        aliases.iter().find_map(|name| self.get_f64(name))
    }

    /// First present key among `aliases`, parsed as an integer.
    pub fn first_i64(&self, aliases: &[&str]) -> Option<i64> {
        aliases.iter().find_map(|name| self.get_i64(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &KeyValue)> {
        self.0.iter()
    }
}

/// Proj-style projection parameters (`{"proj": "lcc", "lat_1": 63.3, ...}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjParams(BTreeMap<String, Value>);

impl ProjParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// The projection name (`cyl`, `lcc`, `stere`, `merc`, ...).
    pub fn proj(&self) -> Option<&str> {
        self.0.get("proj").and_then(Value::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Numeric parameter; numbers encoded as strings are accepted.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parameters as a JSON object, as stored alongside coverage polygons.
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_lookup_prefers_first_present() {
        let keys = GribKeys::new().with("Ni", 720i64).with("Nj", 361i64);
        assert_eq!(keys.first_i64(&["Nx", "Ni"]), Some(720));
        assert_eq!(keys.first_i64(&["Ny", "Nj"]), Some(361));
        assert_eq!(keys.first_i64(&["Nz"]), None);
    }

    #[test]
    fn test_string_values_parse_as_numbers() {
        let keys = GribKeys::new().with("DxInMetres", "2500");
        assert_eq!(keys.get_f64("DxInMetres"), Some(2500.0));
    }

    #[test]
    fn test_projparams_accessors() {
        let params = ProjParams::new()
            .with("proj", "lcc")
            .with("lat_1", 63.3)
            .with("lon_0", "15.0");
        assert_eq!(params.proj(), Some("lcc"));
        assert_eq!(params.get_f64("lat_1"), Some(63.3));
        assert_eq!(params.get_f64("lon_0"), Some(15.0));
        assert_eq!(params.to_json()["proj"], "lcc");
    }
}
