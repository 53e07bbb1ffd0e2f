//! Remapping of decoder parameter identities to catalog names and units.

use std::collections::HashMap;

use grib_common::ParameterInfo;
use serde::{Deserialize, Serialize};

/// Lookup from a parameter code or name to a `(name, unit)` pair.
///
/// Keys are tried in order: the parameter number (`"2"`), then
/// `"category.number"` (`"0.2"`), then the decoder's parameter name. The
/// first hit wins; without one the decoder's name and unit are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMap(HashMap<String, ParameterName>);

/// Catalog name and unit of a remapped parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterName {
    pub name: String,
    pub unit: String,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        self.insert(key, name, unit);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) {
        self.0.insert(
            key.into(),
            ParameterName {
                name: name.into(),
                unit: unit.into(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Catalog `(name, unit)` of a decoded parameter.
    pub fn resolve(&self, parameter: &ParameterInfo) -> (String, String) {
        let by_number = parameter.number.map(|n| n.to_string());
        let by_code = match (parameter.category, parameter.number) {
            (Some(c), Some(n)) => Some(format!("{}.{}", c, n)),
            _ => None,
        };

        by_number
            .iter()
            .chain(by_code.iter())
            .chain(std::iter::once(&parameter.name))
            .find_map(|key| self.0.get(key))
            .map(|p| (p.name.clone(), p.unit.clone()))
            .unwrap_or_else(|| (parameter.name.clone(), parameter.units.clone()))
    }
}

impl<K, N, U> FromIterator<(K, N, U)> for ParameterMap
where
    K: Into<String>,
    N: Into<String>,
    U: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, N, U)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, name, unit) in iter {
            map.insert(key, name, unit);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gust() -> ParameterInfo {
        ParameterInfo::new("Wind speed (gust)", "m s**-1").with_code(2, 22)
    }

    #[test]
    fn test_empty_map_keeps_decoder_identity() {
        let (name, unit) = ParameterMap::new().resolve(&gust());
        assert_eq!(name, "Wind speed (gust)");
        assert_eq!(unit, "m s**-1");
    }

    #[test]
    fn test_number_wins_over_code_and_name() {
        let map = ParameterMap::new()
            .with("22", "by number", "a")
            .with("2.22", "by code", "b")
            .with("Wind speed (gust)", "by name", "c");
        assert_eq!(map.resolve(&gust()).0, "by number");
    }

    #[test]
    fn test_code_wins_over_name() {
        let map = ParameterMap::new()
            .with("2.22", "Gust", "m/s")
            .with("Wind speed (gust)", "by name", "c");
        assert_eq!(map.resolve(&gust()), ("Gust".to_string(), "m/s".to_string()));
    }

    #[test]
    fn test_name_fallback() {
        let map = ParameterMap::new().with("Wind speed (gust)", "Gust", "m/s");
        assert_eq!(map.resolve(&gust()).0, "Gust");

        let uncoded = ParameterInfo::new("Wind speed (gust)", "m s**-1");
        assert_eq!(map.resolve(&uncoded).0, "Gust");
    }

    #[test]
    fn test_from_iter_and_json() {
        let map: ParameterMap = vec![("11", "Temperature", "K")].into_iter().collect();
        assert_eq!(map.len(), 1);

        let json = r#"{"11": {"name": "Temperature", "unit": "K"}}"#;
        let parsed: ParameterMap = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, map);
    }
}
