//! Decoded grid layers as handed over by the GRIB decoder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GribIndexError, GribKeys, GribResult, ProjParams};

/// Parameter identity as reported by the decoder, before any remapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Decoder parameter name (e.g. "Temperature", "U component of wind")
    pub name: String,
    /// Decoder parameter units (e.g. "K", "m s**-1")
    pub units: String,
    /// GRIB2 parameter number within its category, if present
    pub number: Option<i64>,
    /// GRIB2 parameter category, if present
    pub category: Option<i64>,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            number: None,
            category: None,
        }
    }

    pub fn with_code(mut self, category: i64, number: i64) -> Self {
        self.category = Some(category);
        self.number = Some(number);
        self
    }
}

/// One decoded 2-D grid layer.
///
/// Values are stored row-major with `ny` rows of `nx` columns; row `j`,
/// column `i` is grid index `(i, j)`. Missing values are NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedLayer {
    pub values: Vec<f64>,
    pub nx: usize,
    pub ny: usize,
    /// Smallest value considered valid (inclusive)
    pub minimum: f64,
    /// Largest value considered valid (inclusive)
    pub maximum: f64,
    pub keys: GribKeys,
    pub projparams: ProjParams,
    pub parameter: ParameterInfo,
    pub level_type: String,
    pub level: f64,
    pub analysis_time: DateTime<Utc>,
    pub valid_time: DateTime<Utc>,
}

impl DecodedLayer {
    /// Create a layer whose valid range is the span of its finite values.
    pub fn new(values: Vec<f64>, nx: usize, ny: usize) -> Self {
        let (minimum, maximum) = finite_range(&values);
        let epoch = DateTime::<Utc>::default();
        Self {
            values,
            nx,
            ny,
            minimum,
            maximum,
            keys: GribKeys::default(),
            projparams: ProjParams::default(),
            parameter: ParameterInfo::default(),
            level_type: String::new(),
            level: 0.0,
            analysis_time: epoch,
            valid_time: epoch,
        }
    }

    pub fn with_valid_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn with_keys(mut self, keys: GribKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_projparams(mut self, projparams: ProjParams) -> Self {
        self.projparams = projparams;
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameter = parameter;
        self
    }

    pub fn with_level(mut self, level_type: impl Into<String>, level: f64) -> Self {
        self.level_type = level_type.into();
        self.level = level;
        self
    }

    pub fn with_times(mut self, analysis: DateTime<Utc>, valid: DateTime<Utc>) -> Self {
        self.analysis_time = analysis;
        self.valid_time = valid;
        self
    }

    /// Value at grid index `(i, j)`.
    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.nx || j >= self.ny {
            return None;
        }
        self.values.get(j * self.nx + i).copied()
    }

    /// Whether `v` lies in the layer's valid range. NaN is never valid.
    pub fn is_valid(&self, v: f64) -> bool {
        v >= self.minimum && v <= self.maximum
    }

    /// Check that the value buffer matches the declared dimensions.
    pub fn check_shape(&self) -> GribResult<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(GribIndexError::MalformedLayer(format!(
                "empty grid {}x{}",
                self.nx, self.ny
            )));
        }
        if self.values.len() != self.nx * self.ny {
            return Err(GribIndexError::MalformedLayer(format!(
                "expected {} values for {}x{} grid, got {}",
                self.nx * self.ny,
                self.nx,
                self.ny,
                self.values.len()
            )));
        }
        Ok(())
    }
}

fn finite_range(values: &[f64]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range_from_finite_values() {
        let layer = DecodedLayer::new(vec![1.0, f64::NAN, 5.0, -2.0], 2, 2);
        assert_eq!(layer.minimum, -2.0);
        assert_eq!(layer.maximum, 5.0);
        assert!(layer.is_valid(0.0));
        assert!(!layer.is_valid(f64::NAN));
    }

    #[test]
    fn test_all_missing_layer_has_no_valid_values() {
        let layer = DecodedLayer::new(vec![f64::NAN; 4], 2, 2);
        assert!(!layer.is_valid(0.0));
        assert!(!layer.is_valid(f64::INFINITY));
    }

    #[test]
    fn test_value_indexing_is_row_major() {
        let layer = DecodedLayer::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 3, 2);
        assert_eq!(layer.value(2, 0), Some(2.0));
        assert_eq!(layer.value(0, 1), Some(3.0));
        assert_eq!(layer.value(3, 0), None);
    }

    #[test]
    fn test_check_shape() {
        assert!(DecodedLayer::new(vec![0.0; 6], 3, 2).check_shape().is_ok());
        assert!(DecodedLayer::new(vec![0.0; 5], 3, 2).check_shape().is_err());
        assert!(DecodedLayer::new(vec![], 0, 0).check_shape().is_err());
    }
}
