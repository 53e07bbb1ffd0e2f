//! Layer query model shared by catalog implementations.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use grib_common::{GribIndexError, LayerRecord, MeasurementKey, VerticalAxis};
use serde::{Deserialize, Serialize};

/// Side of a time bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeDirection {
    /// Valid time <= timestamp, newest first
    AtOrBefore,
    /// Valid time >= timestamp, oldest first
    AtOrAfter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeFilter {
    pub timestamp: DateTime<Utc>,
    pub direction: TimeDirection,
}

impl TimeFilter {
    pub fn matches(&self, valid: &DateTime<Utc>) -> bool {
        match self.direction {
            TimeDirection::AtOrBefore => valid <= &self.timestamp,
            TimeDirection::AtOrAfter => valid >= &self.timestamp,
        }
    }
}

/// How a requested level selects layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelMode {
    /// Level equals the requested value
    Exact,
    /// Per measurement family, the highest level strictly below the
    /// requested one
    HighestBelow,
    /// Per measurement family, the lowest level strictly above the
    /// requested one
    LowestAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelFilter {
    pub value: f64,
    pub mode: LevelMode,
}

/// Filters for [`Catalog::query_layers`](crate::Catalog::query_layers) and
/// [`Catalog::query_distinct_field`](crate::Catalog::query_distinct_field).
///
/// Unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerQuery {
    /// (lon, lat) that must lie inside the layer's coverage polygon
    pub point: Option<(f64, f64)>,
    pub time: Option<TimeFilter>,
    pub parameter_name: Option<String>,
    pub parameter_unit: Option<String>,
    pub level_type: Option<String>,
    pub level: Option<LevelFilter>,
}

impl LayerQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_point(mut self, lon: f64, lat: f64) -> Self {
        self.point = Some((lon, lat));
        self
    }

    pub fn at_or_before(mut self, timestamp: DateTime<Utc>) -> Self {
        self.time = Some(TimeFilter {
            timestamp,
            direction: TimeDirection::AtOrBefore,
        });
        self
    }

    pub fn at_or_after(mut self, timestamp: DateTime<Utc>) -> Self {
        self.time = Some(TimeFilter {
            timestamp,
            direction: TimeDirection::AtOrAfter,
        });
        self
    }

    pub fn with_time(mut self, time: Option<TimeFilter>) -> Self {
        self.time = time;
        self
    }

    pub fn parameter(mut self, name: impl Into<String>) -> Self {
        self.parameter_name = Some(name.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.parameter_unit = Some(unit.into());
        self
    }

    pub fn level_type(mut self, level_type: impl Into<String>) -> Self {
        self.level_type = Some(level_type.into());
        self
    }

    pub fn level(mut self, value: f64) -> Self {
        self.level = Some(LevelFilter {
            value,
            mode: LevelMode::Exact,
        });
        self
    }

    pub fn level_highest_below(mut self, value: f64) -> Self {
        self.level = Some(LevelFilter {
            value,
            mode: LevelMode::HighestBelow,
        });
        self
    }

    pub fn level_lowest_above(mut self, value: f64) -> Self {
        self.level = Some(LevelFilter {
            value,
            mode: LevelMode::LowestAbove,
        });
        self
    }

    /// Attribute and time filters of one record, excluding the point and any
    /// relative level rule.
    pub fn matches_attributes(&self, record: &LayerRecord) -> bool {
        let m = &record.measurement;
        if let Some(name) = &self.parameter_name {
            if &m.name != name {
                return false;
            }
        }
        if let Some(unit) = &self.parameter_unit {
            if &m.unit != unit {
                return false;
            }
        }
        if let Some(level_type) = &self.level_type {
            if &m.level_type != level_type {
                return false;
            }
        }
        if let Some(LevelFilter {
            value,
            mode: LevelMode::Exact,
        }) = self.level
        {
            if m.level != value {
                return false;
            }
        }
        if let Some(time) = &self.time {
            if !time.matches(&record.valid_time) {
                return false;
            }
        }
        true
    }
}

/// Keep, per measurement family, only the records at the level chosen by a
/// relative level rule. Exact level filters are left to
/// [`LayerQuery::matches_attributes`].
pub fn apply_level_rule(records: Vec<LayerRecord>, filter: Option<LevelFilter>) -> Vec<LayerRecord> {
    let Some(LevelFilter { value, mode }) = filter else {
        return records;
    };
    if mode == LevelMode::Exact {
        return records;
    }

    let mut chosen: HashMap<(String, String, String), f64> = HashMap::new();
    for record in &records {
        let m = &record.measurement;
        let axis = VerticalAxis::of(&m.level_type);
        // Eligible levels lie on the requested side; the best is the one
        // nearest to the requested level.
        let (eligible, better): (bool, fn(VerticalAxis, f64, f64) -> bool) = match mode {
            LevelMode::HighestBelow => (axis.is_below(m.level, value), VerticalAxis::is_higher),
            LevelMode::LowestAbove => (axis.is_higher(m.level, value), VerticalAxis::is_below),
            LevelMode::Exact => (false, VerticalAxis::is_higher),
        };
        if !eligible {
            continue;
        }
        let family = family_key(m);
        let current = chosen.get(&family).copied();
        if current.map_or(true, |c| better(axis, m.level, c)) {
            chosen.insert(family, m.level);
        }
    }

    records
        .into_iter()
        .filter(|r| chosen.get(&family_key(&r.measurement)) == Some(&r.measurement.level))
        .collect()
}

fn family_key(m: &MeasurementKey) -> (String, String, String) {
    (m.name.clone(), m.unit.clone(), m.level_type.clone())
}

/// Order records for a bracket side: newest first before the timestamp,
/// oldest first after it, and chronologically without a time filter.
pub fn sort_records(records: &mut [LayerRecord], time: Option<&TimeFilter>) {
    let descending = matches!(
        time,
        Some(TimeFilter {
            direction: TimeDirection::AtOrBefore,
            ..
        })
    );
    records.sort_by(|a, b| {
        let by_time = a.valid_time.cmp(&b.valid_time);
        let by_time = if descending { by_time.reverse() } else { by_time };
        by_time
            .then_with(|| a.measurement.cmp(&b.measurement))
            .then_with(|| a.layer.cmp(&b.layer))
    });
}

/// A categorical layer attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerField {
    Name,
    Unit,
    LevelType,
    Level,
}

impl LayerField {
    pub fn value_of(&self, m: &MeasurementKey) -> FieldValue {
        match self {
            LayerField::Name => FieldValue::Text(m.name.clone()),
            LayerField::Unit => FieldValue::Text(m.unit.clone()),
            LayerField::LevelType => FieldValue::Text(m.level_type.clone()),
            LayerField::Level => FieldValue::Number(m.level),
        }
    }
}

impl FromStr for LayerField {
    type Err = GribIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "names" | "parameter_name" => Ok(LayerField::Name),
            "unit" | "units" | "parameter_unit" => Ok(LayerField::Unit),
            "level-type" | "level-types" | "level_type" | "leveltype" => Ok(LayerField::LevelType),
            "level" | "levels" => Ok(LayerField::Level),
            other => Err(GribIndexError::InvalidQuery(format!(
                "unknown layer field: {}",
                other
            ))),
        }
    }
}

/// A distinct value of a [`LayerField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    fn sort_key(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Number(_), FieldValue::Text(_)) => std::cmp::Ordering::Less,
            (FieldValue::Text(_), FieldValue::Number(_)) => std::cmp::Ordering::Greater,
        }
    }

    /// Sort ascending and remove duplicates.
    pub fn sort_dedup(values: &mut Vec<FieldValue>) {
        values.sort_by(|a, b| a.sort_key(b));
        values.dedup();
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(v) => write!(f, "{}", v),
        }
    }
}
