//! Catalog identities: measurements, layer records and coverage ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Content hash of a coverage polygon (hex-encoded SHA-256 of its WKB).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridId(pub String);

impl GridId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a parameter at a level: (name, unit, level type, level).
///
/// Levels compare by total order on their bit pattern so the key can be used
/// in hashed and ordered collections; `-0.0` and `0.0` are the same level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementKey {
    pub name: String,
    pub unit: String,
    pub level_type: String,
    pub level: f64,
}

impl MeasurementKey {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        level_type: impl Into<String>,
        level: f64,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            level_type: level_type.into(),
            level,
        }
    }

    /// Same unit and level, different parameter name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Comma-joined identifier, `"Temperature,K,heightAboveGround,2"`.
    pub fn id(&self) -> String {
        format!("{},{},{},{}", self.name, self.unit, self.level_type, self.level)
    }

    /// The measurement ignoring its level value.
    pub fn family(&self) -> (&str, &str, &str) {
        (&self.name, &self.unit, &self.level_type)
    }

    fn level_bits(&self) -> u64 {
        if self.level == 0.0 {
            0.0f64.to_bits()
        } else {
            self.level.to_bits()
        }
    }
}

impl PartialEq for MeasurementKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MeasurementKey {}

impl PartialOrd for MeasurementKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MeasurementKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.family()
            .cmp(&other.family())
            .then_with(|| {
                let a = if self.level == 0.0 { 0.0 } else { self.level };
                let b = if other.level == 0.0 { 0.0 } else { other.level };
                a.total_cmp(&b)
            })
    }
}

impl Hash for MeasurementKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family().hash(state);
        self.level_bits().hash(state);
    }
}

impl std::fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Direction in which a level type's values grow along the vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAxis {
    /// Larger values are higher up (heights, hybrid/model levels counted upward)
    Upward,
    /// Larger values are lower down (pressure, depth)
    Downward,
}

impl VerticalAxis {
    /// Axis of a GRIB `typeOfLevel` name.
    pub fn of(level_type: &str) -> Self {
        let lower = level_type.to_ascii_lowercase();
        if lower.starts_with("isobaric")
            || lower.starts_with("pressure")
            || lower.starts_with("depth")
            || lower == "sigma"
        {
            VerticalAxis::Downward
        } else {
            VerticalAxis::Upward
        }
    }

    /// Whether `level` is physically strictly below `reference`.
    pub fn is_below(self, level: f64, reference: f64) -> bool {
        match self {
            VerticalAxis::Upward => level < reference,
            VerticalAxis::Downward => level > reference,
        }
    }

    /// Whether `a` is physically higher than `b`.
    pub fn is_higher(self, a: f64, b: f64) -> bool {
        match self {
            VerticalAxis::Upward => a > b,
            VerticalAxis::Downward => a < b,
        }
    }
}

/// Position of one layer inside one source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerRef {
    /// Source locator (file path or URL)
    pub source: String,
    /// 1-based layer index within the source
    pub index: usize,
}

impl LayerRef {
    pub fn new(source: impl Into<String>, index: usize) -> Self {
        Self {
            source: source.into(),
            index,
        }
    }
}

impl std::fmt::Display for LayerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.source, self.index)
    }
}

/// Catalog entry for one decoded grid layer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub layer: LayerRef,
    pub measurement: MeasurementKey,
    /// Shared coverage polygon
    pub gridid: GridId,
    pub analysis_time: DateTime<Utc>,
    pub valid_time: DateTime<Utc>,
}

impl LayerRecord {
    /// Valid time as Unix-epoch seconds.
    pub fn valid_epoch(&self) -> i64 {
        self.valid_time.timestamp()
    }
}
