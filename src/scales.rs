//! Grade-point scales.
//!
//! Scales are a configuration artifact rather than code: an ordered JSON array
//! of named grade → point mappings. Array order is the order reports list the
//! scales in.
//!
//! ```json
//! [
//!   { "name": "University", "points": { "A+": 4.0, "A": 4.0, "A-": 3.67, ... } },
//!   { "name": "AMCAS",      "points": { "A+": 4.0, "A": 4.0, "A-": 3.7,  ... } }
//! ]
//! ```

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::error::{GpaError, Result};
use crate::grade::Grade;

/// Built-in University, AMCAS and TMDSAS scales.
const BUILTIN_SCALES: &str = include_str!("../config/gpa_scales.json");

const MAX_POINTS: f64 = 4.0;

#[derive(Deserialize)]
struct RawScale {
    name: String,
    #[serde(deserialize_with = "map_entries")]
    points: Vec<(String, f64)>,
}

/// Reads a JSON object as its raw entries so repeated keys stay visible.
fn map_entries<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, f64)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Entries;

    impl<'de> Visitor<'de> for Entries {
        type Value = Vec<(String, f64)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of grade to points")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(Entries)
}

/// One named mapping from letter grade to point value.
#[derive(Debug, Clone, Serialize)]
pub struct GradeScale {
    name: String,
    points: BTreeMap<Grade, f64>,
}

impl GradeScale {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Point value for `grade`, or `None` if this scale does not define it.
    pub fn points(&self, grade: Grade) -> Option<f64> {
        self.points.get(&grade).copied()
    }

    /// Iterates over `(grade, points)` pairs, best grade first.
    pub fn iter(&self) -> impl Iterator<Item = (Grade, f64)> + '_ {
        self.points.iter().map(|(g, p)| (*g, *p))
    }

    fn from_raw(raw: RawScale) -> Result<Self> {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(GpaError::InvalidScaleConfig(
                "scale name must not be empty".into(),
            ));
        }

        let mut points = BTreeMap::new();
        for (key, value) in raw.points {
            let grade: Grade = key.parse().map_err(|_| {
                GpaError::InvalidScaleConfig(format!("scale {name:?}: unknown grade {key:?}"))
            })?;
            if !grade.counts_toward_gpa() {
                return Err(GpaError::InvalidScaleConfig(format!(
                    "scale {name:?}: {grade} never counts toward GPA and cannot carry points"
                )));
            }
            if !value.is_finite() || !(0.0..=MAX_POINTS).contains(&value) {
                return Err(GpaError::InvalidScaleConfig(format!(
                    "scale {name:?}: {grade} = {value} is outside [0.0, {MAX_POINTS}]"
                )));
            }
            if points.insert(grade, value).is_some() {
                return Err(GpaError::InvalidScaleConfig(format!(
                    "scale {name:?}: grade {grade} is defined more than once"
                )));
            }
        }

        Ok(Self { name, points })
    }
}

/// The ordered set of scales an engine was constructed with.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ScaleSet {
    scales: Vec<GradeScale>,
}

impl ScaleSet {
    /// The University, AMCAS and TMDSAS scales shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_SCALES)
    }

    /// Loads scales from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading GPA scales");
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: Vec<RawScale> = serde_json::from_str(content)
            .map_err(|e| GpaError::InvalidScaleConfig(e.to_string()))?;
        if raw.is_empty() {
            return Err(GpaError::InvalidScaleConfig(
                "at least one scale must be defined".into(),
            ));
        }

        let mut seen = HashSet::new();
        let mut scales = Vec::with_capacity(raw.len());
        for raw_scale in raw {
            let scale = GradeScale::from_raw(raw_scale)?;
            if !seen.insert(scale.name.clone()) {
                return Err(GpaError::InvalidScaleConfig(format!(
                    "duplicate scale name {:?}",
                    scale.name
                )));
            }
            scales.push(scale);
        }

        Ok(Self { scales })
    }

    /// Position of `name` in enumeration order.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.scales
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| GpaError::InvalidScale(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&GradeScale> {
        self.index_of(name).map(|i| &self.scales[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &GradeScale> {
        self.scales.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scales.iter().map(GradeScale::name)
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}
