//! Data types used by the GPA engine and report assembler.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::GpaError;
use crate::transcript::{CourseCategory, Period};

/// Which courses a GPA is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpaCategory {
    Overall,
    Bcpm,
    Ao,
}

impl GpaCategory {
    /// Report enumeration order.
    pub const ALL: [GpaCategory; 3] = [GpaCategory::Overall, GpaCategory::Bcpm, GpaCategory::Ao];

    pub fn as_str(self) -> &'static str {
        match self {
            GpaCategory::Overall => "Overall",
            GpaCategory::Bcpm => "BCPM",
            GpaCategory::Ao => "AO",
        }
    }

    pub fn includes(self, category: CourseCategory) -> bool {
        match self {
            GpaCategory::Overall => true,
            GpaCategory::Bcpm => category == CourseCategory::Bcpm,
            GpaCategory::Ao => category == CourseCategory::Ao,
        }
    }
}

impl FromStr for GpaCategory {
    type Err = GpaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GpaCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GpaError::InvalidCategory(s.to_string()))
    }
}

impl fmt::Display for GpaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GpaCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A set of academic periods to restrict a GPA to.
///
/// Matching is exact on both year and term. An empty filter selects every
/// course, the same as passing no filter at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodFilter {
    periods: HashSet<Period>,
}

impl PeriodFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, period: Period) -> bool {
        self.periods.insert(period)
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether a course taken in `period` is selected. Courses without a
    /// period never match a non-empty filter.
    pub fn matches(&self, period: Option<&Period>) -> bool {
        if self.periods.is_empty() {
            return true;
        }
        period.is_some_and(|p| self.periods.contains(p))
    }
}

impl FromIterator<Period> for PeriodFilter {
    fn from_iter<I: IntoIterator<Item = Period>>(iter: I) -> Self {
        Self {
            periods: iter.into_iter().collect(),
        }
    }
}

/// GPA for one (scale, category, period filter) combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpaResult {
    #[serde(rename = "GPA Point Sum")]
    pub point_sum: f64,
    #[serde(rename = "Credit Hours")]
    pub credit_hours: f64,
    #[serde(rename = "GPA")]
    pub gpa: f64,
}

impl GpaResult {
    /// Placeholder used by [`OnEmpty::Zero`].
    pub const ZERO: GpaResult = GpaResult {
        point_sum: 0.0,
        credit_hours: 0.0,
        gpa: 0.0,
    };
}

/// What the report assembler does with a cell that has no courses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnEmpty {
    /// Propagate [`GpaError::NoMatchingCourses`]; the whole report fails.
    #[default]
    Fail,
    /// Substitute [`GpaResult::ZERO`].
    Zero,
    /// Leave the cell out of the report.
    Omit,
}

impl FromStr for OnEmpty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(OnEmpty::Fail),
            "zero" => Ok(OnEmpty::Zero),
            "omit" => Ok(OnEmpty::Omit),
            other => Err(format!("expected fail, zero or omit, got {other:?}")),
        }
    }
}

/// All category results for one scale, in enumeration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleReport {
    pub scale: String,
    pub categories: Vec<(GpaCategory, GpaResult)>,
}

impl ScaleReport {
    pub fn get(&self, category: GpaCategory) -> Option<&GpaResult> {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, r)| r)
    }
}

impl Serialize for ScaleReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (category, result) in &self.categories {
            map.serialize_entry(category, result)?;
        }
        map.end()
    }
}

/// Full scale × category cross product, serialized as
/// `{ scale: { category: GpaResult } }` with keys in enumeration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpaReport {
    pub scales: Vec<ScaleReport>,
}

impl GpaReport {
    pub fn get(&self, scale: &str, category: GpaCategory) -> Option<&GpaResult> {
        self.scales
            .iter()
            .find(|s| s.scale == scale)
            .and_then(|s| s.get(category))
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

impl Serialize for GpaReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scales.len()))?;
        for scale in &self.scales {
            map.serialize_entry(&scale.scale, scale)?;
        }
        map.end()
    }
}
