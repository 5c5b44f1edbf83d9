//! Transcript loading.
//!
//! Reads a delimited transcript, validates every row against the configured
//! scales, and precomputes `credit hours × points` for each scale. The result
//! is immutable; all GPA queries read from it.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{GpaError, Result};
use crate::grade::Grade;
use crate::scales::ScaleSet;

/// Subject grouping used for specialized GPAs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseCategory {
    /// Biology, chemistry, physics, math.
    Bcpm,
    /// All other.
    Ao,
}

impl CourseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseCategory::Bcpm => "BCPM",
            CourseCategory::Ao => "AO",
        }
    }
}

impl FromStr for CourseCategory {
    type Err = GpaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "BCPM" => Ok(CourseCategory::Bcpm),
            "AO" => Ok(CourseCategory::Ao),
            other => Err(GpaError::InvalidCategory(other.to_string())),
        }
    }
}

/// An academic term such as `(2018, "Fall")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Period {
    pub year: i32,
    pub term: String,
}

impl Period {
    pub fn new(year: i32, term: impl Into<String>) -> Self {
        Self {
            year,
            term: term.into(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.year, self.term)
    }
}

/// Parses `YEAR:TERM`, e.g. `2018:Fall`.
impl FromStr for Period {
    type Err = GpaError;

    fn from_str(s: &str) -> Result<Self> {
        let (year, term) = s.split_once(':').ok_or_else(|| {
            GpaError::MalformedInput(format!("period {s:?} is not in YEAR:TERM form"))
        })?;
        let year = year
            .trim()
            .parse()
            .map_err(|_| GpaError::MalformedInput(format!("period {s:?} has a non-integer year")))?;
        let term = term.trim();
        if term.is_empty() {
            return Err(GpaError::MalformedInput(format!(
                "period {s:?} has an empty term"
            )));
        }
        Ok(Period::new(year, term))
    }
}

/// Header names for each transcript field.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub credit_hours: String,
    pub grade: String,
    pub category: String,
    pub year: String,
    pub term: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            credit_hours: "Credit_Hours".into(),
            grade: "Grade".into(),
            category: "Type".into(),
            year: "Year".into(),
            term: "Semester".into(),
        }
    }
}

/// Reader options for [`Transcript::from_reader`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub columns: ColumnMap,
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            delimiter: b',',
        }
    }
}

/// One transcript row, annotated with its weighted points under every scale.
#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub credit_hours: f64,
    pub grade: Grade,
    pub category: CourseCategory,
    pub period: Option<Period>,
    /// `credit_hours × scale[grade]`, aligned with the transcript's
    /// [`ScaleSet`] order. Zero for CR/NC rows.
    points: Vec<f64>,
}

impl CourseRecord {
    /// Weighted points under the scale at `scale_index`, or `None` if the
    /// transcript has no scale at that position.
    pub fn points(&self, scale_index: usize) -> Option<f64> {
        self.points.get(scale_index).copied()
    }
}

/// A loaded, annotated transcript.
#[derive(Debug, Clone)]
pub struct Transcript {
    scales: ScaleSet,
    records: Vec<CourseRecord>,
    has_periods: bool,
}

struct ColumnIndex {
    credit_hours: usize,
    grade: usize,
    category: usize,
    period: Option<(usize, usize)>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, columns: &ColumnMap) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                GpaError::MalformedInput(format!("missing required column {name:?}"))
            })
        };

        Ok(Self {
            credit_hours: require(columns.credit_hours.as_str())?,
            grade: require(columns.grade.as_str())?,
            category: require(columns.category.as_str())?,
            period: find(columns.year.as_str()).zip(find(columns.term.as_str())),
        })
    }
}

impl Transcript {
    /// Loads a transcript from a file with the default column names.
    pub fn from_path(path: impl AsRef<Path>, scales: ScaleSet) -> Result<Self> {
        Self::from_path_with(path, scales, &LoadOptions::default())
    }

    pub fn from_path_with(
        path: impl AsRef<Path>,
        scales: ScaleSet,
        options: &LoadOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening transcript");
        let file = File::open(path)?;
        Self::from_reader(file, scales, options)
    }

    /// Parses and annotates a transcript from any reader.
    ///
    /// # Errors
    ///
    /// - [`GpaError::MalformedInput`] for a missing required column, a row
    ///   whose field count differs from the header, a non-numeric or
    ///   negative credit-hours cell, or a non-integer year.
    /// - [`GpaError::InvalidGrade`] for a grade outside the enumeration, or
    ///   a counting grade that some scale does not define.
    /// - [`GpaError::InvalidCategory`] for a category other than BCPM/AO.
    #[tracing::instrument(skip_all, fields(scales = scales.len()))]
    pub fn from_reader<R: Read>(reader: R, scales: ScaleSet, options: &LoadOptions) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let index = ColumnIndex::resolve(&headers, &options.columns)?;

        let mut records = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(row_error)?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            records.push(parse_row(&row, line, &index, &scales)?);
        }

        info!(
            rows = records.len(),
            has_periods = index.period.is_some(),
            "Transcript loaded"
        );

        Ok(Self {
            scales,
            records,
            has_periods: index.period.is_some(),
        })
    }

    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    /// Whether the input carried both a year and a term column.
    pub fn has_periods(&self) -> bool {
        self.has_periods
    }

    /// Distinct periods in first-appearance order.
    pub fn periods(&self) -> Vec<Period> {
        let mut periods: Vec<Period> = Vec::new();
        for period in self.records.iter().filter_map(|r| r.period.as_ref()) {
            if !periods.contains(period) {
                periods.push(period.clone());
            }
        }
        periods
    }
}

/// Short or long rows are a transcript defect, not a reader failure.
fn row_error(err: csv::Error) -> GpaError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
        return GpaError::MalformedInput(format!(
            "line {line}: expected {expected_len} fields, found {len}"
        ));
    }
    GpaError::Csv(err)
}

fn parse_row(
    row: &StringRecord,
    line: u64,
    index: &ColumnIndex,
    scales: &ScaleSet,
) -> Result<CourseRecord> {
    let field = |i: usize| row.get(i).unwrap_or("");

    let raw_hours = field(index.credit_hours);
    let credit_hours: f64 = raw_hours.parse().map_err(|_| {
        GpaError::MalformedInput(format!(
            "line {line}: credit hours {raw_hours:?} is not a number"
        ))
    })?;
    if !credit_hours.is_finite() || credit_hours < 0.0 {
        return Err(GpaError::MalformedInput(format!(
            "line {line}: credit hours {raw_hours:?} must be a non-negative number"
        )));
    }

    let grade: Grade = field(index.grade).parse()?;
    let category: CourseCategory = field(index.category).parse()?;

    let period = match index.period {
        Some((year_col, term_col)) => {
            let (year, term) = (field(year_col), field(term_col));
            if year.is_empty() || term.is_empty() {
                None
            } else {
                let year = year.parse().map_err(|_| {
                    GpaError::MalformedInput(format!("line {line}: year {year:?} is not an integer"))
                })?;
                Some(Period::new(year, term))
            }
        }
        None => None,
    };

    let points = scales
        .iter()
        .map(|scale| {
            if !grade.counts_toward_gpa() {
                return Ok(0.0);
            }
            scale
                .points(grade)
                .map(|p| p * credit_hours)
                .ok_or_else(|| GpaError::InvalidGrade {
                    grade: grade.to_string(),
                    scale: Some(scale.name().to_string()),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CourseRecord {
        credit_hours,
        grade,
        category,
        period,
        points,
    })
}
