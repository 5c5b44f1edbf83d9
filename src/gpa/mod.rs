//! GPA computation and report assembly.
//!
//! This module filters an annotated [`Transcript`](crate::transcript::Transcript)
//! by period, grade and category, sums its weighted points and credit hours,
//! and assembles the full scale × category report.

pub mod compute;
pub mod report;
pub mod types;
pub mod utility;

pub use compute::compute;
pub use report::{report, report_by_period};
pub use types::{GpaCategory, GpaReport, GpaResult, OnEmpty, PeriodFilter, ScaleReport};
