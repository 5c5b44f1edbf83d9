use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::GpaError;

/// A transcript letter grade.
///
/// | Grade        | Counts toward GPA |
/// |--------------|-------------------|
/// | A+ .. D-, F  | yes               |
/// | CR, NC       | no                |
///
/// Variants are declared best-first so the derived `Ord` sorts a scale's
/// grades the way a transcript reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
    Credit,
    NoCredit,
}

impl Grade {
    /// Every grade that carries a point value, best-first.
    pub const COUNTING: [Grade; 13] = [
        Grade::APlus,
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::DMinus,
        Grade::F,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::DMinus => "D-",
            Grade::F => "F",
            Grade::Credit => "CR",
            Grade::NoCredit => "NC",
        }
    }

    /// CR and NC never contribute points or credit hours to any GPA.
    pub fn counts_toward_gpa(self) -> bool {
        !matches!(self, Grade::Credit | Grade::NoCredit)
    }
}

impl FromStr for Grade {
    type Err = GpaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let grade = match s.trim() {
            "A+" => Grade::APlus,
            "A" => Grade::A,
            "A-" => Grade::AMinus,
            "B+" => Grade::BPlus,
            "B" => Grade::B,
            "B-" => Grade::BMinus,
            "C+" => Grade::CPlus,
            "C" => Grade::C,
            "C-" => Grade::CMinus,
            "D+" => Grade::DPlus,
            "D" => Grade::D,
            "D-" => Grade::DMinus,
            "F" => Grade::F,
            "CR" => Grade::Credit,
            "NC" => Grade::NoCredit,
            other => {
                return Err(GpaError::InvalidGrade {
                    grade: other.to_string(),
                    scale: None,
                });
            }
        };
        Ok(grade)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
