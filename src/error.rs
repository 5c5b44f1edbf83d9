//! Error types shared by the loader, the GPA engine and the output writers.

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, GpaError>;

/// Everything that can go wrong while loading a transcript or computing GPAs.
///
/// All variants are fatal to the single operation that produced them.
#[derive(Debug, thiserror::Error)]
pub enum GpaError {
    /// A grade that is not part of the letter-grade enumeration, or that a
    /// particular scale has no point value for.
    #[error("invalid grade {grade:?}{}", .scale.as_ref().map(|s| format!(" (not defined in scale {s:?})")).unwrap_or_default())]
    InvalidGrade {
        grade: String,
        scale: Option<String>,
    },

    #[error("invalid GPA scale {0:?}")]
    InvalidScale(String),

    #[error("invalid GPA category {0:?} (expected Overall, BCPM or AO)")]
    InvalidCategory(String),

    /// The selection had zero credit hours, so the GPA is undefined.
    #[error("no matching courses for scale {scale:?}, category {category:?}")]
    NoMatchingCourses { scale: String, category: String },

    /// Missing required column, unparseable number, and similar row defects.
    #[error("malformed transcript: {0}")]
    MalformedInput(String),

    #[error("invalid scale configuration: {0}")]
    InvalidScaleConfig(String),

    #[error("unsupported report file extension {0:?} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
