pub mod error;
pub mod gpa;
pub mod grade;
pub mod output;
pub mod scales;
pub mod transcript;

pub use error::{GpaError, Result};
