//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. Survey answers are
//! closed enumerations, so an out-of-domain answer cannot be represented.

pub mod advice;
mod assessment;
mod contribution;
pub mod survey;

pub use advice::{select_advice, AdviceTopic, Recommendation};
pub use assessment::{Assessment, RiskBand, RiskScore};
pub use contribution::{Contribution, ContributionError, ContributionSet, OTHER_FACTORS};
pub use survey::{FormSection, SurveyAnswers, SurveyField, ValidationError};
