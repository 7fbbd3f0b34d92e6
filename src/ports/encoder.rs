//! Encoder port: Trait for turning survey answers into model inputs.
//!
//! This trait abstracts the fitted categorical encoder from the application logic.

use crate::domain::SurveyAnswers;

use super::classifier::ModelError;

/// One numeric row, one column per fitted feature.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures {
    names: Vec<String>,
    values: Vec<f64>,
}

impl EncodedFeatures {
    /// Pair column names with values.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if the lengths differ.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self, ModelError> {
        if names.len() != values.len() {
            return Err(ModelError::ShapeMismatch {
                expected: names.len(),
                got: values.len(),
            });
        }
        Ok(Self { names, values })
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }
}

/// Trait for fitted categorical encoders.
///
/// Implementations are frozen after loading: `encode` never mutates state,
/// so the same answers always give the same row.
pub trait FeatureEncoder: Send + Sync {
    /// Column names, in output order.
    fn feature_names(&self) -> &[String];

    /// Encode one record.
    ///
    /// Answers the encoder did not see during fitting are encoded with its
    /// fallback statistic rather than rejected.
    ///
    /// # Errors
    /// Returns `ModelError::MissingFeature` if a fitted column has no
    /// corresponding survey answer.
    fn encode(&self, answers: &SurveyAnswers) -> Result<EncodedFeatures, ModelError>;
}
