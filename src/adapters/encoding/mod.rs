//! Target encoder adapter: Implementation of `FeatureEncoder`.
//!
//! Replays a CatBoost-style target encoder fitted in the training pipeline.
//! Each category maps to a smoothed mean of the training target:
//!
//! `encoded = (sum + prior * smoothing) / (count + smoothing)`
//!
//! Categories that were never seen during fitting encode to the prior.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::adapters::ArtifactError;
use crate::domain::SurveyAnswers;
use crate::ports::{EncodedFeatures, FeatureEncoder, ModelError};

/// Only artifact layout this adapter understands.
const SUPPORTED_FORMAT_VERSION: u32 = 1;

fn default_smoothing() -> f64 {
    1.0
}

/// Target statistics of one category, as observed during fitting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CategoryStats {
    pub sum: f64,
    pub count: f64,
}

/// Encoder parameters exported by the training pipeline (`encoder.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedTargetEncoder {
    pub format_version: u32,
    pub prior: f64,
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    pub feature_names: Vec<String>,
    pub mapping: BTreeMap<String, BTreeMap<String, CategoryStats>>,
}

/// Frozen target encoder.
#[derive(Debug, Clone)]
pub struct TargetEncoder {
    feature_names: Vec<String>,
    prior: f64,
    /// Encoded value per category, one table per column.
    columns: Vec<HashMap<String, f64>>,
}

impl TargetEncoder {
    /// Build the encoder from exported parameters, precomputing every encoding.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the parameters are inconsistent.
    pub fn from_exported(exported: ExportedTargetEncoder) -> Result<Self, ArtifactError> {
        if exported.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ArtifactError::Invalid(format!(
                "unsupported encoder format_version {} (expected {SUPPORTED_FORMAT_VERSION})",
                exported.format_version
            )));
        }
        if !exported.prior.is_finite() || !(0.0..=1.0).contains(&exported.prior) {
            return Err(ArtifactError::Invalid(format!(
                "encoder prior {} is not a probability",
                exported.prior
            )));
        }
        if !exported.smoothing.is_finite() || exported.smoothing <= 0.0 {
            return Err(ArtifactError::Invalid(format!(
                "encoder smoothing {} must be positive",
                exported.smoothing
            )));
        }
        if exported.feature_names.is_empty() {
            return Err(ArtifactError::Invalid("encoder has no columns".into()));
        }

        let mut columns = Vec::with_capacity(exported.feature_names.len());
        for name in &exported.feature_names {
            let stats = exported.mapping.get(name).ok_or_else(|| {
                ArtifactError::Invalid(format!("encoder has no mapping for column `{name}`"))
            })?;

            let mut table = HashMap::with_capacity(stats.len());
            for (category, s) in stats {
                if !s.sum.is_finite() || !s.count.is_finite() || s.count < 0.0 || s.sum < 0.0 {
                    return Err(ArtifactError::Invalid(format!(
                        "invalid statistics for `{name}` = `{category}`"
                    )));
                }
                let encoded =
                    (s.sum + exported.prior * exported.smoothing) / (s.count + exported.smoothing);
                table.insert(category.clone(), encoded);
            }
            columns.push(table);
        }

        tracing::debug!(
            "Prepared target encoder (columns={}, prior={:.4}, smoothing={})",
            columns.len(),
            exported.prior,
            exported.smoothing
        );

        Ok(Self {
            feature_names: exported.feature_names,
            prior: exported.prior,
            columns,
        })
    }

    /// Fallback value for categories unseen during fitting.
    #[must_use]
    pub fn prior(&self) -> f64 {
        self.prior
    }

    /// Encoded value of one category, falling back to the prior.
    #[must_use]
    pub fn encode_value(&self, column: usize, category: &str) -> f64 {
        self.columns
            .get(column)
            .and_then(|table| table.get(category))
            .copied()
            .unwrap_or(self.prior)
    }
}

impl FeatureEncoder for TargetEncoder {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn encode(&self, answers: &SurveyAnswers) -> Result<EncodedFeatures, ModelError> {
        let mut values = Vec::with_capacity(self.feature_names.len());
        for (i, name) in self.feature_names.iter().enumerate() {
            let category = answers
                .value_of(name)
                .ok_or_else(|| ModelError::MissingFeature(name.clone()))?;

            if !self.columns[i].contains_key(category) {
                tracing::debug!("Unseen category in column {}, using prior", name);
            }
            values.push(self.encode_value(i, category));
        }

        EncodedFeatures::new(self.feature_names.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::survey::{Gender, SmokingStatus};
    use crate::domain::SurveyField;

    fn stats(sum: f64, count: f64) -> CategoryStats {
        CategoryStats { sum, count }
    }

    /// Encoder over every survey column, each seeing only the default answer.
    fn exported() -> ExportedTargetEncoder {
        let defaults = SurveyAnswers::default();
        let mut mapping = BTreeMap::new();
        for field in SurveyField::ALL {
            let mut cats = BTreeMap::new();
            cats.insert(defaults.get(field).to_string(), stats(10.0, 99.0));
            mapping.insert(field.key().to_string(), cats);
        }
        mapping
            .get_mut("smoking_status")
            .expect("column")
            .insert("current_smoker_every_day".into(), stats(3.0, 9.0));

        ExportedTargetEncoder {
            format_version: 1,
            prior: 0.2,
            smoothing: 1.0,
            feature_names: SurveyField::ALL.iter().map(|f| f.key().to_string()).collect(),
            mapping,
        }
    }

    #[test]
    fn test_smoothed_target_mean() {
        let encoder = TargetEncoder::from_exported(exported()).expect("valid encoder");
        let answers = SurveyAnswers {
            smoking_status: SmokingStatus::CurrentEveryDay,
            ..SurveyAnswers::default()
        };
        let row = encoder.encode(&answers).expect("encodes");

        assert_eq!(row.len(), 22);
        // (3 + 0.2) / (9 + 1)
        assert!((row.get("smoking_status").unwrap() - 0.32).abs() < 1e-12);
        // (10 + 0.2) / (99 + 1)
        assert!((row.get("gender").unwrap() - 0.102).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_category_falls_back_to_prior() {
        let encoder = TargetEncoder::from_exported(exported()).expect("valid encoder");
        let answers = SurveyAnswers {
            gender: Gender::Nonbinary,
            ..SurveyAnswers::default()
        };
        let row = encoder.encode(&answers).expect("unseen values are not errors");
        assert_eq!(row.get("gender"), Some(0.2));
    }

    #[test]
    fn test_column_order_follows_encoder() {
        let mut e = exported();
        e.feature_names.reverse();
        let encoder = TargetEncoder::from_exported(e).expect("valid encoder");
        let row = encoder.encode(&SurveyAnswers::default()).expect("encodes");
        assert_eq!(row.names()[0], "drinks_category");
        assert_eq!(row.names()[21], "gender");
    }

    #[test]
    fn test_fitted_column_without_answer_is_rejected() {
        let mut e = exported();
        e.feature_names.push("household_income".into());
        e.mapping.insert("household_income".into(), BTreeMap::new());
        let encoder = TargetEncoder::from_exported(e).expect("valid encoder");

        assert_eq!(
            encoder.encode(&SurveyAnswers::default()),
            Err(ModelError::MissingFeature("household_income".into()))
        );
    }

    #[test]
    fn test_rejects_inconsistent_parameters() {
        let mut e = exported();
        e.prior = 1.5;
        assert!(TargetEncoder::from_exported(e).is_err());

        let mut e = exported();
        e.mapping.remove("BMI");
        let err = TargetEncoder::from_exported(e).unwrap_err();
        assert!(err.to_string().contains("BMI"));

        let mut e = exported();
        e.format_version = 2;
        assert!(TargetEncoder::from_exported(e).is_err());

        let mut e = exported();
        e.smoothing = 0.0;
        assert!(TargetEncoder::from_exported(e).is_err());
    }
}
