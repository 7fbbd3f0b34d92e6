//! Feature contribution breakdown.
//!
//! Turns raw per-feature attributions into percentages of the total absolute
//! attribution, ranked from largest to smallest.

use serde::{Deserialize, Serialize};

/// Label of the aggregated bucket in the chart breakdown.
pub const OTHER_FACTORS: &str = "Other Factors";

/// Number of features shown individually in the chart breakdown.
pub const CHART_TOP_N: usize = 6;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContributionError {
    #[error("attribution count mismatch: {values} values for {names} features")]
    LengthMismatch { names: usize, values: usize },

    #[error("attributions sum to {0}; cannot normalize")]
    Degenerate(f64),
}

/// One feature's share of the explanation, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub feature: String,
    pub percent: f64,
}

/// Ranked contributions for a single scored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionSet {
    /// Every feature, sorted by descending percent (ties keep column order).
    pub ranked: Vec<Contribution>,

    /// Top features plus an "Other Factors" bucket when the remainder is positive.
    pub chart: Vec<Contribution>,
}

impl ContributionSet {
    /// Normalize attributions to percentages and rank them.
    ///
    /// Absolute values are used, so the percentages are non-negative and sum
    /// to 100.
    ///
    /// # Errors
    /// Returns `ContributionError::LengthMismatch` if `names` and `attributions`
    /// differ in length, and `ContributionError::Degenerate` if the absolute
    /// attributions sum to zero or a non-finite value.
    pub fn from_attributions(
        names: &[String],
        attributions: &[f64],
    ) -> Result<Self, ContributionError> {
        if names.len() != attributions.len() {
            return Err(ContributionError::LengthMismatch {
                names: names.len(),
                values: attributions.len(),
            });
        }

        let total: f64 = attributions.iter().map(|v| v.abs()).sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(ContributionError::Degenerate(total));
        }

        let mut ranked: Vec<Contribution> = names
            .iter()
            .zip(attributions)
            .map(|(name, value)| Contribution {
                feature: name.clone(),
                percent: value.abs() / total * 100.0,
            })
            .collect();
        ranked.sort_by(|a, b| b.percent.total_cmp(&a.percent));

        let mut chart: Vec<Contribution> = ranked.iter().take(CHART_TOP_N).cloned().collect();
        let other: f64 = ranked.iter().skip(CHART_TOP_N).map(|c| c.percent).sum();
        if other > 0.0 {
            chart.push(Contribution {
                feature: OTHER_FACTORS.to_string(),
                percent: other,
            });
        }

        Ok(Self { ranked, chart })
    }

    /// The `n` largest contributions.
    pub fn top(&self, n: usize) -> impl Iterator<Item = &Contribution> {
        self.ranked.iter().take(n)
    }

    /// Percent for a feature, `None` if it is not part of the set.
    #[must_use]
    pub fn percent_of(&self, feature: &str) -> Option<f64> {
        self.ranked
            .iter()
            .find(|c| c.feature == feature)
            .map(|c| c.percent)
    }
}
