//! Risk assessment result types.
//!
//! Represents the output of one scoring request: the ensemble probability,
//! its risk band, the explanation and the advice selected from it.

use serde::{Deserialize, Serialize};

use super::advice::Recommendation;
use super::contribution::ContributionSet;

/// Risk band for heart disease, derived from the percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    /// score <= 25
    Low,
    /// 25 < score <= 40
    Moderate,
    /// 40 < score <= 70
    High,
    /// score > 70
    VeryHigh,
}

impl RiskBand {
    /// Band for a percentage score in [0, 100].
    #[must_use]
    pub fn from_percent(score: f64) -> Self {
        if score > 70.0 {
            Self::VeryHigh
        } else if score > 40.0 {
            Self::High
        } else if score > 25.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Keep up your healthy habits",
            Self::Moderate => "Some risk factors worth addressing",
            Self::High => "Several significant risk factors present",
            Self::VeryHigh => "Talk to a healthcare provider soon",
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129),      // Emerald (#10B981)
            Self::Moderate => (245, 158, 11), // Amber (#F59E0B)
            Self::High => (249, 115, 22),     // Orange (#F97316)
            Self::VeryHigh => (239, 68, 68),  // Red (#EF4444)
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low Risk"),
            Self::Moderate => write!(f, "Moderate Risk"),
            Self::High => write!(f, "High Risk"),
            Self::VeryHigh => write!(f, "Very High Risk"),
        }
    }
}

/// Ensemble probability of the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Probability in [0, 1]
    pub probability: f64,
}

impl RiskScore {
    /// Create a score from a probability, clamped into [0, 1].
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
        }
    }

    /// Score as a percentage in [0, 100].
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.probability * 100.0
    }

    #[must_use]
    pub fn band(&self) -> RiskBand {
        RiskBand::from_percent(self.percent())
    }
}

impl std::fmt::Display for RiskScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.percent())
    }
}

/// Complete response for one survey submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub score: RiskScore,

    /// Risk percentage rounded to one decimal place
    pub risk_percent: f64,

    pub band: RiskBand,

    pub contributions: ContributionSet,

    pub recommendations: Vec<Recommendation>,

    /// Timestamp of the assessment
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Assessment {
    #[must_use]
    pub fn new(
        score: RiskScore,
        contributions: ContributionSet,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        Self {
            risk_percent: (score.percent() * 10.0).round() / 10.0,
            band: score.band(),
            score,
            contributions,
            recommendations,
            created_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_thresholds() {
        assert_eq!(RiskBand::from_percent(0.0), RiskBand::Low);
        assert_eq!(RiskBand::from_percent(25.0), RiskBand::Low);
        assert_eq!(RiskBand::from_percent(25.0001), RiskBand::Moderate);
        assert_eq!(RiskBand::from_percent(40.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_percent(40.0001), RiskBand::High);
        assert_eq!(RiskBand::from_percent(70.0), RiskBand::High);
        assert_eq!(RiskBand::from_percent(70.0001), RiskBand::VeryHigh);
        assert_eq!(RiskBand::from_percent(100.0), RiskBand::VeryHigh);
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(RiskBand::VeryHigh.to_string(), "Very High Risk");
        assert_eq!(RiskBand::Low.to_string(), "Low Risk");
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(RiskScore::new(1.5).percent(), 100.0);
        assert_eq!(RiskScore::new(-0.1).percent(), 0.0);
        assert_eq!(RiskScore::new(0.4567).to_string(), "45.7%");
    }

    #[test]
    fn test_assessment_rounds_percent() {
        let assessment = Assessment::new(
            RiskScore::new(0.82364),
            ContributionSet::default(),
            Vec::new(),
        );
        assert!((assessment.risk_percent - 82.4).abs() < 1e-9);
        assert_eq!(assessment.band, RiskBand::VeryHigh);
    }
}
