//! Recommendation selection.
//!
//! Maps the strongest contributing features of an assessment, together with
//! the respondent's raw answers, to a fixed set of lifestyle recommendations.

use serde::{Deserialize, Serialize};

use super::assessment::{RiskBand, RiskScore};
use super::contribution::ContributionSet;
use super::survey::{
    BmiCategory, DiabetesStatus, ExerciseStatus, SmokingStatus, SurveyAnswers, SurveyField, YesNo,
};

/// Number of top-ranked features the rules are evaluated against.
pub const ADVICE_TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceTopic {
    CardiologyFollowUp,
    SmokingCessation,
    PhysicalActivity,
    WeightManagement,
    GlycemicControl,
    KeepItUp,
}

impl AdviceTopic {
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::CardiologyFollowUp => "Heart Attack History",
            Self::SmokingCessation => "Smoking",
            Self::PhysicalActivity => "Physical Activity",
            Self::WeightManagement => "Weight Management",
            Self::GlycemicControl => "Diabetes Management",
            Self::KeepItUp => "Excellent Heart Health!",
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::CardiologyFollowUp => {
                "Maintain regular cardiology visits and strict medication adherence. Monitor for new symptoms."
            }
            Self::SmokingCessation => {
                "Quitting smoking is the single most effective way to reduce your cardiovascular risk. Seek professional help."
            }
            Self::PhysicalActivity => {
                "Start with 150 minutes of moderate exercise weekly. Even light walking significantly improves heart health."
            }
            Self::WeightManagement => {
                "Achieve healthy weight through balanced nutrition and regular exercise. Consult a healthcare provider for guidance."
            }
            Self::GlycemicControl => {
                "Maintain optimal blood sugar control through diet, exercise, and medication compliance."
            }
            Self::KeepItUp => {
                "Your risk is low. Continue your healthy lifestyle habits to maintain optimal cardiovascular health."
            }
        }
    }
}

/// A single piece of advice shown with an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub topic: AdviceTopic,
    pub title: String,
    pub message: String,

    /// Feature that triggered the advice, absent for the low-risk message
    pub feature: Option<String>,

    /// Contribution of that feature, in percent
    pub contribution: Option<f64>,
}

impl Recommendation {
    fn new(topic: AdviceTopic, feature: Option<(&str, f64)>) -> Self {
        Self {
            topic,
            title: topic.title().to_string(),
            message: topic.message().to_string(),
            feature: feature.map(|(name, _)| name.to_string()),
            contribution: feature.map(|(_, pct)| pct),
        }
    }
}

/// Rule for one feature: the topic it triggers, if the raw answer qualifies.
fn rule_for(field: SurveyField, answers: &SurveyAnswers) -> Option<AdviceTopic> {
    match field {
        SurveyField::HeartAttack if answers.ever_diagnosed_with_heart_attack == YesNo::Yes => {
            Some(AdviceTopic::CardiologyFollowUp)
        }
        SurveyField::Smoking if answers.smoking_status != SmokingStatus::NeverSmoked => {
            Some(AdviceTopic::SmokingCessation)
        }
        SurveyField::Exercise
            if answers.exercise_status_in_past_30_days == ExerciseStatus::No =>
        {
            Some(AdviceTopic::PhysicalActivity)
        }
        SurveyField::Bmi
            if matches!(answers.bmi, BmiCategory::Overweight | BmiCategory::Obese) =>
        {
            Some(AdviceTopic::WeightManagement)
        }
        SurveyField::Diabetes if answers.ever_told_you_had_diabetes == DiabetesStatus::Yes => {
            Some(AdviceTopic::GlycemicControl)
        }
        _ => None,
    }
}

/// Select recommendations for a scored record.
///
/// Low-risk scores get a single encouragement message. Otherwise each of the
/// top five features is checked against its rule; features without a
/// matching rule produce nothing.
#[must_use]
pub fn select_advice(
    score: RiskScore,
    contributions: &ContributionSet,
    answers: &SurveyAnswers,
) -> Vec<Recommendation> {
    if score.band() == RiskBand::Low {
        return vec![Recommendation::new(AdviceTopic::KeepItUp, None)];
    }

    contributions
        .top(ADVICE_TOP_N)
        .filter_map(|c| {
            let field = SurveyField::from_key(&c.feature)?;
            let topic = rule_for(field, answers)?;
            Some(Recommendation::new(topic, Some((c.feature.as_str(), c.percent))))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributions(order: &[SurveyField]) -> ContributionSet {
        let names: Vec<String> = order.iter().map(|f| f.key().to_string()).collect();
        let values: Vec<f64> = (0..order.len()).rev().map(|i| (i + 1) as f64).collect();
        ContributionSet::from_attributions(&names, &values).expect("normalizes")
    }

    fn risky_answers() -> SurveyAnswers {
        SurveyAnswers {
            ever_diagnosed_with_heart_attack: YesNo::Yes,
            smoking_status: SmokingStatus::CurrentEveryDay,
            exercise_status_in_past_30_days: ExerciseStatus::No,
            bmi: BmiCategory::Obese,
            ever_told_you_had_diabetes: DiabetesStatus::Yes,
            ..SurveyAnswers::default()
        }
    }

    #[test]
    fn test_low_risk_gets_single_positive_message() {
        let set = contributions(&[SurveyField::HeartAttack, SurveyField::Smoking]);
        let advice = select_advice(RiskScore::new(0.25), &set, &risky_answers());

        assert_eq!(advice.len(), 1);
        assert_eq!(advice[0].topic, AdviceTopic::KeepItUp);
        assert!(advice[0].feature.is_none());
    }

    #[test]
    fn test_all_rules_fire_in_rank_order() {
        let set = contributions(&[
            SurveyField::Smoking,
            SurveyField::HeartAttack,
            SurveyField::Bmi,
            SurveyField::Exercise,
            SurveyField::Diabetes,
        ]);
        let advice = select_advice(RiskScore::new(0.8), &set, &risky_answers());

        let topics: Vec<AdviceTopic> = advice.iter().map(|r| r.topic).collect();
        assert_eq!(
            topics,
            vec![
                AdviceTopic::SmokingCessation,
                AdviceTopic::CardiologyFollowUp,
                AdviceTopic::WeightManagement,
                AdviceTopic::PhysicalActivity,
                AdviceTopic::GlycemicControl,
            ]
        );
        assert_eq!(advice[0].feature.as_deref(), Some("smoking_status"));
        assert_eq!(advice[0].contribution, set.percent_of("smoking_status"));
    }

    #[test]
    fn test_only_top_five_are_considered() {
        let set = contributions(&[
            SurveyField::AgeCategory,
            SurveyField::GeneralHealth,
            SurveyField::Race,
            SurveyField::Gender,
            SurveyField::Sleep,
            SurveyField::HeartAttack,
        ]);
        let advice = select_advice(RiskScore::new(0.5), &set, &risky_answers());
        assert!(advice.is_empty());
    }

    #[test]
    fn test_rules_check_raw_values() {
        let answers = SurveyAnswers {
            smoking_status: SmokingStatus::NeverSmoked,
            bmi: BmiCategory::Underweight,
            ever_told_you_had_diabetes: DiabetesStatus::NoPrediabetes,
            ..risky_answers()
        };
        let set = contributions(&[
            SurveyField::Smoking,
            SurveyField::Bmi,
            SurveyField::Diabetes,
            SurveyField::Exercise,
        ]);
        let advice = select_advice(RiskScore::new(0.3), &set, &answers);

        assert_eq!(advice.len(), 1);
        assert_eq!(advice[0].topic, AdviceTopic::PhysicalActivity);
    }

    #[test]
    fn test_former_smoker_triggers_cessation() {
        let answers = SurveyAnswers {
            smoking_status: SmokingStatus::FormerSmoker,
            ..SurveyAnswers::default()
        };
        let set = contributions(&[SurveyField::Smoking]);
        let advice = select_advice(RiskScore::new(0.41), &set, &answers);
        assert_eq!(advice.len(), 1);
        assert_eq!(advice[0].topic, AdviceTopic::SmokingCessation);
    }
}
