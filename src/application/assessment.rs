//! Assessment service: Orchestrates one survey submission.
//!
//! This service coordinates:
//! - Encoding the validated answers
//! - Scoring with the ensemble
//! - Explaining the score with per-feature attributions
//! - Selecting advice from the top contributors

use std::sync::Arc;

use crate::domain::{select_advice, Assessment, ContributionSet, RiskScore, SurveyAnswers};
use crate::ports::{FeatureAttribution, FeatureEncoder, ModelError, RiskClassifier};
use crate::HolomedError;

/// Service for assessing survey submissions.
///
/// Both artifacts are frozen after loading and shared behind `Arc`, so one
/// service can serve any number of requests. A failed request leaves nothing
/// behind.
pub struct AssessmentService<E, C>
where
    E: FeatureEncoder,
    C: RiskClassifier + FeatureAttribution,
{
    encoder: Arc<E>,
    classifier: Arc<C>,
}

impl<E, C> Clone for AssessmentService<E, C>
where
    E: FeatureEncoder,
    C: RiskClassifier + FeatureAttribution,
{
    fn clone(&self) -> Self {
        Self {
            encoder: Arc::clone(&self.encoder),
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<E, C> AssessmentService<E, C>
where
    E: FeatureEncoder,
    C: RiskClassifier + FeatureAttribution,
{
    /// Create a new assessment service.
    pub fn new(encoder: Arc<E>, classifier: Arc<C>) -> Self {
        Self {
            encoder,
            classifier,
        }
    }

    /// Score, explain and advise on one set of answers.
    ///
    /// Performs the full pipeline:
    /// 1. Encode answers into the model's feature space
    /// 2. Predict the positive-class probability
    /// 3. Attribute the prediction to features and rank them
    /// 4. Select recommendations
    ///
    /// # Errors
    /// Returns `HolomedError::Model` if the encoder and classifier disagree on
    /// the feature layout, or if the attributions cannot be normalized.
    pub fn assess(&self, answers: &SurveyAnswers) -> Result<Assessment, HolomedError> {
        tracing::info!("Starting risk assessment...");

        // Step 1: Encode
        tracing::debug!("Step 1: Encoding survey answers...");
        let features = self.encoder.encode(answers)?;
        let expected = self.classifier.feature_names();
        if features.len() != expected.len() {
            return Err(ModelError::ShapeMismatch {
                expected: expected.len(),
                got: features.len(),
            }
            .into());
        }
        tracing::debug!("Encoded {} features", features.len());

        // Step 2: Score
        tracing::debug!("Step 2: Predicting probability...");
        let score = RiskScore::new(self.classifier.predict_probability(&features)?);

        // Step 3: Explain
        tracing::debug!("Step 3: Computing attributions...");
        let attributions = self.classifier.attributions(&features)?;
        let contributions = ContributionSet::from_attributions(features.names(), &attributions)
            .map_err(ModelError::from)?;

        // Step 4: Advise
        tracing::debug!("Step 4: Selecting recommendations...");
        let recommendations = select_advice(score, &contributions, answers);

        let assessment = Assessment::new(score, contributions, recommendations);
        tracing::info!(
            "Assessment complete: risk={:.1}%, band={}, recommendations={}",
            assessment.risk_percent,
            assessment.band,
            assessment.recommendations.len()
        );

        Ok(assessment)
    }

    /// Expected raw output of the explained model.
    #[must_use]
    pub fn baseline(&self) -> f64 {
        self.classifier.expected_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::encoding::TargetEncoder;
    use crate::adapters::gbdt::BalancedEnsemble;
    use crate::adapters::load_artifacts;
    use crate::domain::survey::{
        AgeCategory, BmiCategory, DiabetesStatus, ExerciseStatus, GeneralHealth, SmokingStatus,
        YesNo,
    };
    use crate::domain::{AdviceTopic, RiskBand, OTHER_FACTORS};
    use crate::ports::EncodedFeatures;
    use std::path::Path;

    fn create_test_service() -> AssessmentService<TargetEncoder, BalancedEnsemble> {
        let loaded = load_artifacts(Path::new("models"), true).expect("bundled artifacts load");
        AssessmentService::new(Arc::new(loaded.encoder), Arc::new(loaded.classifier))
    }

    fn topics(assessment: &Assessment) -> Vec<AdviceTopic> {
        assessment.recommendations.iter().map(|r| r.topic).collect()
    }

    #[test]
    fn test_default_answers_are_low_risk() {
        let service = create_test_service();
        let assessment = service
            .assess(&SurveyAnswers::default())
            .expect("assessment");

        assert_eq!(assessment.band, RiskBand::Low);
        assert!(assessment.risk_percent <= 25.0);
        assert_eq!(topics(&assessment), vec![AdviceTopic::KeepItUp]);
    }

    #[test]
    fn test_heart_attack_and_daily_smoking() {
        let service = create_test_service();
        let answers = SurveyAnswers {
            ever_diagnosed_with_heart_attack: YesNo::Yes,
            smoking_status: SmokingStatus::CurrentEveryDay,
            ..SurveyAnswers::default()
        };
        let assessment = service.assess(&answers).expect("assessment");

        assert!(assessment.risk_percent > 40.0);
        let t = topics(&assessment);
        assert!(t.contains(&AdviceTopic::CardiologyFollowUp));
        assert!(t.contains(&AdviceTopic::SmokingCessation));

        let top = &assessment.contributions.ranked[0];
        assert_eq!(top.feature, "ever_diagnosed_with_heart_attack");
    }

    #[test]
    fn test_only_top_five_matching_rules_fire() {
        let service = create_test_service();
        let answers = SurveyAnswers {
            exercise_status_in_past_30_days: ExerciseStatus::No,
            bmi: BmiCategory::Obese,
            age_category: AgeCategory::Age65To69,
            ever_told_you_had_diabetes: DiabetesStatus::Yes,
            general_health: GeneralHealth::Fair,
            ..SurveyAnswers::default()
        };
        let assessment = service.assess(&answers).expect("assessment");

        assert_eq!(assessment.band, RiskBand::High);
        // BMI ranks sixth, smoking is in the top five but never smoked.
        assert_eq!(
            topics(&assessment),
            vec![AdviceTopic::GlycemicControl, AdviceTopic::PhysicalActivity]
        );
        assert_eq!(assessment.contributions.ranked[5].feature, "BMI");
    }

    #[test]
    fn test_contribution_invariants() {
        let service = create_test_service();
        let answers = SurveyAnswers {
            ever_diagnosed_with_heart_attack: YesNo::Yes,
            smoking_status: SmokingStatus::CurrentEveryDay,
            ..SurveyAnswers::default()
        };
        let assessment = service.assess(&answers).expect("assessment");
        let c = &assessment.contributions;

        let total: f64 = c.ranked.iter().map(|x| x.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(c.ranked.windows(2).all(|w| w[0].percent >= w[1].percent));
        assert!(c.ranked.iter().all(|x| x.percent >= 0.0));

        assert_eq!(c.chart.len(), 7);
        assert_eq!(c.chart[6].feature, OTHER_FACTORS);
        let chart_total: f64 = c.chart.iter().map(|x| x.percent).sum();
        assert!((chart_total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_assessment_is_deterministic() {
        let service = create_test_service();
        let answers = SurveyAnswers {
            smoking_status: SmokingStatus::FormerSmoker,
            ..SurveyAnswers::default()
        };
        let a = service.assess(&answers).expect("first");
        let b = service.assess(&answers).expect("second");

        assert_eq!(a.score, b.score);
        assert_eq!(a.contributions, b.contributions);
        assert_eq!(a.recommendations, b.recommendations);
    }

    struct ConstantEncoder;

    impl FeatureEncoder for ConstantEncoder {
        fn feature_names(&self) -> &[String] {
            &[]
        }

        fn encode(&self, _answers: &SurveyAnswers) -> Result<EncodedFeatures, ModelError> {
            EncodedFeatures::new(vec!["x".into()], vec![0.0])
        }
    }

    struct FlatModel {
        names: Vec<String>,
    }

    impl RiskClassifier for FlatModel {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict_probability(&self, _features: &EncodedFeatures) -> Result<f64, ModelError> {
            Ok(0.5)
        }
    }

    impl FeatureAttribution for FlatModel {
        fn attributions(&self, features: &EncodedFeatures) -> Result<Vec<f64>, ModelError> {
            Ok(vec![0.0; features.len()])
        }

        fn expected_value(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_zero_attributions_fail_the_request() {
        let service = AssessmentService::new(
            Arc::new(ConstantEncoder),
            Arc::new(FlatModel {
                names: vec!["x".into()],
            }),
        );
        let err = service.assess(&SurveyAnswers::default()).unwrap_err();
        assert!(matches!(
            err,
            HolomedError::Model(ModelError::DegenerateAttribution(_))
        ));
    }

    #[test]
    fn test_shape_mismatch_fails_the_request() {
        let service = AssessmentService::new(
            Arc::new(ConstantEncoder),
            Arc::new(FlatModel {
                names: vec!["x".into(), "y".into()],
            }),
        );
        let err = service.assess(&SurveyAnswers::default()).unwrap_err();
        assert!(matches!(
            err,
            HolomedError::Model(ModelError::ShapeMismatch {
                expected: 2,
                got: 1
            })
        ));
    }
}
