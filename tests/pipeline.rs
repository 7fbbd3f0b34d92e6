//! End-to-end checks through the public API: JSON answers in, assessment out.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use holomed::adapters::artifacts::{ArtifactManifest, ENCODER_FILE, MANIFEST_FILE, MODEL_FILE};
use holomed::adapters::encoding::TargetEncoder;
use holomed::adapters::gbdt::BalancedEnsemble;
use holomed::adapters::{load_artifacts, ArtifactError};
use holomed::application::AssessmentService;
use holomed::domain::advice::ADVICE_TOP_N;
use holomed::domain::{AdviceTopic, SurveyField, ValidationError, OTHER_FACTORS};
use holomed::{Assessment, RiskBand, SurveyAnswers};
use tempfile::tempdir;

const MODELS: &str = "models";

fn service() -> AssessmentService<TargetEncoder, BalancedEnsemble> {
    let loaded = load_artifacts(Path::new(MODELS), true).expect("bundled artifacts load");
    AssessmentService::new(Arc::new(loaded.encoder), Arc::new(loaded.classifier))
}

fn default_record() -> BTreeMap<String, String> {
    SurveyAnswers::default()
        .iter()
        .map(|(f, v)| (f.key().to_string(), v.to_string()))
        .collect()
}

fn to_json(record: &BTreeMap<String, String>) -> String {
    serde_json::to_string(record).expect("serialize record")
}

/// Every record that differs from the defaults in exactly one answer.
fn single_changes() -> Vec<SurveyAnswers> {
    let mut out = Vec::new();
    for field in SurveyField::ALL {
        for option in field.options() {
            let mut answers = SurveyAnswers::default();
            answers.set(field, option).expect("option from the field's domain");
            out.push(answers);
        }
    }
    out
}

fn check_invariants(a: &Assessment) {
    assert!((0.0..=100.0).contains(&a.risk_percent));
    assert_eq!(a.band, RiskBand::from_percent(a.score.percent()));

    let ranked = &a.contributions.ranked;
    assert_eq!(ranked.len(), SurveyField::ALL.len());
    assert!(ranked.iter().all(|c| c.percent >= 0.0));
    let total: f64 = ranked.iter().map(|c| c.percent).sum();
    assert!((total - 100.0).abs() < 1e-6, "ranked total {total}");

    let chart = &a.contributions.chart;
    assert!(chart.len() <= 7);
    let chart_total: f64 = chart.iter().map(|c| c.percent).sum();
    assert!((chart_total - 100.0).abs() < 1e-6, "chart total {chart_total}");
    if let Some(other) = chart.iter().find(|c| c.feature == OTHER_FACTORS) {
        assert!(other.percent > 0.0);
    }

    if a.score.percent() <= 25.0 {
        assert_eq!(a.recommendations.len(), 1);
        assert_eq!(a.recommendations[0].topic, AdviceTopic::KeepItUp);
    } else {
        assert!(a.recommendations.len() <= ADVICE_TOP_N);
        let top: Vec<&str> = ranked
            .iter()
            .take(ADVICE_TOP_N)
            .map(|c| c.feature.as_str())
            .collect();
        let mut seen = Vec::new();
        for rec in &a.recommendations {
            let feature = rec.feature.as_deref().expect("triggered advice names a feature");
            assert!(top.contains(&feature), "{feature} not in the top five");
            assert!(!seen.contains(&feature), "{feature} advised twice");
            seen.push(feature);
        }
    }
}

#[test]
fn test_json_record_round_trip() {
    let answers = SurveyAnswers::from_json(&to_json(&default_record())).expect("valid record");
    assert_eq!(answers, SurveyAnswers::default());

    let assessment = service().assess(&answers).expect("assessment");
    assert_eq!(assessment.band, RiskBand::Low);
    assert!((assessment.risk_percent - 9.0).abs() < 0.2);

    let value: serde_json::Value =
        serde_json::to_value(&assessment).expect("assessment to json");
    assert_eq!(value["band"], "low");
    assert!(value["risk_percent"].is_number());
    assert!(value["contributions"]["chart"].is_array());
    assert!(value["created_at"].is_string());
}

#[test]
fn test_invalid_records_are_rejected() {
    let mut record = default_record();
    record.insert("smoking_status".into(), "sometimes".into());
    assert_eq!(
        SurveyAnswers::from_json(&to_json(&record)),
        Err(ValidationError::OutOfDomain {
            field: "smoking_status".into(),
            value: "sometimes".into(),
        })
    );

    let mut record = default_record();
    record.remove("general_health");
    assert_eq!(
        SurveyAnswers::from_json(&to_json(&record)),
        Err(ValidationError::MissingField("general_health".into()))
    );

    assert!(matches!(
        SurveyAnswers::from_json("[1, 2, 3]"),
        Err(ValidationError::Malformed(_))
    ));
}

#[test]
fn test_every_single_answer_change_holds_invariants() {
    let service = service();
    for answers in single_changes() {
        let assessment = service.assess(&answers).expect("assessment");
        check_invariants(&assessment);
    }
}

#[test]
fn test_heart_attack_and_daily_smoker() {
    let mut record = default_record();
    record.insert("ever_diagnosed_with_heart_attack".into(), "yes".into());
    record.insert("smoking_status".into(), "current_smoker_every_day".into());
    let answers = SurveyAnswers::from_json(&to_json(&record)).expect("valid record");

    let assessment = service().assess(&answers).expect("assessment");
    check_invariants(&assessment);

    assert!(assessment.risk_percent > 40.0);
    assert_eq!(assessment.band, RiskBand::VeryHigh);
    let topics: Vec<AdviceTopic> = assessment.recommendations.iter().map(|r| r.topic).collect();
    assert!(topics.contains(&AdviceTopic::CardiologyFollowUp));
    assert!(topics.contains(&AdviceTopic::SmokingCessation));
}

#[test]
fn test_unseen_category_still_scores() {
    let mut record = default_record();
    record.insert("gender".into(), "nonbinary".into());
    let answers = SurveyAnswers::from_json(&to_json(&record)).expect("valid record");

    let assessment = service().assess(&answers).expect("assessment");
    check_invariants(&assessment);
    assert!((assessment.risk_percent - 8.1).abs() < 0.2);
}

#[test]
fn test_rewritten_manifest_verifies_and_detects_tampering() {
    let temp = tempdir().expect("tempdir");
    for name in [ENCODER_FILE, MODEL_FILE] {
        fs::copy(Path::new(MODELS).join(name), temp.path().join(name)).expect("copy");
    }

    let manifest = ArtifactManifest::for_dir(temp.path()).expect("hash");
    let path = manifest.write(temp.path()).expect("write");
    assert_eq!(path, temp.path().join(MANIFEST_FILE));

    let loaded = load_artifacts(temp.path(), true).expect("verified load");
    assert!(loaded.verified);

    let encoder_path = temp.path().join(ENCODER_FILE);
    let text = fs::read_to_string(&encoder_path).expect("read");
    fs::write(&encoder_path, format!("{text} ")).expect("tamper");

    match load_artifacts(temp.path(), true) {
        Err(ArtifactError::ChecksumMismatch(file)) => assert_eq!(file, ENCODER_FILE),
        other => panic!("expected checksum mismatch, got {other:?}"),
    }
}
