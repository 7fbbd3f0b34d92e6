//! Artifact store: loads the fitted encoder and classifier from disk.
//!
//! A model directory holds `encoder.json`, `model.json` and, optionally,
//! `manifest.json` with SHA-256 digests of both. When a manifest is present
//! every digest must match before anything is parsed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::adapters::encoding::{ExportedTargetEncoder, TargetEncoder};
use crate::adapters::gbdt::{BalancedEnsemble, ExportedEnsemble};
use crate::domain::SurveyField;
use crate::ports::{FeatureEncoder, RiskClassifier};

pub const ENCODER_FILE: &str = "encoder.json";
pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/// Errors raised while loading artifacts. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model directory not found: {0:?}")]
    NotFound(PathBuf),

    #[error("failed to read {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("failed to parse {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("invalid artifact: {0}")]
    Invalid(String),

    #[error("{0} not found; refusing to load unverified artifacts")]
    MissingManifest(PathBuf),

    #[error("file hash mismatch for {0}")]
    ChecksumMismatch(String),

    #[error("encoder and classifier disagree on features: {0}")]
    FeatureMismatch(String),
}

/// SHA-256 digests of the artifact files, keyed by file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Hash the encoder and model files of `dir`.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if either file cannot be read.
    pub fn for_dir(dir: &Path) -> Result<Self, ArtifactError> {
        let mut files = BTreeMap::new();
        for name in [ENCODER_FILE, MODEL_FILE] {
            let bytes = read_bytes(&dir.join(name))?;
            files.insert(name.to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            files,
        })
    }

    /// Write the manifest into `dir`, returning its path.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if the file cannot be written.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ArtifactError> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(self).map_err(|e| ArtifactError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| ArtifactError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|e| ArtifactError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = read_bytes(path)?;
    serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// The two frozen artifacts, ready to serve requests.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub encoder: TargetEncoder,
    pub classifier: BalancedEnsemble,

    /// Whether a manifest was present and every digest matched.
    pub verified: bool,
}

/// Load and cross-check the artifacts in `dir`.
///
/// # Errors
/// Returns `ArtifactError` if a file is missing, unparsable, fails its digest,
/// or if the encoder and classifier were not fitted on the same columns.
pub fn load_artifacts(dir: &Path, require_manifest: bool) -> Result<LoadedArtifacts, ArtifactError> {
    if !dir.is_dir() {
        return Err(ArtifactError::NotFound(dir.to_path_buf()));
    }

    let verified = verify_manifest(dir, require_manifest)?;

    let encoder_path = dir.join(ENCODER_FILE);
    let encoder =
        TargetEncoder::from_exported(read_json::<ExportedTargetEncoder>(&encoder_path)?)?;

    let model_path = dir.join(MODEL_FILE);
    let classifier =
        BalancedEnsemble::from_exported(read_json::<ExportedEnsemble>(&model_path)?)?;

    check_features(&encoder, &classifier)?;

    tracing::info!(
        "Loaded artifacts from {:?} (features={}, members={})",
        dir,
        encoder.feature_names().len(),
        classifier.members().len()
    );

    Ok(LoadedArtifacts {
        encoder,
        classifier,
        verified,
    })
}

/// Check the manifest digests, returning whether a manifest was present.
fn verify_manifest(dir: &Path, require_manifest: bool) -> Result<bool, ArtifactError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        if require_manifest {
            tracing::error!("Artifact manifest not found at {:?}", manifest_path);
            return Err(ArtifactError::MissingManifest(manifest_path));
        }
        tracing::warn!("Loading artifacts without a manifest; digests not verified");
        return Ok(false);
    }

    let manifest: ArtifactManifest = read_json(&manifest_path)?;
    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactError::Invalid(format!(
            "unsupported manifest version: {}",
            manifest.version
        )));
    }
    for required in [ENCODER_FILE, MODEL_FILE] {
        if !manifest.files.contains_key(required) {
            return Err(ArtifactError::Invalid(format!(
                "manifest.json must include {required}"
            )));
        }
    }

    // Entries name files inside `dir`; anything else could hash outside it.
    if let Some(bad) = manifest.files.keys().find(|rel| !is_plain_file_name(rel)) {
        return Err(ArtifactError::Invalid(format!(
            "manifest entry `{bad}` is not a file name"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let actual_hex = sha256_hex(&read_bytes(&dir.join(rel))?);
        if !constant_time_eq_str(&actual_hex, expected_hex) {
            return Err(ArtifactError::ChecksumMismatch(rel.clone()));
        }
    }

    tracing::info!("Artifact digests verified ({} files)", manifest.files.len());
    Ok(true)
}

fn is_plain_file_name(rel: &str) -> bool {
    let mut components = Path::new(rel).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn check_features(
    encoder: &TargetEncoder,
    classifier: &BalancedEnsemble,
) -> Result<(), ArtifactError> {
    let encoded = encoder.feature_names();
    let expected = RiskClassifier::feature_names(classifier);

    if encoded.len() != expected.len() {
        return Err(ArtifactError::FeatureMismatch(format!(
            "encoder emits {} columns, classifier expects {}",
            encoded.len(),
            expected.len()
        )));
    }
    if let Some((i, (a, b))) = encoded
        .iter()
        .zip(expected)
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(ArtifactError::FeatureMismatch(format!(
            "column {i} is `{a}` in the encoder but `{b}` in the classifier"
        )));
    }
    if let Some(unknown) = encoded.iter().find(|n| SurveyField::from_key(n).is_none()) {
        return Err(ArtifactError::FeatureMismatch(format!(
            "column `{unknown}` is not a survey question"
        )));
    }
    Ok(())
}
