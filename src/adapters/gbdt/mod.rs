//! Gradient-boosted tree adapter: Implementation of `RiskClassifier` and
//! `FeatureAttribution`.
//!
//! The classifier is a balanced ensemble: several boosted tree models, each
//! trained on a different undersampled view of the data. The ensemble
//! probability is the plain average of the members' probabilities.
//!
//! Attributions are computed on the first member only, in its raw (log-odds)
//! output space.

mod shap;

use serde::{Deserialize, Serialize};

use crate::adapters::ArtifactError;
use crate::ports::{EncodedFeatures, FeatureAttribution, ModelError, RiskClassifier};

pub use shap::tree_shap;

/// Only artifact layout this adapter understands.
const SUPPORTED_FORMAT_VERSION: u32 = 1;

fn default_left() -> bool {
    true
}

/// One node of a binary decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    /// Go left when `x[feature] <= threshold`; NaN follows `default_left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_left")]
        default_left: bool,
        cover: f64,
    },
    Leaf { value: f64, cover: f64 },
}

impl TreeNode {
    /// Training samples (or hessian mass) that reached this node.
    #[must_use]
    pub fn cover(&self) -> f64 {
        match self {
            Self::Split { cover, .. } | Self::Leaf { cover, .. } => *cover,
        }
    }
}

/// A single regression tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

/// Branch taken by `value` at a split; NaN follows the default direction.
pub(crate) fn goes_left(value: f64, threshold: f64, default_left: bool) -> bool {
    if value.is_nan() {
        default_left
    } else {
        value <= threshold
    }
}

impl Tree {
    /// Leaf value reached by `x`.
    #[must_use]
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value, .. } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                    ..
                } => {
                    idx = if goes_left(x[feature], threshold, default_left) {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Cover-weighted mean leaf value.
    #[must_use]
    pub fn expected_value(&self) -> f64 {
        self.mean_below(0)
    }

    fn mean_below(&self, node: usize) -> f64 {
        match self.nodes[node] {
            TreeNode::Leaf { value, .. } => value,
            TreeNode::Split {
                left, right, cover, ..
            } => {
                let l = &self.nodes[left];
                let r = &self.nodes[right];
                (l.cover() * self.mean_below(left) + r.cover() * self.mean_below(right)) / cover
            }
        }
    }

    /// Check the node table forms a tree over `n_features` inputs.
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            if std::mem::replace(&mut seen[idx], true) {
                return Err(format!("node {idx} is reachable twice"));
            }
            let node = &self.nodes[idx];
            if !node.cover().is_finite() || node.cover() <= 0.0 {
                return Err(format!("node {idx} has non-positive cover"));
            }
            match *node {
                TreeNode::Leaf { value, .. } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {idx} has a non-finite value"));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "split {idx} uses feature {feature}, model has {n_features}"
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("split {idx} has a NaN threshold"));
                    }
                    for child in [left, right] {
                        if child >= self.nodes.len() {
                            return Err(format!("split {idx} points at missing node {child}"));
                        }
                        stack.push(child);
                    }
                }
            }
        }
        Ok(())
    }
}

/// A binary gradient-boosted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedModel {
    #[serde(default)]
    pub init_score: f64,
    pub trees: Vec<Tree>,
}

impl BoostedModel {
    /// Raw (log-odds) output.
    #[must_use]
    pub fn raw_score(&self, x: &[f64]) -> f64 {
        self.init_score + self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    /// Probability of the positive class.
    #[must_use]
    pub fn probability(&self, x: &[f64]) -> f64 {
        sigmoid(self.raw_score(x))
    }

    /// Expected raw output under the training distribution.
    #[must_use]
    pub fn expected_value(&self) -> f64 {
        self.init_score + self.trees.iter().map(Tree::expected_value).sum::<f64>()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Ensemble parameters exported by the training pipeline (`model.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedEnsemble {
    pub format_version: u32,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub members: Vec<BoostedModel>,
}

/// Average of boosted members trained on balanced resamples.
#[derive(Debug, Clone)]
pub struct BalancedEnsemble {
    feature_names: Vec<String>,
    members: Vec<BoostedModel>,
}

impl BalancedEnsemble {
    /// Validate exported parameters and build the ensemble.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the ensemble is structurally broken.
    pub fn from_exported(exported: ExportedEnsemble) -> Result<Self, ArtifactError> {
        if exported.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ArtifactError::Invalid(format!(
                "unsupported model format_version {} (expected {SUPPORTED_FORMAT_VERSION})",
                exported.format_version
            )));
        }
        let n = exported.n_features;
        if n == 0 || exported.feature_names.len() != n {
            return Err(ArtifactError::Invalid(format!(
                "model declares {n} features but names {}",
                exported.feature_names.len()
            )));
        }
        if exported.members.is_empty() {
            return Err(ArtifactError::Invalid("ensemble has no members".into()));
        }

        for (m, member) in exported.members.iter().enumerate() {
            if !member.init_score.is_finite() {
                return Err(ArtifactError::Invalid(format!(
                    "member {m} has a non-finite init_score"
                )));
            }
            for (t, tree) in member.trees.iter().enumerate() {
                tree.validate(n).map_err(|e| {
                    ArtifactError::Invalid(format!("member {m}, tree {t}: {e}"))
                })?;
            }
        }

        tracing::debug!(
            "Prepared balanced ensemble (members={}, trees={}, n_features={})",
            exported.members.len(),
            exported.members.iter().map(|m| m.trees.len()).sum::<usize>(),
            n
        );

        Ok(Self {
            feature_names: exported.feature_names,
            members: exported.members,
        })
    }

    #[must_use]
    pub fn members(&self) -> &[BoostedModel] {
        &self.members
    }

    /// Ensure the row matches the training layout.
    fn check_row<'a>(&self, features: &'a EncodedFeatures) -> Result<&'a [f64], ModelError> {
        if features.len() != self.feature_names.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.feature_names.len(),
                got: features.len(),
            });
        }
        for (index, (expected, got)) in self
            .feature_names
            .iter()
            .zip(features.names())
            .enumerate()
        {
            if expected != got {
                return Err(ModelError::FeatureOrder {
                    index,
                    expected: expected.clone(),
                    got: got.clone(),
                });
            }
        }
        Ok(features.values())
    }
}

impl RiskClassifier for BalancedEnsemble {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_probability(&self, features: &EncodedFeatures) -> Result<f64, ModelError> {
        let x = self.check_row(features)?;
        let total: f64 = self.members.iter().map(|m| m.probability(x)).sum();
        let probability = total / self.members.len() as f64;

        if !probability.is_finite() {
            return Err(ModelError::NonFinite);
        }
        Ok(probability)
    }
}

impl FeatureAttribution for BalancedEnsemble {
    fn attributions(&self, features: &EncodedFeatures) -> Result<Vec<f64>, ModelError> {
        let x = self.check_row(features)?;
        let phi = tree_shap(&self.members[0], x);

        if phi.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite);
        }
        Ok(phi)
    }

    fn expected_value(&self) -> f64 {
        self.members[0].expected_value()
    }
}
