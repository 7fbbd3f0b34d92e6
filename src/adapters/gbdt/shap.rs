//! Exact path-dependent TreeSHAP.
//!
//! Polynomial-time Shapley values for tree models (Lundberg et al., 2018).
//! Node covers stand in for the background distribution: a feature outside
//! the coalition splits the path proportionally to the children's covers.
//! The result satisfies local accuracy:
//! `sum(phi) == raw_score(x) - expected_value()`.

use super::{goes_left, BoostedModel, Tree, TreeNode};

/// One feature on the current root-to-node path.
#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// `None` for the root placeholder.
    feature: Option<usize>,
    /// Fraction of paths flowing through here when the feature is absent.
    zero_fraction: f64,
    /// Fraction of paths flowing through here when the feature is present.
    one_fraction: f64,
    /// Permutation weight for subsets of the other path features.
    pweight: f64,
}

/// SHAP values of every feature for one row, in the model's raw output space.
#[must_use]
pub fn tree_shap(model: &BoostedModel, x: &[f64]) -> Vec<f64> {
    let mut phi = vec![0.0; x.len()];
    for tree in &model.trees {
        let mut walker = Walker {
            tree,
            x,
            phi: &mut phi,
        };
        walker.recurse(0, &[], 1.0, 1.0, None);
    }
    phi
}

struct Walker<'a> {
    tree: &'a Tree,
    x: &'a [f64],
    phi: &'a mut [f64],
}

impl Walker<'_> {
    fn recurse(
        &mut self,
        node: usize,
        parent_path: &[PathElement],
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) {
        let mut path = parent_path.to_vec();
        extend(&mut path, zero_fraction, one_fraction, feature);

        let tree = self.tree;
        match tree.nodes[node] {
            TreeNode::Leaf { value, .. } => {
                for i in 1..path.len() {
                    let weight = unwound_sum(&path, i);
                    let el = path[i];
                    if let Some(f) = el.feature {
                        self.phi[f] += weight * (el.one_fraction - el.zero_fraction) * value;
                    }
                }
            }
            TreeNode::Split {
                feature: split_feature,
                threshold,
                left,
                right,
                default_left,
                cover,
            } => {
                let (hot, cold) = if goes_left(self.x[split_feature], threshold, default_left) {
                    (left, right)
                } else {
                    (right, left)
                };
                let hot_zero = tree.nodes[hot].cover() / cover;
                let cold_zero = tree.nodes[cold].cover() / cover;

                // A feature split on twice along the path is counted once.
                let mut incoming_zero = 1.0;
                let mut incoming_one = 1.0;
                if let Some(k) = path.iter().position(|e| e.feature == Some(split_feature)) {
                    incoming_zero = path[k].zero_fraction;
                    incoming_one = path[k].one_fraction;
                    unwind(&mut path, k);
                }

                self.recurse(
                    hot,
                    &path,
                    hot_zero * incoming_zero,
                    incoming_one,
                    Some(split_feature),
                );
                self.recurse(
                    cold,
                    &path,
                    cold_zero * incoming_zero,
                    0.0,
                    Some(split_feature),
                );
            }
        }
    }
}

/// Append a feature to the path and update the permutation weights.
fn extend(
    path: &mut Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let d = depth as f64;
    for i in (0..depth).rev() {
        let fi = i as f64;
        path[i + 1].pweight += one_fraction * path[i].pweight * (fi + 1.0) / (d + 1.0);
        path[i].pweight = zero_fraction * path[i].pweight * (d - fi) / (d + 1.0);
    }
}

/// Remove element `index` from the path, undoing its `extend`.
fn unwind(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let d = depth as f64;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;

    for i in (0..depth).rev() {
        let fi = i as f64;
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * (d + 1.0) / ((fi + 1.0) * one_fraction);
            next_one_portion = tmp - path[i].pweight * zero_fraction * (d - fi) / (d + 1.0);
        } else {
            path[i].pweight = path[i].pweight * (d + 1.0) / (zero_fraction * (d - fi));
        }
    }

    // Weights stay in place; only the feature data shifts down.
    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with element `index` unwound.
fn unwound_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let d = depth as f64;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        let fi = i as f64;
        if one_fraction != 0.0 {
            let tmp = next_one_portion * (d + 1.0) / ((fi + 1.0) * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * (d - fi) / (d + 1.0);
        } else {
            total += path[i].pweight / zero_fraction / ((d - fi) / (d + 1.0));
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: f64, cover: f64) -> TreeNode {
        TreeNode::Leaf { value, cover }
    }

    fn split(feature: usize, threshold: f64, left: usize, right: usize, cover: f64) -> TreeNode {
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
            default_left: true,
            cover,
        }
    }

    /// E[f(x) | x_S] where features outside S follow the covers.
    fn conditional(tree: &Tree, node: usize, x: &[f64], subset: u32) -> f64 {
        match tree.nodes[node] {
            TreeNode::Leaf { value, .. } => value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
                default_left,
                cover,
            } => {
                if subset & (1 << feature) != 0 {
                    let next = if goes_left(x[feature], threshold, default_left) {
                        left
                    } else {
                        right
                    };
                    conditional(tree, next, x, subset)
                } else {
                    (tree.nodes[left].cover() * conditional(tree, left, x, subset)
                        + tree.nodes[right].cover() * conditional(tree, right, x, subset))
                        / cover
                }
            }
        }
    }

    /// Shapley values by enumerating every coalition.
    fn brute_force(model: &BoostedModel, x: &[f64]) -> Vec<f64> {
        let n = x.len();
        let value = |subset: u32| -> f64 {
            model.init_score
                + model
                    .trees
                    .iter()
                    .map(|t| conditional(t, 0, x, subset))
                    .sum::<f64>()
        };
        let factorial = |k: usize| -> f64 { (1..=k).map(|v| v as f64).product() };

        let mut phi = vec![0.0; n];
        for (i, slot) in phi.iter_mut().enumerate() {
            for subset in 0u32..(1 << n) {
                if subset & (1 << i) != 0 {
                    continue;
                }
                let size = subset.count_ones() as usize;
                let weight = factorial(size) * factorial(n - size - 1) / factorial(n);
                *slot += weight * (value(subset | (1 << i)) - value(subset));
            }
        }
        phi
    }

    /// Depth-3 tree reusing feature 0 below the root, plus a stump.
    fn model() -> BoostedModel {
        let deep = Tree {
            nodes: vec![
                split(0, 0.5, 1, 2, 100.0),
                split(1, 0.3, 3, 4, 60.0),
                split(2, 0.7, 5, 6, 40.0),
                leaf(-1.0, 45.0),
                split(0, 0.2, 7, 8, 15.0),
                leaf(0.5, 10.0),
                leaf(2.5, 30.0),
                leaf(0.3, 5.0),
                leaf(1.2, 10.0),
            ],
        };
        let stump = Tree {
            nodes: vec![split(2, 0.4, 1, 2, 100.0), leaf(-0.4, 70.0), leaf(0.9, 30.0)],
        };
        BoostedModel {
            init_score: -0.25,
            trees: vec![deep, stump],
        }
    }

    #[test]
    fn test_single_stump() {
        let stump = BoostedModel {
            init_score: 0.0,
            trees: vec![Tree {
                nodes: vec![split(0, 0.5, 1, 2, 10.0), leaf(1.0, 8.0), leaf(6.0, 2.0)],
            }],
        };
        // E = 0.8 * 1 + 0.2 * 6 = 2.0
        let phi = tree_shap(&stump, &[0.9, 0.0]);
        assert!((phi[0] - 4.0).abs() < 1e-12);
        assert_eq!(phi[1], 0.0);

        let phi = tree_shap(&stump, &[0.1, 0.0]);
        assert!((phi[0] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matches_exhaustive_shapley_values() {
        let model = model();
        let rows = [
            [0.1, 0.1, 0.1],
            [0.4, 0.9, 0.9],
            [0.15, 0.5, 0.2],
            [0.9, 0.0, 0.8],
            [0.6, 0.6, 0.3],
        ];
        for x in rows {
            let fast = tree_shap(&model, &x);
            let exact = brute_force(&model, &x);
            for (a, b) in fast.iter().zip(&exact) {
                assert!((a - b).abs() < 1e-9, "row {x:?}: {fast:?} vs {exact:?}");
            }
        }
    }

    #[test]
    fn test_local_accuracy() {
        let model = model();
        for x in [[0.1, 0.1, 0.1], [0.4, 0.9, 0.9], [0.9, 0.0, 0.8]] {
            let phi = tree_shap(&model, &x);
            let total: f64 = phi.iter().sum();
            let gap = model.raw_score(&x) - model.expected_value();
            assert!((total - gap).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unused_feature_gets_zero() {
        let model = BoostedModel {
            init_score: 0.0,
            trees: vec![Tree {
                nodes: vec![split(1, 0.5, 1, 2, 10.0), leaf(-1.0, 5.0), leaf(1.0, 5.0)],
            }],
        };
        let phi = tree_shap(&model, &[0.3, 0.9, 0.1]);
        assert_eq!(phi[0], 0.0);
        assert_eq!(phi[2], 0.0);
        assert!((phi[1] - 1.0).abs() < 1e-12);
    }
}
