//! Decision-forest skin-type classifier.
//!
//! The forest is trained offline and shipped as JSON. Each tree votes for a
//! skin type; the most votes win. Whenever the forest cannot produce a
//! label the rule cascade answers instead, so classification stays total.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::{RuleCascade, SkinFeatures, SkinType, SkinTypeClassifier};
use crate::error::SkinScanError;
use crate::metrics::AnalysisResult;

/// Input features the forest was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForestFeature {
    /// [`SkinFeatures::oiliness`].
    Oiliness,
    /// [`SkinFeatures::dryness`].
    Dryness,
    /// [`SkinFeatures::acne`].
    AcneSpots,
    /// [`SkinFeatures::redness`].
    Redness,
}

impl ForestFeature {
    fn value(self, features: &SkinFeatures) -> f64 {
        match self {
            ForestFeature::Oiliness => features.oiliness,
            ForestFeature::Dryness => features.dryness,
            ForestFeature::AcneSpots => features.acne,
            ForestFeature::Redness => features.redness,
        }
    }
}

/// A node in a decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` if the feature is at most `threshold`, else to `right`.
    Split {
        /// Feature compared.
        feature: ForestFeature,
        /// Inclusive upper bound for the left branch.
        threshold: f64,
        /// Node index taken at or below the threshold.
        left: u32,
        /// Node index taken above it.
        right: u32,
    },
    /// Terminal vote.
    Leaf {
        /// The tree's vote.
        skin_type: SkinType,
    },
}

/// A single decision tree. Node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Nodes addressed by index.
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf.
    ///
    /// A tree longer than its node count must contain a cycle, so the walk
    /// is bounded by it.
    pub fn predict(&self, features: &SkinFeatures) -> Result<SkinType, SkinScanError> {
        let mut node_idx = 0usize;

        for _ in 0..=self.nodes.len() {
            match self.nodes.get(node_idx) {
                Some(TreeNode::Leaf { skin_type }) => return Ok(*skin_type),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    node_idx = if feature.value(features) <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                None => {
                    return Err(SkinScanError::Inference(format!(
                        "tree node {node_idx} out of range ({} nodes)",
                        self.nodes.len()
                    )))
                }
            }
        }

        Err(SkinScanError::Inference("tree walk did not reach a leaf".into()))
    }
}

/// Majority-vote forest over [`DecisionTree`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    /// Voting trees, at least one.
    pub trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    /// Parse a forest from JSON. A forest without trees, or with an empty
    /// tree, is a [`SkinScanError::ModelLoad`].
    pub fn from_json_str(json: &str) -> Result<Self, SkinScanError> {
        let forest: Self = serde_json::from_str(json)?;
        if forest.trees.is_empty() || forest.trees.iter().any(|tree| tree.nodes.is_empty()) {
            return Err(SkinScanError::ModelLoad("forest has no usable trees".into()));
        }
        Ok(forest)
    }

    /// Read and parse a forest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SkinScanError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SkinScanError::ModelLoad(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Tally every tree's vote. Ties go to the earliest type in
    /// [`SkinType::ALL`].
    pub fn predict(&self, features: &SkinFeatures) -> Result<SkinType, SkinScanError> {
        let mut votes = [0usize; SkinType::ALL.len()];
        for tree in &self.trees {
            let label = tree.predict(features)?;
            if let Some(slot) = SkinType::ALL.iter().position(|t| *t == label) {
                votes[slot] += 1;
            }
        }

        let mut best = 0;
        for (slot, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = slot;
            }
        }
        Ok(SkinType::ALL[best])
    }
}

impl SkinTypeClassifier for ForestClassifier {
    fn classify(&self, analysis: &AnalysisResult) -> SkinType {
        if analysis.is_empty() {
            return SkinType::Normal;
        }
        let features = SkinFeatures::from_analysis(analysis);
        match self.predict(&features) {
            Ok(skin_type) => skin_type,
            Err(e) => {
                log::warn!("forest inference failed, using rule cascade: {e}");
                RuleCascade.classify_features(&features)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Condition, ConditionMetric};

    /// One stump per rule of thumb: oily above 60, dry when dryness above 60,
    /// otherwise normal.
    const FOREST: &str = r#"{
        "trees": [
            {"nodes": [
                {"split": {"feature": "oiliness", "threshold": 60.0, "left": 1, "right": 2}},
                {"leaf": {"skin_type": "Normal"}},
                {"leaf": {"skin_type": "Oily"}}
            ]},
            {"nodes": [
                {"split": {"feature": "dryness", "threshold": 60.0, "left": 1, "right": 2}},
                {"leaf": {"skin_type": "Oily"}},
                {"leaf": {"skin_type": "Dry"}}
            ]},
            {"nodes": [
                {"split": {"feature": "acne_spots", "threshold": 15.0, "left": 1, "right": 2}},
                {"leaf": {"skin_type": "Normal"}},
                {"leaf": {"skin_type": "Oily"}}
            ]}
        ]
    }"#;

    fn analysis(oiliness: f64, dryness: f64, acne: f64) -> AnalysisResult {
        [
            ConditionMetric::new(Condition::Oiliness, oiliness),
            ConditionMetric::new(Condition::Dryness, dryness),
            ConditionMetric::new(Condition::AcneSpots, acne),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn majority_vote() {
        let forest = ForestClassifier::from_json_str(FOREST).unwrap();
        // Oily, Oily, Oily
        assert_eq!(forest.classify(&analysis(80.0, 20.0, 30.0)), SkinType::Oily);
        // Normal, Oily, Normal
        assert_eq!(forest.classify(&analysis(40.0, 40.0, 0.0)), SkinType::Normal);
    }

    #[test]
    fn ties_follow_label_order() {
        let forest = ForestClassifier::from_json_str(FOREST).unwrap();
        // Normal, Dry, Oily: one vote each → Dry comes first
        assert_eq!(forest.classify(&analysis(40.0, 80.0, 30.0)), SkinType::Dry);
    }

    #[test]
    fn empty_analysis_is_normal() {
        let forest = ForestClassifier::from_json_str(FOREST).unwrap();
        assert_eq!(forest.classify(&AnalysisResult::new()), SkinType::Normal);
    }

    #[test]
    fn dangling_node_falls_back_to_rules() {
        let forest = ForestClassifier::from_json_str(
            r#"{"trees": [{"nodes": [
                {"split": {"feature": "redness", "threshold": 5.0, "left": 7, "right": 7}}
            ]}]}"#,
        )
        .unwrap();
        let features = SkinFeatures::from_analysis(&analysis(80.0, 20.0, 20.0));
        assert!(matches!(
            forest.predict(&features),
            Err(SkinScanError::Inference(_))
        ));
        // The rule cascade calls this oily
        assert_eq!(forest.classify(&analysis(80.0, 20.0, 20.0)), SkinType::Oily);
    }

    #[test]
    fn cyclic_tree_is_an_inference_error() {
        let tree = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: ForestFeature::Oiliness,
                threshold: 50.0,
                left: 0,
                right: 0,
            }],
        };
        let features = SkinFeatures::from_analysis(&analysis(10.0, 10.0, 0.0));
        assert!(tree.predict(&features).is_err());
    }

    #[test]
    fn empty_forest_is_rejected() {
        assert!(matches!(
            ForestClassifier::from_json_str(r#"{"trees": []}"#),
            Err(SkinScanError::ModelLoad(_))
        ));
        assert!(ForestClassifier::from_json_str(r#"{"trees": [{"nodes": []}]}"#).is_err());
    }
}
