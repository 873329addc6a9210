//! Skin-type classification.
//!
//! [`RuleCascade`] is the reference classifier: an ordered table of guards
//! where the first match wins. Downstream recommendation lookup keys off its
//! labels, so the order of [`RULES`] is part of the contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ClassifierKind;
use crate::forest::ForestClassifier;
use crate::metrics::{AnalysisResult, Condition};

/// Categorical skin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkinType {
    /// Tight, flaky skin.
    Dry,
    /// Shiny skin with large pores.
    Oily,
    /// Oily T-zone, normal or dry elsewhere.
    Combination,
    /// Balanced skin.
    Normal,
    /// Reactive, reddened skin.
    Sensitive,
}

impl SkinType {
    /// Every skin type, in tie-break order.
    pub const ALL: [SkinType; 5] = [
        SkinType::Dry,
        SkinType::Oily,
        SkinType::Combination,
        SkinType::Normal,
        SkinType::Sensitive,
    ];

    /// Display name, also the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            SkinType::Dry => "Dry",
            SkinType::Oily => "Oily",
            SkinType::Combination => "Combination",
            SkinType::Normal => "Normal",
            SkinType::Sensitive => "Sensitive",
        }
    }
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an analysis to a skin type. Implementations must be total: every
/// analysis, including an empty one, gets a label.
pub trait SkinTypeClassifier: Send + Sync {
    /// Label `analysis`.
    fn classify(&self, analysis: &AnalysisResult) -> SkinType;
}

/// The metric values the cascade reads, with defaults for anything missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinFeatures {
    /// Oiliness score, 50 when missing.
    pub oiliness: f64,
    /// Dryness score, 50 when missing.
    pub dryness: f64,
    /// Acne severity, 0 when missing.
    pub acne: f64,
    /// Redness severity, 0 when missing.
    pub redness: f64,
    /// Uneven tone score, 0 when missing.
    pub uneven_tone: f64,
    /// Texture score, 0 when missing.
    pub texture: f64,
}

impl SkinFeatures {
    /// Read the features out of `analysis`, defaulting missing metrics.
    pub fn from_analysis(analysis: &AnalysisResult) -> Self {
        Self {
            oiliness: analysis.value_or(Condition::Oiliness, 50.0),
            dryness: analysis.value_or(Condition::Dryness, 50.0),
            acne: analysis.value_or(Condition::AcneSpots, 0.0),
            redness: analysis.value_or(Condition::Redness, 0.0),
            uneven_tone: analysis.value_or(Condition::UnevenTone, 0.0),
            texture: analysis.value_or(Condition::Texture, 0.0),
        }
    }

    /// Oiliness minus dryness.
    pub fn balance(&self) -> f64 {
        self.oiliness - self.dryness
    }
}

/// A labelled guard in the cascade.
pub struct Rule {
    /// Label produced when the guard matches.
    pub skin_type: SkinType,
    /// The guard.
    pub matches: fn(&SkinFeatures) -> bool,
}

/// Cascade rules in priority order.
pub const RULES: [Rule; 5] = [
    Rule {
        skin_type: SkinType::Sensitive,
        matches: is_sensitive,
    },
    Rule {
        skin_type: SkinType::Oily,
        matches: is_oily,
    },
    Rule {
        skin_type: SkinType::Dry,
        matches: is_dry,
    },
    Rule {
        skin_type: SkinType::Normal,
        matches: is_normal,
    },
    Rule {
        skin_type: SkinType::Combination,
        matches: is_combination,
    },
];

fn is_sensitive(f: &SkinFeatures) -> bool {
    f.redness > 25.0 || (f.redness > 15.0 && f.uneven_tone > 20.0)
}

fn is_oily(f: &SkinFeatures) -> bool {
    f.oiliness > 65.0 && (f.balance() > 30.0 || (f.oiliness > 70.0 && f.acne > 10.0))
}

fn is_dry(f: &SkinFeatures) -> bool {
    f.dryness > 60.0 && (-f.balance() > 25.0 || (f.dryness > 65.0 && f.texture > 30.0))
}

fn is_normal(f: &SkinFeatures) -> bool {
    let mid = 30.0..=55.0;
    mid.contains(&f.oiliness)
        && mid.contains(&f.dryness)
        && f.balance().abs() <= 15.0
        && f.acne < 15.0
        && f.redness < 15.0
}

fn is_combination(f: &SkinFeatures) -> bool {
    let diff = f.balance().abs();
    let mixed = (f.oiliness > 45.0 && f.dryness > 35.0)
        || ((40.0..=65.0).contains(&f.oiliness) && (35.0..=60.0).contains(&f.dryness) && diff < 30.0);
    mixed && diff < 25.0 && (f.oiliness > 50.0 || f.dryness > 50.0)
}

/// Applied when no rule in [`RULES`] matches.
fn fallback(f: &SkinFeatures) -> SkinType {
    let diff = f.balance();
    if diff > 25.0 {
        SkinType::Oily
    } else if diff < -25.0 {
        SkinType::Dry
    } else if diff.abs() <= 20.0 && f.oiliness < 50.0 && f.dryness < 50.0 {
        SkinType::Normal
    } else {
        SkinType::Combination
    }
}

/// The hand-built rule cascade.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCascade;

impl RuleCascade {
    /// Classify pre-extracted features.
    pub fn classify_features(&self, features: &SkinFeatures) -> SkinType {
        RULES
            .iter()
            .find(|rule| (rule.matches)(features))
            .map(|rule| rule.skin_type)
            .unwrap_or_else(|| fallback(features))
    }
}

impl SkinTypeClassifier for RuleCascade {
    fn classify(&self, analysis: &AnalysisResult) -> SkinType {
        if analysis.is_empty() {
            return SkinType::Normal;
        }
        self.classify_features(&SkinFeatures::from_analysis(analysis))
    }
}

/// Build the configured classifier. A forest that cannot be loaded is logged
/// and replaced by the rule cascade.
pub fn build_classifier(kind: &ClassifierKind) -> Box<dyn SkinTypeClassifier> {
    match kind {
        ClassifierKind::Rules => Box::new(RuleCascade),
        ClassifierKind::Forest { path } => match ForestClassifier::load(path) {
            Ok(forest) => {
                log::debug!("loaded skin-type forest from {}", path.display());
                Box::new(forest)
            }
            Err(e) => {
                log::warn!(
                    "could not load skin-type forest from {}, using rule cascade: {e}",
                    path.display()
                );
                Box::new(RuleCascade)
            }
        },
    }
}
