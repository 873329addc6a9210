//! Per-condition metrics and the analysis result they form.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// A skin condition measured by one extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Dark blemishes of spot size.
    AcneSpots,
    /// Darkening below the eyes.
    DarkCircles,
    /// Red, saturated areas.
    Redness,
    /// Shine.
    Oiliness,
    /// Flaky, fine-grained texture.
    Dryness,
    /// Chrominance spread.
    UnevenTone,
    /// Overall roughness.
    Texture,
}

impl Condition {
    /// Every condition, in extraction order.
    pub const ALL: [Condition; 7] = [
        Condition::AcneSpots,
        Condition::DarkCircles,
        Condition::Redness,
        Condition::Oiliness,
        Condition::Dryness,
        Condition::UnevenTone,
        Condition::Texture,
    ];

    /// Key used in serialized results.
    pub fn name(self) -> &'static str {
        match self {
            Condition::AcneSpots => "acne_spots",
            Condition::DarkCircles => "dark_circles",
            Condition::Redness => "redness",
            Condition::Oiliness => "oiliness",
            Condition::Dryness => "dryness",
            Condition::UnevenTone => "uneven_tone",
            Condition::Texture => "texture",
        }
    }

    /// Values below the first breakpoint are low, below the second medium,
    /// anything else high.
    pub fn breakpoints(self) -> (f64, f64) {
        match self {
            Condition::AcneSpots => (10.0, 30.0),
            Condition::DarkCircles => (15.0, 30.0),
            Condition::Redness => (10.0, 25.0),
            Condition::Oiliness => (30.0, 60.0),
            Condition::Dryness => (20.0, 50.0),
            Condition::UnevenTone => (15.0, 30.0),
            Condition::Texture => (20.0, 40.0),
        }
    }

    /// Whether the value is reported as a severity (how much of the face
    /// shows the condition) rather than a score.
    pub fn is_severity(self) -> bool {
        matches!(
            self,
            Condition::AcneSpots | Condition::DarkCircles | Condition::Redness
        )
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Three-band summary of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Below the first breakpoint.
    Low,
    /// Between the breakpoints.
    Medium,
    /// At or above the second breakpoint.
    High,
}

impl Level {
    /// Band `value` using the given breakpoints.
    pub fn from_value(value: f64, (medium, high): (f64, f64)) -> Self {
        if value < medium {
            Level::Low
        } else if value < high {
            Level::Medium
        } else {
            Level::High
        }
    }

    /// Lowercase name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

/// A single extractor output: value clamped to 0..=100 and rounded to two
/// decimals, plus its level.
///
/// Serializes with an extra `label` field carrying [`ConditionMetric::label`];
/// it is derived from `condition` and `level` and ignored when reading back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionMetric {
    /// Condition this metric measures.
    pub condition: Condition,
    /// Value in 0..=100.
    pub value: f64,
    /// Band of `value` under the condition's breakpoints.
    pub level: Level,
    /// Number of spots behind the value (acne only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl ConditionMetric {
    /// Build a metric from a raw value, clamping and rounding it and deriving
    /// the level from the condition's fixed breakpoints.
    pub fn new(condition: Condition, raw_value: f64) -> Self {
        let value = if raw_value.is_finite() {
            round2(raw_value.clamp(0.0, 100.0))
        } else {
            0.0
        };
        Self {
            condition,
            value,
            level: Level::from_value(value, condition.breakpoints()),
            count: None,
        }
    }

    /// Attach the spot count behind an acne value.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Human-readable level. Texture reads smooth/moderate/rough.
    pub fn label(&self) -> &'static str {
        match (self.condition, self.level) {
            (Condition::Texture, Level::Low) => "smooth",
            (Condition::Texture, Level::Medium) => "moderate",
            (Condition::Texture, Level::High) => "rough",
            (_, Level::Low) => "low",
            (_, Level::Medium) => "medium",
            (_, Level::High) => "high",
        }
    }
}

impl Serialize for ConditionMetric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ConditionMetric", 5)?;
        state.serialize_field("condition", &self.condition)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("level", &self.level)?;
        state.serialize_field("label", self.label())?;
        match self.count {
            Some(count) => state.serialize_field("count", &count)?,
            None => state.skip_field("count")?,
        }
        state.end()
    }
}

/// Condition name → metric for one analyzed face. Empty when no face was
/// available to analyze.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    metrics: BTreeMap<Condition, ConditionMetric>,
}

impl AnalysisResult {
    /// An empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `metric`, replacing any earlier metric for the same condition.
    pub fn insert(&mut self, metric: ConditionMetric) {
        self.metrics.insert(metric.condition, metric);
    }

    /// The metric for `condition`, if measured.
    pub fn get(&self, condition: Condition) -> Option<&ConditionMetric> {
        self.metrics.get(&condition)
    }

    /// The metric value, if the condition was measured.
    pub fn value(&self, condition: Condition) -> Option<f64> {
        self.get(condition).map(|metric| metric.value)
    }

    /// The metric value, or `default` when the condition is missing.
    pub fn value_or(&self, condition: Condition, default: f64) -> f64 {
        self.value(condition).unwrap_or(default)
    }

    /// True when no face was analyzed.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Number of measured conditions.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Metrics in condition order.
    pub fn iter(&self) -> impl Iterator<Item = &ConditionMetric> {
        self.metrics.values()
    }
}

impl FromIterator<ConditionMetric> for AnalysisResult {
    fn from_iter<I: IntoIterator<Item = ConditionMetric>>(iter: I) -> Self {
        let mut result = Self::new();
        for metric in iter {
            result.insert(metric);
        }
        result
    }
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_is_clamped_and_rounded() {
        assert_eq!(ConditionMetric::new(Condition::Redness, 123.4).value, 100.0);
        assert_eq!(ConditionMetric::new(Condition::Redness, -3.0).value, 0.0);
        assert_eq!(ConditionMetric::new(Condition::Redness, 12.34567).value, 12.35);
        assert_eq!(ConditionMetric::new(Condition::Redness, f64::NAN).value, 0.0);
    }

    #[test]
    fn level_breakpoints_are_exclusive_upper_bounds() {
        assert_eq!(ConditionMetric::new(Condition::AcneSpots, 9.99).level, Level::Low);
        assert_eq!(ConditionMetric::new(Condition::AcneSpots, 10.0).level, Level::Medium);
        assert_eq!(ConditionMetric::new(Condition::AcneSpots, 30.0).level, Level::High);
        assert_eq!(ConditionMetric::new(Condition::Oiliness, 59.99).level, Level::Medium);
        assert_eq!(ConditionMetric::new(Condition::Dryness, 19.0).level, Level::Low);
    }

    #[test]
    fn texture_uses_smoothness_labels() {
        assert_eq!(ConditionMetric::new(Condition::Texture, 5.0).label(), "smooth");
        assert_eq!(ConditionMetric::new(Condition::Texture, 25.0).label(), "moderate");
        assert_eq!(ConditionMetric::new(Condition::Texture, 45.0).label(), "rough");
        assert_eq!(ConditionMetric::new(Condition::Redness, 45.0).label(), "high");
    }

    #[test]
    fn serializes_as_condition_keyed_map() {
        let result: AnalysisResult = [
            ConditionMetric::new(Condition::AcneSpots, 12.0).with_count(3),
            ConditionMetric::new(Condition::Oiliness, 40.0),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["acne_spots"]["value"], 12.0);
        assert_eq!(json["acne_spots"]["level"], "medium");
        assert_eq!(json["acne_spots"]["count"], 3);
        assert_eq!(json["oiliness"]["level"], "medium");
        assert!(json["oiliness"].get("count").is_none());

        let back: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn serialized_metric_carries_label() {
        let result: AnalysisResult = [
            ConditionMetric::new(Condition::Texture, 25.0),
            ConditionMetric::new(Condition::Redness, 5.0),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["texture"]["level"], "medium");
        assert_eq!(json["texture"]["label"], "moderate");
        assert_eq!(json["redness"]["label"], "low");

        let back: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn missing_values_use_default() {
        let result = AnalysisResult::new();
        assert!(result.is_empty());
        assert_eq!(result.value_or(Condition::Oiliness, 50.0), 50.0);
        assert_eq!(result.value(Condition::Redness), None);
    }
}
