use crate::metrics::{round2, AnalysisResult, Condition};

/// Penalty weight and cap per condition.
const PENALTIES: [(Condition, f64, f64); 4] = [
    (Condition::AcneSpots, 0.3, 30.0),
    (Condition::DarkCircles, 0.2, 20.0),
    (Condition::Redness, 0.15, 15.0),
    (Condition::UnevenTone, 0.15, 15.0),
];

/// Weight of the uncapped oiliness/dryness imbalance penalty.
const BALANCE_WEIGHT: f64 = 0.1;

/// Oiliness and dryness assumed when either was not measured.
const NEUTRAL_BALANCE: f64 = 50.0;

/// Overall skin health in 0..=100, higher is healthier.
///
/// An empty analysis scores exactly 0, which callers read as "no analysis
/// was possible".
pub fn health_score(analysis: &AnalysisResult) -> f64 {
    if analysis.is_empty() {
        return 0.0;
    }

    let capped: f64 = PENALTIES
        .iter()
        .map(|&(condition, weight, cap)| (analysis.value_or(condition, 0.0) * weight).min(cap))
        .sum();

    let oiliness = analysis.value_or(Condition::Oiliness, NEUTRAL_BALANCE);
    let dryness = analysis.value_or(Condition::Dryness, NEUTRAL_BALANCE);
    let balance = (oiliness - dryness).abs() * BALANCE_WEIGHT;

    round2((100.0 - capped - balance).clamp(0.0, 100.0))
}
