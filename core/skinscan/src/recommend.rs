//! Static skincare advice keyed by skin type, extended by the concerns the
//! analysis flags.

use serde::{Deserialize, Serialize};

use crate::classify::SkinType;
use crate::metrics::{AnalysisResult, Condition};

/// Advice returned alongside every scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    /// Skin type the bundle was built for.
    pub skin_type: SkinType,
    /// Suggested product kinds.
    pub products: Vec<String>,
    /// Morning steps, in order.
    pub morning_routine: Vec<String>,
    /// Evening steps, in order.
    pub night_routine: Vec<String>,
    /// Diet advice.
    pub diet_tips: Vec<String>,
    /// Hydration advice.
    pub hydration_tips: Vec<String>,
    /// Type-specific tips, then concern tips; the generic list when both are empty.
    pub general_tips: Vec<String>,
}

struct BaseAdvice {
    products: &'static [&'static str],
    morning_routine: &'static [&'static str],
    night_routine: &'static [&'static str],
    diet_tips: &'static [&'static str],
    hydration_tips: &'static [&'static str],
    general_tips: &'static [&'static str],
}

const DRY: BaseAdvice = BaseAdvice {
    products: &[
        "Gentle hydrating cleanser",
        "Hyaluronic acid serum",
        "Rich moisturizer with ceramides",
        "SPF 30+ sunscreen",
        "Night cream with peptides",
    ],
    morning_routine: &[
        "Cleanse with gentle hydrating cleanser",
        "Apply hyaluronic acid serum",
        "Moisturize with rich cream",
        "Apply sunscreen (SPF 30+)",
    ],
    night_routine: &[
        "Remove makeup with oil-based cleanser",
        "Cleanse with gentle cleanser",
        "Apply hydrating serum",
        "Moisturize with night cream",
        "Use facial oil if needed",
    ],
    diet_tips: &[
        "Increase omega-3 fatty acids (fish, walnuts)",
        "Eat foods rich in vitamin E (nuts, seeds)",
        "Stay hydrated with 8+ glasses of water daily",
        "Include avocados and olive oil in your diet",
    ],
    hydration_tips: &[
        "Drink 8-10 glasses of water daily",
        "Use a humidifier in dry environments",
        "Avoid hot showers (use lukewarm water)",
        "Apply moisturizer immediately after washing",
    ],
    general_tips: &[],
};

const OILY: BaseAdvice = BaseAdvice {
    products: &[
        "Foaming cleanser with salicylic acid",
        "Oil-free moisturizer",
        "Niacinamide serum",
        "SPF 30+ non-comedogenic sunscreen",
        "Clay mask (2-3 times per week)",
    ],
    morning_routine: &[
        "Cleanse with foaming cleanser",
        "Apply niacinamide serum",
        "Moisturize with oil-free lotion",
        "Apply non-comedogenic sunscreen",
    ],
    night_routine: &[
        "Double cleanse (oil + water-based)",
        "Use BHA/AHA exfoliant (2-3 times/week)",
        "Apply lightweight moisturizer",
        "Spot treatment for acne if needed",
    ],
    diet_tips: &[
        "Reduce dairy and high-glycemic foods",
        "Increase green leafy vegetables",
        "Include zinc-rich foods (nuts, seeds)",
        "Limit processed and fried foods",
    ],
    hydration_tips: &[
        "Use oil-free, non-comedogenic products",
        "Don't skip moisturizer (use lightweight)",
        "Stay hydrated with water throughout the day",
        "Avoid over-washing (max 2x daily)",
    ],
    general_tips: &[],
};

const COMBINATION: BaseAdvice = BaseAdvice {
    products: &[
        "Balancing cleanser",
        "Lightweight moisturizer",
        "Vitamin C serum",
        "SPF 30+ sunscreen",
        "Exfoliating toner (for T-zone)",
    ],
    morning_routine: &[
        "Cleanse with balancing cleanser",
        "Apply vitamin C serum",
        "Moisturize (lighter on T-zone)",
        "Apply sunscreen",
    ],
    night_routine: &[
        "Double cleanse",
        "Use exfoliating toner on T-zone",
        "Apply serum",
        "Moisturize (adjust based on zone)",
    ],
    diet_tips: &[
        "Maintain balanced diet",
        "Stay hydrated",
        "Include antioxidants (berries, green tea)",
        "Moderate dairy intake",
    ],
    hydration_tips: &[
        "Use different products for different zones",
        "Moisturize dry areas more",
        "Keep T-zone matte",
        "Drink adequate water daily",
    ],
    general_tips: &[],
};

const SENSITIVE: BaseAdvice = BaseAdvice {
    products: &[
        "Gentle, fragrance-free cleanser",
        "Hypoallergenic moisturizer with ceramides",
        "Soothing serum (centella asiatica, niacinamide)",
        "Mineral sunscreen (zinc oxide, titanium dioxide)",
        "Calming face mask (aloe vera, chamomile)",
    ],
    morning_routine: &[
        "Cleanse with gentle, lukewarm water",
        "Apply soothing serum",
        "Moisturize with hypoallergenic cream",
        "Apply mineral sunscreen (SPF 30+)",
    ],
    night_routine: &[
        "Remove makeup with gentle micellar water",
        "Cleanse with gentle cleanser",
        "Apply calming serum",
        "Moisturize with barrier-repair cream",
        "Avoid active ingredients on irritated days",
    ],
    diet_tips: &[
        "Avoid inflammatory foods (processed, high sugar)",
        "Include anti-inflammatory foods (omega-3, turmeric)",
        "Stay hydrated with water",
        "Consider probiotics for skin health",
        "Limit alcohol and spicy foods",
    ],
    hydration_tips: &[
        "Use lukewarm water (never hot)",
        "Pat dry gently, don't rub",
        "Apply products immediately after cleansing",
        "Test new products on small area first",
        "Avoid harsh exfoliants and fragrances",
        "Use products with minimal ingredients",
    ],
    general_tips: &[
        "Patch test all new products for 48 hours",
        "Avoid products with alcohol, fragrance, and harsh acids",
        "Use gentle, pH-balanced products",
        "Protect skin from extreme temperatures",
        "Consider consulting a dermatologist for persistent issues",
    ],
};

const NORMAL: BaseAdvice = BaseAdvice {
    products: &[
        "Gentle cleanser",
        "Balanced moisturizer",
        "Antioxidant serum",
        "SPF 30+ sunscreen",
        "Weekly exfoliant",
    ],
    morning_routine: &[
        "Cleanse with gentle cleanser",
        "Apply antioxidant serum",
        "Moisturize",
        "Apply sunscreen",
    ],
    night_routine: &[
        "Remove makeup",
        "Cleanse",
        "Apply serum",
        "Moisturize",
        "Weekly exfoliation",
    ],
    diet_tips: &[
        "Maintain healthy balanced diet",
        "Include variety of fruits and vegetables",
        "Stay hydrated",
        "Limit processed foods",
    ],
    hydration_tips: &[
        "Maintain consistent routine",
        "Drink 8 glasses of water daily",
        "Protect from sun exposure",
        "Get adequate sleep",
    ],
    general_tips: &[],
};

/// Extra general tips appended when a condition's value exceeds the bound.
const CONCERN_TIPS: [(Condition, f64, [&str; 3]); 4] = [
    (
        Condition::AcneSpots,
        15.0,
        [
            "Consider salicylic acid or benzoyl peroxide for acne",
            "Avoid touching your face frequently",
            "Change pillowcases regularly",
        ],
    ),
    (
        Condition::DarkCircles,
        20.0,
        [
            "Get 7-9 hours of sleep nightly",
            "Use eye cream with caffeine or retinol",
            "Apply cold compresses to reduce puffiness",
        ],
    ),
    (
        Condition::Redness,
        15.0,
        [
            "Use gentle, fragrance-free products",
            "Avoid hot water and harsh exfoliants",
            "Consider products with niacinamide or centella asiatica",
        ],
    ),
    (
        Condition::UnevenTone,
        20.0,
        [
            "Use vitamin C serum in the morning",
            "Apply retinol at night (start slow)",
            "Always use sunscreen to prevent further darkening",
        ],
    ),
];

/// Used when neither the base entry nor any concern contributed a tip.
const FALLBACK_TIPS: [&str; 5] = [
    "Maintain consistent skincare routine",
    "Always wear sunscreen",
    "Stay hydrated",
    "Get adequate sleep",
    "Eat a balanced diet",
];

fn base_advice(skin_type: SkinType) -> &'static BaseAdvice {
    match skin_type {
        SkinType::Dry => &DRY,
        SkinType::Oily => &OILY,
        SkinType::Combination => &COMBINATION,
        SkinType::Sensitive => &SENSITIVE,
        SkinType::Normal => &NORMAL,
    }
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

/// Build the advice bundle for `skin_type`, adding concern tips for every
/// metric in `analysis` above its bound.
pub fn recommend(skin_type: SkinType, analysis: &AnalysisResult) -> RecommendationBundle {
    let base = base_advice(skin_type);

    let mut general_tips = owned(base.general_tips);
    for (condition, bound, tips) in &CONCERN_TIPS {
        if analysis.value_or(*condition, 0.0) > *bound {
            general_tips.extend(tips.iter().map(|tip| tip.to_string()));
        }
    }
    if general_tips.is_empty() {
        general_tips = owned(&FALLBACK_TIPS);
    }

    RecommendationBundle {
        skin_type,
        products: owned(base.products),
        morning_routine: owned(base.morning_routine),
        night_routine: owned(base.night_routine),
        diet_tips: owned(base.diet_tips),
        hydration_tips: owned(base.hydration_tips),
        general_tips,
    }
}
