use serde::{Deserialize, Serialize};

use crate::qa::{HIGHLY_PROFITABLE_THRESHOLD, MARGINAL_THRESHOLD, PROFITABLE_THRESHOLD};

/// Minimum competition score for the top recommendation.
pub const HIGHLY_RECOMMENDED_MIN_SCORE: u32 = 70;
pub const RECOMMENDED_MIN_SCORE: u32 = 60;
/// Profitability ratio (0..=1) required for the top recommendation.
pub const HIGHLY_RECOMMENDED_MIN_RATIO: f64 = 0.70;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    HighlyRecommended,
    Recommended,
    Consider,
    NotRecommended,
}

impl Recommendation {
    pub fn message(self) -> &'static str {
        match self {
            Self::HighlyRecommended => {
                "Highly Recommended - High profitability with low competition and strong product portfolio"
            }
            Self::Recommended => "Recommended - Good profitability with manageable competition",
            Self::Consider => {
                "Consider - Marginal profitability, review pricing strategy and cost structure"
            }
            Self::NotRecommended => {
                "Not Recommended - Low profitability or high competition. Consider alternative brands or pricing adjustments"
            }
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// `profitability_ratio` is a fraction in `[0, 1]`.
pub fn recommend(margin_percent: f64, score: u32, profitability_ratio: f64) -> Recommendation {
    if margin_percent >= HIGHLY_PROFITABLE_THRESHOLD
        && score >= HIGHLY_RECOMMENDED_MIN_SCORE
        && profitability_ratio >= HIGHLY_RECOMMENDED_MIN_RATIO
    {
        Recommendation::HighlyRecommended
    } else if margin_percent >= PROFITABLE_THRESHOLD && score >= RECOMMENDED_MIN_SCORE {
        Recommendation::Recommended
    } else if margin_percent >= MARGINAL_THRESHOLD {
        Recommendation::Consider
    } else {
        Recommendation::NotRecommended
    }
}
