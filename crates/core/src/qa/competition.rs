//! Competition scoring.
//!
//! Five independently bounded factors are summed and clamped to 100. A higher
//! score means an easier market, so the level reads inverted: 80+ is low
//! competition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::brand::Brand;
use crate::qa::price::ProductRecord;

pub const MAX_COMPETITION_SCORE: u32 = 100;
/// Stand-in until profitability feeds into the score.
pub const PROFITABILITY_FACTOR_SCORE: u32 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionFactor {
    CatalogSize,
    PricePositioning,
    BrandPresence,
    Profitability,
    MarketBreadth,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScore {
    pub score: u32,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompetitionLevel {
    #[serde(rename = "Low Competition")]
    Low,
    #[serde(rename = "Moderate Competition")]
    Moderate,
    #[serde(rename = "High Competition")]
    High,
    #[serde(rename = "Very High Competition")]
    VeryHigh,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl CompetitionLevel {
    pub const ALL: [Self; 5] = [Self::Low, Self::Moderate, Self::High, Self::VeryHigh, Self::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low Competition",
            Self::Moderate => "Moderate Competition",
            Self::High => "High Competition",
            Self::VeryHigh => "Very High Competition",
            Self::Unknown => "Unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == value.trim())
    }

    pub fn for_score(score: u32) -> Self {
        match score {
            80.. => Self::Low,
            60..=79 => Self::Moderate,
            40..=59 => Self::High,
            _ => Self::VeryHigh,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionScore {
    pub score: u32,
    pub level: CompetitionLevel,
    pub factors: BTreeMap<CompetitionFactor, FactorScore>,
}

impl CompetitionScore {
    pub fn unknown() -> Self {
        Self { score: 0, level: CompetitionLevel::Unknown, factors: BTreeMap::new() }
    }
}

/// The brand fields that contribute to the presence factor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BrandPresence {
    pub domain: Option<String>,
    pub email: Option<String>,
    pub social_media: BTreeMap<String, String>,
}

impl From<&Brand> for BrandPresence {
    fn from(brand: &Brand) -> Self {
        Self {
            domain: brand.domain.clone(),
            email: brand.email.clone(),
            social_media: brand.social_media.clone(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("average price is not finite ({0})")]
    NonFiniteAverage(f64),
}

pub trait CompetitionScorer: Send + Sync {
    fn score(&self, presence: &BrandPresence, products: &[ProductRecord]) -> CompetitionScore;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedCompetitionScorer;

impl CompetitionScorer for WeightedCompetitionScorer {
    fn score(&self, presence: &BrandPresence, products: &[ProductRecord]) -> CompetitionScore {
        score(presence, products)
    }
}

/// Scores a brand, falling back to the `Unknown` sentinel on failure.
pub fn score(presence: &BrandPresence, products: &[ProductRecord]) -> CompetitionScore {
    match try_score(presence, products) {
        Ok(score) => score,
        Err(error) => {
            tracing::warn!(
                event_name = "qa.competition.failed",
                error = %error,
                "competition scoring failed; returning unknown"
            );
            CompetitionScore::unknown()
        }
    }
}

pub fn try_score(
    presence: &BrandPresence,
    products: &[ProductRecord],
) -> Result<CompetitionScore, ScoringError> {
    let mut factors = BTreeMap::new();
    let product_count = products.len();

    let catalog = match product_count {
        20.. => 25,
        10..=19 => 15,
        5..=9 => 10,
        _ => 5,
    };
    factors.insert(
        CompetitionFactor::CatalogSize,
        FactorScore { score: catalog, reason: format!("{product_count} products found") },
    );

    let prices = products.iter().filter_map(ProductRecord::resolved_amount).collect::<Vec<_>>();
    if !prices.is_empty() {
        let average = prices.iter().sum::<f64>() / prices.len() as f64;
        if !average.is_finite() {
            return Err(ScoringError::NonFiniteAverage(average));
        }
        let factor = if (15.0..=50.0).contains(&average) {
            FactorScore { score: 20, reason: format!("Optimal price range: ${average:.2}") }
        } else if (10.0..=100.0).contains(&average) {
            FactorScore { score: 15, reason: format!("Good price range: ${average:.2}") }
        } else {
            FactorScore { score: 10, reason: format!("Price range: ${average:.2}") }
        };
        factors.insert(CompetitionFactor::PricePositioning, factor);
    }

    factors.insert(
        CompetitionFactor::BrandPresence,
        FactorScore { score: brand_presence_score(presence), reason: "Brand visibility".to_string() },
    );

    factors.insert(
        CompetitionFactor::Profitability,
        FactorScore {
            score: PROFITABILITY_FACTOR_SCORE,
            reason: "Profitability analysis".to_string(),
        },
    );

    let breadth = match product_count {
        15.. => FactorScore { score: 15, reason: "Strong market presence".to_string() },
        5..=14 => FactorScore { score: 10, reason: "Moderate market presence".to_string() },
        _ => FactorScore { score: 5, reason: "Limited market presence".to_string() },
    };
    factors.insert(CompetitionFactor::MarketBreadth, breadth);

    let total = factors.values().map(|factor| factor.score).sum::<u32>().min(MAX_COMPETITION_SCORE);

    Ok(CompetitionScore { score: total, level: CompetitionLevel::for_score(total), factors })
}

fn brand_presence_score(presence: &BrandPresence) -> u32 {
    let mut score = 0;
    if presence.domain.as_deref().is_some_and(|domain| domain.starts_with("http")) {
        score += 5;
    }
    if presence.email.as_deref().is_some_and(|email| !email.trim().is_empty()) {
        score += 5;
    }
    let social_links =
        presence.social_media.values().filter(|url| !url.trim().is_empty()).count() as u32;
    score + (social_links * 2).min(10)
}
