use serde::{Deserialize, Serialize};

use crate::qa::metrics::margin_for;
use crate::qa::{round_to, HIGHLY_PROFITABLE_THRESHOLD, MARGINAL_THRESHOLD, PROFITABLE_THRESHOLD};

/// Ratio at or above which a marginal brand is upgraded to profitable.
pub const HIGH_RATIO_THRESHOLD: f64 = 0.70;
/// Ratio below which profitable and marginal brands are downgraded.
pub const LOW_RATIO_THRESHOLD: f64 = 0.30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitabilityStatus {
    HighlyProfitable,
    Profitable,
    Marginal,
    Unprofitable,
    Unknown,
}

impl ProfitabilityStatus {
    pub const ALL: [Self; 5] = [
        Self::HighlyProfitable,
        Self::Profitable,
        Self::Marginal,
        Self::Unprofitable,
        Self::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighlyProfitable => "highly_profitable",
            Self::Profitable => "profitable",
            Self::Marginal => "marginal",
            Self::Unprofitable => "unprofitable",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value.trim())
    }

    /// 1 is best, 5 is unknown.
    pub fn priority(self) -> u8 {
        match self {
            Self::HighlyProfitable => 1,
            Self::Profitable => 2,
            Self::Marginal => 3,
            Self::Unprofitable => 4,
            Self::Unknown => 5,
        }
    }

    pub fn color(self) -> ProfitabilityColor {
        match self {
            Self::HighlyProfitable => ProfitabilityColor::Green,
            Self::Profitable => ProfitabilityColor::LightGreen,
            Self::Marginal => ProfitabilityColor::Yellow,
            Self::Unprofitable => ProfitabilityColor::Red,
            Self::Unknown => ProfitabilityColor::Gray,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::HighlyProfitable => "Highly Profitable",
            Self::Profitable => "Profitable",
            Self::Marginal => "Marginal",
            Self::Unprofitable => "Not Profitable",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_profitable(self) -> bool {
        matches!(self, Self::HighlyProfitable | Self::Profitable)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfitabilityColor {
    Green,
    LightGreen,
    Yellow,
    Red,
    Gray,
}

impl ProfitabilityColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::LightGreen => "lightgreen",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Gray => "gray",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitabilityClassification {
    pub status: ProfitabilityStatus,
    pub color: ProfitabilityColor,
    pub label: String,
    pub priority: u8,
}

impl ProfitabilityClassification {
    fn from_status(status: ProfitabilityStatus, label: &str) -> Self {
        Self { status, color: status.color(), label: label.to_string(), priority: status.priority() }
    }

    pub fn unknown() -> Self {
        Self::from_status(ProfitabilityStatus::Unknown, ProfitabilityStatus::Unknown.label())
    }
}

/// Number of products per color. Products without a usable price are gray.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSummary {
    pub green: u32,
    pub lightgreen: u32,
    pub yellow: u32,
    pub red: u32,
    pub gray: u32,
}

impl ColorSummary {
    pub fn record(&mut self, color: ProfitabilityColor) {
        match color {
            ProfitabilityColor::Green => self.green += 1,
            ProfitabilityColor::LightGreen => self.lightgreen += 1,
            ProfitabilityColor::Yellow => self.yellow += 1,
            ProfitabilityColor::Red => self.red += 1,
            ProfitabilityColor::Gray => self.gray += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.green + self.lightgreen + self.yellow + self.red + self.gray
    }
}

pub trait ProfitabilityClassifier: Send + Sync {
    fn classify(&self, margin_percent: f64, profitability_ratio: f64) -> ProfitabilityClassification;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TieredProfitabilityClassifier;

impl ProfitabilityClassifier for TieredProfitabilityClassifier {
    fn classify(&self, margin_percent: f64, profitability_ratio: f64) -> ProfitabilityClassification {
        classify(margin_percent, profitability_ratio)
    }
}

fn base_tier(margin_percent: f64) -> ProfitabilityStatus {
    if margin_percent >= HIGHLY_PROFITABLE_THRESHOLD {
        ProfitabilityStatus::HighlyProfitable
    } else if margin_percent >= PROFITABLE_THRESHOLD {
        ProfitabilityStatus::Profitable
    } else if margin_percent >= MARGINAL_THRESHOLD {
        ProfitabilityStatus::Marginal
    } else {
        ProfitabilityStatus::Unprofitable
    }
}

/// Brand-level classification: margin tier, then ratio overrides. Color and
/// priority always follow the final status.
pub fn classify(margin_percent: f64, profitability_ratio: f64) -> ProfitabilityClassification {
    if !margin_percent.is_finite() || !profitability_ratio.is_finite() {
        tracing::warn!(
            event_name = "qa.classify.invalid_input",
            margin_percent,
            profitability_ratio,
            "classification input is not finite; returning unknown"
        );
        return ProfitabilityClassification::unknown();
    }

    let base = base_tier(margin_percent);

    if profitability_ratio >= HIGH_RATIO_THRESHOLD && base == ProfitabilityStatus::Marginal {
        return ProfitabilityClassification::from_status(
            ProfitabilityStatus::Profitable,
            "Profitable (High Ratio)",
        );
    }

    if profitability_ratio < LOW_RATIO_THRESHOLD
        && matches!(base, ProfitabilityStatus::Profitable | ProfitabilityStatus::Marginal)
    {
        return ProfitabilityClassification::from_status(
            ProfitabilityStatus::Unprofitable,
            "Not Profitable (Low Ratio)",
        );
    }

    ProfitabilityClassification::from_status(base, base.label())
}

/// Per-product classification from the margin tier alone; `None` means the
/// product had no usable price.
pub fn classify_product(price: Option<f64>) -> ProfitabilityClassification {
    match price.filter(|amount| amount.is_finite() && *amount > 0.0) {
        Some(amount) => {
            let (_, margin) = margin_for(amount);
            let status = base_tier(round_to(margin, 2));
            ProfitabilityClassification::from_status(status, status.label())
        }
        None => ProfitabilityClassification::from_status(ProfitabilityStatus::Unknown, "Price Unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        classify, classify_product, ColorSummary, ProfitabilityColor, ProfitabilityStatus,
    };

    #[test]
    fn margin_tier_wins_outright_when_highly_profitable() {
        let result = classify(35.0, 0.9);
        assert_eq!(result.status, ProfitabilityStatus::HighlyProfitable);
        assert_eq!(result.color, ProfitabilityColor::Green);
        assert_eq!(result.priority, 1);

        let low_ratio = classify(35.0, 0.1);
        assert_eq!(low_ratio.status, ProfitabilityStatus::HighlyProfitable);
    }

    #[test]
    fn marginal_brand_with_high_ratio_is_upgraded() {
        let result = classify(10.0, 0.75);
        assert_eq!(result.status, ProfitabilityStatus::Profitable);
        assert_eq!(result.color, ProfitabilityColor::LightGreen);
        assert_eq!(result.label, "Profitable (High Ratio)");
        assert_eq!(result.priority, 2);
    }

    #[test]
    fn profitable_brand_with_low_ratio_is_downgraded() {
        let result = classify(20.0, 0.2);
        assert_eq!(result.status, ProfitabilityStatus::Unprofitable);
        assert_eq!(result.color, ProfitabilityColor::Red);
        assert_eq!(result.label, "Not Profitable (Low Ratio)");
        assert_eq!(result.priority, 4);

        assert_eq!(classify(7.0, 0.1).status, ProfitabilityStatus::Unprofitable);
    }

    #[test]
    fn base_tiers_apply_between_ratio_overrides() {
        assert_eq!(classify(30.0, 0.5).status, ProfitabilityStatus::HighlyProfitable);
        assert_eq!(classify(15.0, 0.5).status, ProfitabilityStatus::Profitable);
        assert_eq!(classify(5.0, 0.5).status, ProfitabilityStatus::Marginal);
        assert_eq!(classify(4.99, 0.5).status, ProfitabilityStatus::Unprofitable);
        assert_eq!(classify(4.0, 0.95).status, ProfitabilityStatus::Unprofitable);
    }

    #[test]
    fn non_finite_input_falls_back_to_unknown() {
        let result = classify(f64::NAN, 0.5);
        assert_eq!(result.status, ProfitabilityStatus::Unknown);
        assert_eq!(result.color, ProfitabilityColor::Gray);
        assert_eq!(result.priority, 5);
    }

    #[test]
    fn products_without_price_are_gray() {
        let mut summary = ColorSummary::default();
        for price in [Some(25.0), None, Some(0.0), Some(12.0)] {
            summary.record(classify_product(price).color);
        }

        assert_eq!(summary.green, 2);
        assert_eq!(summary.gray, 2);
        assert_eq!(summary.total(), 4);
        assert_eq!(classify_product(None).label, "Price Unknown");
    }

    #[test]
    fn status_strings_parse_back() {
        for status in ProfitabilityStatus::ALL {
            assert_eq!(ProfitabilityStatus::parse(status.as_str()), Some(status));
        }
    }
}
