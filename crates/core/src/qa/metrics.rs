use serde::{Deserialize, Serialize};

use crate::qa::price::ProductPriceSample;
use crate::qa::{round_to, PROFITABLE_THRESHOLD};

/// Share of the selling price assumed to be cost of goods.
pub const ESTIMATED_COST_RATIO: f64 = 0.70;
/// Per-product breakdown lists keep at most this many entries.
pub const MAX_PRODUCT_BREAKDOWN: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductMargin {
    pub asin: String,
    pub title: String,
    pub price: f64,
    pub estimated_cost: f64,
    pub margin_percent: f64,
    pub profit: f64,
}

/// Aggregate profit statistics for one analysis run.
///
/// `ProfitMetrics::default()` is the empty result returned when no product
/// carried a usable price.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitMetrics {
    pub margin_percent: f64,
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub median_price: f64,
    pub estimated_cost: f64,
    pub profit_per_unit: f64,
    /// Currently identical to `margin_percent`.
    pub roi_percent: f64,
    pub break_even_price: f64,
    pub product_count: u32,
    pub profitable_count: u32,
    pub unprofitable_count: u32,
    /// Fraction in `[0, 1]`.
    pub profitability_ratio: f64,
    pub price_range: f64,
    pub price_volatility_percent: f64,
    pub profitable_products: Vec<ProductMargin>,
    pub unprofitable_products: Vec<ProductMargin>,
}

impl ProductMargin {
    pub fn is_finite(&self) -> bool {
        [self.price, self.estimated_cost, self.margin_percent, self.profit]
            .iter()
            .all(|value| value.is_finite())
    }
}

impl ProfitMetrics {
    pub fn is_empty(&self) -> bool {
        self.product_count == 0
    }

    /// False when any figure overflowed. Such metrics cannot be encoded as
    /// JSON numbers.
    pub fn is_finite(&self) -> bool {
        let scalars = [
            self.margin_percent,
            self.average_price,
            self.min_price,
            self.max_price,
            self.median_price,
            self.estimated_cost,
            self.profit_per_unit,
            self.roi_percent,
            self.break_even_price,
            self.profitability_ratio,
            self.price_range,
            self.price_volatility_percent,
        ];
        scalars.iter().all(|value| value.is_finite())
            && self.profitable_products.iter().all(ProductMargin::is_finite)
            && self.unprofitable_products.iter().all(ProductMargin::is_finite)
    }
}

pub trait MetricsEngine: Send + Sync {
    fn compute(&self, samples: &[ProductPriceSample]) -> ProfitMetrics;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicMetricsEngine;

impl MetricsEngine for DeterministicMetricsEngine {
    fn compute(&self, samples: &[ProductPriceSample]) -> ProfitMetrics {
        compute_samples(samples)
    }
}

pub fn product_margin(sample: &ProductPriceSample) -> ProductMargin {
    let (estimated_cost, margin_percent) = margin_for(sample.price_amount);
    ProductMargin {
        asin: sample.asin.clone(),
        title: sample.title.clone(),
        price: sample.price_amount,
        estimated_cost: round_to(estimated_cost, 2),
        margin_percent: round_to(margin_percent, 2),
        profit: round_to(sample.price_amount - estimated_cost, 2),
    }
}

/// Returns `(estimated_cost, margin_percent)` for a single positive price.
pub fn margin_for(price: f64) -> (f64, f64) {
    let estimated_cost = price * ESTIMATED_COST_RATIO;
    let margin = if price > 0.0 { (price - estimated_cost) / price * 100.0 } else { 0.0 };
    (estimated_cost, margin)
}

/// Metrics over bare prices. Titles and ASINs in the breakdown are empty.
pub fn compute(prices: &[f64]) -> ProfitMetrics {
    let samples = prices
        .iter()
        .map(|price| ProductPriceSample {
            asin: String::new(),
            title: String::new(),
            price_amount: *price,
            brand: String::new(),
        })
        .collect::<Vec<_>>();
    compute_samples(&samples)
}

pub fn compute_samples(samples: &[ProductPriceSample]) -> ProfitMetrics {
    let samples = samples
        .iter()
        .filter(|sample| sample.price_amount.is_finite() && sample.price_amount > 0.0)
        .collect::<Vec<_>>();
    if samples.is_empty() {
        return ProfitMetrics::default();
    }

    let mut profitable_count = 0u32;
    let mut unprofitable_count = 0u32;
    let mut profitable_products = Vec::new();
    let mut unprofitable_products = Vec::new();

    for sample in &samples {
        let (_, margin) = margin_for(sample.price_amount);
        if margin >= PROFITABLE_THRESHOLD {
            profitable_count += 1;
            if profitable_products.len() < MAX_PRODUCT_BREAKDOWN {
                profitable_products.push(product_margin(sample));
            }
        } else {
            unprofitable_count += 1;
            if unprofitable_products.len() < MAX_PRODUCT_BREAKDOWN {
                unprofitable_products.push(product_margin(sample));
            }
        }
    }

    let prices = samples.iter().map(|sample| sample.price_amount).collect::<Vec<_>>();
    let count = prices.len();
    let average_price = prices.iter().sum::<f64>() / count as f64;
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut sorted = prices.clone();
    sorted.sort_by(f64::total_cmp);
    let median_price = sorted[count / 2];

    let (estimated_cost, margin_percent) = margin_for(average_price);
    let profitability_ratio = f64::from(profitable_count) / count as f64;

    let metrics = ProfitMetrics {
        margin_percent: round_to(margin_percent, 2),
        average_price: round_to(average_price, 2),
        min_price: round_to(min_price, 2),
        max_price: round_to(max_price, 2),
        median_price: round_to(median_price, 2),
        estimated_cost: round_to(estimated_cost, 2),
        profit_per_unit: round_to(average_price - estimated_cost, 2),
        roi_percent: round_to(margin_percent, 2),
        break_even_price: round_to(estimated_cost, 2),
        product_count: profitable_count + unprofitable_count,
        profitable_count,
        unprofitable_count,
        profitability_ratio: round_to(profitability_ratio, 4),
        price_range: round_to(max_price - min_price, 2),
        price_volatility_percent: price_volatility(&prices),
        profitable_products,
        unprofitable_products,
    };

    if !metrics.is_finite() {
        tracing::warn!(
            event_name = "qa.metrics.overflow",
            products = count,
            "price aggregates overflowed; returning empty metrics"
        );
        return ProfitMetrics::default();
    }
    metrics
}

/// Coefficient of variation (population standard deviation over mean) as a
/// percentage, rounded to 2 decimals.
pub fn price_volatility(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let count = prices.len() as f64;
    let mean = prices.iter().sum::<f64>() / count;
    if mean <= 0.0 || !mean.is_finite() {
        return 0.0;
    }

    let variance = prices.iter().map(|price| (price - mean).powi(2)).sum::<f64>() / count;
    let volatility = round_to(variance.sqrt() / mean * 100.0, 2);
    if volatility.is_finite() {
        volatility
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{compute, compute_samples, price_volatility, ProfitMetrics, MAX_PRODUCT_BREAKDOWN};
    use crate::qa::price::ProductPriceSample;

    #[test]
    fn empty_price_list_yields_the_zero_sentinel() {
        let first = compute(&[]);
        let second = compute(&[]);

        assert_eq!(first, ProfitMetrics::default());
        assert_eq!(first, second);
        assert!(first.is_empty());
        assert!(first.profitable_products.is_empty());
    }

    #[test]
    fn aggregates_follow_the_fixed_cost_model() {
        let metrics = compute(&[10.0, 20.0, 30.0, 40.0]);

        assert_eq!(metrics.product_count, 4);
        assert_eq!(metrics.average_price, 25.0);
        assert_eq!(metrics.min_price, 10.0);
        assert_eq!(metrics.max_price, 40.0);
        assert_eq!(metrics.median_price, 30.0, "lower index len/2 of sorted list");
        assert_eq!(metrics.estimated_cost, 17.5);
        assert_eq!(metrics.break_even_price, 17.5);
        assert_eq!(metrics.profit_per_unit, 7.5);
        assert_eq!(metrics.margin_percent, 30.0);
        assert_eq!(metrics.roi_percent, metrics.margin_percent);
        assert_eq!(metrics.price_range, 30.0);
        assert_eq!(metrics.profitability_ratio, 1.0);
    }

    #[test]
    fn counts_partition_the_product_count() {
        let prices = (1..=37).map(|value| f64::from(value) * 3.5).collect::<Vec<_>>();
        let metrics = compute(&prices);

        assert_eq!(metrics.product_count, 37);
        assert_eq!(metrics.profitable_count + metrics.unprofitable_count, metrics.product_count);
        assert!(metrics.profitable_products.len() <= MAX_PRODUCT_BREAKDOWN);
        assert!(metrics.unprofitable_products.len() <= MAX_PRODUCT_BREAKDOWN);
    }

    #[test]
    fn breakdown_keeps_first_entries_in_input_order() {
        let samples = (0..15)
            .map(|index| ProductPriceSample {
                asin: format!("B{index:03}"),
                title: format!("Item {index}"),
                price_amount: 100.0 - f64::from(index),
                brand: "Acme".to_string(),
            })
            .collect::<Vec<_>>();
        let metrics = compute_samples(&samples);

        let asins = metrics
            .profitable_products
            .iter()
            .map(|product| product.asin.as_str())
            .collect::<Vec<_>>();
        assert_eq!(asins.len(), MAX_PRODUCT_BREAKDOWN);
        assert_eq!(asins.first().copied(), Some("B000"));
        assert_eq!(asins.last().copied(), Some("B009"));
        assert_eq!(metrics.profitable_products[0].estimated_cost, 70.0);
        assert_eq!(metrics.profitable_products[0].profit, 30.0);
    }

    #[test]
    fn volatility_guards_degenerate_inputs() {
        assert_eq!(price_volatility(&[10.0, 10.0, 10.0]), 0.0);
        assert_eq!(price_volatility(&[]), 0.0);
        assert_eq!(price_volatility(&[5.0]), 0.0);
        assert_eq!(price_volatility(&[10.0, 30.0]), 50.0);
    }

    #[test]
    fn metrics_survive_a_json_round_trip() {
        let metrics = compute(&[12.0, 18.5, 44.99]);
        let encoded = serde_json::to_value(&metrics).expect("metrics serialize");
        let decoded: ProfitMetrics = serde_json::from_value(encoded).expect("metrics deserialize");

        assert_eq!(decoded, metrics);
    }

    #[test]
    fn a_single_huge_price_keeps_finite_aggregates() {
        let metrics = compute(&[5.0e306]);

        assert!(metrics.is_finite());
        assert_eq!(metrics.product_count, 1);
        assert_eq!(metrics.min_price, 5.0e306);
        assert_eq!(metrics.max_price, 5.0e306);

        let encoded = serde_json::to_string(&metrics).expect("metrics serialize");
        let decoded: ProfitMetrics = serde_json::from_str(&encoded).expect("metrics deserialize");
        assert!(decoded.is_finite());
        assert_eq!(decoded.product_count, 1);
    }

    #[test]
    fn overflowing_aggregates_fall_back_to_the_zero_sentinel() {
        let metrics = compute(&[f64::MAX, f64::MAX, 12.0]);

        assert_eq!(metrics, ProfitMetrics::default());
        assert!(metrics.is_finite());
    }

    #[test]
    fn volatility_of_overflowing_prices_is_zero() {
        assert_eq!(price_volatility(&[f64::MAX, 1.0]), 0.0);
    }
}
