//! Price extraction.
//!
//! Product feeds report prices either as a bare number or as an
//! `{amount, currency}` object, and frequently omit them. Records are
//! resolved once into [`Price`] at ingestion; everything downstream only
//! sees positive `f64` amounts.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Structured { amount: f64, currency: String },
}

impl Price {
    pub fn amount(&self) -> f64 {
        match self {
            Self::Amount(amount) | Self::Structured { amount, .. } => *amount,
        }
    }
}

/// A raw product as returned by a price source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub asin: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<Price>,
    #[serde(default)]
    pub brand: String,
    #[serde(default = "unknown_availability")]
    pub availability: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ProductRecord {
    /// The record's amount when it is usable for analysis.
    pub fn resolved_amount(&self) -> Option<f64> {
        self.price.as_ref().map(Price::amount).and_then(resolve_amount)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductPriceSample {
    pub asin: String,
    pub title: String,
    pub price_amount: f64,
    pub brand: String,
}

fn unknown_availability() -> String {
    "Unknown".to_string()
}

fn resolve_amount(amount: f64) -> Option<f64> {
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

// Malformed prices degrade to `None` instead of failing the whole record.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<Price>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(price_from_value))
}

fn price_from_value(value: &Value) -> Option<Price> {
    match value {
        Value::Number(number) => number.as_f64().map(Price::Amount),
        Value::String(text) => text.trim().parse::<f64>().ok().map(Price::Amount),
        Value::Object(map) => {
            let amount = match map.get("amount")? {
                Value::Number(number) => number.as_f64()?,
                Value::String(text) => text.trim().parse::<f64>().ok()?,
                _ => return None,
            };
            let currency = map
                .get("currency")
                .and_then(Value::as_str)
                .unwrap_or("USD")
                .to_string();
            Some(Price::Structured { amount, currency })
        }
        _ => None,
    }
}

/// Positive prices in input order. Records without one are dropped.
pub fn extract_prices(products: &[ProductRecord]) -> Vec<f64> {
    products.iter().filter_map(ProductRecord::resolved_amount).collect()
}

pub fn extract_samples(products: &[ProductRecord]) -> Vec<ProductPriceSample> {
    products
        .iter()
        .filter_map(|product| {
            product.resolved_amount().map(|price_amount| ProductPriceSample {
                asin: product.asin.clone(),
                title: product.title.clone(),
                price_amount,
                brand: product.brand.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_prices, extract_samples, Price, ProductRecord};

    fn records(value: serde_json::Value) -> Vec<ProductRecord> {
        serde_json::from_value(value).expect("fixture records should deserialize")
    }

    #[test]
    fn structured_and_scalar_prices_are_both_resolved() {
        let products = records(json!([
            {"asin": "A1", "title": "Mug", "price": {"amount": 19.99, "currency": "USD"}},
            {"asin": "A2", "title": "Cup", "price": 12.5},
            {"asin": "A3", "title": "Jar", "price": "8.25"},
        ]));

        assert_eq!(extract_prices(&products), vec![19.99, 12.5, 8.25]);
        assert_eq!(
            products[0].price,
            Some(Price::Structured { amount: 19.99, currency: "USD".to_string() })
        );
    }

    #[test]
    fn missing_zero_and_malformed_prices_are_dropped_silently() {
        let products = records(json!([
            {"asin": "A1", "title": "No price"},
            {"asin": "A2", "title": "Zero", "price": 0},
            {"asin": "A3", "title": "Negative", "price": {"amount": -4.0}},
            {"asin": "A4", "title": "Text", "price": "call for price"},
            {"asin": "A5", "title": "Empty object", "price": {}},
            {"asin": "A6", "title": "Null", "price": null},
            {"asin": "A7", "title": "Kept", "price": {"amount": "14.00", "currency": "EUR"}},
        ]));

        assert_eq!(products.len(), 7);
        let samples = extract_samples(&products);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].asin, "A7");
        assert_eq!(samples[0].price_amount, 14.0);
    }

    #[test]
    fn availability_defaults_to_unknown() {
        let products = records(json!([{"asin": "A1"}]));
        assert_eq!(products[0].availability, "Unknown");
        assert_eq!(products[0].resolved_amount(), None);
    }
}
