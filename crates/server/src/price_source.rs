//! HTTP product price source. Any transport, status or decode failure is
//! logged and turned into an empty product list.

use std::time::Duration;

use async_trait::async_trait;
use leadgen_core::config::PriceSourceConfig;
use leadgen_core::qa::price::ProductRecord;
use leadgen_core::source::ProductPriceSource;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub struct HttpPriceSource {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    item_count: u32,
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    asins: &'a [String],
}

#[derive(Debug, Serialize)]
struct SearchQuery<'a> {
    brand: &'a str,
    limit: u32,
}

/// Responses are either a bare product array or `{"products": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductsPayload {
    Bare(Vec<ProductRecord>),
    Wrapped { products: Vec<ProductRecord> },
}

impl ProductsPayload {
    fn into_products(self) -> Vec<ProductRecord> {
        match self {
            Self::Bare(products) | Self::Wrapped { products } => products,
        }
    }
}

impl HttpPriceSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
        item_count: u32,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            item_count,
        })
    }

    /// `None` when no base URL is configured.
    pub fn from_config(config: &PriceSourceConfig) -> Result<Option<Self>, reqwest::Error> {
        config
            .base_url
            .as_deref()
            .map(|base_url| {
                Self::new(
                    base_url,
                    config.api_key.clone(),
                    Duration::from_secs(config.timeout_secs),
                    config.item_count,
                )
            })
            .transpose()
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }

    async fn fetch(&self, operation: &'static str, request: reqwest::RequestBuilder) -> Vec<ProductRecord> {
        let response = match self.authorize(request).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "price_source.request_failed",
                    operation,
                    error = %error,
                    "price source request failed"
                );
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(
                event_name = "price_source.bad_status",
                operation,
                status = %response.status(),
                "price source returned an error status"
            );
            return Vec::new();
        }

        match response.json::<Value>().await.map(serde_json::from_value::<ProductsPayload>) {
            Ok(Ok(payload)) => payload.into_products(),
            Ok(Err(error)) => {
                warn!(
                    event_name = "price_source.decode_failed",
                    operation,
                    error = %error,
                    "price source payload did not match the product shape"
                );
                Vec::new()
            }
            Err(error) => {
                warn!(
                    event_name = "price_source.decode_failed",
                    operation,
                    error = %error,
                    "price source returned invalid json"
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ProductPriceSource for HttpPriceSource {
    async fn by_asins(&self, asins: &[String]) -> Vec<ProductRecord> {
        if asins.is_empty() {
            return Vec::new();
        }
        let url = format!("{}/products/lookup", self.base_url);
        self.fetch("by_asins", self.client.post(url).json(&LookupRequest { asins })).await
    }

    async fn by_brand(&self, brand_name: &str) -> Vec<ProductRecord> {
        let url = format!("{}/products/search", self.base_url);
        let query = SearchQuery { brand: brand_name, limit: self.item_count };
        self.fetch("by_brand", self.client.get(url).query(&query)).await
    }
}

/// Used when no price source is configured. Every lookup is empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredPriceSource;

#[async_trait]
impl ProductPriceSource for UnconfiguredPriceSource {
    async fn by_asins(&self, _asins: &[String]) -> Vec<ProductRecord> {
        Vec::new()
    }

    async fn by_brand(&self, brand_name: &str) -> Vec<ProductRecord> {
        warn!(
            event_name = "price_source.unconfigured",
            brand = brand_name,
            "no price source configured; analysis will have no products"
        );
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use leadgen_core::config::AppConfig;
    use leadgen_core::source::ProductPriceSource;

    use super::{HttpPriceSource, ProductsPayload};

    #[test]
    fn both_payload_shapes_decode() {
        let bare: ProductsPayload =
            serde_json::from_str(r#"[{"asin":"B1","price":12.5}]"#).expect("bare");
        assert_eq!(bare.into_products().len(), 1);

        let wrapped: ProductsPayload = serde_json::from_str(
            r#"{"products":[{"asin":"B1","price":{"amount":9.99,"currency":"USD"}},{"asin":"B2"}]}"#,
        )
        .expect("wrapped");
        let products = wrapped.into_products();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].resolved_amount(), Some(9.99));
        assert_eq!(products[1].resolved_amount(), None);
    }

    #[test]
    fn no_base_url_means_no_http_source() {
        let source = HttpPriceSource::from_config(&AppConfig::default().price_source).expect("build");
        assert!(source.is_none());
    }

    #[tokio::test]
    async fn unreachable_upstream_degrades_to_empty() {
        let source = HttpPriceSource::new("http://127.0.0.1:9", None, Duration::from_millis(500), 10)
            .expect("client");

        assert!(source.by_brand("Acme").await.is_empty());
        assert!(source.by_asins(&["B0001".to_string()]).await.is_empty());
        assert!(source.by_asins(&[]).await.is_empty());
    }
}
