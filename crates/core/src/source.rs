use async_trait::async_trait;

use crate::domain::brand::Brand;
use crate::qa::price::ProductRecord;

/// Supplies product listings with prices. Implementations swallow upstream
/// failures and return an empty list so analysis degrades to zero metrics.
#[async_trait]
pub trait ProductPriceSource: Send + Sync {
    async fn by_asins(&self, asins: &[String]) -> Vec<ProductRecord>;
    async fn by_brand(&self, brand_name: &str) -> Vec<ProductRecord>;
}

/// Keeps products whose brand or title mentions the brand name. Falls back
/// to the full list when nothing matches.
pub fn filter_by_brand(brand_name: &str, products: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let needle = brand_name.trim().to_lowercase();
    if needle.is_empty() {
        return products;
    }

    let matching = products
        .iter()
        .filter(|product| {
            product.brand.to_lowercase().contains(&needle)
                || product.title.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect::<Vec<_>>();

    if matching.is_empty() {
        products
    } else {
        matching
    }
}

/// ASIN lookup first; a brand search when no ASINs were given or none came
/// back.
pub async fn fetch_for_brand<S>(source: &S, brand: &Brand, asins: &[String]) -> Vec<ProductRecord>
where
    S: ProductPriceSource + ?Sized,
{
    if !asins.is_empty() {
        let products = source.by_asins(asins).await;
        if !products.is_empty() {
            return products;
        }
    }

    if brand.name.trim().is_empty() {
        return Vec::new();
    }

    filter_by_brand(&brand.name, source.by_brand(&brand.name).await)
}

/// In-memory source, for tests and file-driven CLI runs.
#[derive(Clone, Debug, Default)]
pub struct StaticPriceSource {
    products: Vec<ProductRecord>,
}

impl StaticPriceSource {
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductPriceSource for StaticPriceSource {
    async fn by_asins(&self, asins: &[String]) -> Vec<ProductRecord> {
        self.products.iter().filter(|product| asins.contains(&product.asin)).cloned().collect()
    }

    async fn by_brand(&self, _brand_name: &str) -> Vec<ProductRecord> {
        self.products.clone()
    }
}
