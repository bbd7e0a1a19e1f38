use std::sync::Arc;

use leadgen_core::domain::analysis::QaAnalysis;
use leadgen_core::domain::brand::{Brand, BrandId};
use leadgen_core::errors::ApplicationError;
use leadgen_core::qa::classify::TieredProfitabilityClassifier;
use leadgen_core::qa::competition::WeightedCompetitionScorer;
use leadgen_core::qa::metrics::DeterministicMetricsEngine;
use leadgen_core::qa::price::ProductRecord;
use leadgen_core::source::{fetch_for_brand, ProductPriceSource};
use leadgen_core::QaAnalyzer;

use crate::repositories::{
    BrandRepository, Page, PageRequest, QaAnalysisFilter, QaAnalysisRepository,
};

pub type DefaultQaAnalyzer =
    QaAnalyzer<DeterministicMetricsEngine, TieredProfitabilityClassifier, WeightedCompetitionScorer>;

pub struct QaService {
    brands: Arc<dyn BrandRepository>,
    analyses: Arc<dyn QaAnalysisRepository>,
    source: Arc<dyn ProductPriceSource>,
    analyzer: DefaultQaAnalyzer,
}

impl QaService {
    pub fn new(
        brands: Arc<dyn BrandRepository>,
        analyses: Arc<dyn QaAnalysisRepository>,
        source: Arc<dyn ProductPriceSource>,
    ) -> Self {
        Self { brands, analyses, source, analyzer: DefaultQaAnalyzer::default() }
    }

    async fn brand(&self, brand_id: &BrandId) -> Result<Brand, ApplicationError> {
        self.brands
            .find_by_id(brand_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound { entity: "brand", id: brand_id.0.clone() })
    }

    /// Fetches products from the price source and stores a new analysis.
    /// An empty fetch still produces an analysis with zero metrics.
    pub async fn analyze_brand(
        &self,
        brand_id: &BrandId,
        asins: &[String],
    ) -> Result<QaAnalysis, ApplicationError> {
        let brand = self.brand(brand_id).await?;
        let products = fetch_for_brand(self.source.as_ref(), &brand, asins).await;
        if products.is_empty() {
            tracing::warn!(
                event_name = "qa.analysis.no_products",
                brand_id = %brand.id.0,
                "price source returned no products"
            );
        }
        self.store(&brand, &products).await
    }

    /// Analyzes a caller-supplied product list for a stored brand.
    pub async fn analyze_products(
        &self,
        brand_id: &BrandId,
        products: &[ProductRecord],
    ) -> Result<QaAnalysis, ApplicationError> {
        let brand = self.brand(brand_id).await?;
        self.store(&brand, products).await
    }

    async fn store(
        &self,
        brand: &Brand,
        products: &[ProductRecord],
    ) -> Result<QaAnalysis, ApplicationError> {
        let analysis = self.analyzer.analyze(brand, products)?;
        Ok(self.analyses.save(analysis).await?)
    }

    pub async fn latest_metrics(&self, brand_id: &BrandId) -> Result<QaAnalysis, ApplicationError> {
        self.analyses.latest_for_brand(brand_id).await?.ok_or_else(|| ApplicationError::NotFound {
            entity: "qa analysis for brand",
            id: brand_id.0.clone(),
        })
    }

    pub async fn list_analyses(
        &self,
        filter: &QaAnalysisFilter,
        page: PageRequest,
    ) -> Result<Page<QaAnalysis>, ApplicationError> {
        Ok(self.analyses.list(filter, page).await?)
    }
}
