pub mod classify;
pub mod competition;
pub mod metrics;
pub mod price;
pub mod recommendation;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::analysis::{QaAnalysis, QaAnalysisId};
use crate::domain::brand::Brand;
use crate::errors::DomainError;

use self::{
    classify::{
        classify_product, ColorSummary, ProfitabilityClassification, ProfitabilityClassifier,
        TieredProfitabilityClassifier,
    },
    competition::{BrandPresence, CompetitionScore, CompetitionScorer, WeightedCompetitionScorer},
    metrics::{DeterministicMetricsEngine, MetricsEngine, ProfitMetrics},
    price::{extract_samples, ProductRecord},
    recommendation::{recommend, Recommendation},
};

pub const HIGHLY_PROFITABLE_THRESHOLD: f64 = 30.0;
pub const PROFITABLE_THRESHOLD: f64 = 15.0;
pub const MARGINAL_THRESHOLD: f64 = 5.0;

/// Values too large to scale are returned unchanged.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Everything the engines derive from one product list, before it is tied to
/// a persisted brand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QaEvaluation {
    pub metrics: ProfitMetrics,
    pub classification: ProfitabilityClassification,
    pub competition: CompetitionScore,
    pub recommendation: Recommendation,
    pub products_analyzed: u32,
    pub color_summary: ColorSummary,
}

pub struct QaAnalyzer<M, C, S> {
    metrics_engine: M,
    classifier: C,
    scorer: S,
}

impl<M, C, S> QaAnalyzer<M, C, S> {
    pub fn new(metrics_engine: M, classifier: C, scorer: S) -> Self {
        Self { metrics_engine, classifier, scorer }
    }
}

impl Default
    for QaAnalyzer<DeterministicMetricsEngine, TieredProfitabilityClassifier, WeightedCompetitionScorer>
{
    fn default() -> Self {
        Self::new(DeterministicMetricsEngine, TieredProfitabilityClassifier, WeightedCompetitionScorer)
    }
}

impl<M, C, S> QaAnalyzer<M, C, S>
where
    M: MetricsEngine,
    C: ProfitabilityClassifier,
    S: CompetitionScorer,
{
    pub fn evaluate(&self, presence: &BrandPresence, products: &[ProductRecord]) -> QaEvaluation {
        let samples = extract_samples(products);
        let metrics = self.metrics_engine.compute(&samples);
        let classification =
            self.classifier.classify(metrics.margin_percent, metrics.profitability_ratio);
        let competition = self.scorer.score(presence, products);
        let recommendation =
            recommend(metrics.margin_percent, competition.score, metrics.profitability_ratio);

        let mut color_summary = ColorSummary::default();
        for product in products {
            color_summary.record(classify_product(product.resolved_amount()).color);
        }

        QaEvaluation {
            metrics,
            classification,
            competition,
            recommendation,
            products_analyzed: u32::try_from(products.len()).unwrap_or(u32::MAX),
            color_summary,
        }
    }

    pub fn analyze(
        &self,
        brand: &Brand,
        products: &[ProductRecord],
    ) -> Result<QaAnalysis, DomainError> {
        if brand.id.0.trim().is_empty() {
            return Err(DomainError::MissingBrandId);
        }

        let evaluation = self.evaluate(&BrandPresence::from(brand), products);
        tracing::info!(
            event_name = "qa.analysis.completed",
            brand_id = %brand.id.0,
            status = evaluation.classification.status.as_str(),
            score = evaluation.competition.score,
            products = evaluation.products_analyzed,
            "qa analysis completed"
        );

        let now = Utc::now();
        Ok(QaAnalysis {
            id: QaAnalysisId::generate(),
            brand_id: brand.id.clone(),
            brand_name: brand.name.clone(),
            metrics: evaluation.metrics,
            classification: evaluation.classification,
            competition: evaluation.competition,
            recommendation: evaluation.recommendation.message().to_string(),
            products_analyzed: evaluation.products_analyzed,
            color_summary: evaluation.color_summary,
            notes: None,
            analyzed_by: None,
            created_at: now,
            updated_at: now,
        })
    }
}
