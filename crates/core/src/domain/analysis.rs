use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::brand::BrandId;
use crate::qa::classify::{ColorSummary, ProfitabilityClassification};
use crate::qa::competition::CompetitionScore;
use crate::qa::metrics::ProfitMetrics;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QaAnalysisId(pub String);

impl QaAnalysisId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// One persisted profitability assessment of a brand. Analyses are appended;
/// the latest one per brand is the current view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QaAnalysis {
    pub id: QaAnalysisId,
    pub brand_id: BrandId,
    pub brand_name: String,
    pub metrics: ProfitMetrics,
    pub classification: ProfitabilityClassification,
    pub competition: CompetitionScore,
    pub recommendation: String,
    pub products_analyzed: u32,
    pub color_summary: ColorSummary,
    pub notes: Option<String>,
    pub analyzed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
