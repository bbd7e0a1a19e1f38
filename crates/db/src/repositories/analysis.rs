use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite};

use leadgen_core::domain::analysis::{QaAnalysis, QaAnalysisId};
use leadgen_core::domain::brand::BrandId;
use leadgen_core::qa::classify::{ColorSummary, ProfitabilityClassification};
use leadgen_core::qa::competition::CompetitionScore;
use leadgen_core::qa::metrics::ProfitMetrics;

use super::{
    decode_error, decode_timestamp, encode_timestamp, ensure_storable, Page, PageRequest, QaAnalysisFilter,
    QaAnalysisRepository, RepositoryError,
};
use crate::DbPool;

const ANALYSIS_COLUMNS: &str = "id, brand_id, brand_name, recommendation, products_analyzed,
    analysis_data, notes, analyzed_by, created_at, updated_at";

/// Structured part of an analysis, kept as one JSON document. The scalar
/// columns beside it exist for filtering and ordering.
#[derive(Serialize, Deserialize)]
struct AnalysisData {
    metrics: ProfitMetrics,
    classification: ProfitabilityClassification,
    competition: CompetitionScore,
    color_summary: ColorSummary,
}

pub struct SqlQaAnalysisRepository {
    pool: DbPool,
}

impl SqlQaAnalysisRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_analysis(row: &sqlx::sqlite::SqliteRow) -> Result<QaAnalysis, RepositoryError> {
    let analysis_data: String = row.try_get("analysis_data").map_err(decode_error)?;
    let data: AnalysisData = serde_json::from_str(&analysis_data).map_err(decode_error)?;
    let products_analyzed: i64 = row.try_get("products_analyzed").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_error)?;

    Ok(QaAnalysis {
        id: QaAnalysisId(row.try_get("id").map_err(decode_error)?),
        brand_id: BrandId(row.try_get("brand_id").map_err(decode_error)?),
        brand_name: row.try_get("brand_name").map_err(decode_error)?,
        metrics: data.metrics,
        classification: data.classification,
        competition: data.competition,
        recommendation: row.try_get("recommendation").map_err(decode_error)?,
        products_analyzed: u32::try_from(products_analyzed).map_err(decode_error)?,
        color_summary: data.color_summary,
        notes: row.try_get("notes").map_err(decode_error)?,
        analyzed_by: row.try_get("analyzed_by").map_err(decode_error)?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &QaAnalysisFilter) {
    builder.push(" WHERE 1=1");
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(brand_id) = &filter.brand_id {
        builder.push(" AND brand_id = ").push_bind(brand_id.0.clone());
    }
}

#[async_trait::async_trait]
impl QaAnalysisRepository for SqlQaAnalysisRepository {
    async fn save(&self, analysis: QaAnalysis) -> Result<QaAnalysis, RepositoryError> {
        ensure_storable(&analysis)?;
        let data = serde_json::to_string(&AnalysisData {
            metrics: analysis.metrics.clone(),
            classification: analysis.classification.clone(),
            competition: analysis.competition.clone(),
            color_summary: analysis.color_summary,
        })
        .map_err(decode_error)?;

        sqlx::query(
            "INSERT INTO qa_analyses (id, brand_id, brand_name, profit_margin, profitability_ratio,
                                      status, profitability_color, competition_score,
                                      competition_level, recommendation, products_analyzed,
                                      analysis_data, notes, analyzed_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&analysis.id.0)
        .bind(&analysis.brand_id.0)
        .bind(&analysis.brand_name)
        .bind(analysis.metrics.margin_percent)
        .bind(analysis.metrics.profitability_ratio)
        .bind(analysis.classification.status.as_str())
        .bind(analysis.classification.color.as_str())
        .bind(i64::from(analysis.competition.score))
        .bind(analysis.competition.level.as_str())
        .bind(&analysis.recommendation)
        .bind(i64::from(analysis.products_analyzed))
        .bind(data)
        .bind(&analysis.notes)
        .bind(&analysis.analyzed_by)
        .bind(encode_timestamp(&analysis.created_at))
        .bind(encode_timestamp(&analysis.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(analysis)
    }

    async fn find_by_id(&self, id: &QaAnalysisId) -> Result<Option<QaAnalysis>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {ANALYSIS_COLUMNS} FROM qa_analyses WHERE id = ?"))
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(row_to_analysis).transpose()
    }

    async fn latest_for_brand(
        &self,
        brand_id: &BrandId,
    ) -> Result<Option<QaAnalysis>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM qa_analyses
             WHERE brand_id = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1"
        ))
        .bind(&brand_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_analysis).transpose()
    }

    async fn list(
        &self,
        filter: &QaAnalysisFilter,
        page: PageRequest,
    ) -> Result<Page<QaAnalysis>, RepositoryError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) AS count FROM qa_analyses");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get("count")
            .map_err(decode_error)?;

        let mut query = QueryBuilder::new(format!("SELECT {ANALYSIS_COLUMNS} FROM qa_analyses"));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows = query.build().fetch_all(&self.pool).await?;

        let analyses = rows.iter().map(row_to_analysis).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(analyses, u64::try_from(total).unwrap_or_default(), page))
    }

    async fn all(&self) -> Result<Vec<QaAnalysis>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM qa_analyses ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_analysis).collect()
    }
}
