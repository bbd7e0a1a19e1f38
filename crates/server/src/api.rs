//! JSON API.
//!
//! - `POST /api/v1/qa/analyze`: analyze a brand and store the result
//! - `GET  /api/v1/qa/metrics/{brand_id}`: latest analysis for a brand
//! - `GET  /api/v1/qa/analyses`: paginated analyses, filterable by status and brand
//! - `GET  /api/v1/brands`, `GET /api/v1/sellers`: paginated listing, filterable by
//!   `status`, `validation_status`, `is_duplicate` and `search`
//! - `POST /api/v1/brands`, `POST /api/v1/sellers`: validate, duplicate-check and store
//! - `GET  /api/v1/brands/{id}`, `GET /api/v1/sellers/{id}`: one record
//! - `POST /api/v1/duplicates/scan`: duplicate sweep over sellers or brands
//! - `POST /api/v1/duplicates/merge`: delete exact duplicates, keeping the oldest record
//! - `GET  /api/v1/reports/daily`: daily report, `?date=YYYY-MM-DD` (default today, UTC)

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use leadgen_core::domain::brand::{BrandDraft, BrandId};
use leadgen_core::domain::seller::{SellerDraft, SellerId};
use leadgen_core::domain::{RecordStatus, ValidationStatus};
use leadgen_core::errors::{ApplicationError, InterfaceError};
use leadgen_core::qa::classify::ProfitabilityStatus;
use leadgen_core::source::ProductPriceSource;
use leadgen_db::repositories::{
    BrandFilter, PageRequest, QaAnalysisFilter, SellerFilter, SqlBrandRepository,
    SqlQaAnalysisRepository, SqlSellerRepository, DEFAULT_PAGE_LIMIT,
};
use leadgen_db::services::{
    DuplicateEntity, DuplicateService, LeadService, QaService, ReportService,
};
use leadgen_db::DbPool;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    qa: Arc<QaService>,
    duplicates: Arc<DuplicateService>,
    leads: Arc<LeadService>,
    reports: Arc<ReportService>,
}

impl ApiState {
    pub fn new(db_pool: DbPool, source: Arc<dyn ProductPriceSource>) -> Self {
        let brands = Arc::new(SqlBrandRepository::new(db_pool.clone()));
        let sellers = Arc::new(SqlSellerRepository::new(db_pool.clone()));
        let analyses = Arc::new(SqlQaAnalysisRepository::new(db_pool));

        let duplicates = Arc::new(DuplicateService::new(sellers.clone(), brands.clone()));

        Self {
            qa: Arc::new(QaService::new(brands.clone(), analyses.clone(), source)),
            leads: Arc::new(LeadService::new(brands.clone(), sellers.clone(), duplicates.clone())),
            duplicates,
            reports: Arc::new(ReportService::new(sellers, brands, analyses)),
        }
    }

    pub fn duplicates(&self) -> Arc<DuplicateService> {
        self.duplicates.clone()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/qa/analyze", post(analyze_brand))
        .route("/api/v1/qa/metrics/{brand_id}", get(brand_metrics))
        .route("/api/v1/qa/analyses", get(list_analyses))
        .route("/api/v1/brands", get(list_brands).post(create_brand))
        .route("/api/v1/brands/{brand_id}", get(get_brand))
        .route("/api/v1/sellers", get(list_sellers).post(create_seller))
        .route("/api/v1/sellers/{seller_id}", get(get_seller))
        .route("/api/v1/duplicates/scan", post(scan_duplicates))
        .route("/api/v1/duplicates/merge", post(merge_duplicates))
        .route("/api/v1/reports/daily", get(daily_report))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, message: None, data })
    }

    fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self { success: true, message: Some(message.into()), data })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(InterfaceError::BadRequest { message: message.into(), correlation_id: correlation_id() })
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(correlation_id()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message),
            InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message),
            InterfaceError::ServiceUnavailable { message, .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, message)
            }
        };

        if status.is_server_error() {
            warn!(
                event_name = "api.request.failed",
                correlation_id = self.0.correlation_id(),
                status = status.as_u16(),
                error = %message,
                "api request failed"
            );
        }

        let body = ApiErrorBody {
            success: false,
            error: self.0.user_message(),
            message: message.clone(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub brand_id: String,
    #[serde(default)]
    pub asins: Vec<String>,
}

async fn analyze_brand(
    State(state): State<ApiState>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let brand_id = body.brand_id.trim();
    if brand_id.is_empty() {
        return Err(ApiError::bad_request("brand_id is required"));
    }

    let analysis = state.qa.analyze_brand(&BrandId(brand_id.to_string()), &body.asins).await?;
    Ok(ApiResponse::with_message("QA analysis completed", analysis))
}

async fn brand_metrics(
    Path(brand_id): Path<String>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let analysis = state.qa.latest_metrics(&BrandId(brand_id)).await?;
    Ok(ApiResponse::ok(analysis))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub brand_id: Option<String>,
}

async fn list_analyses(
    State(state): State<ApiState>,
    Query(query): Query<AnalysesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match query.status.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => Some(
            ProfitabilityStatus::parse(raw)
                .ok_or_else(|| ApiError::bad_request(format!("unknown status `{raw}`")))?,
        ),
        None => None,
    };
    let filter = QaAnalysisFilter {
        status,
        brand_id: query.brand_id.filter(|value| !value.trim().is_empty()).map(BrandId),
    };
    let page = PageRequest::new(query.page.unwrap_or(1), query.limit.unwrap_or(DEFAULT_PAGE_LIMIT));

    let analyses = state.qa.list_analyses(&filter, page).await?;
    Ok(ApiResponse::ok(analyses))
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub validation_status: Option<String>,
    pub is_duplicate: Option<bool>,
    pub search: Option<String>,
}

impl LeadsQuery {
    fn page(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.limit.unwrap_or(DEFAULT_PAGE_LIMIT))
    }

    fn status(&self) -> Result<Option<RecordStatus>, ApiError> {
        parse_param(self.status.as_deref(), "status", RecordStatus::parse)
    }

    fn validation_status(&self) -> Result<Option<ValidationStatus>, ApiError> {
        parse_param(self.validation_status.as_deref(), "validation_status", ValidationStatus::parse)
    }

    fn search(&self) -> Option<String> {
        self.search.clone().filter(|value| !value.trim().is_empty())
    }
}

fn parse_param<T>(
    raw: Option<&str>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("unknown {name} `{value}`"))),
        None => Ok(None),
    }
}

async fn list_brands(
    State(state): State<ApiState>,
    Query(query): Query<LeadsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = BrandFilter {
        status: query.status()?,
        validation_status: query.validation_status()?,
        is_duplicate: query.is_duplicate,
        search: query.search(),
    };

    let brands = state.leads.list_brands(&filter, query.page()).await?;
    Ok(ApiResponse::ok(brands))
}

async fn create_brand(
    State(state): State<ApiState>,
    Json(body): Json<BrandDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let brand = state.leads.create_brand(body.into_brand()).await?;
    let message = if brand.is_duplicate {
        "Brand stored and flagged as a possible duplicate"
    } else {
        "Brand stored"
    };
    Ok((StatusCode::CREATED, ApiResponse::with_message(message, brand)))
}

async fn get_brand(
    Path(brand_id): Path<String>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let brand = state.leads.brand(&BrandId(brand_id)).await?;
    Ok(ApiResponse::ok(brand))
}

async fn list_sellers(
    State(state): State<ApiState>,
    Query(query): Query<LeadsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = SellerFilter {
        status: query.status()?,
        validation_status: query.validation_status()?,
        is_duplicate: query.is_duplicate,
        search: query.search(),
    };

    let sellers = state.leads.list_sellers(&filter, query.page()).await?;
    Ok(ApiResponse::ok(sellers))
}

async fn create_seller(
    State(state): State<ApiState>,
    Json(body): Json<SellerDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let seller = state.leads.create_seller(body.into_seller()).await?;
    let message = if seller.is_duplicate {
        "Seller stored and flagged as a possible duplicate"
    } else {
        "Seller stored"
    };
    Ok((StatusCode::CREATED, ApiResponse::with_message(message, seller)))
}

async fn get_seller(
    Path(seller_id): Path<String>,
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let seller = state.leads.seller(&SellerId(seller_id)).await?;
    Ok(ApiResponse::ok(seller))
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub entity: String,
    #[serde(default = "default_flag")]
    pub flag: bool,
}

fn default_flag() -> bool {
    true
}

async fn scan_duplicates(
    State(state): State<ApiState>,
    Json(body): Json<ScanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entity = body.entity.parse::<DuplicateEntity>().map_err(ApiError::bad_request)?;
    let report = state.duplicates.sweep(entity, body.flag).await?;
    let message = format!(
        "Found {} potential duplicates among {} {}",
        report.candidates.len(),
        report.scanned,
        entity.as_str()
    );
    Ok(ApiResponse::with_message(message, report))
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub entity: String,
}

async fn merge_duplicates(
    State(state): State<ApiState>,
    Json(body): Json<MergeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entity = body.entity.parse::<DuplicateEntity>().map_err(ApiError::bad_request)?;
    let report = state.duplicates.merge_exact(entity).await?;
    let message = format!("Removed {} exact duplicate {}", report.merged.len(), entity.as_str());
    Ok(ApiResponse::with_message(message, report))
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyReportQuery {
    pub date: Option<String>,
}

async fn daily_report(
    State(state): State<ApiState>,
    Query(query): Query<DailyReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = match query.date.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::bad_request(format!("invalid date `{raw}`; use YYYY-MM-DD")))?,
        None => Utc::now().date_naive(),
    };

    let report = state.reports.daily_report(date).await?;
    Ok(ApiResponse::ok(report))
}
