use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use leadgen_core::domain::analysis::{QaAnalysis, QaAnalysisId};
use leadgen_core::domain::brand::{Brand, BrandId};
use leadgen_core::domain::seller::{Seller, SellerId};
use leadgen_core::domain::{RecordStatus, ValidationStatus};
use leadgen_core::qa::classify::ProfitabilityStatus;

pub mod analysis;
pub mod brand;
pub mod memory;
pub mod seller;

pub use analysis::SqlQaAnalysisRepository;
pub use brand::SqlBrandRepository;
pub use memory::{InMemoryBrandRepository, InMemoryQaAnalysisRepository, InMemorySellerRepository};
pub use seller::SqlSellerRepository;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Page is 1-based; the limit is clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page: page.max(1), limit: limit.clamp(1, MAX_PAGE_LIMIT) }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        let pages = total.div_ceil(u64::from(request.limit));
        Self {
            data,
            total,
            page: request.page,
            limit: request.limit,
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            pages: self.pages,
        }
    }
}

/// Search matches name, email and domain, case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BrandFilter {
    pub status: Option<RecordStatus>,
    pub validation_status: Option<ValidationStatus>,
    pub is_duplicate: Option<bool>,
    pub search: Option<String>,
}

/// Search matches name, email and company name, case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SellerFilter {
    pub status: Option<RecordStatus>,
    pub validation_status: Option<ValidationStatus>,
    pub is_duplicate: Option<bool>,
    pub search: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QaAnalysisFilter {
    pub status: Option<ProfitabilityStatus>,
    pub brand_id: Option<BrandId>,
}

/// Fixed-width UTC text so lexical order matches time order.
pub(crate) fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{value}`: {error}")))
}

pub(crate) fn decode_error(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

/// Non-finite metrics encode as JSON `null` and could never be read back.
pub(crate) fn ensure_storable(analysis: &QaAnalysis) -> Result<(), RepositoryError> {
    if analysis.metrics.is_finite() {
        Ok(())
    } else {
        Err(RepositoryError::Decode(format!(
            "qa analysis `{}` has non-finite metrics",
            analysis.id.0
        )))
    }
}

pub(crate) fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| format!("%{}%", value.to_lowercase()))
}

#[async_trait]
pub trait BrandRepository: Send + Sync {
    async fn find_by_id(&self, id: &BrandId) -> Result<Option<Brand>, RepositoryError>;
    async fn save(&self, brand: Brand) -> Result<(), RepositoryError>;
    /// Newest first.
    async fn list(
        &self,
        filter: &BrandFilter,
        page: PageRequest,
    ) -> Result<Page<Brand>, RepositoryError>;
    /// Every brand, oldest first. Detection passes run over this snapshot.
    async fn all(&self) -> Result<Vec<Brand>, RepositoryError>;
    async fn set_duplicate_flag(&self, id: &BrandId, flag: bool) -> Result<bool, RepositoryError>;
    /// The SQL schema cascades the delete to the brand's analyses.
    async fn delete(&self, id: &BrandId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait SellerRepository: Send + Sync {
    async fn find_by_id(&self, id: &SellerId) -> Result<Option<Seller>, RepositoryError>;
    async fn save(&self, seller: Seller) -> Result<(), RepositoryError>;
    async fn list(
        &self,
        filter: &SellerFilter,
        page: PageRequest,
    ) -> Result<Page<Seller>, RepositoryError>;
    async fn all(&self) -> Result<Vec<Seller>, RepositoryError>;
    async fn set_duplicate_flag(&self, id: &SellerId, flag: bool)
        -> Result<bool, RepositoryError>;
    async fn delete(&self, id: &SellerId) -> Result<bool, RepositoryError>;
}

/// Analyses are appended. Saving never replaces an earlier analysis of the
/// same brand.
#[async_trait]
pub trait QaAnalysisRepository: Send + Sync {
    async fn save(&self, analysis: QaAnalysis) -> Result<QaAnalysis, RepositoryError>;
    async fn find_by_id(&self, id: &QaAnalysisId) -> Result<Option<QaAnalysis>, RepositoryError>;
    async fn latest_for_brand(&self, brand_id: &BrandId)
        -> Result<Option<QaAnalysis>, RepositoryError>;
    async fn list(
        &self,
        filter: &QaAnalysisFilter,
        page: PageRequest,
    ) -> Result<Page<QaAnalysis>, RepositoryError>;
    async fn all(&self) -> Result<Vec<QaAnalysis>, RepositoryError>;
}
