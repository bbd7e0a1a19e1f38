use tokio::sync::RwLock;

use chrono::Utc;
use leadgen_core::domain::analysis::{QaAnalysis, QaAnalysisId};
use leadgen_core::domain::brand::{Brand, BrandId};
use leadgen_core::domain::seller::{Seller, SellerId};

use super::{
    ensure_storable, BrandFilter, BrandRepository, Page, PageRequest, QaAnalysisFilter,
    QaAnalysisRepository, RepositoryError, SellerFilter, SellerRepository,
};

/// Records are kept in insertion order so ties on `created_at` resolve the
/// same way the SQL repositories resolve them by rowid.
fn newest_first<T: Clone>(
    records: &[T],
    created_at: impl Fn(&T) -> chrono::DateTime<Utc>,
    keep: impl Fn(&T) -> bool,
    page: PageRequest,
) -> Page<T> {
    let mut matching = records.iter().enumerate().filter(|(_, record)| keep(record)).collect::<Vec<_>>();
    matching.sort_by(|(left_index, left), (right_index, right)| {
        created_at(right).cmp(&created_at(left)).then(right_index.cmp(left_index))
    });

    let total = matching.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let data = matching
        .into_iter()
        .skip(offset)
        .take(page.limit as usize)
        .map(|(_, record)| record.clone())
        .collect();
    Page::new(data, total, page)
}

fn oldest_first<T: Clone>(records: &[T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut ordered = records.to_vec();
    ordered.sort_by_key(|record| created_at(record));
    ordered
}

fn contains_search(needle: Option<&str>, haystacks: &[Option<&str>]) -> bool {
    let Some(needle) = needle.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };
    let needle = needle.to_lowercase();
    haystacks.iter().flatten().any(|value| value.to_lowercase().contains(&needle))
}

#[derive(Default)]
pub struct InMemoryBrandRepository {
    brands: RwLock<Vec<Brand>>,
}

#[async_trait::async_trait]
impl BrandRepository for InMemoryBrandRepository {
    async fn find_by_id(&self, id: &BrandId) -> Result<Option<Brand>, RepositoryError> {
        let brands = self.brands.read().await;
        Ok(brands.iter().find(|brand| &brand.id == id).cloned())
    }

    async fn save(&self, brand: Brand) -> Result<(), RepositoryError> {
        let mut brands = self.brands.write().await;
        match brands.iter_mut().find(|existing| existing.id == brand.id) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = Brand { created_at, ..brand };
            }
            None => brands.push(brand),
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &BrandFilter,
        page: PageRequest,
    ) -> Result<Page<Brand>, RepositoryError> {
        let brands = self.brands.read().await;
        Ok(newest_first(
            brands.as_slice(),
            |brand| brand.created_at,
            |brand| {
                filter.status.map_or(true, |status| brand.status == status)
                    && filter
                        .validation_status
                        .map_or(true, |status| brand.validation_status == status)
                    && filter.is_duplicate.map_or(true, |flag| brand.is_duplicate == flag)
                    && contains_search(
                        filter.search.as_deref(),
                        &[Some(brand.name.as_str()), brand.email.as_deref(), brand.domain.as_deref()],
                    )
            },
            page,
        ))
    }

    async fn all(&self) -> Result<Vec<Brand>, RepositoryError> {
        let brands = self.brands.read().await;
        Ok(oldest_first(brands.as_slice(), |brand| brand.created_at))
    }

    async fn set_duplicate_flag(&self, id: &BrandId, flag: bool) -> Result<bool, RepositoryError> {
        let mut brands = self.brands.write().await;
        Ok(brands
            .iter_mut()
            .find(|brand| &brand.id == id)
            .map(|brand| {
                brand.is_duplicate = flag;
                brand.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn delete(&self, id: &BrandId) -> Result<bool, RepositoryError> {
        let mut brands = self.brands.write().await;
        let before = brands.len();
        brands.retain(|brand| &brand.id != id);
        Ok(brands.len() < before)
    }
}

#[derive(Default)]
pub struct InMemorySellerRepository {
    sellers: RwLock<Vec<Seller>>,
}

#[async_trait::async_trait]
impl SellerRepository for InMemorySellerRepository {
    async fn find_by_id(&self, id: &SellerId) -> Result<Option<Seller>, RepositoryError> {
        let sellers = self.sellers.read().await;
        Ok(sellers.iter().find(|seller| &seller.id == id).cloned())
    }

    async fn save(&self, seller: Seller) -> Result<(), RepositoryError> {
        let mut sellers = self.sellers.write().await;
        match sellers.iter_mut().find(|existing| existing.id == seller.id) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = Seller { created_at, ..seller };
            }
            None => sellers.push(seller),
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &SellerFilter,
        page: PageRequest,
    ) -> Result<Page<Seller>, RepositoryError> {
        let sellers = self.sellers.read().await;
        Ok(newest_first(
            sellers.as_slice(),
            |seller| seller.created_at,
            |seller| {
                filter.status.map_or(true, |status| seller.status == status)
                    && filter
                        .validation_status
                        .map_or(true, |status| seller.validation_status == status)
                    && filter.is_duplicate.map_or(true, |flag| seller.is_duplicate == flag)
                    && contains_search(
                        filter.search.as_deref(),
                        &[Some(seller.name.as_str()), seller.email.as_deref(), seller.company_name.as_deref()],
                    )
            },
            page,
        ))
    }

    async fn all(&self) -> Result<Vec<Seller>, RepositoryError> {
        let sellers = self.sellers.read().await;
        Ok(oldest_first(sellers.as_slice(), |seller| seller.created_at))
    }

    async fn set_duplicate_flag(
        &self,
        id: &SellerId,
        flag: bool,
    ) -> Result<bool, RepositoryError> {
        let mut sellers = self.sellers.write().await;
        Ok(sellers
            .iter_mut()
            .find(|seller| &seller.id == id)
            .map(|seller| {
                seller.is_duplicate = flag;
                seller.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn delete(&self, id: &SellerId) -> Result<bool, RepositoryError> {
        let mut sellers = self.sellers.write().await;
        let before = sellers.len();
        sellers.retain(|seller| &seller.id != id);
        Ok(sellers.len() < before)
    }
}

#[derive(Default)]
pub struct InMemoryQaAnalysisRepository {
    analyses: RwLock<Vec<QaAnalysis>>,
}

#[async_trait::async_trait]
impl QaAnalysisRepository for InMemoryQaAnalysisRepository {
    async fn save(&self, analysis: QaAnalysis) -> Result<QaAnalysis, RepositoryError> {
        ensure_storable(&analysis)?;
        let mut analyses = self.analyses.write().await;
        if analyses.iter().any(|existing| existing.id == analysis.id) {
            return Err(RepositoryError::Decode(format!(
                "qa analysis `{}` already exists",
                analysis.id.0
            )));
        }
        analyses.push(analysis.clone());
        Ok(analysis)
    }

    async fn find_by_id(&self, id: &QaAnalysisId) -> Result<Option<QaAnalysis>, RepositoryError> {
        let analyses = self.analyses.read().await;
        Ok(analyses.iter().find(|analysis| &analysis.id == id).cloned())
    }

    async fn latest_for_brand(
        &self,
        brand_id: &BrandId,
    ) -> Result<Option<QaAnalysis>, RepositoryError> {
        let analyses = self.analyses.read().await;
        let for_brand = QaAnalysisFilter { brand_id: Some(brand_id.clone()), ..QaAnalysisFilter::default() };
        Ok(newest_first(
            analyses.as_slice(),
            |analysis| analysis.created_at,
            |analysis| matches_analysis(&for_brand, analysis),
            PageRequest::new(1, 1),
        )
        .data
        .into_iter()
        .next())
    }

    async fn list(
        &self,
        filter: &QaAnalysisFilter,
        page: PageRequest,
    ) -> Result<Page<QaAnalysis>, RepositoryError> {
        let analyses = self.analyses.read().await;
        Ok(newest_first(
            analyses.as_slice(),
            |analysis| analysis.created_at,
            |analysis| matches_analysis(filter, analysis),
            page,
        ))
    }

    async fn all(&self) -> Result<Vec<QaAnalysis>, RepositoryError> {
        let analyses = self.analyses.read().await;
        Ok(oldest_first(analyses.as_slice(), |analysis| analysis.created_at))
    }
}

fn matches_analysis(filter: &QaAnalysisFilter, analysis: &QaAnalysis) -> bool {
    filter.status.map_or(true, |status| analysis.classification.status == status)
        && filter.brand_id.as_ref().map_or(true, |brand_id| &analysis.brand_id == brand_id)
}
