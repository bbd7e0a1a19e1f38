use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use leadgen_core::dedup::{duplicate_indices, DuplicateCandidate, DuplicateDetector, DuplicateKind};
use leadgen_core::domain::brand::Brand;
use leadgen_core::domain::seller::Seller;
use leadgen_core::errors::ApplicationError;
use leadgen_core::validation::{validate_brand, validate_seller};

use crate::repositories::{BrandRepository, SellerRepository};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateEntity {
    Sellers,
    Brands,
}

impl DuplicateEntity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sellers => "sellers",
            Self::Brands => "brands",
        }
    }
}

impl FromStr for DuplicateEntity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sellers" | "seller" => Ok(Self::Sellers),
            "brands" | "brand" => Ok(Self::Brands),
            other => Err(format!("unknown entity `{other}`; expected sellers or brands")),
        }
    }
}

/// A detector candidate with snapshot indices resolved to record ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCandidate {
    #[serde(rename = "type")]
    pub kind: DuplicateKind,
    pub original_id: String,
    pub original_name: String,
    pub duplicate_id: String,
    pub duplicate_name: String,
    pub similarity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub entity: DuplicateEntity,
    pub scanned: usize,
    pub candidates: Vec<ResolvedCandidate>,
    /// Records whose duplicate flag was set by this sweep. Zero on dry runs.
    pub flagged: usize,
}

/// Outcome of removing exact duplicates. Near duplicates are never removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub entity: DuplicateEntity,
    pub scanned: usize,
    /// Exact candidates whose duplicate side was deleted.
    pub merged: Vec<ResolvedCandidate>,
}

pub struct DuplicateService {
    sellers: Arc<dyn SellerRepository>,
    brands: Arc<dyn BrandRepository>,
    detector: DuplicateDetector,
}

fn resolve<T>(
    records: &[T],
    candidates: &[DuplicateCandidate],
    id_and_name: impl Fn(&T) -> (String, String),
) -> Vec<ResolvedCandidate> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let (original_id, original_name) = id_and_name(records.get(candidate.original_index)?);
            let (duplicate_id, duplicate_name) =
                id_and_name(records.get(candidate.duplicate_index)?);
            Some(ResolvedCandidate {
                kind: candidate.kind,
                original_id,
                original_name,
                duplicate_id,
                duplicate_name,
                similarity: candidate.similarity,
            })
        })
        .collect()
}

fn exact_only(candidates: Vec<DuplicateCandidate>) -> Vec<DuplicateCandidate> {
    candidates.into_iter().filter(|candidate| candidate.kind == DuplicateKind::Exact).collect()
}

impl DuplicateService {
    pub fn new(sellers: Arc<dyn SellerRepository>, brands: Arc<dyn BrandRepository>) -> Self {
        Self { sellers, brands, detector: DuplicateDetector::default() }
    }

    pub async fn sweep(
        &self,
        entity: DuplicateEntity,
        flag: bool,
    ) -> Result<SweepReport, ApplicationError> {
        match entity {
            DuplicateEntity::Sellers => self.sweep_sellers(flag).await,
            DuplicateEntity::Brands => self.sweep_brands(flag).await,
        }
    }

    /// Runs detection over a snapshot of every seller. With `flag`, each
    /// record on the duplicate side of a candidate is marked. Sellers saved
    /// while the sweep runs are left for the next pass.
    pub async fn sweep_sellers(&self, flag: bool) -> Result<SweepReport, ApplicationError> {
        let sellers = self.sellers.all().await?;
        let candidates = self.detector.detect(&sellers);

        let mut flagged = 0;
        if flag {
            for index in duplicate_indices(&candidates) {
                let Some(seller) = sellers.get(index) else { continue };
                if !seller.is_duplicate && self.sellers.set_duplicate_flag(&seller.id, true).await? {
                    flagged += 1;
                }
            }
        }

        tracing::info!(
            event_name = "duplicates.sweep.completed",
            entity = "sellers",
            scanned = sellers.len(),
            candidates = candidates.len(),
            flagged,
            "duplicate sweep completed"
        );

        Ok(SweepReport {
            entity: DuplicateEntity::Sellers,
            scanned: sellers.len(),
            candidates: resolve(&sellers, &candidates, |seller| {
                (seller.id.0.clone(), seller.name.clone())
            }),
            flagged,
        })
    }

    pub async fn sweep_brands(&self, flag: bool) -> Result<SweepReport, ApplicationError> {
        let brands = self.brands.all().await?;
        let candidates = self.detector.detect(&brands);

        let mut flagged = 0;
        if flag {
            for index in duplicate_indices(&candidates) {
                let Some(brand) = brands.get(index) else { continue };
                if !brand.is_duplicate && self.brands.set_duplicate_flag(&brand.id, true).await? {
                    flagged += 1;
                }
            }
        }

        tracing::info!(
            event_name = "duplicates.sweep.completed",
            entity = "brands",
            scanned = brands.len(),
            candidates = candidates.len(),
            flagged,
            "duplicate sweep completed"
        );

        Ok(SweepReport {
            entity: DuplicateEntity::Brands,
            scanned: brands.len(),
            candidates: resolve(&brands, &candidates, |brand| {
                (brand.id.0.clone(), brand.name.clone())
            }),
            flagged,
        })
    }

    pub async fn merge_exact(&self, entity: DuplicateEntity) -> Result<MergeReport, ApplicationError> {
        match entity {
            DuplicateEntity::Sellers => self.merge_exact_sellers().await,
            DuplicateEntity::Brands => self.merge_exact_brands().await,
        }
    }

    /// Deletes the later record of every exact seller pair; the oldest copy
    /// is kept.
    pub async fn merge_exact_sellers(&self) -> Result<MergeReport, ApplicationError> {
        let sellers = self.sellers.all().await?;
        let exact = exact_only(self.detector.detect(&sellers));

        let mut merged = Vec::new();
        for candidate in resolve(&sellers, &exact, |seller| (seller.id.0.clone(), seller.name.clone())) {
            let Some(seller) = sellers.iter().find(|seller| seller.id.0 == candidate.duplicate_id)
            else {
                continue;
            };
            if self.sellers.delete(&seller.id).await? {
                merged.push(candidate);
            }
        }

        tracing::info!(
            event_name = "duplicates.merge.completed",
            entity = "sellers",
            scanned = sellers.len(),
            merged = merged.len(),
            "exact duplicates merged"
        );

        Ok(MergeReport { entity: DuplicateEntity::Sellers, scanned: sellers.len(), merged })
    }

    /// Brand deletes cascade to the brand's analyses.
    pub async fn merge_exact_brands(&self) -> Result<MergeReport, ApplicationError> {
        let brands = self.brands.all().await?;
        let exact = exact_only(self.detector.detect(&brands));

        let mut merged = Vec::new();
        for candidate in resolve(&brands, &exact, |brand| (brand.id.0.clone(), brand.name.clone())) {
            let Some(brand) = brands.iter().find(|brand| brand.id.0 == candidate.duplicate_id) else {
                continue;
            };
            if self.brands.delete(&brand.id).await? {
                merged.push(candidate);
            }
        }

        tracing::info!(
            event_name = "duplicates.merge.completed",
            entity = "brands",
            scanned = brands.len(),
            merged = merged.len(),
            "exact duplicates merged"
        );

        Ok(MergeReport { entity: DuplicateEntity::Brands, scanned: brands.len(), merged })
    }

    /// Validates a new seller, checks it against every stored seller and
    /// saves it. The returned record carries the duplicate flag and the
    /// validation outcome.
    pub async fn register_seller(&self, seller: Seller) -> Result<Seller, ApplicationError> {
        let mut seller = validate_seller(&seller);
        let mut snapshot = self.sellers.all().await?;
        snapshot.retain(|existing| existing.id != seller.id);
        snapshot.push(seller.clone());

        let candidate_index = snapshot.len() - 1;
        seller.is_duplicate = seller.is_duplicate
            || duplicate_indices(&self.detector.detect(&snapshot)).contains(&candidate_index);

        self.sellers.save(seller.clone()).await?;
        Ok(seller)
    }

    pub async fn register_brand(&self, brand: Brand) -> Result<Brand, ApplicationError> {
        let mut brand = validate_brand(&brand);
        let mut snapshot = self.brands.all().await?;
        snapshot.retain(|existing| existing.id != brand.id);
        snapshot.push(brand.clone());

        let candidate_index = snapshot.len() - 1;
        brand.is_duplicate = brand.is_duplicate
            || duplicate_indices(&self.detector.detect(&snapshot)).contains(&candidate_index);

        self.brands.save(brand.clone()).await?;
        Ok(brand)
    }
}
