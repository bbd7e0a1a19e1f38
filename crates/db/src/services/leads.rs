use std::sync::Arc;

use leadgen_core::domain::brand::{Brand, BrandId};
use leadgen_core::domain::seller::{Seller, SellerId};
use leadgen_core::errors::ApplicationError;

use crate::repositories::{
    BrandFilter, BrandRepository, Page, PageRequest, SellerFilter, SellerRepository,
};
use crate::services::DuplicateService;

/// Brand and seller intake and lookup. New records always pass through
/// validation and the duplicate guard before they are stored.
pub struct LeadService {
    brands: Arc<dyn BrandRepository>,
    sellers: Arc<dyn SellerRepository>,
    duplicates: Arc<DuplicateService>,
}

impl LeadService {
    pub fn new(
        brands: Arc<dyn BrandRepository>,
        sellers: Arc<dyn SellerRepository>,
        duplicates: Arc<DuplicateService>,
    ) -> Self {
        Self { brands, sellers, duplicates }
    }

    pub async fn create_brand(&self, brand: Brand) -> Result<Brand, ApplicationError> {
        let brand = self.duplicates.register_brand(brand).await?;
        tracing::info!(
            event_name = "leads.brand.created",
            brand_id = %brand.id.0,
            is_duplicate = brand.is_duplicate,
            validation_status = brand.validation_status.as_str(),
            "brand registered"
        );
        Ok(brand)
    }

    pub async fn create_seller(&self, seller: Seller) -> Result<Seller, ApplicationError> {
        let seller = self.duplicates.register_seller(seller).await?;
        tracing::info!(
            event_name = "leads.seller.created",
            seller_id = %seller.id.0,
            is_duplicate = seller.is_duplicate,
            validation_status = seller.validation_status.as_str(),
            "seller registered"
        );
        Ok(seller)
    }

    pub async fn brand(&self, id: &BrandId) -> Result<Brand, ApplicationError> {
        self.brands
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound { entity: "brand", id: id.0.clone() })
    }

    pub async fn seller(&self, id: &SellerId) -> Result<Seller, ApplicationError> {
        self.sellers
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound { entity: "seller", id: id.0.clone() })
    }

    pub async fn list_brands(
        &self,
        filter: &BrandFilter,
        page: PageRequest,
    ) -> Result<Page<Brand>, ApplicationError> {
        Ok(self.brands.list(filter, page).await?)
    }

    pub async fn list_sellers(
        &self,
        filter: &SellerFilter,
        page: PageRequest,
    ) -> Result<Page<Seller>, ApplicationError> {
        Ok(self.sellers.list(filter, page).await?)
    }
}
