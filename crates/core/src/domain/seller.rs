use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{RecordStatus, ValidationStatus};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SellerId(pub String);

impl SellerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub id: SellerId,
    pub name: String,
    pub email: Option<String>,
    pub store_url: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub is_duplicate: bool,
    #[serde(default)]
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub validation_issues: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Seller {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SellerId::generate(),
            name: name.into(),
            email: None,
            store_url: None,
            phone: None,
            company_name: None,
            location: None,
            rating: None,
            total_reviews: 0,
            status: RecordStatus::Active,
            is_duplicate: false,
            validation_status: ValidationStatus::Pending,
            validation_issues: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SellerDraft {
    pub name: String,
    pub email: Option<String>,
    pub store_url: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub total_reviews: u32,
    pub notes: Option<String>,
}

impl SellerDraft {
    pub fn into_seller(self) -> Seller {
        Seller {
            email: self.email,
            store_url: self.store_url,
            phone: self.phone,
            company_name: self.company_name,
            location: self.location,
            rating: self.rating,
            total_reviews: self.total_reviews,
            notes: self.notes,
            ..Seller::new(self.name)
        }
    }
}
