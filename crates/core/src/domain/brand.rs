use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{RecordStatus, ValidationStatus};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrandId(pub String);

impl BrandId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub domain: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Platform name (`linkedin`, `instagram`, ...) to profile URL.
    #[serde(default)]
    pub social_media: BTreeMap<String, String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
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

impl Brand {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: BrandId::generate(),
            name: name.into(),
            domain: None,
            email: None,
            phone: None,
            social_media: BTreeMap::new(),
            description: None,
            industry: None,
            location: None,
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

/// Caller-supplied brand fields. Ids, flags and timestamps are assigned on
/// intake.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BrandDraft {
    pub name: String,
    pub domain: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub social_media: BTreeMap<String, String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl BrandDraft {
    pub fn into_brand(self) -> Brand {
        Brand {
            domain: self.domain,
            email: self.email,
            phone: self.phone,
            social_media: self.social_media,
            description: self.description,
            industry: self.industry,
            location: self.location,
            notes: self.notes,
            ..Brand::new(self.name)
        }
    }
}
