pub mod config;
pub mod dedup;
pub mod domain;
pub mod errors;
pub mod qa;
pub mod reporting;
pub mod source;
pub mod validation;

pub use dedup::{DuplicateCandidate, DuplicateDetector, DuplicateIdentity, DuplicateKind};
pub use domain::analysis::{QaAnalysis, QaAnalysisId};
pub use domain::brand::{Brand, BrandDraft, BrandId};
pub use domain::seller::{Seller, SellerDraft, SellerId};
pub use domain::{RecordStatus, ValidationStatus};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use qa::classify::{ProfitabilityClassification, ProfitabilityColor, ProfitabilityStatus};
pub use qa::competition::{CompetitionLevel, CompetitionScore};
pub use qa::metrics::ProfitMetrics;
pub use qa::price::{Price, ProductPriceSample, ProductRecord};
pub use qa::recommendation::Recommendation;
pub use qa::{QaAnalyzer, QaEvaluation};
pub use reporting::DailyReport;
pub use source::{ProductPriceSource, StaticPriceSource};
