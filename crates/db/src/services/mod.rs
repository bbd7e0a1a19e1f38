//! Application services over the repositories. Each service is built
//! explicitly from its collaborators; nothing here is process-global.

pub mod duplicates;
pub mod leads;
pub mod qa;
pub mod reports;

use leadgen_core::errors::ApplicationError;

use crate::repositories::RepositoryError;

pub use duplicates::{
    DuplicateEntity, DuplicateService, MergeReport, ResolvedCandidate, SweepReport,
};
pub use leads::LeadService;
pub use qa::QaService;
pub use reports::ReportService;

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}
