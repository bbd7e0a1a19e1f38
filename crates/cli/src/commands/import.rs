use std::fs;
use std::path::Path;
use std::sync::Arc;

use leadgen_core::domain::brand::BrandDraft;
use leadgen_core::domain::seller::SellerDraft;
use leadgen_core::domain::ValidationStatus;
use leadgen_core::errors::ApplicationError;
use leadgen_db::repositories::{SqlBrandRepository, SqlSellerRepository};
use leadgen_db::services::{DuplicateEntity, DuplicateService, LeadService};
use leadgen_db::DbPool;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::commands::{
    application_failure, finish, load_config, open_database, runtime, CommandFailure,
    CommandResult,
};

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile<T> {
    Bare(Vec<T>),
    Wrapped { records: Vec<T> },
}

enum Drafts {
    Brands(Vec<BrandDraft>),
    Sellers(Vec<SellerDraft>),
}

#[derive(Debug, Default, Serialize)]
struct ImportSummary {
    entity: &'static str,
    imported: usize,
    duplicates: usize,
    invalid: usize,
    ids: Vec<String>,
}

impl ImportSummary {
    fn record(&mut self, id: String, is_duplicate: bool, validation: ValidationStatus) {
        self.imported += 1;
        self.duplicates += usize::from(is_duplicate);
        self.invalid += usize::from(validation == ValidationStatus::Invalid);
        self.ids.push(id);
    }
}

/// Records are registered one by one in file order, so later rows are
/// checked against earlier rows of the same file.
pub fn run(entity: &str, path: &Path) -> CommandResult {
    finish("import", import(entity, path))
}

fn import(entity: &str, path: &Path) -> Result<CommandResult, CommandFailure> {
    let entity: DuplicateEntity = entity.parse().map_err(|error| ("invalid_input", error, 6))?;
    let raw = fs::read_to_string(path).map_err(|error| {
        ("invalid_input", format!("failed to read `{}`: {error}", path.display()), 6)
    })?;

    let drafts = match entity {
        DuplicateEntity::Brands => Drafts::Brands(parse_records(&raw, path)?),
        DuplicateEntity::Sellers => Drafts::Sellers(parse_records(&raw, path)?),
    };

    let config = load_config()?;
    let runtime = runtime()?;

    let summary = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let service = lead_service(&pool);
        let result = match drafts {
            Drafts::Brands(drafts) => import_brands(&service, drafts).await,
            Drafts::Sellers(drafts) => import_sellers(&service, drafts).await,
        };
        pool.close().await;
        result.map_err(application_failure)
    })?;

    let message = format!(
        "imported {} {} ({} possible duplicates, {} with validation issues)",
        summary.imported, summary.entity, summary.duplicates, summary.invalid
    );
    Ok(CommandResult::success_with_data("import", message, &summary))
}

async fn import_brands(
    service: &LeadService,
    drafts: Vec<BrandDraft>,
) -> Result<ImportSummary, ApplicationError> {
    let mut summary = ImportSummary { entity: "brands", ..ImportSummary::default() };
    for draft in drafts {
        let brand = service.create_brand(draft.into_brand()).await?;
        summary.record(brand.id.0, brand.is_duplicate, brand.validation_status);
    }
    Ok(summary)
}

async fn import_sellers(
    service: &LeadService,
    drafts: Vec<SellerDraft>,
) -> Result<ImportSummary, ApplicationError> {
    let mut summary = ImportSummary { entity: "sellers", ..ImportSummary::default() };
    for draft in drafts {
        let seller = service.create_seller(draft.into_seller()).await?;
        summary.record(seller.id.0, seller.is_duplicate, seller.validation_status);
    }
    Ok(summary)
}

fn lead_service(pool: &DbPool) -> LeadService {
    let brands = Arc::new(SqlBrandRepository::new(pool.clone()));
    let sellers = Arc::new(SqlSellerRepository::new(pool.clone()));
    let duplicates = Arc::new(DuplicateService::new(sellers.clone(), brands.clone()));
    LeadService::new(brands, sellers, duplicates)
}

fn parse_records<T: DeserializeOwned>(raw: &str, path: &Path) -> Result<Vec<T>, CommandFailure> {
    let parsed: RecordsFile<T> = serde_json::from_str(raw).map_err(|error| {
        ("invalid_input", format!("`{}` is not a record list: {error}", path.display()), 6)
    })?;

    Ok(match parsed {
        RecordsFile::Bare(records) | RecordsFile::Wrapped { records } => records,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::Value;

    use super::run;

    #[test]
    fn records_that_are_not_a_list_are_rejected_before_connecting() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(br#"{"records": {"name": "Acme"}}"#).expect("write records");

        let result = run("brands", file.path());
        assert_eq!(result.exit_code, 6);

        let payload: Value = serde_json::from_str(&result.output).expect("json output");
        assert_eq!(payload["command"], "import");
        assert_eq!(payload["error_class"], "invalid_input");
    }
}
