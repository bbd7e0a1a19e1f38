use std::sync::Arc;

use leadgen_db::repositories::{SqlBrandRepository, SqlSellerRepository};
use leadgen_db::services::{DuplicateEntity, DuplicateService};
use leadgen_db::DbPool;

use crate::commands::{
    application_failure, finish, load_config, open_database, runtime, CommandFailure,
    CommandResult,
};

pub fn run(entity: &str, flag: bool) -> CommandResult {
    finish("dedupe", sweep(entity, flag))
}

/// Deletes exact duplicates and keeps the oldest record of each group.
pub fn merge(entity: &str) -> CommandResult {
    finish("dedupe", merge_exact(entity))
}

fn service(pool: &DbPool) -> DuplicateService {
    DuplicateService::new(
        Arc::new(SqlSellerRepository::new(pool.clone())),
        Arc::new(SqlBrandRepository::new(pool.clone())),
    )
}

fn sweep(entity: &str, flag: bool) -> Result<CommandResult, CommandFailure> {
    let entity: DuplicateEntity = entity.parse().map_err(|error| ("invalid_input", error, 6))?;
    let config = load_config()?;
    let runtime = runtime()?;

    let report = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let result = service(&pool).sweep(entity, flag).await;
        pool.close().await;
        result.map_err(application_failure)
    })?;

    let message = if flag {
        format!(
            "found {} duplicate {} candidates, flagged {}",
            report.candidates.len(),
            entity.as_str(),
            report.flagged
        )
    } else {
        format!("found {} duplicate {} candidates", report.candidates.len(), entity.as_str())
    };
    Ok(CommandResult::success_with_data("dedupe", message, &report))
}

fn merge_exact(entity: &str) -> Result<CommandResult, CommandFailure> {
    let entity: DuplicateEntity = entity.parse().map_err(|error| ("invalid_input", error, 6))?;
    let config = load_config()?;
    let runtime = runtime()?;

    let report = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let result = service(&pool).merge_exact(entity).await;
        pool.close().await;
        result.map_err(application_failure)
    })?;

    let message = format!(
        "removed {} exact duplicate {} out of {}",
        report.merged.len(),
        entity.as_str(),
        report.scanned
    );
    Ok(CommandResult::success_with_data("dedupe", message, &report))
}
