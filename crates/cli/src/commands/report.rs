use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use leadgen_db::repositories::{SqlBrandRepository, SqlQaAnalysisRepository, SqlSellerRepository};
use leadgen_db::services::ReportService;

use crate::commands::{
    application_failure, finish, load_config, open_database, runtime, CommandFailure,
    CommandResult,
};

/// Defaults to today in UTC.
pub fn run(date: Option<&str>) -> CommandResult {
    finish("report", daily(date))
}

fn daily(date: Option<&str>) -> Result<CommandResult, CommandFailure> {
    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|error| {
            ("invalid_input", format!("`{raw}` is not a YYYY-MM-DD date: {error}"), 6)
        })?,
        None => Utc::now().date_naive(),
    };
    let config = load_config()?;
    let runtime = runtime()?;

    let report = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let service = ReportService::new(
            Arc::new(SqlSellerRepository::new(pool.clone())),
            Arc::new(SqlBrandRepository::new(pool.clone())),
            Arc::new(SqlQaAnalysisRepository::new(pool.clone())),
        );
        let result = service.daily_report(date).await;
        pool.close().await;
        result.map_err(application_failure)
    })?;

    Ok(CommandResult::success_with_data("report", format!("daily report for {date}"), &report))
}
