use std::sync::Arc;

use leadgen_core::config::{AppConfig, ConfigError, LoadOptions};
use leadgen_core::source::ProductPriceSource;
use leadgen_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::api::ApiState;
use crate::price_source::{HttpPriceSource, UnconfiguredPriceSource};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub api_state: ApiState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("price source client could not be built: {0}")]
    PriceSource(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let source: Arc<dyn ProductPriceSource> =
        match HttpPriceSource::from_config(&config.price_source).map_err(BootstrapError::PriceSource)? {
            Some(source) => Arc::new(source),
            None => Arc::new(UnconfiguredPriceSource),
        };
    info!(
        event_name = "system.bootstrap.price_source",
        correlation_id = "bootstrap",
        configured = config.price_source.base_url.is_some(),
        "price source initialized"
    );

    let api_state = ApiState::new(db_pool.clone(), source);
    Ok(Application { config, db_pool, api_state })
}

#[cfg(test)]
mod tests {
    use leadgen_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn memory_options(overrides: ConfigOverrides) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..overrides
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_when_price_source_key_is_missing() {
        let result = bootstrap(memory_options(ConfigOverrides {
            price_source_base_url: Some("https://prices.example".to_string()),
            ..ConfigOverrides::default()
        }))
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("price_source.api_key"));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_services() {
        let app = bootstrap(memory_options(ConfigOverrides::default()))
            .await
            .expect("bootstrap should succeed with an in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('brands', 'sellers', 'qa_analyses')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("lead tables should exist after bootstrap");
        assert_eq!(table_count, 3);

        let sweep = app
            .api_state
            .duplicates()
            .sweep_brands(false)
            .await
            .expect("sweep over empty tables");
        assert_eq!(sweep.scanned, 0);

        app.db_pool.close().await;
    }
}
