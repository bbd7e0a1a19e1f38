use leadgen_db::{connect_with_settings, migrations};

use crate::commands::{finish, load_config, runtime, CommandFailure, CommandResult};

pub fn run() -> CommandResult {
    finish("migrate", apply())
}

fn apply() -> Result<CommandResult, CommandFailure> {
    let config = load_config()?;
    let runtime = runtime()?;

    let applied = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4))?;

        let pending = migrations::pending_count(&pool)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5))?;
        pool.close().await;
        Ok::<usize, CommandFailure>(pending)
    })?;

    Ok(CommandResult::success("migrate", format!("applied {applied} pending migrations")))
}
