pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "leadgen",
    about = "Leadgen operator CLI",
    long_about = "Import leads, run profitability analyses and duplicate sweeps, build daily reports, apply migrations and check readiness.",
    after_help = "Examples:\n  leadgen doctor --json\n  leadgen analyze --products products.json\n  leadgen import --entity brands --file brands.json\n  leadgen dedupe --entity brands --flag\n  leadgen report --date 2026-10-01"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, price source readiness, DB connectivity and schema state")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run a profitability analysis over a JSON product list")]
    Analyze {
        #[arg(long, value_name = "FILE", help = "JSON array of products, or {\"products\": [...]}")]
        products: PathBuf,
        #[arg(long, help = "Store the analysis against this brand; omit for an ad-hoc run")]
        brand_id: Option<String>,
        #[arg(long, help = "Brand name used for ad-hoc runs")]
        brand_name: Option<String>,
    },
    #[command(about = "Register brands or sellers from a JSON file")]
    Import {
        #[arg(long, help = "sellers or brands")]
        entity: String,
        #[arg(long, value_name = "FILE", help = "JSON array of records, or {\"records\": [...]}")]
        file: PathBuf,
    },
    #[command(about = "Detect duplicate sellers or brands")]
    Dedupe {
        #[arg(long, default_value = "sellers", help = "sellers or brands")]
        entity: String,
        #[arg(long, help = "Mark newly found duplicates in the database")]
        flag: bool,
        #[arg(long, conflicts_with = "flag", help = "Delete exact duplicates, keeping the oldest")]
        merge: bool,
    },
    #[command(about = "Build the daily report")]
    Report {
        #[arg(long, value_name = "YYYY-MM-DD", help = "Report date (defaults to today, UTC)")]
        date: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Analyze { products, brand_id, brand_name } => {
            commands::analyze::run(&products, brand_id.as_deref(), brand_name.as_deref())
        }
        Command::Import { entity, file } => commands::import::run(&entity, &file),
        Command::Dedupe { entity, merge: true, .. } => commands::dedupe::merge(&entity),
        Command::Dedupe { entity, flag, .. } => commands::dedupe::run(&entity, flag),
        Command::Report { date } => commands::report::run(date.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
