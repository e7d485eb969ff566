// ABOUTME: CLI entry point for churn-elt
// ABOUTME: Parses commands and routes to appropriate handlers

use churn_elt::commands;
use churn_elt::config::PipelineConfig;
use churn_elt::schema::Schema;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "churn-elt")]
#[command(about = "Dump, remap and reload the telecom customer churn dataset", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the INSERT statements of a SQL dump to the destination schema
    Rewrite {
        /// Dump file to rewrite
        input: PathBuf,
        /// Write here instead of rewriting the input in place
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Also write the rewrite report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
        /// Column mapping TOML (defaults to the built-in churn layout)
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Dump the source database, rewrite the dump and load it into the destination
    Run {
        /// Pipeline config TOML (defaults to the container deployment)
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Stop after rewriting the dump
        #[arg(long)]
        skip_load: bool,
    },
    /// Export the destination table as a cleaned CSV
    Export {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Generate seed SQL for the source database from the raw CSV
    Seed {
        /// Raw churn CSV with a header row
        csv: PathBuf,
        #[arg(long, short, default_value = "init-ddl.sql")]
        output: PathBuf,
        /// Table to create (defaults to telecom_customer_churn)
        #[arg(long)]
        table: Option<String>,
    },
    /// Print the column mapping as TOML
    Schema {
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rewrite {
            input,
            output,
            report,
            schema,
        } => {
            let schema = Schema::load_or_default(schema.as_deref())?;
            let summary = commands::rewrite(&input, output.as_deref(), &schema, report.as_deref())?;
            tracing::info!(
                "{} statement(s) found, {} rewritten, {} missing and {} unparseable value(s)",
                summary.statements_found(),
                summary.statements_rewritten,
                summary.missing_values,
                summary.unparseable_values
            );
            Ok(())
        }
        Commands::Run {
            config,
            schema,
            skip_load,
        } => {
            let config = PipelineConfig::load(config.as_deref())?;
            let schema = Schema::load_or_default(schema.as_deref())?;
            commands::run(&config, &schema, skip_load).await?;
            Ok(())
        }
        Commands::Export { config } => {
            let config = PipelineConfig::load(config.as_deref())?;
            commands::export(&config).await?;
            Ok(())
        }
        Commands::Seed { csv, output, table } => commands::seed(&csv, &output, table.as_deref()),
        Commands::Schema { schema } => {
            let schema = Schema::load_or_default(schema.as_deref())?;
            commands::print_schema(&schema)
        }
    }
}
