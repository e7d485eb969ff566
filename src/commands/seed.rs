// ABOUTME: Seed command converting the raw churn CSV into an SQL seed file
// ABOUTME: The seed file initializes the source database

use crate::pipeline::{self, SeedOptions};
use crate::utils;
use anyhow::{Context, Result};
use std::path::Path;

/// Write the seed SQL generated from `csv_path` to `output`
pub fn seed(csv_path: &Path, output: &Path, table: Option<&str>) -> Result<()> {
    let mut options = SeedOptions::default();
    if let Some(table) = table {
        options.table = table.to_string();
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    let sql = pipeline::generate_seed_sql(file, &options)
        .with_context(|| format!("Failed to generate seed SQL from {}", csv_path.display()))?;

    utils::write_atomically(output, sql.as_bytes())
        .with_context(|| format!("Failed to write seed SQL to {}", output.display()))?;

    tracing::info!("✓ Seed SQL written to {}", output.display());
    Ok(())
}
