// ABOUTME: Wrapper for pg_dump producing the source dump as INSERT statements
// ABOUTME: The dump is the input of the transform step

use super::client_command;
use crate::config::DatabaseConfig;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Dump schema and data of the source database into a plain SQL file
///
/// Rows are written as `INSERT` statements (`--inserts`) rather than `COPY`
/// blocks, because only `INSERT` statements are rewritten downstream.
pub async fn dump_database(source: &DatabaseConfig, output_path: &Path) -> Result<()> {
    tracing::info!(
        "Dumping database '{}' on {} to {}",
        source.dbname,
        source.host,
        output_path.display()
    );

    let output = client_command("pg_dump", source)
        .arg("--inserts")
        .arg("--no-owner")
        .arg(format!("--file={}", output_path.display()))
        .output()
        .context("Failed to execute pg_dump. Is PostgreSQL client installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("pg_dump failed: {}", stderr);
    }

    tracing::info!("✓ Database dumped successfully");
    Ok(())
}
