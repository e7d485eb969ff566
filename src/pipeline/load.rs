// ABOUTME: Wrapper for psql loading the rewritten dump into the destination
// ABOUTME: Stops at the first SQL error so a bad load is reported as a failure

use super::client_command;
use crate::config::DatabaseConfig;
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Stdio;

/// Replay a SQL file against the destination database with psql
pub async fn load_dump(destination: &DatabaseConfig, input_path: &Path) -> Result<()> {
    tracing::info!(
        "Loading {} into database '{}' on {}",
        input_path.display(),
        destination.dbname,
        destination.host
    );

    let status = client_command("psql", destination)
        .arg("--echo-all")
        .arg("--set=ON_ERROR_STOP=1")
        .arg(format!("--file={}", input_path.display()))
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .context(
            "Failed to execute psql. Is PostgreSQL client installed?\n\
             Install with:\n\
             - Ubuntu/Debian: sudo apt-get install postgresql-client\n\
             - macOS: brew install postgresql\n\
             - RHEL/CentOS: sudo yum install postgresql",
        )?;

    if !status.success() {
        bail!(
            "Loading the dump failed.\n\
             \n\
             Common causes:\n\
             - Destination database does not exist\n\
             - Table already exists or already holds these rows\n\
             - Destination column types do not accept the rewritten values\n\
             - User lacks CREATE or INSERT privileges on the destination"
        );
    }

    tracing::info!("✓ Dump loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    #[ignore]
    async fn test_load_dump() {
        let host =
            std::env::var("TEST_DESTINATION_HOST").expect("TEST_DESTINATION_HOST must be set");
        let destination = DatabaseConfig {
            host,
            ..DatabaseConfig::default()
        };

        let dir = tempdir().unwrap();
        let file = dir.path().join("load.sql");
        std::fs::write(&file, "SELECT 1;\n").unwrap();

        let result = load_dump(&destination, &file).await;
        assert!(result.is_ok());
    }
}
