// ABOUTME: Export command producing the cleaned churn CSV from the destination
// ABOUTME: Fetches the table, imputes missing values and writes the object file

use crate::config::PipelineConfig;
use crate::pipeline::{self, CleaningSummary};
use crate::utils;
use anyhow::Result;
use std::path::PathBuf;

/// Fetch `config.table` from the destination, clean it and write it to
/// `config.export.object_path()`; returns the written path and what changed
pub async fn export(config: &PipelineConfig) -> Result<(PathBuf, CleaningSummary)> {
    config.validate()?;
    utils::check_required_tools(&["pg_isready", "psql"])?;

    tracing::info!("Step 1/3: Waiting for destination database...");
    pipeline::wait_for_postgres(&config.destination, &config.readiness).await?;

    tracing::info!("Step 2/3: Fetching and cleaning '{}'...", config.table);
    let mut dataset = pipeline::fetch_table(&config.destination, &config.table).await?;
    let summary = pipeline::clean_dataset(&mut dataset, &config.export)?;

    tracing::info!("Step 3/3: Writing cleaned dataset...");
    let path = config.export.object_path();
    pipeline::write_csv(&dataset, &path)?;

    tracing::info!("✅ Export complete: {}", path.display());
    Ok((path, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadinessConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_export_fails_when_destination_unreachable() {
        let dir = tempdir().unwrap();
        let mut config = PipelineConfig {
            readiness: ReadinessConfig {
                max_retries: 0,
                delay_secs: 0,
            },
            ..PipelineConfig::default()
        };
        config.destination.host = "nonexistent.invalid".to_string();
        config.export.output_dir = dir.path().to_path_buf();

        assert!(export(&config).await.is_err());
        assert!(!config.export.object_path().exists());
    }

    #[tokio::test]
    #[ignore]
    async fn test_export_against_live_database() {
        let host =
            std::env::var("TEST_DESTINATION_HOST").expect("TEST_DESTINATION_HOST must be set");
        let dir = tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.destination.host = host;
        config.export.output_dir = dir.path().to_path_buf();

        let (path, _) = export(&config).await.unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.exists());
    }
}
