// ABOUTME: Readiness probe waiting for PostgreSQL to accept connections
// ABOUTME: Polls pg_isready with retry and backoff before the pipeline starts

use crate::config::{DatabaseConfig, ReadinessConfig};
use crate::utils;
use anyhow::{bail, Context, Result};
use std::process::Command;

/// Run `pg_isready` once against `db`
pub async fn probe(db: &DatabaseConfig) -> Result<()> {
    let output = Command::new("pg_isready")
        .arg("--host")
        .arg(&db.host)
        .arg("--port")
        .arg(db.port.to_string())
        .output()
        .context("Failed to execute pg_isready. Is PostgreSQL client installed?")?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() || !is_accepting(&stdout) {
        bail!(
            "PostgreSQL at {}:{} is not ready: {}",
            db.host,
            db.port,
            stdout.trim()
        );
    }

    Ok(())
}

fn is_accepting(pg_isready_output: &str) -> bool {
    pg_isready_output.contains("accepting connections")
}

/// Wait until `db` accepts connections, retrying per `readiness`
pub async fn wait_for_postgres(db: &DatabaseConfig, readiness: &ReadinessConfig) -> Result<()> {
    tracing::info!("Waiting for PostgreSQL at {}:{}...", db.host, db.port);

    utils::retry_with_backoff(|| probe(db), readiness.max_retries, readiness.delay())
        .await
        .with_context(|| {
            format!(
                "PostgreSQL at {} did not become ready after {} attempt(s)",
                db.host,
                readiness.max_retries + 1
            )
        })?;

    tracing::info!("✓ Successfully connected to PostgreSQL at {}", db.host);
    Ok(())
}
