// ABOUTME: Pipeline configuration loaded from TOML
// ABOUTME: Database endpoints, dump location, readiness and export settings

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection settings for one PostgreSQL database, passed to the client tools
///
/// Fields missing from a `[source]`/`[destination]` table take the generic
/// defaults (`localhost:5432`, user and database `postgres`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub dbname: String,
    /// Falls back to the `PGPASSWORD` environment variable when unset
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            dbname: "postgres".to_string(),
            password: None,
        }
    }
}

impl DatabaseConfig {
    fn named(host: &str, dbname: &str) -> Self {
        Self {
            host: host.to_string(),
            dbname: dbname.to_string(),
            ..Self::default()
        }
    }

    pub fn password(&self) -> Option<String> {
        self.password
            .clone()
            .or_else(|| std::env::var("PGPASSWORD").ok())
    }

    /// `--host/--port/--username/--dbname` arguments shared by psql and pg_dump
    pub fn connection_args(&self) -> Vec<String> {
        vec![
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
            "--username".to_string(),
            self.user.clone(),
            "--dbname".to_string(),
            self.dbname.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Retries after the first probe
    pub max_retries: u32,
    /// Delay before the first retry, doubled after each one
    pub delay_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay_secs: 5,
        }
    }
}

impl ReadinessConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    /// Object key the cleaned CSV is stored under, relative to `output_dir`
    pub object_key: String,
    /// Numeric columns whose missing or unparseable values get the column median
    pub median_impute_columns: Vec<String>,
    /// Columns whose missing values get `fill_value`
    pub fill_unknown_columns: Vec<String>,
    pub fill_value: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("export"),
            object_key: "telecom_customer_churn/cleaned_data.csv".to_string(),
            median_impute_columns: vec!["Total Charges".to_string()],
            fill_unknown_columns: vec!["Churn Reason".to_string()],
            fill_value: "Unknown".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn object_path(&self) -> PathBuf {
        self.output_dir.join(&self.object_key)
    }
}

/// Everything `run` and `export` need to know about the deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: DatabaseConfig,
    pub destination: DatabaseConfig,
    pub dump_file: PathBuf,
    pub table: String,
    pub readiness: ReadinessConfig,
    pub export: ExportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: DatabaseConfig::named("source_postgres", "source_db"),
            destination: DatabaseConfig::named("destination_postgres", "destination_db"),
            dump_file: PathBuf::from("data_dump.sql"),
            table: "telecom_customer_churn".to_string(),
            readiness: ReadinessConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file, or use the built-in deployment defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        validate_table_name(&self.table)?;
        for (role, db) in [("source", &self.source), ("destination", &self.destination)] {
            if db.host.trim().is_empty() || db.dbname.trim().is_empty() {
                bail!("{} database needs both host and dbname", role);
            }
        }
        if self.export.object_key.trim().is_empty() {
            bail!("export.object_key cannot be empty");
        }
        Ok(())
    }
}

/// Table names end up in a `SELECT` sent to psql, so only plain
/// (optionally schema-qualified) identifiers are accepted
pub fn validate_table_name(table: &str) -> Result<()> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && !part.starts_with(|c: char| c.is_ascii_digit())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| valid_part(p)) {
        bail!(
            "Invalid table name '{}': use letters, digits and underscores, optionally schema-qualified",
            crate::utils::sanitize_identifier(table)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_deployment() {
        let config = PipelineConfig::default();
        assert_eq!(config.source.host, "source_postgres");
        assert_eq!(config.source.dbname, "source_db");
        assert_eq!(config.destination.host, "destination_postgres");
        assert_eq!(config.destination.dbname, "destination_db");
        assert_eq!(config.dump_file, PathBuf::from("data_dump.sql"));
        assert_eq!(config.table, "telecom_customer_churn");
        assert_eq!(config.readiness.max_retries, 5);
        assert_eq!(
            config.export.object_path(),
            PathBuf::from("export/telecom_customer_churn/cleaned_data.csv")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            table = "public.churn"

            [destination]
            host = "db.internal"
            dbname = "warehouse"
            password = "pw"

            [readiness]
            delay_secs = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.table, "public.churn");
        assert_eq!(config.destination.host, "db.internal");
        assert_eq!(config.destination.port, 5432);
        assert_eq!(config.destination.password(), Some("pw".to_string()));
        assert_eq!(config.source.host, "source_postgres");
        assert_eq!(config.readiness.max_retries, 5);
        assert_eq!(config.readiness.delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(PipelineConfig::from_toml_str("table = \"t; DROP TABLE x\"").is_err());
        assert!(PipelineConfig::from_toml_str("[source]\nhost = \"\"").is_err());
        assert!(PipelineConfig::from_toml_str("table = 5").is_err());
    }

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("telecom_customer_churn").is_ok());
        assert!(validate_table_name("public.t1").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name("1abc").is_err());
        assert!(validate_table_name("t;--").is_err());
        assert!(validate_table_name("\"Quoted\"").is_err());
    }

    #[test]
    fn test_connection_args() {
        let db = DatabaseConfig::named("h", "d");
        assert_eq!(
            db.connection_args(),
            ["--host", "h", "--port", "5432", "--username", "postgres", "--dbname", "d"]
        );
    }

    #[test]
    fn test_load() {
        assert_eq!(PipelineConfig::load(None).unwrap(), PipelineConfig::default());

        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "dump_file = \"/tmp/d.sql\"\n").unwrap();
        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.dump_file, PathBuf::from("/tmp/d.sql"));

        assert!(PipelineConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
