// ABOUTME: Column schema mapping source dump columns to destination fields
// ABOUTME: Ships the fixed churn layout and loads alternative layouts from TOML

use crate::error::SchemaError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Type a raw cell is coerced to on its way into the destination row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coercion {
    Text,
    Integer,
    Float,
    Boolean,
}

/// Substring substitution applied to text fields after coercion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

/// One source column and the destination field it becomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source: String,
    pub destination: String,
    pub coercion: Coercion,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace: Vec<Replacement>,
}

impl ColumnMapping {
    pub fn new(source: &str, destination: &str, coercion: Coercion) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            coercion,
            replace: Vec::new(),
        }
    }

    pub fn with_replacement(mut self, from: &str, to: &str) -> Self {
        self.replace.push(Replacement {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }
}

#[derive(Serialize, Deserialize)]
struct SchemaFile {
    columns: Vec<ColumnMapping>,
}

/// Ordered column mapping used to read dump tuples and build destination rows
///
/// Tuples in a dump carry no column names, so the position of each mapping
/// is the position of the value it reads. Destination fields are emitted in
/// the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnMapping>,
}

impl Schema {
    /// Build a schema, rejecting empty, blank or duplicated names
    pub fn new(columns: Vec<ColumnMapping>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut sources = HashSet::new();
        let mut destinations = HashSet::new();
        for (idx, column) in columns.iter().enumerate() {
            if column.source.trim().is_empty() || column.destination.trim().is_empty() {
                return Err(SchemaError::BlankName(idx + 1));
            }
            if !sources.insert(column.source.as_str()) {
                return Err(SchemaError::DuplicateSource(column.source.clone()));
            }
            if !destinations.insert(column.destination.as_str()) {
                return Err(SchemaError::DuplicateDestination(
                    column.destination.clone(),
                ));
            }
        }

        Ok(Self { columns })
    }

    /// The telecom customer churn layout: 33 columns in dump order
    pub fn churn() -> Self {
        use Coercion::{Boolean, Float, Integer, Text};

        let columns = vec![
            ColumnMapping::new("CustomerID", "customerID", Text),
            ColumnMapping::new("Count", "count", Integer),
            ColumnMapping::new("Country", "country", Text),
            ColumnMapping::new("State", "state", Text),
            ColumnMapping::new("City", "city", Text),
            ColumnMapping::new("Zip Code", "zipCode", Integer),
            ColumnMapping::new("Lat Long", "latlong", Text),
            ColumnMapping::new("Latitude", "latitude", Float),
            ColumnMapping::new("Longitude", "longitude", Float),
            ColumnMapping::new("Gender", "gender", Text),
            ColumnMapping::new("Senior Citizen", "seniorCitizen_fl", Boolean),
            ColumnMapping::new("Partner", "partner", Boolean),
            ColumnMapping::new("Dependents", "dependents", Boolean),
            ColumnMapping::new("Tenure Months", "tenure_months", Integer),
            ColumnMapping::new("Phone Service", "phoneService", Boolean),
            ColumnMapping::new("Multiple Lines", "multipleLines", Text),
            ColumnMapping::new("Internet Service", "internetService", Text),
            ColumnMapping::new("Online Security", "onlineSecurity", Text),
            ColumnMapping::new("Online Backup", "onlineBackup", Text),
            ColumnMapping::new("Device Protection", "deviceProtection", Text),
            ColumnMapping::new("Tech Support", "techSupport", Text),
            ColumnMapping::new("Streaming TV", "streamingTV", Text),
            ColumnMapping::new("Streaming Movies", "streamingMovies", Text),
            ColumnMapping::new("Contract", "contract", Text),
            ColumnMapping::new("Paperless Billing", "paperlessBilling", Boolean),
            ColumnMapping::new("Payment Method", "paymentMethod", Text),
            ColumnMapping::new("Monthly Charges", "monthlyCharges", Float),
            ColumnMapping::new("Total Charges", "totalCharges", Float),
            ColumnMapping::new("Churn Label", "churn_label", Boolean),
            ColumnMapping::new("Churn Value", "churn_value", Integer),
            ColumnMapping::new("Churn Score", "churn_score", Integer),
            ColumnMapping::new("CLTV", "cltv", Integer),
            ColumnMapping::new("Churn Reason", "churn_reason", Text)
                .with_replacement("Don't know", "Unknown"),
        ];

        Self { columns }
    }

    /// Parse a schema from TOML (`[[columns]]` tables)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SchemaFile = toml::from_str(content).context("Failed to parse schema TOML")?;
        Ok(Self::new(file.columns)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let file = SchemaFile {
            columns: self.columns.clone(),
        };
        toml::to_string_pretty(&file).context("Failed to serialize schema to TOML")
    }

    /// Load a schema file, or fall back to the churn layout when no path is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::churn());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        let schema = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid schema file {}", path.display()))?;

        tracing::info!(
            "Loaded schema with {} column(s) from {}",
            schema.len(),
            path.display()
        );
        Ok(schema)
    }

    pub fn columns(&self) -> &[ColumnMapping] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.source.as_str())
    }

    /// Check a column list declared by a statement against the source order
    ///
    /// Names are compared exactly (after identifier unquoting by the
    /// tokenizer), so a dump whose columns are reordered is rejected rather
    /// than mapped positionally onto the wrong fields.
    pub fn check_declared_columns(&self, declared: &[String]) -> Result<(), SchemaError> {
        if declared.len() != self.columns.len() {
            return Err(SchemaError::DeclaredColumnCount {
                expected: self.columns.len(),
                found: declared.len(),
            });
        }

        for (idx, (name, column)) in declared.iter().zip(&self.columns).enumerate() {
            if name != &column.source {
                return Err(SchemaError::DeclaredColumn {
                    position: idx + 1,
                    expected: column.source.clone(),
                    found: name.clone(),
                });
            }
        }

        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::churn()
    }
}
