// ABOUTME: Export of the destination table as a cleaned CSV dataset
// ABOUTME: Fetches rows through psql, imputes missing values and writes the object file

use super::client_command;
use crate::config::{DatabaseConfig, ExportConfig};
use crate::utils;
use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

/// Rectangular dataset with a header row; `None` is a missing value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Dataset {
    /// Read CSV with a header row; empty fields become `None`
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(String::from)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV row {}", idx + 1))?;
            let row = record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        None
                    } else {
                        Some(field.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .context("Failed to write CSV header")?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(|v| v.as_deref().unwrap_or("")))
                .context("Failed to write CSV row")?;
        }
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish CSV output: {}", e.error()))
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        match self.column_index(name) {
            Some(idx) => Ok(idx),
            None => bail!(
                "Column '{}' not found in dataset (columns: {})",
                utils::sanitize_identifier(name),
                self.headers.join(", ")
            ),
        }
    }
}

/// What cleaning changed, per column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningSummary {
    /// (column, values replaced, median used)
    pub imputed: Vec<(String, usize, f64)>,
    /// (column, values filled)
    pub filled: Vec<(String, usize)>,
}

/// Fetch every row of `table` from `db` as CSV through psql
pub async fn fetch_table(db: &DatabaseConfig, table: &str) -> Result<Dataset> {
    crate::config::validate_table_name(table)?;
    tracing::info!("Fetching table '{}' from database '{}'", table, db.dbname);

    let output = client_command("psql", db)
        .arg("--csv")
        .arg(format!("--command=SELECT * FROM {};", table))
        .output()
        .context("Failed to execute psql. Is PostgreSQL client installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("psql failed to fetch table '{}': {}", table, stderr);
    }

    let dataset = Dataset::from_csv(output.stdout.as_slice())
        .with_context(|| format!("Failed to parse rows of table '{}'", table))?;

    tracing::info!("✓ Fetched {} row(s)", dataset.rows.len());
    Ok(dataset)
}

/// Impute and fill the configured columns in place
///
/// Median columns are read as numbers; values that are missing or do not
/// parse are replaced by the median of the values that do. Fill columns get
/// `fill_value` wherever they are missing; blank text is kept as is.
pub fn clean_dataset(dataset: &mut Dataset, config: &ExportConfig) -> Result<CleaningSummary> {
    let mut summary = CleaningSummary::default();

    for column in &config.median_impute_columns {
        let idx = dataset.require_column(column)?;

        let parsed: Vec<Option<f64>> = dataset
            .rows
            .iter()
            .map(|row| row.get(idx).and_then(|v| parse_finite(v.as_deref())))
            .collect();
        let mut numbers: Vec<f64> = parsed.iter().flatten().copied().collect();

        let Some(median) = median(&mut numbers) else {
            tracing::warn!("⚠ Column '{}' has no numeric values, nothing to impute", column);
            continue;
        };

        let replacement = format!("{:?}", median);
        let mut replaced = 0;
        for (row, value) in dataset.rows.iter_mut().zip(&parsed) {
            if value.is_none() {
                if let Some(cell) = row.get_mut(idx) {
                    *cell = Some(replacement.clone());
                    replaced += 1;
                }
            }
        }

        tracing::info!(
            "Imputed {} value(s) in '{}' with median {}",
            replaced,
            column,
            replacement
        );
        summary.imputed.push((column.clone(), replaced, median));
    }

    for column in &config.fill_unknown_columns {
        let idx = dataset.require_column(column)?;
        let mut filled = 0;
        for row in dataset.rows.iter_mut() {
            if let Some(cell) = row.get_mut(idx).filter(|cell| cell.is_none()) {
                *cell = Some(config.fill_value.clone());
                filled += 1;
            }
        }

        tracing::info!(
            "Filled {} missing value(s) in '{}' with '{}'",
            filled,
            column,
            config.fill_value
        );
        summary.filled.push((column.clone(), filled));
    }

    Ok(summary)
}

/// Write the dataset as CSV, creating parent directories as needed
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let bytes = dataset.to_csv_bytes()?;
    utils::write_atomically(path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("✓ Wrote {} row(s) to {}", dataset.rows.len(), path.display());
    Ok(())
}

/// Median of `values` (mean of the middle pair for even counts)
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn parse_finite(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = "CustomerID,Total Charges,Churn Reason\n\
                          A,100.5,Moved\n\
                          B,,\n\
                          C, ,Competitor offered more data\n\
                          D,20,\n\
                          E,300.0,Price too high\n";

    #[test]
    fn test_from_csv_marks_empty_fields_missing() {
        let dataset = Dataset::from_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.headers, ["CustomerID", "Total Charges", "Churn Reason"]);
        assert_eq!(dataset.rows.len(), 5);
        assert_eq!(dataset.rows[1], vec![Some("B".to_string()), None, None]);
        assert_eq!(dataset.rows[2][1], Some(" ".to_string()));
        assert_eq!(dataset.column_index("Churn Reason"), Some(2));
        assert_eq!(dataset.column_index("Nope"), None);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0]), Some(3.0));
        assert_eq!(median(&mut [5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_clean_dataset() {
        let mut dataset = Dataset::from_csv(SAMPLE.as_bytes()).unwrap();
        let summary = clean_dataset(&mut dataset, &ExportConfig::default()).unwrap();

        // Median of 20, 100.5, 300.0
        assert_eq!(summary.imputed, vec![("Total Charges".to_string(), 2, 100.5)]);
        assert_eq!(summary.filled, vec![("Churn Reason".to_string(), 2)]);

        assert_eq!(dataset.rows[1][1].as_deref(), Some("100.5"));
        assert_eq!(dataset.rows[2][1].as_deref(), Some("100.5"));
        assert_eq!(dataset.rows[3][1].as_deref(), Some("20"));
        assert_eq!(dataset.rows[1][2].as_deref(), Some("Unknown"));
        assert_eq!(dataset.rows[3][2].as_deref(), Some("Unknown"));
        assert_eq!(dataset.rows[4][2].as_deref(), Some("Price too high"));
    }

    #[test]
    fn test_fill_keeps_blank_text() {
        let mut dataset =
            Dataset::from_csv("Total Charges,Churn Reason\n1,\n2,\"  \"\n".as_bytes()).unwrap();
        let summary = clean_dataset(&mut dataset, &ExportConfig::default()).unwrap();

        assert_eq!(summary.filled, vec![("Churn Reason".to_string(), 1)]);
        assert_eq!(dataset.rows[0][1].as_deref(), Some("Unknown"));
        assert_eq!(dataset.rows[1][1].as_deref(), Some("  "));
    }

    #[test]
    fn test_clean_dataset_missing_column() {
        let mut dataset = Dataset::from_csv("a,b\n1,2\n".as_bytes()).unwrap();
        let err = clean_dataset(&mut dataset, &ExportConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Total Charges"));
    }

    #[test]
    fn test_clean_dataset_without_numbers_leaves_column() {
        let mut dataset = Dataset::from_csv("Total Charges,Churn Reason\nx,\n".as_bytes()).unwrap();
        let summary = clean_dataset(&mut dataset, &ExportConfig::default()).unwrap();
        assert!(summary.imputed.is_empty());
        assert_eq!(dataset.rows[0][0].as_deref(), Some("x"));
    }

    #[test]
    fn test_write_csv_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("telecom_customer_churn").join("cleaned_data.csv");
        let dataset = Dataset {
            headers: vec!["id".to_string(), "note".to_string()],
            rows: vec![
                vec![Some("1".to_string()), Some("has, comma".to_string())],
                vec![Some("2".to_string()), None],
            ],
        };

        write_csv(&dataset, &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "id,note\n1,\"has, comma\"\n2,\n"
        );

        let reread = Dataset::from_csv(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(reread, dataset);
    }

    #[tokio::test]
    async fn test_fetch_table_rejects_bad_name() {
        let db = DatabaseConfig::default();
        assert!(fetch_table(&db, "t; DROP TABLE t").await.is_err());
    }
}
