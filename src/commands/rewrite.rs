// ABOUTME: Rewrite command remapping the INSERT statements of one dump file
// ABOUTME: Writes in place or to a separate output, optionally with a JSON report

use crate::schema::Schema;
use crate::transform::{self, RewriteReport};
use crate::utils;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Rewrite the dump at `input` against `schema`
///
/// The dump is rewritten in place unless `output` is given. When
/// `report_path` is set, the [`RewriteReport`] is also written there as
/// pretty-printed JSON.
///
/// # Errors
///
/// Fails when the input cannot be read or the output or report cannot be
/// written. Statements that do not fit the schema are not errors; they are
/// left unchanged and listed in the report warnings.
pub fn rewrite(
    input: &Path,
    output: Option<&Path>,
    schema: &Schema,
    report_path: Option<&Path>,
) -> Result<RewriteReport> {
    if !input.is_file() {
        bail!("Dump file {} does not exist", input.display());
    }

    let output = output.unwrap_or(input);
    let report = transform::rewrite_dump_to(input, output, schema)?;

    if report.statements_found() == 0 && report.statements_malformed == 0 {
        tracing::warn!("⚠ No INSERT statements found in {}", input.display());
    }

    if let Some(report_path) = report_path {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize rewrite report")?;
        utils::write_atomically(report_path, json.as_bytes())
            .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
        tracing::info!("Report written to {}", report_path.display());
    }

    Ok(report)
}
