// ABOUTME: Dump rewrite driver turning a whole dump file into its mapped form
// ABOUTME: Rebuilds the document in one pass and replaces the file atomically

use crate::schema::Schema;
use crate::transform::rewriter::{rewrite_statement, RewriteStatus};
use crate::transform::tokenizer::{scan, Segment};
use crate::utils;
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Summary of one dump rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// Statements that were rewritten
    pub statements_rewritten: usize,
    /// Statements left unchanged because they do not fit the schema
    pub statements_skipped: usize,
    /// `INSERT` keywords that did not start a readable statement
    pub statements_malformed: usize,
    pub rows_rewritten: usize,
    pub missing_values: usize,
    pub unparseable_values: usize,
    pub warnings: Vec<String>,
    pub input_sha256: String,
    pub output_sha256: String,
}

impl RewriteReport {
    pub fn statements_found(&self) -> usize {
        self.statements_rewritten + self.statements_skipped
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("⚠ {}", message);
        self.warnings.push(message);
    }
}

/// Rewrite every statement of `document`, copying everything else verbatim
///
/// Statements are replaced by position, so two identical statements are
/// each rewritten where they stand.
pub fn rewrite_document(document: &str, schema: &Schema) -> (String, RewriteReport) {
    let mut report = RewriteReport::default();
    let mut output = String::with_capacity(document.len() + document.len() / 4);
    let mut copied_to = 0;
    let mut lines = LineCursor::default();

    for segment in scan(document) {
        match segment {
            Segment::Statement(statement) => {
                let rewrite = rewrite_statement(&statement, schema);
                match rewrite.status {
                    RewriteStatus::Rewritten => {
                        output.push_str(&document[copied_to..statement.span.start]);
                        output.push_str(&rewrite.text);
                        copied_to = statement.span.end;

                        report.statements_rewritten += 1;
                        report.rows_rewritten += rewrite.rows;
                        report.missing_values += rewrite.missing_values;
                        report.unparseable_values += rewrite.unparseable_values;
                    }
                    RewriteStatus::Skipped(reason) => {
                        report.statements_skipped += 1;
                        report.warn(format!(
                            "Statement at line {} into {} left unchanged: {}",
                            lines.line_at(document, statement.span.start),
                            utils::sanitize_identifier(statement.table),
                            reason
                        ));
                    }
                }
            }
            Segment::Rejected { offset, error } => {
                report.statements_malformed += 1;
                report.warn(format!(
                    "Unreadable INSERT at line {} left unchanged: {}",
                    lines.line_at(document, offset),
                    error
                ));
            }
        }
    }
    output.push_str(&document[copied_to..]);

    report.input_sha256 = sha256_hex(document);
    report.output_sha256 = sha256_hex(&output);
    (output, report)
}

/// Rewrite the dump at `path` in place
pub fn rewrite_dump(path: &Path, schema: &Schema) -> Result<RewriteReport> {
    rewrite_dump_to(path, path, schema)
}

/// Rewrite the dump at `input` into `output` (which may be the same file)
///
/// Nothing is written until the whole document has been rewritten in
/// memory, and the write itself goes through a temporary file renamed over
/// `output`, so a failure leaves `output` as it was.
pub fn rewrite_dump_to(input: &Path, output: &Path, schema: &Schema) -> Result<RewriteReport> {
    tracing::info!("Rewriting dump {}", input.display());

    let document = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read dump file {}", input.display()))?;

    let (rewritten, report) = rewrite_document(&document, schema);

    utils::write_atomically(output, rewritten.as_bytes())
        .with_context(|| format!("Failed to write rewritten dump to {}", output.display()))?;

    tracing::info!(
        "✓ Rewrote {} statement(s), {} row(s) into {}",
        report.statements_rewritten,
        report.rows_rewritten,
        output.display()
    );
    if report.statements_skipped + report.statements_malformed > 0 {
        tracing::warn!(
            "⚠ {} statement(s) left unchanged, see warnings above",
            report.statements_skipped + report.statements_malformed
        );
    }

    Ok(report)
}

/// Line numbers for offsets met in increasing order, counting each byte once
#[derive(Default)]
struct LineCursor {
    offset: usize,
    line: usize,
}

impl LineCursor {
    fn line_at(&mut self, document: &str, offset: usize) -> usize {
        if offset < self.offset {
            *self = Self::default();
        }
        self.line += document.as_bytes()[self.offset..offset]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.offset = offset;
        self.line + 1
    }
}

fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
