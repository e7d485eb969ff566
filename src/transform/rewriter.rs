// ABOUTME: Statement rewriter serializing mapped rows back into INSERT text
// ABOUTME: Falls back to the original statement text when it cannot be mapped

use crate::error::SchemaError;
use crate::schema::Schema;
use crate::transform::mapper::{map_row, MappedRow, Outcome, RawRow, Value};
use crate::transform::tokenizer::{self, Statement};

/// Whether a statement was rewritten or left as it was
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteStatus {
    Rewritten,
    Skipped(SchemaError),
}

/// Rewritten text of one statement plus what happened to its values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRewrite {
    pub text: String,
    pub status: RewriteStatus,
    pub rows: usize,
    pub missing_values: usize,
    pub unparseable_values: usize,
}

impl StatementRewrite {
    fn skipped(statement: &Statement<'_>, reason: SchemaError) -> Self {
        Self {
            text: statement.text.to_string(),
            status: RewriteStatus::Skipped(reason),
            rows: 0,
            missing_values: 0,
            unparseable_values: 0,
        }
    }
}

/// Map every tuple of `statement` through `schema` and rebuild the statement
///
/// The preamble is kept byte for byte; tuples are joined with `", "`. If a
/// declared column list differs from the schema, or any tuple has the wrong
/// number of values, the whole statement comes back unchanged with the
/// reason attached: a statement is never half rewritten.
pub fn rewrite_statement(statement: &Statement<'_>, schema: &Schema) -> StatementRewrite {
    if let Some(columns) = &statement.columns {
        if let Err(reason) = schema.check_declared_columns(columns) {
            return StatementRewrite::skipped(statement, reason);
        }
    }

    let mut rendered = Vec::with_capacity(statement.tuples.len());
    let mut missing_values = 0;
    let mut unparseable_values = 0;

    for (idx, tuple) in statement.tuples.iter().enumerate() {
        let raw = match RawRow::from_cells(schema, &tuple.cells, idx + 1) {
            Ok(raw) => raw,
            Err(reason) => return StatementRewrite::skipped(statement, reason),
        };

        let mapped = map_row(&raw, schema);
        missing_values += mapped.count(Outcome::Missing);
        unparseable_values += mapped.count(Outcome::Unparseable);
        rendered.push(render_row(&mapped));
    }

    let mut text = String::with_capacity(statement.text.len());
    text.push_str(statement.preamble);
    text.push_str(&rendered.join(", "));
    text.push(';');

    StatementRewrite {
        text,
        status: RewriteStatus::Rewritten,
        rows: rendered.len(),
        missing_values,
        unparseable_values,
    }
}

/// Rewrite a standalone statement string
///
/// Text that is not exactly one readable `INSERT` statement, or that does
/// not fit the schema, is returned unchanged.
pub fn rewrite_statement_text(text: &str, schema: &Schema) -> String {
    match tokenizer::parse_statement(text) {
        Ok(statement) => {
            let rewrite = rewrite_statement(&statement, schema);
            format!(
                "{}{}{}",
                &text[..statement.span.start],
                rewrite.text,
                &text[statement.span.end..]
            )
        }
        Err(e) => {
            tracing::debug!("Leaving statement unchanged: {}", e);
            text.to_string()
        }
    }
}

/// `(v1, v2, ...)` in field order
pub fn render_row(row: &MappedRow<'_>) -> String {
    let values: Vec<String> = row.fields.iter().map(|f| sql_literal(&f.value)).collect();
    format!("({})", values.join(", "))
}

/// SQL literal for a destination value
///
/// Only text is quoted. Floats always keep a fractional part or exponent
/// (`350.0`, `1e21`) so the loader reads them as numeric, not integer.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => format!("{:?}", f),
        Value::Boolean(true) => "true".to_string(),
        Value::Boolean(false) => "false".to_string(),
        Value::Null => "NULL".to_string(),
    }
}
