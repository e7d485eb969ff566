// ABOUTME: Seed SQL generation from the raw churn CSV
// ABOUTME: Infers column types and emits CREATE TABLE plus one INSERT per row

use super::export::Dataset;
use crate::config::validate_table_name;
use crate::schema::Replacement;
use crate::transform::mapper::Value;
use crate::transform::rewriter::sql_literal;
use anyhow::Result;
use std::fmt::Write as _;
use std::io::Read;

/// Column type inferred from the values of a CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    DoublePrecision,
    Boolean,
    Text,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::DoublePrecision => "DOUBLE PRECISION",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Text => "TEXT",
        }
    }

    /// Narrowest type all present values fit; a column with no values is text
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut all_int = true;
        let mut all_float = true;
        let mut all_bool = true;
        let mut seen = false;

        for value in values {
            let v = value.trim();
            seen = true;
            all_int &= v.parse::<i64>().is_ok();
            all_float &= v.parse::<f64>().is_ok_and(f64::is_finite);
            all_bool &= v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false");
        }

        match (seen, all_int, all_float, all_bool) {
            (false, ..) => SqlType::Text,
            (true, true, _, _) => SqlType::Integer,
            (true, _, true, _) => SqlType::DoublePrecision,
            (true, _, _, true) => SqlType::Boolean,
            _ => SqlType::Text,
        }
    }

    fn literal(&self, value: &str) -> String {
        let v = value.trim();
        let typed = match self {
            SqlType::Integer => v.parse().map(Value::Integer).ok(),
            SqlType::DoublePrecision => v.parse().map(Value::Float).ok(),
            SqlType::Boolean => Some(Value::Boolean(v.eq_ignore_ascii_case("true"))),
            SqlType::Text => None,
        };
        sql_literal(&typed.unwrap_or_else(|| Value::Text(value.to_string())))
    }
}

/// Settings for seed generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOptions {
    pub table: String,
    /// Text substitutions applied to the named column before quoting
    pub replacements: Vec<(String, Replacement)>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            table: "telecom_customer_churn".to_string(),
            replacements: vec![(
                "Churn Reason".to_string(),
                Replacement {
                    from: "Don't know".to_string(),
                    to: "Unknown".to_string(),
                },
            )],
        }
    }
}

/// Turn a CSV with a header row into `CREATE TABLE` and `INSERT` statements
pub fn generate_seed_sql<R: Read>(reader: R, options: &SeedOptions) -> Result<String> {
    validate_table_name(&options.table)?;
    let mut dataset = Dataset::from_csv(reader)?;

    for (column, replacement) in &options.replacements {
        let Some(idx) = dataset.column_index(column) else {
            tracing::warn!("⚠ Replacement column '{}' not in CSV, skipping", column);
            continue;
        };
        for value in dataset.rows.iter_mut().filter_map(|row| row.get_mut(idx)) {
            if let Some(text) = value {
                *text = text.replace(&replacement.from, &replacement.to);
            }
        }
    }

    let types: Vec<SqlType> = (0..dataset.headers.len())
        .map(|idx| {
            SqlType::infer(
                dataset
                    .rows
                    .iter()
                    .filter_map(|row| row.get(idx).and_then(|v| v.as_deref())),
            )
        })
        .collect();

    let quoted: Vec<String> = dataset
        .headers
        .iter()
        .map(|h| format!("\"{}\"", h.replace('"', "\"\"")))
        .collect();

    let mut sql = String::new();
    let _ = writeln!(sql, "CREATE TABLE {} (", options.table);
    let definitions: Vec<String> = quoted
        .iter()
        .zip(&types)
        .map(|(name, ty)| format!("    {} {}", name, ty.as_sql()))
        .collect();
    sql.push_str(&definitions.join(",\n"));
    sql.push_str("\n);\n\n");

    let column_list = quoted.join(", ");
    for row in &dataset.rows {
        let values: Vec<String> = types
            .iter()
            .enumerate()
            .map(|(idx, ty)| match row.get(idx).and_then(|v| v.as_deref()) {
                Some(value) => ty.literal(value),
                None => "NULL".to_string(),
            })
            .collect();
        let _ = writeln!(
            sql,
            "INSERT INTO {} ({}) VALUES ({});",
            options.table,
            column_list,
            values.join(", ")
        );
    }

    tracing::info!(
        "Generated seed SQL for {} column(s), {} row(s)",
        dataset.headers.len(),
        dataset.rows.len()
    );
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_infer() {
        assert_eq!(SqlType::infer(["1", "2", " 3 "]), SqlType::Integer);
        assert_eq!(SqlType::infer(["1", "2.5"]), SqlType::DoublePrecision);
        assert_eq!(SqlType::infer(["True", "false"]), SqlType::Boolean);
        assert_eq!(SqlType::infer(["Yes", "No"]), SqlType::Text);
        assert_eq!(SqlType::infer(["1", "x"]), SqlType::Text);
        assert_eq!(SqlType::infer(["inf"]), SqlType::Text);
        assert_eq!(SqlType::infer(Vec::<&str>::new()), SqlType::Text);
    }

    #[test]
    fn test_generate_seed_sql() {
        let csv = "Id,Amount,Active,Churn Reason\n\
                   1,2.5,true,Don't know\n\
                   2,,False,\n";
        let sql = generate_seed_sql(csv.as_bytes(), &SeedOptions::default()).unwrap();

        assert_eq!(
            sql,
            "CREATE TABLE telecom_customer_churn (\n\
             \x20   \"Id\" INTEGER,\n\
             \x20   \"Amount\" DOUBLE PRECISION,\n\
             \x20   \"Active\" BOOLEAN,\n\
             \x20   \"Churn Reason\" TEXT\n\
             );\n\
             \n\
             INSERT INTO telecom_customer_churn (\"Id\", \"Amount\", \"Active\", \"Churn Reason\") VALUES (1, 2.5, true, 'Unknown');\n\
             INSERT INTO telecom_customer_churn (\"Id\", \"Amount\", \"Active\", \"Churn Reason\") VALUES (2, NULL, false, NULL);\n"
        );
    }

    #[test]
    fn test_generate_seed_sql_quotes_text() {
        let csv = "name\nO'Brien\n";
        let options = SeedOptions {
            table: "people".to_string(),
            replacements: vec![],
        };
        let sql = generate_seed_sql(csv.as_bytes(), &options).unwrap();
        assert!(sql.ends_with("INSERT INTO people (\"name\") VALUES ('O''Brien');\n"));
    }

    #[test]
    fn test_generate_seed_sql_rejects_bad_table() {
        let options = SeedOptions {
            table: "bad name".to_string(),
            replacements: vec![],
        };
        assert!(generate_seed_sql("a\n1\n".as_bytes(), &options).is_err());
    }
}
