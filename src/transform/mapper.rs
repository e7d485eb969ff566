// ABOUTME: Row mapper converting raw dump cells into typed destination fields
// ABOUTME: Applies text, integer, float and boolean coercions with outcome tags

use crate::error::SchemaError;
use crate::schema::{Coercion, ColumnMapping, Replacement, Schema};

/// A raw cell as read from a value tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// SQL `NULL`
    Null,
    /// Literal text with quoting and escapes already removed
    Text(String),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Null => None,
            Cell::Text(s) => Some(s),
        }
    }
}

/// Typed destination value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

/// How a destination value came about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Source value was present and converted
    Ok,
    /// Source cell was `NULL` (or empty for numeric fields)
    Missing,
    /// Source text could not be read as the declared number type
    Unparseable,
}

/// Source row: source column name to raw cell, in dump order
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow<'a> {
    entries: Vec<(&'a str, Cell)>,
}

impl<'a> RawRow<'a> {
    pub fn new(entries: Vec<(&'a str, Cell)>) -> Self {
        Self { entries }
    }

    /// Zip one tuple's cells with the schema's source column order
    ///
    /// `row` is only used to label the error.
    pub fn from_cells(schema: &'a Schema, cells: &[Cell], row: usize) -> Result<Self, SchemaError> {
        if cells.len() != schema.len() {
            return Err(SchemaError::CellCount {
                row,
                expected: schema.len(),
                found: cells.len(),
            });
        }

        let entries = schema.source_names().zip(cells.iter().cloned()).collect();
        Ok(Self { entries })
    }

    pub fn get(&self, source: &str) -> Option<&Cell> {
        self.entries
            .iter()
            .find(|(name, _)| *name == source)
            .map(|(_, cell)| cell)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One field of a destination row
#[derive(Debug, Clone, PartialEq)]
pub struct MappedField<'a> {
    pub name: &'a str,
    pub value: Value,
    pub outcome: Outcome,
}

/// Destination row in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow<'a> {
    pub fields: Vec<MappedField<'a>>,
}

impl<'a> MappedRow<'a> {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.fields.iter().filter(|f| f.outcome == outcome).count()
    }
}

/// Map a source row onto the destination fields of `schema`
///
/// Lookup is by source name, so the order of `raw` does not matter. A
/// column absent from `raw` is treated like a `NULL` cell.
pub fn map_row<'a>(raw: &RawRow<'_>, schema: &'a Schema) -> MappedRow<'a> {
    let fields = schema
        .columns()
        .iter()
        .map(|column| {
            let cell = raw.get(&column.source).unwrap_or(&Cell::Null);
            let (value, outcome) = coerce(cell, column);
            MappedField {
                name: column.destination.as_str(),
                value,
                outcome,
            }
        })
        .collect();

    MappedRow { fields }
}

/// Apply one column's coercion to a cell
pub fn coerce(cell: &Cell, column: &ColumnMapping) -> (Value, Outcome) {
    match column.coercion {
        Coercion::Text => to_text(cell, &column.replace),
        Coercion::Integer => to_int(cell),
        Coercion::Float => to_float(cell),
        Coercion::Boolean => {
            let outcome = match cell {
                Cell::Null => Outcome::Missing,
                Cell::Text(_) => Outcome::Ok,
            };
            (Value::Boolean(to_bool(cell)), outcome)
        }
    }
}

/// Only "yes" (any case) is true; `NULL` is false
pub fn to_bool(cell: &Cell) -> bool {
    matches!(cell, Cell::Text(s) if s.to_lowercase() == "yes")
}

pub fn to_int(cell: &Cell) -> (Value, Outcome) {
    parse_number(cell, |s| s.parse::<i64>().ok().map(Value::Integer))
}

/// Non-finite results count as unparseable: SQL has no bare literal for them
pub fn to_float(cell: &Cell) -> (Value, Outcome) {
    parse_number(cell, |s| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
    })
}

pub fn to_text(cell: &Cell, replacements: &[Replacement]) -> (Value, Outcome) {
    match cell {
        Cell::Null => (Value::Null, Outcome::Missing),
        Cell::Text(s) => {
            let mut text = s.clone();
            for r in replacements {
                if !r.from.is_empty() && text.contains(&r.from) {
                    text = text.replace(&r.from, &r.to);
                }
            }
            (Value::Text(text), Outcome::Ok)
        }
    }
}

fn parse_number(cell: &Cell, parse: impl Fn(&str) -> Option<Value>) -> (Value, Outcome) {
    let Some(raw) = cell.as_str() else {
        return (Value::Null, Outcome::Missing);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (Value::Null, Outcome::Missing);
    }

    match parse(trimmed) {
        Some(value) => (value, Outcome::Ok),
        None => (Value::Null, Outcome::Unparseable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn churn_cells() -> Vec<Cell> {
        [
            "C1",
            "1",
            "US",
            "CA",
            "LA",
            "90001",
            "x,y",
            "34.0",
            "-118.2",
            "Male",
            "Yes",
            "No",
            "No",
            "5",
            "Yes",
            "No",
            "DSL",
            "No",
            "No",
            "No",
            "No",
            "No",
            "No",
            "Month-to-month",
            "Yes",
            "Electronic check",
            "70.5",
            "350.0",
            "No",
            "0",
            "50",
            "1200",
            "Don't know",
        ]
        .iter()
        .map(|s| Cell::text(s))
        .collect()
    }

    #[test]
    fn test_to_bool() {
        assert!(to_bool(&Cell::text("Yes")));
        assert!(to_bool(&Cell::text("yes")));
        assert!(to_bool(&Cell::text("YES")));

        assert!(!to_bool(&Cell::text("No")));
        assert!(!to_bool(&Cell::Null));
        assert!(!to_bool(&Cell::text("")));
        assert!(!to_bool(&Cell::text("y")));
        assert!(!to_bool(&Cell::text(" yes")));
    }

    #[test]
    fn test_to_float_degrades_to_null() {
        assert_eq!(to_float(&Cell::text("")), (Value::Null, Outcome::Missing));
        assert_eq!(to_float(&Cell::text("  ")), (Value::Null, Outcome::Missing));
        assert_eq!(to_float(&Cell::Null), (Value::Null, Outcome::Missing));
        assert_eq!(
            to_float(&Cell::text("abc")),
            (Value::Null, Outcome::Unparseable)
        );
        assert_eq!(
            to_float(&Cell::text("NaN")),
            (Value::Null, Outcome::Unparseable)
        );
        assert_eq!(
            to_float(&Cell::text(" 350.5 ")),
            (Value::Float(350.5), Outcome::Ok)
        );
    }

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(&Cell::text("5")), (Value::Integer(5), Outcome::Ok));
        assert_eq!(to_int(&Cell::text("-12")), (Value::Integer(-12), Outcome::Ok));
        assert_eq!(to_int(&Cell::text("5.0")), (Value::Null, Outcome::Unparseable));
        assert_eq!(to_int(&Cell::Null), (Value::Null, Outcome::Missing));
    }

    #[test]
    fn test_to_text_replacements() {
        let unknown = [Replacement {
            from: "Don't know".to_string(),
            to: "Unknown".to_string(),
        }];

        assert_eq!(
            to_text(&Cell::text("Don't know"), &unknown),
            (Value::Text("Unknown".to_string()), Outcome::Ok)
        );
        assert_eq!(
            to_text(&Cell::text("Competitor had better devices"), &unknown),
            (
                Value::Text("Competitor had better devices".to_string()),
                Outcome::Ok
            )
        );
        assert_eq!(to_text(&Cell::Null, &unknown), (Value::Null, Outcome::Missing));
        assert_eq!(
            to_text(&Cell::text(""), &[]),
            (Value::Text(String::new()), Outcome::Ok)
        );
    }

    #[test]
    fn test_map_row_churn_example() {
        let schema = Schema::churn();
        let cells = churn_cells();
        let raw = RawRow::from_cells(&schema, &cells, 1).unwrap();
        let mapped = map_row(&raw, &schema);

        assert_eq!(mapped.fields.len(), 33);
        assert_eq!(mapped.fields[0].name, "customerID");
        assert_eq!(mapped.get("customerID"), Some(&Value::Text("C1".into())));
        assert_eq!(mapped.get("zipCode"), Some(&Value::Integer(90001)));
        assert_eq!(mapped.get("latlong"), Some(&Value::Text("x,y".into())));
        assert_eq!(mapped.get("longitude"), Some(&Value::Float(-118.2)));
        assert_eq!(mapped.get("seniorCitizen_fl"), Some(&Value::Boolean(true)));
        assert_eq!(mapped.get("partner"), Some(&Value::Boolean(false)));
        assert_eq!(mapped.get("tenure_months"), Some(&Value::Integer(5)));
        assert_eq!(mapped.get("totalCharges"), Some(&Value::Float(350.0)));
        assert_eq!(mapped.get("churn_label"), Some(&Value::Boolean(false)));
        assert_eq!(mapped.get("cltv"), Some(&Value::Integer(1200)));
        assert_eq!(
            mapped.get("churn_reason"),
            Some(&Value::Text("Unknown".into()))
        );
        assert_eq!(mapped.count(Outcome::Ok), 33);
    }

    #[test]
    fn test_map_row_ignores_input_order_and_propagates_nulls() {
        let schema = Schema::churn();
        let cells = churn_cells();
        let mut entries: Vec<(&str, Cell)> = schema.source_names().zip(cells).collect();
        entries.reverse();
        entries.retain(|(name, _)| *name != "Total Charges");
        for (name, cell) in entries.iter_mut() {
            if *name == "Senior Citizen" || *name == "City" {
                *cell = Cell::Null;
            }
        }

        let mapped = map_row(&RawRow::new(entries), &schema);
        assert_eq!(mapped.fields[0].name, "customerID");
        assert_eq!(mapped.fields[32].name, "churn_reason");
        assert_eq!(mapped.get("city"), Some(&Value::Null));
        assert_eq!(mapped.get("seniorCitizen_fl"), Some(&Value::Boolean(false)));
        assert_eq!(mapped.get("totalCharges"), Some(&Value::Null));
        assert_eq!(mapped.count(Outcome::Missing), 3);
    }

    #[test]
    fn test_map_row_tags_unparseable_values() {
        let schema = Schema::churn();
        let mut cells = churn_cells();
        cells[27] = Cell::text(" ");
        cells[26] = Cell::text("seventy");

        let raw = RawRow::from_cells(&schema, &cells, 1).unwrap();
        let mapped = map_row(&raw, &schema);

        let total = mapped
            .fields
            .iter()
            .find(|f| f.name == "totalCharges")
            .unwrap();
        assert_eq!(total.value, Value::Null);
        assert_eq!(total.outcome, Outcome::Missing);

        let monthly = mapped
            .fields
            .iter()
            .find(|f| f.name == "monthlyCharges")
            .unwrap();
        assert_eq!(monthly.value, Value::Null);
        assert_eq!(monthly.outcome, Outcome::Unparseable);
    }

    #[test]
    fn test_from_cells_rejects_wrong_arity() {
        let schema = Schema::churn();
        let mut cells = churn_cells();
        cells.pop();

        assert_eq!(
            RawRow::from_cells(&schema, &cells, 4),
            Err(SchemaError::CellCount {
                row: 4,
                expected: 33,
                found: 32
            })
        );
    }
}
