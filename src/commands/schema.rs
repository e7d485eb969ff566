// ABOUTME: Schema command printing the active column mapping as TOML
// ABOUTME: Output can be edited and passed back with --schema

use crate::schema::Schema;
use anyhow::Result;

pub fn print_schema(schema: &Schema) -> Result<()> {
    print!("{}", schema.to_toml_string()?);
    Ok(())
}
