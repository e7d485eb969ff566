// ABOUTME: Pipeline steps wrapping the PostgreSQL client tools
// ABOUTME: Readiness probing, dump, load, export cleaning and seed generation

pub mod dump;
pub mod export;
pub mod load;
pub mod readiness;
pub mod seed;

pub use dump::dump_database;
pub use export::{clean_dataset, fetch_table, write_csv, CleaningSummary, Dataset};
pub use load::load_dump;
pub use readiness::wait_for_postgres;
pub use seed::{generate_seed_sql, SeedOptions, SqlType};

use crate::config::DatabaseConfig;
use std::process::Command;

/// Command for a libpq client tool pointed at `db`, never prompting for a password
fn client_command(program: &str, db: &DatabaseConfig) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(db.connection_args()).arg("--no-password");
    if let Some(password) = db.password() {
        cmd.env("PGPASSWORD", password);
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_command_arguments() {
        let db = DatabaseConfig {
            host: "h".to_string(),
            port: 6543,
            user: "u".to_string(),
            dbname: "d".to_string(),
            password: Some("secret".to_string()),
        };
        let cmd = client_command("psql", &db);

        assert_eq!(cmd.get_program(), "psql");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["--host", "h", "--port", "6543", "--username", "u", "--dbname", "d", "--no-password"]
        );

        let password = cmd
            .get_envs()
            .find(|(key, _)| *key == "PGPASSWORD")
            .and_then(|(_, value)| value);
        assert_eq!(password.and_then(|v| v.to_str()), Some("secret"));
    }
}
