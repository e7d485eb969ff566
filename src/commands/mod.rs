// ABOUTME: Command implementations behind each CLI subcommand
// ABOUTME: Exports rewrite, run, export, seed and schema commands

pub mod export;
pub mod rewrite;
pub mod run;
pub mod schema;
pub mod seed;

pub use export::export;
pub use rewrite::rewrite;
pub use run::run;
pub use schema::print_schema;
pub use seed::seed;
