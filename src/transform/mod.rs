// ABOUTME: SQL dump transformation engine
// ABOUTME: Tokenizes INSERT statements, maps their rows and rebuilds the dump

pub mod driver;
pub mod mapper;
pub mod rewriter;
pub mod tokenizer;

pub use driver::{rewrite_document, rewrite_dump, rewrite_dump_to, RewriteReport};
pub use mapper::{map_row, Cell, MappedField, MappedRow, Outcome, RawRow, Value};
pub use rewriter::{rewrite_statement, rewrite_statement_text, RewriteStatus, StatementRewrite};
pub use tokenizer::{find_statements, parse_statement, scan, Segment, Statement, Tuple};
