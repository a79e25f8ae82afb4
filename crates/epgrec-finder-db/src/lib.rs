//! Database layer for epgrec program lookup.
//!
//! Builds a parameterized query for unreserved programs from a list of
//! exclusion rules and runs it against the epgrec MySQL database via `sqlx`.

mod connection;
mod error;
/// Predicate expression tree and SQL compiler.
pub mod filter;
/// Program records and the MySQL-backed program source.
pub mod programs;
/// Unreserved-program query builder.
pub mod query;

pub use connection::{DatabaseConfig, connect};
pub use error::FinderError;
pub use filter::{CompiledSql, ExclusionRule, Placeholder};
pub use programs::{LocalProgramSource, MySqlProgramSource, ProgramRecord, ProgramSource};
pub use query::{ProgramQuery, TableNames, build_program_query};
