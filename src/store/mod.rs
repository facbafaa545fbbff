//! Persistence layer: libSQL-backed storage for workers, projects, tables, and work records.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::Database;
