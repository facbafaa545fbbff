//! Field Tracker — solar-field installation tracking core.

pub mod backup;
pub mod completion;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod store;

pub use parser::parse_table_completion_patterns;
