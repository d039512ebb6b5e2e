//! Persistence - Diagnostic log storage

mod database;

pub use database::{Database, DatabaseSink, Diagnostic, Severity};
