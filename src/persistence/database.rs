//! SQLite database implementation for the diagnostic log

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::core::DiagnosticSink;

/// Severity of a diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "INFO" => Some(Self::Info),
            "WARNING" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

/// One persisted diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub logged_at: DateTime<Utc>,
    pub plugin_id: String,
    pub severity: Severity,
    pub message: String,
}

/// Database wrapper for SQLite operations
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        info!("Database opened at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Initialize database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Database lock poisoned: {}", e))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS diagnostics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                logged_at TEXT NOT NULL,
                plugin_id TEXT NOT NULL,
                severity TEXT NOT NULL,
                message TEXT NOT NULL
            );
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }

    /// Append a diagnostic
    pub fn append_diagnostic(&self, diagnostic: &Diagnostic) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Database lock poisoned: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO diagnostics (logged_at, plugin_id, severity, message)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                diagnostic.logged_at.to_rfc3339(),
                diagnostic.plugin_id,
                diagnostic.severity.label(),
                diagnostic.message,
            ],
        )?;
        debug!("Diagnostic recorded");
        Ok(())
    }

    /// Most recent diagnostics, newest first
    pub fn recent_diagnostics(&self, limit: usize) -> Result<Vec<Diagnostic>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Database lock poisoned: {}", e))?;
        let mut stmt = conn.prepare(
            r#"
            SELECT logged_at, plugin_id, severity, message
            FROM diagnostics
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut diagnostics = Vec::new();
        for row in rows {
            let (logged_at, plugin_id, severity, message) = row?;
            let logged_at = DateTime::parse_from_rfc3339(&logged_at)
                .map(|t| t.with_timezone(&Utc))
                .context("Invalid diagnostic timestamp")?;
            let severity = Severity::parse(&severity)
                .with_context(|| format!("Unknown diagnostic severity '{}'", severity))?;
            diagnostics.push(Diagnostic {
                logged_at,
                plugin_id,
                severity,
                message,
            });
        }
        Ok(diagnostics)
    }

    /// Delete diagnostics older than `days` days
    pub fn prune_diagnostics(&self, days: u32) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::days(days as i64);
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Database lock poisoned: {}", e))?;
        let removed = conn.execute(
            "DELETE FROM diagnostics WHERE logged_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(removed)
    }
}

/// Diagnostic sink writing `ERROR` entries to the database
pub struct DatabaseSink {
    database: std::sync::Arc<Database>,
    plugin_id: String,
}

impl DatabaseSink {
    pub fn new(database: std::sync::Arc<Database>, plugin_id: impl Into<String>) -> Self {
        Self {
            database,
            plugin_id: plugin_id.into(),
        }
    }
}

impl DiagnosticSink for DatabaseSink {
    fn log_error(&self, message: &str) {
        error!("{}", message);
        let diagnostic = Diagnostic {
            logged_at: Utc::now(),
            plugin_id: self.plugin_id.clone(),
            severity: Severity::Error,
            message: message.to_string(),
        };
        if let Err(e) = self.database.append_diagnostic(&diagnostic) {
            error!("Failed to persist diagnostic: {}", e);
        }
    }
}
