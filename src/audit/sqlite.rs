use std::{fs::create_dir_all, path::Path};

use anyhow::Context;
use chrono::SecondsFormat;
use log::{error, info};
use rusqlite::{Connection, named_params};

use super::{AuditEntry, AuditLog};

/// Audit sink that appends every call to a SQLite database. The database and
/// its parent directory are created if needed; existing entries are kept.
pub struct SqliteAudit {
    conn: Connection,
}

impl SqliteAudit {
    pub fn open(path: &Path) -> anyhow::Result<SqliteAudit> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).with_context(|| {
                format!("Could not create directory {} for the audit log", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Could not open audit database {}", path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS calls (
                id INTEGER PRIMARY KEY NOT NULL,
                `timestamp` DATETIME NOT NULL,
                `action` varchar(255) NOT NULL,
                `method` varchar(10) NOT NULL,
                `request` blob(65535),
                `response` blob(65535) NULL,
                `decoded` blob(65535) NULL,
                `error` varchar(255) NULL
            )",
            [],
        )
        .context("Could not create `calls` table")?;

        info!("Audit log is written to {}", path.display());
        Ok(SqliteAudit { conn })
    }

    /// Number of recorded calls.
    pub fn count(&self) -> anyhow::Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM calls", [], |row| row.get(0))?)
    }

    /// All recorded entries, oldest first.
    pub fn entries(&self) -> anyhow::Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT action, method, request, response, decoded, error FROM calls ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let method: String = row.get(1)?;
            Ok((
                row.get::<_, String>(0)?,
                method,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let (action, method, request, response, decoded, error) = row?;
            entries.push(AuditEntry {
                action,
                method: method
                    .as_str()
                    .try_into()
                    .map_err(|e| anyhow!("Corrupt audit entry: {e}"))?,
                request,
                response,
                decoded,
                error,
            });
        }
        Ok(entries)
    }

    fn insert(&self, entry: &AuditEntry) -> rusqlite::Result<i64> {
        let time = chrono::offset::Utc::now();
        let mut insert_stmt = self.conn.prepare(
            "INSERT INTO calls (timestamp, action, method, request, response, decoded, error) \
             VALUES(:timestamp, :action, :method, :request, :response, :decoded, :error)",
        )?;
        insert_stmt.insert(named_params! {
            ":timestamp": time.to_rfc3339_opts(SecondsFormat::Millis, true),
            ":action": entry.action,
            ":method": entry.method.as_str(),
            ":request": entry.request,
            ":response": entry.response,
            ":decoded": entry.decoded,
            ":error": entry.error,
        })
    }
}

impl AuditLog for SqliteAudit {
    fn record(&self, entry: &AuditEntry) {
        if let Err(e) = self.insert(entry) {
            error!("Could not write {} {} to the audit log: {e}", entry.method, entry.action);
        }
    }
}
