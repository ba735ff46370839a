// SQLite-backed persistence for the wizard session and generated reports.
//
// The in-progress session lives under two keys in `wizard_state`, one for
// the chosen advisor and one for the answer map. Each value is wrapped in an
// envelope carrying its save time so stale sessions can be discarded on
// restore. Finished reports are appended to `reports`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::wizard::advisor::AdvisorId;
use crate::wizard::report::ValidationReport;
use crate::wizard::state::{SavedAnswer, SavedSession};

const ADVISOR_KEY: &str = "advisor";
const ANSWERS_KEY: &str = "answers";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS wizard_state (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reports (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    advisor    TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

/// Value payload as stored on disk. The timestamp is authoritative for
/// expiry, not the row's `updated_at` column.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEnvelope<T> {
    saved_at: DateTime<Utc>,
    value: T,
}

/// A previously generated report as read back from the store. `advisor` is
/// the persona's stable key form.
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub advisor: String,
    pub report: ValidationReport,
    pub created_at: String,
}

pub struct SessionStore {
    conn: Mutex<Connection>,
    obfuscate: bool,
}

impl SessionStore {
    /// Open (or create) the store at the given path. `":memory:"` gives an
    /// in-memory store for tests.
    pub fn open(path: impl AsRef<Path>, obfuscate: bool) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("failed to open database at {:?}", path.as_ref()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(SCHEMA)
            .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
            obfuscate,
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<String> {
        let envelope = StoredEnvelope {
            saved_at: Utc::now(),
            value,
        };
        let json = serde_json::to_string(&envelope).context("failed to serialize value")?;
        Ok(if self.obfuscate {
            BASE64.encode(json.as_bytes())
        } else {
            json
        })
    }

    // -----------------------------------------------------------------------
    // Session state
    // -----------------------------------------------------------------------

    /// Persist the current session, replacing any previous save.
    ///
    /// The advisor and the answer list go under separate keys. With no
    /// advisor chosen the advisor row is removed rather than storing a null.
    pub fn save_session(&self, session: &SavedSession) -> Result<()> {
        let answers = self.encode(&session.answers)?;
        let advisor = session
            .advisor
            .map(|advisor| self.encode(&advisor))
            .transpose()?;

        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR REPLACE INTO wizard_state (key, value, updated_at)
             VALUES (?1, ?2, ?3)",
            params![ANSWERS_KEY, answers, now],
        )
        .context("failed to save answers")?;
        match advisor {
            Some(value) => {
                conn.execute(
                    "INSERT OR REPLACE INTO wizard_state (key, value, updated_at)
                     VALUES (?1, ?2, ?3)",
                    params![ADVISOR_KEY, value, now],
                )
                .context("failed to save advisor")?;
            }
            None => {
                conn.execute(
                    "DELETE FROM wizard_state WHERE key = ?1",
                    params![ADVISOR_KEY],
                )
                .context("failed to clear advisor")?;
            }
        }
        Ok(())
    }

    /// Load the saved session, if one exists and is fresh enough.
    ///
    /// Either key older than `max_age_hours` (zero means no limit) expires
    /// the whole session, which is deleted and `None` returned. Unreadable
    /// rows are treated the same way so a corrupted save never wedges
    /// startup.
    pub fn load_session(&self, max_age_hours: u64) -> Result<Option<SavedSession>> {
        let advisor_raw = self.read_value(ADVISOR_KEY)?;
        let answers_raw = self.read_value(ANSWERS_KEY)?;

        if advisor_raw.is_none() && answers_raw.is_none() {
            return Ok(None);
        }

        let advisor: Option<StoredEnvelope<AdvisorId>> =
            advisor_raw.as_deref().and_then(decode_envelope);
        let answers: Option<StoredEnvelope<Vec<SavedAnswer>>> =
            answers_raw.as_deref().and_then(decode_envelope);

        if (advisor_raw.is_some() && advisor.is_none())
            || (answers_raw.is_some() && answers.is_none())
        {
            warn!("discarding unreadable saved session");
            self.clear_session()?;
            return Ok(None);
        }

        if max_age_hours > 0 {
            let limit = Duration::hours(max_age_hours as i64);
            let expired = advisor
                .iter()
                .map(|e| e.saved_at)
                .chain(answers.iter().map(|e| e.saved_at))
                .any(|saved_at| Utc::now() - saved_at > limit);
            if expired {
                warn!(hours = max_age_hours, "discarding expired saved session");
                self.clear_session()?;
                return Ok(None);
            }
        }

        Ok(Some(SavedSession {
            advisor: advisor.map(|e| e.value),
            answers: answers.map(|e| e.value).unwrap_or_default(),
        }))
    }

    fn read_value(&self, key: &str) -> Result<Option<String>> {
        self.conn()
            .query_row(
                "SELECT value FROM wizard_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to query saved {key}"))
    }

    /// Delete the saved session.
    pub fn clear_session(&self) -> Result<()> {
        self.conn()
            .execute(
                "DELETE FROM wizard_state WHERE key IN (?1, ?2)",
                params![ADVISOR_KEY, ANSWERS_KEY],
            )
            .context("failed to clear session")?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Append a finished report to the history. `advisor` is the persona's
    /// stable key form.
    pub fn save_report(&self, advisor: &str, report: &ValidationReport) -> Result<()> {
        let content = serde_json::to_string(report).context("failed to serialize report")?;
        self.conn()
            .execute(
                "INSERT INTO reports (advisor, content, created_at)
                 VALUES (?1, ?2, ?3)",
                params![advisor, content, Utc::now().to_rfc3339()],
            )
            .context("failed to save report")?;
        Ok(())
    }

    /// Most recent reports, newest first. Rows that no longer parse are
    /// skipped.
    pub fn recent_reports(&self, limit: usize) -> Result<Vec<StoredReport>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT advisor, content, created_at FROM reports
                 ORDER BY id DESC LIMIT ?1",
            )
            .context("failed to prepare reports query")?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("failed to query reports")?;

        let mut reports = Vec::new();
        for row in rows {
            let (advisor, content, created_at) = row.context("failed to read report row")?;
            match serde_json::from_str(&content) {
                Ok(report) => reports.push(StoredReport {
                    advisor,
                    report,
                    created_at,
                }),
                Err(e) => warn!(error = %e, "skipping unparseable stored report"),
            }
        }
        Ok(reports)
    }
}

/// Decode a stored value into its envelope. Plain JSON is tried first, then
/// base64-wrapped JSON, so toggling `obfuscate` in config never strands an
/// existing save.
fn decode_envelope<T: DeserializeOwned>(value: &str) -> Option<StoredEnvelope<T>> {
    if let Ok(envelope) = serde_json::from_str(value) {
        return Some(envelope);
    }
    let bytes = BASE64.decode(value.trim()).ok()?;
    let json = String::from_utf8(bytes).ok()?;
    serde_json::from_str(&json).ok()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
