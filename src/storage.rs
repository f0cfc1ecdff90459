use crate::difficulty::{Difficulty, Mode};
use crate::error::StorageError;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

/// Key-value persistence for serialized state.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One finished session, as kept in the history table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub finished_at: DateTime<Local>,
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: u32,
    pub elapsed_secs: u32,
    pub difficulty: Difficulty,
    pub mode: Mode,
    pub earned_xp: u32,
}

fn parse_difficulty(s: &str) -> Difficulty {
    Difficulty::ALL
        .into_iter()
        .find(|d| d.to_string() == s)
        .unwrap_or_default()
}

fn parse_mode(s: &str) -> Mode {
    if s == Mode::Pro.to_string() {
        Mode::Pro
    } else {
        Mode::Standard
    }
}

/// SQLite-backed store for profile state and session history.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                finished_at TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                errors INTEGER NOT NULL,
                elapsed_secs INTEGER NOT NULL,
                difficulty TEXT NOT NULL,
                mode TEXT NOT NULL,
                earned_xp INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_finished_at ON sessions(finished_at)",
            [],
        )?;

        Ok(SqliteStore { conn })
    }

    pub fn record_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (finished_at, wpm, accuracy, errors, elapsed_secs, difficulty, mode, earned_xp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.finished_at.to_rfc3339(),
                record.wpm,
                record.accuracy,
                record.errors,
                record.elapsed_secs,
                record.difficulty.to_string(),
                record.mode.to_string(),
                record.earned_xp,
            ],
        )?;
        Ok(())
    }

    /// Most recent sessions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT finished_at, wpm, accuracy, errors, elapsed_secs, difficulty, mode, earned_xp
            FROM sessions
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let finished_at: String = row.get(0)?;
            let finished_at = DateTime::parse_from_rfc3339(&finished_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "finished_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            let difficulty: String = row.get(5)?;
            let mode: String = row.get(6)?;

            Ok(SessionRecord {
                finished_at,
                wpm: row.get(1)?,
                accuracy: row.get(2)?,
                errors: row.get(3)?,
                elapsed_secs: row.get(4)?,
                difficulty: parse_difficulty(&difficulty),
                mode: parse_mode(&mode),
                earned_xp: row.get(7)?,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn session_count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Writes the full history, oldest first, as CSV. Returns the row count.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<usize, StorageError> {
        let mut records = self.recent_sessions(usize::MAX >> 1)?;
        records.reverse();

        let mut writer = csv::Writer::from_path(path)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(records.len())
    }
}

impl KeyValueStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // single-statement upsert replaces the row atomically
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Volatile key-value store, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).save(key, value)
    }
}
