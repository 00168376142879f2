//! SQLite-backed streak storage.
//!
//! Timestamps are written as RFC 3339 strings with their UTC offset. Reads
//! also accept offset-less ISO 8601 (`2024-03-09T23:59:00.123`, or with a
//! space separator) as local time, which is how older databases stored them.

use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::config::Config;
use super::migrations;
use super::store::{StreakRecord, StreakStore};
use crate::error::{DatabaseError, Result};

/// Default database file name inside the data directory.
pub const DEFAULT_DB_FILE: &str = "lemonstudys.db";

/// SQLite database holding the streaks table.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database named by `storage.database_file` in the config,
    /// creating the file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the config cannot be loaded, or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_with(&Config::load()?)
    }

    pub fn open_with(config: &Config) -> Result<Self> {
        Self::open_at(config.database_path()?)
    }

    /// Open the database at an explicit path and create the schema.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut db = Self { conn };
        db.create_schema()?;
        debug!(path = %path.display(), "opened streak database");
        Ok(db)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.create_schema()?;
        Ok(db)
    }

    /// Fetch a single row by id.
    pub fn get(&self, id: i64) -> Result<Option<StreakRecord>, DatabaseError> {
        let record = self
            .conn
            .query_row(
                "SELECT id, title, streak_duration, best_streak, last_activity
                 FROM streaks WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }
}

impl StreakStore for Database {
    fn create_schema(&mut self) -> Result<(), DatabaseError> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    fn insert(
        &mut self,
        title: &str,
        streak_duration: u32,
        best_streak: u32,
        last_activity: Option<DateTime<Local>>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO streaks (title, streak_duration, best_streak, last_activity)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                title,
                streak_duration,
                best_streak,
                last_activity.map(|at| at.to_rfc3339()),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn load_all(&self) -> Result<Vec<StreakRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, streak_duration, best_streak, last_activity
             FROM streaks
             ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn update(&mut self, record: &StreakRecord) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE streaks
             SET title = ?1, streak_duration = ?2, best_streak = ?3, last_activity = ?4
             WHERE id = ?5",
            params![
                record.title,
                record.streak_duration,
                record.best_streak,
                record.last_activity.map(|at| at.to_rfc3339()),
                record.id,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound { id: record.id });
        }
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<(), DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM streaks WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DatabaseError::NotFound { id });
        }
        Ok(())
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StreakRecord> {
    let id: i64 = row.get(0)?;
    let last_activity = row
        .get::<_, Option<String>>(4)?
        .and_then(|raw| {
            let parsed = parse_timestamp(&raw);
            if parsed.is_none() {
                warn!(id, raw = %raw, "ignoring unparseable last_activity");
            }
            parsed
        });

    Ok(StreakRecord {
        id,
        title: row.get(1)?,
        streak_duration: clamp_count(row.get(2)?),
        best_streak: clamp_count(row.get(3)?),
        last_activity,
    })
}

fn clamp_count(value: Option<i64>) -> u32 {
    value
        .map(|v| u32::try_from(v.max(0)).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Parse a stored timestamp; offset-less values are taken as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Local));
    }

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};

    #[test]
    fn insert_assigns_increasing_ids() {
        let mut db = Database::open_memory().unwrap();
        let a = db.insert("Reading", 0, 0, None).unwrap();
        let b = db.insert("Reading", 0, 0, None).unwrap();
        assert!(b > a);
    }

    #[test]
    fn load_all_returns_creation_order() {
        let mut db = Database::open_memory().unwrap();
        for title in ["a", "b", "c"] {
            db.insert(title, 0, 0, None).unwrap();
        }
        let titles: Vec<_> = db
            .load_all()
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn update_overwrites_full_row() {
        let mut db = Database::open_memory().unwrap();
        let id = db.insert("Reading", 0, 0, None).unwrap();
        let at = Local::now().with_nanosecond(0).unwrap();

        let record = StreakRecord {
            id,
            title: "Deep Reading".into(),
            streak_duration: 3,
            best_streak: 5,
            last_activity: Some(at),
        };
        db.update(&record).unwrap();

        assert_eq!(db.get(id).unwrap(), Some(record));
    }

    #[test]
    fn update_and_delete_report_missing_rows() {
        let mut db = Database::open_memory().unwrap();
        let record = StreakRecord {
            id: 77,
            title: "ghost".into(),
            streak_duration: 0,
            best_streak: 0,
            last_activity: None,
        };
        assert!(matches!(
            db.update(&record),
            Err(DatabaseError::NotFound { id: 77 })
        ));
        assert!(matches!(db.delete(77), Err(DatabaseError::NotFound { id: 77 })));
    }

    #[test]
    fn delete_removes_row() {
        let mut db = Database::open_memory().unwrap();
        let id = db.insert("Reading", 0, 0, None).unwrap();
        db.delete(id).unwrap();
        assert!(db.get(id).unwrap().is_none());
        assert!(db.load_all().unwrap().is_empty());
    }

    #[test]
    fn legacy_rows_load() {
        let db = Database::open_memory().unwrap();
        db.conn()
            .execute_batch(
                "INSERT INTO streaks (title, streak_duration, best_streak, last_activity)
                 VALUES ('old', NULL, -3, '2024-03-09T23:59:00.123');
                 INSERT INTO streaks (title, last_activity) VALUES ('broken', 'yesterday');",
            )
            .unwrap();

        let records = db.load_all().unwrap();
        assert_eq!(records[0].streak_duration, 0);
        assert_eq!(records[0].best_streak, 0);
        let at = records[0].last_activity.unwrap();
        assert_eq!(at.date_naive().to_string(), "2024-03-09");
        assert_eq!(at.hour(), 23);
        assert!(records[1].last_activity.is_none());
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339_and_naive() {
        let now = Local::now().with_nanosecond(0).unwrap();
        assert_eq!(parse_timestamp(&now.to_rfc3339()), Some(now));
        assert!(parse_timestamp("2024-01-02 08:30:00").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not a date").is_none());

        let earlier = now - Duration::days(2);
        assert_eq!(parse_timestamp(&earlier.to_rfc3339()), Some(earlier));
    }
}
