//! Persistence gateway for streaks.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// One persisted streak row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub id: i64,
    pub title: String,
    pub streak_duration: u32,
    pub best_streak: u32,
    pub last_activity: Option<DateTime<Local>>,
}

/// Durable storage for streak rows.
///
/// The streak manager owns one instance and calls it synchronously after
/// every in-memory mutation.
pub trait StreakStore {
    /// Create the storage structure if it is missing. Idempotent.
    fn create_schema(&mut self) -> Result<(), DatabaseError>;

    /// Insert a row and return its newly assigned id.
    fn insert(
        &mut self,
        title: &str,
        streak_duration: u32,
        best_streak: u32,
        last_activity: Option<DateTime<Local>>,
    ) -> Result<i64, DatabaseError>;

    /// Every row, in creation order.
    fn load_all(&self) -> Result<Vec<StreakRecord>, DatabaseError>;

    /// Overwrite every field of the row with `record.id`.
    fn update(&mut self, record: &StreakRecord) -> Result<(), DatabaseError>;

    fn delete(&mut self, id: i64) -> Result<(), DatabaseError>;
}
