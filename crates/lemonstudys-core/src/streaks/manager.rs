//! Streak collection manager.
//!
//! Owns the ordered list of [`Streak`]s and keeps it in step with a
//! [`StreakStore`]: every mutation is written through before observers are
//! notified. Store failures during a mutation are logged, never returned;
//! `add` aborts on them while every other mutation keeps its in-memory
//! effect. Index arguments outside the collection are ignored.
//!
//! ## Expiry sweep
//!
//! Once at construction and then every `sweep_interval_secs` (pumped through
//! [`StreakManager::poll`]), any streak with a running count whose last
//! activity is older than `expiry_secs` is zeroed.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::model::{FieldValue, StreakField, StreakRow, StreakSummary};
use super::streak::Streak;
use crate::clock::Clock;
use crate::error::{DatabaseError, Result};
use crate::events::{ListenerId, Listeners, StreakEvent};
use crate::storage::StreakStore;
use crate::ticker::Ticker;

/// Sweep cadence and expiry window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSettings {
    pub sweep_interval_secs: u64,
    pub expiry_secs: u64,
}

impl Default for StreakSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 3600,
            expiry_secs: 86_400,
        }
    }
}

pub struct StreakManager<S: StreakStore> {
    store: S,
    clock: Box<dyn Clock>,
    streaks: Vec<Streak>,
    sweep_ticker: Ticker,
    expiry: Duration,
    listeners: Listeners<StreakEvent>,
}

impl<S: StreakStore> StreakManager<S> {
    /// Create the schema, load every stored streak, run one expiry sweep and
    /// arm the periodic one.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created or the initial load
    /// fails.
    pub fn new(mut store: S, clock: impl Clock + 'static, settings: StreakSettings) -> Result<Self> {
        store.create_schema()?;

        let expiry_secs = settings.expiry_secs.min(u64::from(u32::MAX)) as i64;
        let mut manager = Self {
            store,
            clock: Box::new(clock),
            streaks: Vec::new(),
            sweep_ticker: Ticker::every_secs(settings.sweep_interval_secs),
            expiry: Duration::seconds(expiry_secs),
            listeners: Listeners::new(),
        };
        manager.reload()?;
        manager.sweep_expired();
        let now = manager.clock.now();
        manager.sweep_ticker.start(now);
        Ok(manager)
    }

    // ── Observers ────────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl FnMut(&StreakEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn count(&self) -> usize {
        self.streaks.len()
    }

    pub fn total_count(&self) -> usize {
        self.streaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streaks.is_empty()
    }

    /// Streaks with activity on today's date, recomputed on every call.
    pub fn active_count(&self) -> usize {
        let today = self.clock.now().date_naive();
        self.streaks.iter().filter(|s| s.is_active_on(today)).count()
    }

    pub fn summary(&self) -> StreakSummary {
        StreakSummary {
            total_streaks: self.total_count(),
            active_streaks: self.active_count(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Streak> {
        self.streaks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Streak> {
        self.streaks.iter()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn data(&self, index: usize, field: StreakField) -> Option<FieldValue> {
        let today = self.clock.now().date_naive();
        self.streaks.get(index).map(|s| field.read(s, today))
    }

    pub fn row(&self, index: usize) -> Option<StreakRow> {
        let today = self.clock.now().date_naive();
        self.streaks
            .get(index)
            .map(|s| StreakRow::from_streak(index, s, today))
    }

    pub fn rows(&self) -> Vec<StreakRow> {
        let today = self.clock.now().date_naive();
        self.streaks
            .iter()
            .enumerate()
            .map(|(index, s)| StreakRow::from_streak(index, s, today))
            .collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Persist a new streak and append it. Returns its index, or `None` if
    /// the title is blank or the store rejected the insert.
    pub fn add(&mut self, title: &str) -> Option<usize> {
        if title.trim().is_empty() {
            warn!("refusing to add a streak with an empty title");
            return None;
        }

        let id = match self.store.insert(title, 0, 0, None) {
            Ok(id) => id,
            Err(e) => {
                error!(title, error = %e, "failed to save streak");
                return None;
            }
        };

        let mut streak = Streak::new(title);
        streak.set_id(id);
        self.streaks.push(streak);
        let index = self.streaks.len() - 1;
        info!(id, title, index, "added streak");

        self.listeners.emit(StreakEvent::Added { index });
        self.emit_totals();
        Some(index)
    }

    /// Delete the stored row, then drop the streak from the collection even
    /// if the delete failed.
    pub fn remove(&mut self, index: usize) -> bool {
        let Some(streak) = self.streaks.get(index) else {
            return false;
        };
        let id = streak.id();

        if !streak.is_persisted() {
            warn!(index, "removing a streak that was never saved");
        } else if let Err(e) = self.store.delete(id) {
            error!(id, error = %e, "failed to delete streak from database");
        }

        let removed = self.streaks.remove(index);
        info!(id, title = removed.title(), index, "removed streak");

        self.listeners.emit(StreakEvent::Removed { index });
        self.emit_totals();
        true
    }

    pub fn increment(&mut self, index: usize) -> bool {
        let now = self.clock.now();
        let Some(streak) = self.streaks.get_mut(index) else {
            return false;
        };
        streak.increment_streak_duration_at(now);
        self.persist(index);
        self.emit_row_updated(index);
        true
    }

    /// Zero the current count. Best streak and last activity are kept.
    pub fn reset(&mut self, index: usize) -> bool {
        let Some(streak) = self.streaks.get_mut(index) else {
            return false;
        };
        streak.reset_streak_duration();
        self.persist(index);
        self.emit_row_updated(index);
        true
    }

    /// Generic row write used by editable bindings.
    ///
    /// Only a non-blank `Text` title and an `Int` duration that fits in a
    /// `u32` are accepted. A duration written this way does not raise the
    /// best streak.
    pub fn set_field(&mut self, index: usize, field: StreakField, value: FieldValue) -> bool {
        let Some(streak) = self.streaks.get_mut(index) else {
            return false;
        };

        match (field, value) {
            (StreakField::Title, FieldValue::Text(title)) if !title.trim().is_empty() => {
                streak.set_title(title);
            }
            (StreakField::StreakDuration, FieldValue::Int(n)) => match u32::try_from(n) {
                Ok(duration) => {
                    streak.set_streak_duration(duration);
                }
                Err(_) => return false,
            },
            _ => return false,
        }

        self.persist(index);
        self.emit_row_updated(index);
        true
    }

    pub fn rename(&mut self, index: usize, title: &str) -> bool {
        self.set_field(index, StreakField::Title, FieldValue::Text(title.to_string()))
    }

    /// Replace the whole collection with what the store holds.
    ///
    /// # Errors
    /// If the store cannot be read the collection is left as it was.
    pub fn reload(&mut self) -> Result<(), DatabaseError> {
        let records = self.store.load_all()?;
        self.streaks = records.into_iter().map(Streak::from_record).collect();
        info!(count = self.streaks.len(), "loaded streaks");

        self.listeners.emit(StreakEvent::Reset);
        self.emit_totals();
        Ok(())
    }

    /// Zero every running streak whose last activity is older than the
    /// expiry window. Returns how many were zeroed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now();
        let mut expired = Vec::new();

        for (index, streak) in self.streaks.iter_mut().enumerate() {
            let Some(last) = streak.last_activity() else {
                continue;
            };
            if now - last > self.expiry && streak.streak_duration() > 0 {
                streak.set_streak_duration(0);
                expired.push(index);
            }
        }

        for &index in &expired {
            self.persist(index);
            self.listeners.emit(StreakEvent::RowChanged { index });
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "expired stale streaks");
        }

        let active = self.active_count();
        self.listeners.emit(StreakEvent::ActiveChanged { active });
        expired.len()
    }

    /// Run the periodic sweep if it is due. Several missed periods collapse
    /// into a single sweep.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        if self.sweep_ticker.due(now) == 0 {
            return 0;
        }
        self.sweep_expired()
    }

    pub fn stop_sweep(&mut self) {
        self.sweep_ticker.stop();
    }

    pub fn is_sweep_running(&self) -> bool {
        self.sweep_ticker.is_running()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&mut self, index: usize) {
        let Some(streak) = self.streaks.get(index) else {
            return;
        };
        if !streak.is_persisted() {
            warn!(title = streak.title(), "streak has no database id, skipping update");
            return;
        }

        let record = streak.to_record();
        match self.store.update(&record) {
            Ok(()) => debug!(
                id = record.id,
                duration = record.streak_duration,
                best = record.best_streak,
                "updated streak in database"
            ),
            Err(e) => error!(id = record.id, error = %e, "failed to update streak in database"),
        }
    }

    fn emit_row_updated(&mut self, index: usize) {
        self.listeners.emit(StreakEvent::RowChanged { index });
        self.listeners.emit(StreakEvent::Updated { index });
        let active = self.active_count();
        self.listeners.emit(StreakEvent::ActiveChanged { active });
    }

    fn emit_totals(&mut self) {
        let total = self.total_count();
        self.listeners.emit(StreakEvent::TotalChanged { total });
        let active = self.active_count();
        self.listeners.emit(StreakEvent::ActiveChanged { active });
    }
}
