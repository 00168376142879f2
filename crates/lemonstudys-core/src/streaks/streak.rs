//! A single habit streak.
//!
//! Day arithmetic is done on local calendar dates: an activity at 23:59
//! yesterday is one day ago, regardless of how many hours have passed.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::storage::StreakRecord;

/// Id carried by a streak that has not been persisted yet.
pub const UNSAVED_ID: i64 = -1;

/// What a mutator changed, for callers that forward it to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    TitleChanged,
    StreakDurationChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    id: i64,
    title: String,
    streak_duration: u32,
    best_streak: u32,
    last_activity: Option<DateTime<Local>>,
}

impl Streak {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            title: title.into(),
            streak_duration: 0,
            best_streak: 0,
            last_activity: None,
        }
    }

    /// Rebuild a streak from a stored row, keeping every stored value as is.
    pub fn from_record(record: StreakRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            streak_duration: record.streak_duration,
            best_streak: record.best_streak,
            last_activity: record.last_activity,
        }
    }

    pub fn to_record(&self) -> StreakRecord {
        StreakRecord {
            id: self.id,
            title: self.title.clone(),
            streak_duration: self.streak_duration,
            best_streak: self.best_streak,
            last_activity: self.last_activity,
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }

    // ── Title ────────────────────────────────────────────────────────

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Option<StreakChange> {
        let title = title.into();
        if self.title == title {
            return None;
        }
        self.title = title;
        Some(StreakChange::TitleChanged)
    }

    // ── Duration ─────────────────────────────────────────────────────

    pub fn streak_duration(&self) -> u32 {
        self.streak_duration
    }

    /// Direct setter for restoring state. Does not touch the best streak,
    /// so `best_streak >= streak_duration` may not hold afterwards until
    /// [`update_best_streak`](Self::update_best_streak) runs.
    pub fn set_streak_duration(&mut self, duration: u32) -> Option<StreakChange> {
        if self.streak_duration == duration {
            return None;
        }
        self.streak_duration = duration;
        Some(StreakChange::StreakDurationChanged)
    }

    pub fn increment_streak_duration(&mut self) -> StreakChange {
        self.increment_streak_duration_at(Local::now())
    }

    /// Count one more active day, stamping `now` as the last activity.
    pub fn increment_streak_duration_at(&mut self, now: DateTime<Local>) -> StreakChange {
        self.streak_duration = self.streak_duration.saturating_add(1);
        self.last_activity = Some(now);
        self.update_best_streak();
        StreakChange::StreakDurationChanged
    }

    /// Zero the current streak. Best streak and last activity are kept.
    pub fn reset_streak_duration(&mut self) -> StreakChange {
        self.streak_duration = 0;
        StreakChange::StreakDurationChanged
    }

    // ── Activity ─────────────────────────────────────────────────────

    pub fn last_activity(&self) -> Option<DateTime<Local>> {
        self.last_activity
    }

    pub fn set_last_activity(&mut self, at: Option<DateTime<Local>>) {
        self.last_activity = at;
    }

    pub fn is_active_today(&self) -> bool {
        self.is_active_on(Local::now().date_naive())
    }

    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.days_since(today) == Some(0)
    }

    pub fn is_streak_broken(&self) -> bool {
        self.is_streak_broken_on(Local::now().date_naive())
    }

    /// Broken when never active or when more than one calendar day has
    /// passed; yesterday's activity still counts.
    pub fn is_streak_broken_on(&self, today: NaiveDate) -> bool {
        match self.days_since(today) {
            None => true,
            Some(days) => days > 1,
        }
    }

    pub fn days_since_last_activity(&self) -> i64 {
        self.days_since_last_activity_on(Local::now().date_naive())
    }

    /// Whole calendar days since the last activity, `-1` if never active.
    pub fn days_since_last_activity_on(&self, today: NaiveDate) -> i64 {
        self.days_since(today).unwrap_or(-1)
    }

    fn days_since(&self, today: NaiveDate) -> Option<i64> {
        self.last_activity
            .map(|at| (today - at.date_naive()).num_days())
    }

    // ── Best streak ──────────────────────────────────────────────────

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn set_best_streak(&mut self, best: u32) {
        self.best_streak = best;
    }

    pub fn update_best_streak(&mut self) {
        self.best_streak = self.best_streak.max(self.streak_duration);
    }

    pub fn is_best_streak_zero(&self) -> bool {
        self.best_streak == 0
    }
}
