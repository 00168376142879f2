//! Integration tests for streak persistence across restarts.
//!
//! Each test works on a file-backed database in a temp directory and
//! re-opens it to simulate an application restart.

use chrono::{DateTime, Duration, Local};
use lemonstudys_core::{Database, ManualClock, StreakManager, StreakSettings, StreakStore};
use tempfile::TempDir;

fn noon_today() -> DateTime<Local> {
    Local::now()
        .date_naive()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_local_timezone(Local)
        .earliest()
        .unwrap()
}

fn open(dir: &TempDir, clock: &ManualClock) -> StreakManager<Database> {
    let db = Database::open_at(dir.path().join("streaks.db")).unwrap();
    StreakManager::new(db, clock.clone(), StreakSettings::default()).unwrap()
}

#[test]
fn test_streak_survives_restart() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(noon_today());

    {
        let mut manager = open(&dir, &clock);
        let index = manager.add("X").unwrap();
        assert!(manager.increment(index));
        assert!(manager.increment(index));
    }

    let manager = open(&dir, &clock);
    assert_eq!(manager.count(), 1);
    let streak = manager.get(0).unwrap();
    assert_eq!(streak.title(), "X");
    assert_eq!(streak.streak_duration(), 2);
    assert_eq!(streak.best_streak(), 2);
    assert_eq!(streak.last_activity(), Some(noon_today()));
    assert!(streak.is_active_on(noon_today().date_naive()));
    assert_eq!(manager.active_count(), 1);
}

#[test]
fn test_removal_survives_restart() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(noon_today());

    {
        let mut manager = open(&dir, &clock);
        manager.add("A").unwrap();
        manager.add("B").unwrap();
        manager.add("C").unwrap();
        assert!(manager.remove(1));
    }

    let manager = open(&dir, &clock);
    let titles: Vec<_> = manager.iter().map(|s| s.title().to_string()).collect();
    assert_eq!(titles, vec!["A", "C"]);
}

#[test]
fn test_creation_order_kept_after_rename() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(noon_today());

    {
        let mut manager = open(&dir, &clock);
        manager.add("first").unwrap();
        manager.add("second").unwrap();
        assert!(manager.rename(0, "zzz"));
    }

    let manager = open(&dir, &clock);
    let titles: Vec<_> = manager.iter().map(|s| s.title().to_string()).collect();
    assert_eq!(titles, vec!["zzz", "second"]);
}

#[test]
fn test_expired_streak_is_reset_on_startup() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(noon_today());

    let id = {
        let mut manager = open(&dir, &clock);
        let index = manager.add("Run").unwrap();
        manager.increment(index);
        manager.increment(index);
        manager.get(index).unwrap().id()
    };

    clock.advance(Duration::hours(25));
    {
        let manager = open(&dir, &clock);
        let streak = manager.get(0).unwrap();
        assert_eq!(streak.streak_duration(), 0);
        assert_eq!(streak.best_streak(), 2);
    }

    let db = Database::open_at(dir.path().join("streaks.db")).unwrap();
    let record = db.get(id).unwrap().unwrap();
    assert_eq!(record.streak_duration, 0);
    assert_eq!(record.best_streak, 2);
    assert_eq!(record.last_activity, Some(noon_today()));
}

#[test]
fn test_recent_streak_is_kept_on_startup() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(noon_today());

    {
        let mut manager = open(&dir, &clock);
        let index = manager.add("Read").unwrap();
        manager.increment(index);
    }

    clock.advance(Duration::hours(23));
    let manager = open(&dir, &clock);
    assert_eq!(manager.get(0).unwrap().streak_duration(), 1);
}

#[test]
fn test_store_and_manager_agree() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(noon_today());
    let mut manager = open(&dir, &clock);

    manager.add("Write").unwrap();
    manager.increment(0);
    manager.reset(0);

    let records = manager.store().load_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, manager.get(0).unwrap().id());
    assert_eq!(records[0].streak_duration, 0);
    assert_eq!(records[0].best_streak, 1);
}
