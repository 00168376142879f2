//! Pomodoro timer.
//!
//! A three-state machine that counts whole seconds. It does not use internal
//! threads: the owner calls [`PomodoroTimer::poll`] (or `tick()` directly)
//! and the one-second [`Ticker`] decides how many ticks are due.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Working -> OnBreak -> Idle
//! ```
//!
//! A phase whose counter reached zero moves on at the following tick.
//! Pausing only halts the ticker; state and remaining time stay put.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::events::{ListenerId, Listeners, TimerEvent};
use crate::ticker::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PomodoroState {
    Idle,
    Working,
    OnBreak,
}

impl PomodoroState {
    fn is_active(self) -> bool {
        matches!(self, PomodoroState::Working | PomodoroState::OnBreak)
    }
}

/// Serializable view of the timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: PomodoroState,
    pub remaining_secs: u32,
    pub work_secs: u32,
    pub break_secs: u32,
    pub ticking: bool,
    pub at: DateTime<Local>,
}

pub struct PomodoroTimer {
    clock: Box<dyn Clock>,
    ticker: Ticker,
    state: PomodoroState,
    remaining_secs: u32,
    work_secs: u32,
    break_secs: u32,
    listeners: Listeners<TimerEvent>,
}

impl PomodoroTimer {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            ticker: Ticker::every_secs(1),
            state: PomodoroState::Idle,
            remaining_secs: 0,
            work_secs: 0,
            break_secs: 0,
            listeners: Listeners::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TimerEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PomodoroState {
        self.state
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn work_secs(&self) -> u32 {
        self.work_secs
    }

    pub fn break_secs(&self) -> u32 {
        self.break_secs
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            remaining_secs: self.remaining_secs,
            work_secs: self.work_secs,
            break_secs: self.break_secs,
            ticking: self.is_ticking(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Abandon any running session and start a new one in `Working`.
    pub fn start_session(&mut self, work_secs: u32, break_secs: u32) {
        self.stop();
        self.work_secs = work_secs;
        self.break_secs = break_secs;
        self.transition_to(PomodoroState::Working, work_secs);
        let now = self.clock.now();
        self.ticker.start(now);
        debug!(work_secs, break_secs, "pomodoro session started");
    }

    /// Returns false if there was nothing to pause.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_active() || !self.ticker.is_running() {
            return false;
        }
        self.ticker.stop();
        true
    }

    /// Returns false if there is no phase left to resume.
    pub fn resume(&mut self) -> bool {
        if !self.state.is_active() || self.remaining_secs == 0 {
            return false;
        }
        let now = self.clock.now();
        self.ticker.start(now);
        true
    }

    pub fn stop(&mut self) {
        self.ticker.stop();
        self.remaining_secs = 0;
        self.state = PomodoroState::Idle;
        self.listeners.emit(TimerEvent::StateChanged {
            state: PomodoroState::Idle,
        });
        self.listeners.emit(TimerEvent::RemainingChanged { remaining_secs: 0 });
    }

    /// One second of progress.
    pub fn tick(&mut self) {
        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
            self.listeners.emit(TimerEvent::RemainingChanged {
                remaining_secs: self.remaining_secs,
            });
            return;
        }

        match self.state {
            PomodoroState::Working => {
                self.transition_to(PomodoroState::OnBreak, self.break_secs);
            }
            PomodoroState::OnBreak => {
                self.ticker.stop();
                self.state = PomodoroState::Idle;
                self.listeners.emit(TimerEvent::StateChanged {
                    state: PomodoroState::Idle,
                });
                self.listeners.emit(TimerEvent::SessionEnded);
                debug!("pomodoro session ended");
            }
            PomodoroState::Idle => {}
        }
    }

    /// Run every tick that is due by the clock. Returns how many ran.
    pub fn poll(&mut self) -> u32 {
        let now = self.clock.now();
        let due = self.ticker.due(now);
        let mut ran = 0;
        while ran < due && self.ticker.is_running() {
            self.tick();
            ran += 1;
        }
        ran
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn transition_to(&mut self, state: PomodoroState, remaining_secs: u32) {
        self.state = state;
        self.remaining_secs = remaining_secs;
        self.listeners.emit(TimerEvent::StateChanged { state });
        self.listeners.emit(TimerEvent::RemainingChanged { remaining_secs });
    }
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn timer() -> (PomodoroTimer, ManualClock, Rc<RefCell<Vec<TimerEvent>>>) {
        let clock = ManualClock::starting_now();
        let mut timer = PomodoroTimer::with_clock(clock.clone());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        timer.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        (timer, clock, events)
    }

    #[test]
    fn starts_idle() {
        let timer = PomodoroTimer::new();
        assert_eq!(timer.state(), PomodoroState::Idle);
        assert_eq!(timer.remaining_secs(), 0);
        assert!(!timer.is_ticking());
    }

    #[test]
    fn start_session_enters_working() {
        let (mut timer, _, events) = timer();
        timer.start_session(25, 5);

        assert_eq!(timer.state(), PomodoroState::Working);
        assert_eq!(timer.remaining_secs(), 25);
        assert!(timer.is_ticking());
        assert_eq!(
            events.borrow()[2..],
            [
                TimerEvent::StateChanged {
                    state: PomodoroState::Working
                },
                TimerEvent::RemainingChanged { remaining_secs: 25 },
            ]
        );
    }

    #[test]
    fn full_cycle_work_break_idle() {
        let (mut timer, clock, events) = timer();
        timer.start_session(3, 2);

        clock.advance(Duration::seconds(3));
        assert_eq!(timer.poll(), 3);
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.state(), PomodoroState::Working);

        clock.advance(Duration::seconds(1));
        timer.poll();
        assert_eq!(timer.state(), PomodoroState::OnBreak);
        assert_eq!(timer.remaining_secs(), 2);
        assert!(timer.is_ticking());

        clock.advance(Duration::seconds(2));
        timer.poll();
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.state(), PomodoroState::OnBreak);

        clock.advance(Duration::seconds(1));
        timer.poll();
        assert_eq!(timer.state(), PomodoroState::Idle);
        assert!(!timer.is_ticking());
        assert_eq!(events.borrow().last(), Some(&TimerEvent::SessionEnded));
    }

    #[test]
    fn late_poll_catches_up_and_stops_at_session_end() {
        let (mut timer, clock, _) = timer();
        timer.start_session(2, 1);

        // 2 + 1 (to break) + 1 + 1 (to idle) = 5 ticks, the rest are dropped.
        clock.advance(Duration::seconds(60));
        assert_eq!(timer.poll(), 5);
        assert_eq!(timer.state(), PomodoroState::Idle);

        clock.advance(Duration::seconds(60));
        assert_eq!(timer.poll(), 0);
    }

    #[test]
    fn pause_keeps_state_and_remaining() {
        let (mut timer, clock, _) = timer();
        timer.start_session(10, 5);
        clock.advance(Duration::seconds(4));
        timer.poll();

        assert!(timer.pause());
        assert!(!timer.pause());
        clock.advance(Duration::seconds(30));
        assert_eq!(timer.poll(), 0);
        assert_eq!(timer.state(), PomodoroState::Working);
        assert_eq!(timer.remaining_secs(), 6);

        assert!(timer.resume());
        clock.advance(Duration::seconds(2));
        timer.poll();
        assert_eq!(timer.remaining_secs(), 4);
    }

    #[test]
    fn pause_and_resume_do_nothing_when_idle() {
        let (mut timer, _, _) = timer();
        assert!(!timer.pause());
        assert!(!timer.resume());
        assert!(!timer.is_ticking());
    }

    #[test]
    fn resume_needs_remaining_time() {
        let (mut timer, clock, _) = timer();
        timer.start_session(1, 1);
        clock.advance(Duration::seconds(1));
        timer.poll();
        assert_eq!(timer.remaining_secs(), 0);

        timer.pause();
        assert!(!timer.resume());
        assert!(!timer.is_ticking());
    }

    #[test]
    fn stop_resets_to_idle() {
        let (mut timer, _, events) = timer();
        timer.start_session(10, 5);
        events.borrow_mut().clear();

        timer.stop();
        assert_eq!(timer.state(), PomodoroState::Idle);
        assert_eq!(timer.remaining_secs(), 0);
        assert!(!timer.is_ticking());
        assert_eq!(
            *events.borrow(),
            vec![
                TimerEvent::StateChanged {
                    state: PomodoroState::Idle
                },
                TimerEvent::RemainingChanged { remaining_secs: 0 },
            ]
        );

        // Idle is re-enterable.
        timer.start_session(2, 2);
        assert_eq!(timer.state(), PomodoroState::Working);
    }

    #[test]
    fn snapshot_serializes() {
        let (mut timer, _, _) = timer();
        timer.start_session(90, 30);
        let json = serde_json::to_value(timer.snapshot()).unwrap();
        assert_eq!(json["state"], "working");
        assert_eq!(json["remaining_secs"], 90);
        assert_eq!(json["ticking"], true);
    }
}
