use serde::{Deserialize, Serialize};

use crate::timer::PomodoroState;

/// Change notifications emitted by [`StreakManager`](crate::StreakManager).
///
/// Every event is emitted only after both the in-memory collection and the
/// store have been written for the operation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreakEvent {
    Added { index: usize },
    Removed { index: usize },
    Updated { index: usize },
    /// The derived fields of one row may have changed.
    RowChanged { index: usize },
    TotalChanged { total: usize },
    ActiveChanged { active: usize },
    /// The whole collection was replaced; observers must drop any per-row
    /// state instead of diffing.
    Reset,
}

/// Notifications emitted by [`PomodoroTimer`](crate::PomodoroTimer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    StateChanged { state: PomodoroState },
    RemainingChanged { remaining_secs: u32 },
    SessionEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Synchronous observer list.
pub struct Listeners<E> {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn FnMut(&E)>)>,
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: E) {
        for (_, listener) in self.entries.iter_mut() {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}
