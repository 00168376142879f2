mod manager;
mod model;
mod streak;

pub use manager::{StreakManager, StreakSettings};
pub use model::{FieldValue, StreakField, StreakRow, StreakSummary};
pub use streak::{Streak, StreakChange, UNSAVED_ID};
