mod pomodoro;

pub use pomodoro::{PomodoroState, PomodoroTimer, TimerSnapshot};
