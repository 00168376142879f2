pub mod config;
pub mod pomodoro;
pub mod streak;
