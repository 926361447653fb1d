//! FlowCal focus timer.
//!
//! A pomodoro/stopwatch timer engine that credits finished work to tasks,
//! per-day totals and an append-only session history, persisted in SQLite.

pub mod app;
pub mod clock;
pub mod event;
pub mod ledger;
pub mod models;
pub mod persistence;
pub mod tasks;
pub mod timer;

pub use app::{App, AppError, PhaseEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{ActivityLedger, Credit};
pub use models::{ActiveTimer, Phase, PomodoroSettings, Session, SettingsUpdate, Task, TimerType};
pub use persistence::{Database, DatabaseError};
pub use tasks::TaskBook;
