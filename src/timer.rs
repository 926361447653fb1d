//! Tick loop that drives the timer engine once per interval.

use crate::app::{App, PhaseEvent};
use crate::models::{ActiveTimer, TimerType};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Default spacing between ticks. The engine counts one second per tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Message sent from the timer thread to the driver thread.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerMessage {
    /// Timer state has changed, display needs update.
    StateChanged { title: String },
    /// A phase ran to completion.
    PhaseChanged(PhaseEvent),
}

/// Runs the timer loop, ticking every `interval`.
///
/// Returns once the receiving side of `tx` is gone or the app lock is poisoned.
pub fn run_timer_loop(app: Arc<Mutex<App>>, tx: Sender<TimerMessage>, interval: Duration) {
    loop {
        thread::sleep(interval);

        let (title, event) = {
            let Ok(mut app) = app.lock() else {
                log::error!("App lock poisoned, stopping timer loop");
                return;
            };
            match app.tick() {
                (true, event) => (Some(format_status(app.timer())), event),
                (false, _) => (None, None),
            }
        };

        if let Some(event) = event {
            if tx.send(TimerMessage::PhaseChanged(event)).is_err() {
                return;
            }
        }
        if let Some(title) = title {
            if tx.send(TimerMessage::StateChanged { title }).is_err() {
                return;
            }
        }
    }
}

/// Formats a one-line status for the current timer.
pub fn format_status(timer: Option<&ActiveTimer>) -> String {
    let Some(timer) = timer else {
        return "🍅".to_string();
    };

    let secs = match timer.timer_type {
        TimerType::Stopwatch => timer.elapsed,
        TimerType::Pomodoro => timer.remaining_secs().unwrap_or(0),
    };
    let icon = if timer.is_paused() {
        "⏸"
    } else if timer.timer_type == TimerType::Stopwatch {
        "⏱"
    } else if timer.phase.is_break() {
        "☕"
    } else {
        "🍅"
    };
    format!("{} {}", icon, format_time(secs))
}

/// Formats time in MM:SS format. Minutes keep counting past 59.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
