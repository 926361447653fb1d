//! Driver command parsing and handling.

use crate::app::App;
use crate::models::{SettingsUpdate, Task, TimerType};
use crate::timer::{format_status, format_time};
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("Invalid timer type: {0} (expected pomodoro or stopwatch)")]
    InvalidTimerType(String),
    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("Invalid setting: {0} (expected work=N, short=N, long=N or cycles=N)")]
    InvalidSetting(String),
}

/// A line of driver input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start { task_id: String, timer_type: TimerType },
    Restart { task_id: String, timer_type: TimerType },
    Pause,
    Stop,
    Status,
    Set(SettingsUpdate),
    Add { title: String },
    Tasks,
    Assign { task_id: String, date: NaiveDate },
    Unassign { task_id: String, date: NaiveDate },
    Delete { task_id: String },
    Today,
    Quit,
}

/// Result of handling a command.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    /// Command handled, print this reply.
    Reply(String),
    /// Timer state changed, status line needs update.
    StateChanged,
    /// User requested quit.
    Quit,
}

impl Command {
    /// Parses one line of input. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };

        let command = match name {
            "start" | "restart" => {
                let task_id = words
                    .next()
                    .ok_or(CommandError::MissingArgument("task id"))?
                    .to_string();
                let timer_type = match words.next() {
                    None => TimerType::Pomodoro,
                    Some(kind) => TimerType::parse(kind)
                        .ok_or_else(|| CommandError::InvalidTimerType(kind.to_string()))?,
                };
                if name == "start" {
                    Self::Start { task_id, timer_type }
                } else {
                    Self::Restart { task_id, timer_type }
                }
            }
            "pause" => Self::Pause,
            "stop" => Self::Stop,
            "status" => Self::Status,
            "set" => Self::Set(parse_settings(words)?),
            "add" => {
                let title = words.collect::<Vec<_>>().join(" ");
                if title.is_empty() {
                    return Err(CommandError::MissingArgument("title"));
                }
                Self::Add { title }
            }
            "tasks" => Self::Tasks,
            "assign" | "unassign" => {
                let task_id = words
                    .next()
                    .ok_or(CommandError::MissingArgument("task id"))?
                    .to_string();
                let raw = words.next().ok_or(CommandError::MissingArgument("date"))?;
                let date = raw
                    .parse::<NaiveDate>()
                    .map_err(|_| CommandError::InvalidDate(raw.to_string()))?;
                if name == "assign" {
                    Self::Assign { task_id, date }
                } else {
                    Self::Unassign { task_id, date }
                }
            }
            "delete" => Self::Delete {
                task_id: words
                    .next()
                    .ok_or(CommandError::MissingArgument("task id"))?
                    .to_string(),
            },
            "today" => Self::Today,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_settings<'a>(pairs: impl Iterator<Item = &'a str>) -> Result<SettingsUpdate, CommandError> {
    let mut update = SettingsUpdate::default();
    for pair in pairs {
        let invalid = || CommandError::InvalidSetting(pair.to_string());
        let (key, value) = pair.split_once('=').ok_or_else(invalid)?;
        let value = value.parse::<i64>().map_err(|_| invalid())?;
        match key {
            "work" => update.work_duration = Some(value),
            "short" => update.short_break_duration = Some(value),
            "long" => update.long_break_duration = Some(value),
            "cycles" => update.cycles_before_long_break = Some(value),
            _ => return Err(invalid()),
        }
    }
    if update.is_empty() {
        return Err(CommandError::MissingArgument("setting"));
    }
    Ok(update)
}

/// Handles a command and updates the app state accordingly.
pub fn handle_command(app: &mut App, command: Command) -> EventResult {
    match command {
        Command::Start { task_id, timer_type } => {
            app.start_timer(&task_id, timer_type);
            EventResult::StateChanged
        }
        Command::Restart { task_id, timer_type } => {
            app.restart_timer(&task_id, timer_type);
            EventResult::StateChanged
        }
        Command::Pause => {
            app.pause_timer();
            EventResult::StateChanged
        }
        Command::Stop => {
            app.stop_timer();
            EventResult::StateChanged
        }
        Command::Status => {
            let status = format_status(app.timer());
            match app.timer().and_then(|t| t.progress_percent()) {
                Some(progress) => {
                    EventResult::Reply(format!("{} ({:.0}%)", status, progress * 100.0))
                }
                None => EventResult::Reply(status),
            }
        }
        Command::Set(update) => {
            app.set_pomodoro_settings(update);
            let s = app.settings();
            EventResult::Reply(format!(
                "work {}m, short break {}m, long break {}m, long break every {} cycles",
                s.work_duration,
                s.short_break_duration,
                s.long_break_duration,
                s.cycles_before_long_break
            ))
        }
        Command::Add { title } => {
            let id = Uuid::new_v4().to_string();
            app.add_task(Task::new(id.clone(), title));
            EventResult::Reply(id)
        }
        Command::Tasks => {
            let lines: Vec<String> = app
                .tasks()
                .tasks()
                .iter()
                .map(|t| {
                    let cycles = t.pomodoro.map(|p| p.completed_cycles).unwrap_or(0);
                    let sessions = app.sessions_for_task(&t.id).count();
                    format!(
                        "{}  {}  {:.1}m  {} cycles  {} sessions",
                        t.id, t.title, t.duration, cycles, sessions
                    )
                })
                .collect();
            if lines.is_empty() {
                EventResult::Reply("no tasks".to_string())
            } else {
                EventResult::Reply(lines.join("\n"))
            }
        }
        Command::Assign { task_id, date } => {
            app.assign_to_date(&task_id, date);
            EventResult::Reply(format!("{} scheduled on {}", task_id, date))
        }
        Command::Unassign { task_id, date } => {
            app.remove_from_date(&task_id, date);
            EventResult::Reply(format!("{} removed from {}", task_id, date))
        }
        Command::Delete { task_id } => {
            app.delete_task(&task_id);
            EventResult::Reply(format!("{} deleted", task_id))
        }
        Command::Today => {
            let secs = (app.minutes_today() * 60.0).round() as u32;
            EventResult::Reply(format!(
                "{} focused today, {} sessions recorded",
                format_time(secs),
                app.sessions().len()
            ))
        }
        Command::Quit => EventResult::Quit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::persistence::Database;
    use std::sync::Arc;

    fn create_test_app() -> App {
        let db = Database::new_in_memory().unwrap();
        App::with_db(db, Arc::new(SystemClock)).unwrap()
    }

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_start_defaults_to_pomodoro() {
        assert_eq!(
            parse("start t1"),
            Command::Start {
                task_id: "t1".to_string(),
                timer_type: TimerType::Pomodoro
            }
        );
        assert_eq!(
            parse("  restart t1 stopwatch "),
            Command::Restart {
                task_id: "t1".to_string(),
                timer_type: TimerType::Stopwatch
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Command::parse("start"),
            Err(CommandError::MissingArgument("task id"))
        );
        assert_eq!(
            Command::parse("start t1 kitchen"),
            Err(CommandError::InvalidTimerType("kitchen".to_string()))
        );
        assert_eq!(
            Command::parse("assign t1 tomorrow"),
            Err(CommandError::InvalidDate("tomorrow".to_string()))
        );
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(Command::parse("add"), Err(CommandError::MissingArgument("title")));
    }

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn test_parse_settings_keeps_negative_values() {
        let Command::Set(update) = parse("set work=-5 cycles=0") else {
            panic!("Expected Set command");
        };
        assert_eq!(update.work_duration, Some(-5));
        assert_eq!(update.cycles_before_long_break, Some(0));
        assert_eq!(update.short_break_duration, None);

        assert_eq!(
            Command::parse("set work"),
            Err(CommandError::InvalidSetting("work".to_string()))
        );
        assert_eq!(
            Command::parse("set nap=3"),
            Err(CommandError::InvalidSetting("nap=3".to_string()))
        );
        assert_eq!(
            Command::parse("set"),
            Err(CommandError::MissingArgument("setting"))
        );
    }

    #[test]
    fn test_handle_timer_commands() {
        let mut app = create_test_app();
        app.add_task(Task::new("t", "Write"));

        assert_eq!(
            handle_command(&mut app, parse("start t stopwatch")),
            EventResult::StateChanged
        );
        assert!(app.timer().is_some());

        handle_command(&mut app, parse("pause"));
        assert!(app.timer().unwrap().is_paused());

        assert_eq!(
            handle_command(&mut app, parse("status")),
            EventResult::Reply("⏸ 00:00".to_string())
        );

        handle_command(&mut app, parse("stop"));
        assert!(app.timer().is_none());
    }

    #[test]
    fn test_status_shows_pomodoro_progress() {
        let mut app = create_test_app();
        app.add_task(Task::new("t", "Write"));
        handle_command(&mut app, parse("start t"));
        for _ in 0..300 {
            app.tick();
        }

        assert_eq!(
            handle_command(&mut app, parse("status")),
            EventResult::Reply("🍅 20:00 (20%)".to_string())
        );
    }

    #[test]
    fn test_tasks_listing_counts_sessions() {
        let mut app = create_test_app();
        app.add_task(Task::new("t", "Write"));
        handle_command(&mut app, parse("start t stopwatch"));
        for _ in 0..90 {
            app.tick();
        }
        handle_command(&mut app, parse("stop"));

        assert_eq!(
            handle_command(&mut app, parse("tasks")),
            EventResult::Reply("t  Write  1.0m  0 cycles  1 sessions".to_string())
        );
    }

    #[test]
    fn test_handle_set_coerces() {
        let mut app = create_test_app();
        let result = handle_command(&mut app, parse("set work=0 long=20"));
        assert_eq!(app.settings().work_duration, 1);
        assert_eq!(app.settings().long_break_duration, 20);
        assert!(matches!(result, EventResult::Reply(_)));
    }

    #[test]
    fn test_handle_task_commands() {
        let mut app = create_test_app();
        let EventResult::Reply(id) = handle_command(&mut app, parse("add Buy groceries")) else {
            panic!("Expected reply with task id");
        };
        assert_eq!(app.tasks().get(&id).unwrap().title, "Buy groceries");

        handle_command(&mut app, parse(&format!("assign {id} 2024-03-01")));
        assert_eq!(app.tasks().get(&id).unwrap().dates.len(), 1);

        handle_command(&mut app, parse(&format!("unassign {id} 2024-03-01")));
        assert!(app.tasks().get(&id).unwrap().dates.is_empty());

        let EventResult::Reply(listing) = handle_command(&mut app, parse("tasks")) else {
            panic!("Expected task listing");
        };
        assert!(listing.contains("Buy groceries"));

        handle_command(&mut app, parse(&format!("delete {id}")));
        assert_eq!(
            handle_command(&mut app, parse("tasks")),
            EventResult::Reply("no tasks".to_string())
        );
    }

    #[test]
    fn test_handle_quit() {
        let mut app = create_test_app();
        assert_eq!(handle_command(&mut app, parse("quit")), EventResult::Quit);
    }
}
