//! Activity ledger: credits finalized work to tasks, daily totals and sessions.

use crate::models::{DailyActivity, PomodoroProgress, Session, TimerType};
use crate::tasks::TaskBook;
use chrono::{DateTime, Local, NaiveDate};
use uuid::Uuid;

/// Stopped intervals of this many minutes or fewer are not recorded as sessions.
pub const SESSION_THRESHOLD_MINUTES: f64 = 0.1;

/// How a block of minutes reached the ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Credit {
    /// The timer was paused or resumed.
    Pause,
    /// The timer was stopped. Floors the task total and may record a session.
    Stop {
        started_at: i64,
        timer_type: TimerType,
    },
    /// A pomodoro work phase ran to completion.
    CycleComplete,
}

/// What a successful finalization touched.
#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    pub day: NaiveDate,
    pub task_duration: f64,
    pub session: Option<Session>,
}

/// Append-only session history plus per-day minute totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityLedger {
    sessions: Vec<Session>,
    daily_activity: DailyActivity,
}

impl ActivityLedger {
    pub fn from_parts(sessions: Vec<Session>, daily_activity: DailyActivity) -> Self {
        Self {
            sessions,
            daily_activity,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn daily_activity(&self) -> &DailyActivity {
        &self.daily_activity
    }

    /// Minutes credited on the given local day.
    pub fn minutes_on(&self, day: NaiveDate) -> f64 {
        self.daily_activity.get(&day).copied().unwrap_or(0.0)
    }

    pub fn sessions_for_task<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a Session> {
        self.sessions.iter().filter(move |s| s.task_id == task_id)
    }

    /// Credits `minutes` of work on `task_id` at instant `now`.
    ///
    /// Returns `None` without touching anything if the task does not exist.
    pub fn finalize(
        &mut self,
        tasks: &mut TaskBook,
        task_id: &str,
        minutes: f64,
        credit: Credit,
        now: DateTime<Local>,
    ) -> Option<Finalized> {
        let task = tasks.get_mut(task_id)?;
        let minutes = minutes.max(0.0);

        task.duration = match credit {
            Credit::Stop { .. } => (task.duration + minutes).floor(),
            Credit::Pause | Credit::CycleComplete => task.duration + minutes,
        };

        if credit == Credit::CycleComplete {
            let progress = task.pomodoro.get_or_insert_with(PomodoroProgress::default);
            progress.completed_cycles += 1;
        }

        let day = now.date_naive();
        *self.daily_activity.entry(day).or_insert(0.0) += minutes;

        let session = match credit {
            Credit::Stop {
                started_at,
                timer_type,
            } if minutes > SESSION_THRESHOLD_MINUTES => {
                let session = Session {
                    id: Uuid::new_v4().to_string(),
                    task_id: task.id.clone(),
                    start_time: started_at,
                    end_time: now.timestamp_millis().max(started_at),
                    duration: minutes,
                    timer_type,
                };
                self.sessions.push(session.clone());
                Some(session)
            }
            _ => None,
        };

        Some(Finalized {
            day,
            task_duration: task.duration,
            session,
        })
    }
}
