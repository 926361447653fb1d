//! Timer engine: owns the active timer and routes finalized work into the ledger.

use crate::clock::{Clock, SystemClock};
use crate::ledger::{ActivityLedger, Credit, Finalized};
use crate::models::{
    ActiveTimer, DailyActivity, Folder, FolderUpdate, Phase, PomodoroSettings, Session,
    SettingsUpdate, Task, TaskUpdate, TimerStatus, TimerType,
};
use crate::persistence::{Database, DatabaseError};
use crate::tasks::TaskBook;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Phase boundaries reported by `tick`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseEvent {
    WorkComplete { cycles_completed: u32, next: Phase },
    BreakComplete,
}

/// Main application state: the active timer, settings, tasks and the ledger.
///
/// Every operation runs to completion on the caller's thread. Drivers that
/// tick from another thread share the app behind a `Mutex`.
pub struct App {
    timer: Option<ActiveTimer>,
    settings: PomodoroSettings,
    tasks: TaskBook,
    ledger: ActivityLedger,
    db: Database,
    clock: Arc<dyn Clock>,
}

impl App {
    /// Creates a new application instance backed by the default database.
    pub fn new() -> Result<Self, AppError> {
        let db = Database::new()?;
        Self::with_db(db, Arc::new(SystemClock))
    }

    /// Creates an app over the given database and clock, restoring the last snapshot.
    pub fn with_db(db: Database, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let snapshot = db.load_snapshot()?;
        let tasks = TaskBook::from_parts(snapshot.tasks, snapshot.folders);
        log::debug!(
            "Restored {} tasks and {} sessions",
            tasks.tasks().len(),
            snapshot.sessions.len()
        );
        for folder in tasks.folders() {
            db.save_folder(folder)?;
        }

        Ok(Self {
            timer: None,
            settings: snapshot.settings,
            tasks,
            ledger: ActivityLedger::from_parts(snapshot.sessions, snapshot.daily_activity),
            db,
            clock,
        })
    }

    pub fn timer(&self) -> Option<&ActiveTimer> {
        self.timer.as_ref()
    }

    pub fn settings(&self) -> &PomodoroSettings {
        &self.settings
    }

    pub fn tasks(&self) -> &TaskBook {
        &self.tasks
    }

    pub fn sessions(&self) -> &[Session] {
        self.ledger.sessions()
    }

    /// Recorded sessions that belong to `task_id`.
    pub fn sessions_for_task<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a Session> {
        self.ledger.sessions_for_task(task_id)
    }

    pub fn daily_activity(&self) -> &DailyActivity {
        self.ledger.daily_activity()
    }

    /// Minutes credited on the clock's current local day.
    pub fn minutes_today(&self) -> f64 {
        self.ledger.minutes_on(self.clock.now().date_naive())
    }

    /// Starts a timer on `task_id`, replacing any active timer.
    ///
    /// Progress on a replaced timer is discarded. Use [`App::restart_timer`]
    /// to credit it first.
    pub fn start_timer(&mut self, task_id: &str, timer_type: TimerType) {
        if let Some(previous) = &self.timer {
            log::debug!(
                "Replacing {} timer on task {} ({}s unfinalized)",
                previous.timer_type.as_str(),
                previous.task_id,
                previous.elapsed
            );
        }

        let duration = match timer_type {
            TimerType::Pomodoro => self.settings.work_duration,
            TimerType::Stopwatch => 0,
        };
        self.timer = Some(ActiveTimer {
            task_id: task_id.to_string(),
            timer_type,
            start_time: self.clock.now().timestamp_millis(),
            duration,
            elapsed: 0,
            status: TimerStatus::Running,
            phase: Phase::Work,
            cycles_completed: 0,
        });
        log::debug!("Started {} timer on task {}", timer_type.as_str(), task_id);
    }

    /// Stops the active timer, crediting it, then starts a new one.
    pub fn restart_timer(&mut self, task_id: &str, timer_type: TimerType) {
        self.stop_timer();
        self.start_timer(task_id, timer_type);
    }

    /// Toggles between running and paused.
    ///
    /// Work time elapsed in the current phase is credited on every toggle and
    /// `elapsed` is left as is.
    pub fn pause_timer(&mut self) {
        let Some(timer) = &self.timer else {
            return;
        };
        if timer.logs_work() {
            let task_id = timer.task_id.clone();
            let minutes = timer.elapsed_minutes();
            self.credit(&task_id, minutes, Credit::Pause);
        }

        if let Some(timer) = &mut self.timer {
            timer.status = timer.status.toggled();
            log::debug!("Timer on task {} is now {:?}", timer.task_id, timer.status);
        }
    }

    /// Credits outstanding work, records a session if it is long enough,
    /// and clears the active timer.
    pub fn stop_timer(&mut self) {
        let Some(timer) = self.timer.take() else {
            return;
        };
        if timer.logs_work() {
            let credit = Credit::Stop {
                started_at: timer.start_time,
                timer_type: timer.timer_type,
            };
            self.credit(&timer.task_id, timer.elapsed_minutes(), credit);
        }
        log::debug!("Stopped timer on task {}", timer.task_id);
    }

    /// Advances the running timer by one second.
    /// Returns (state_changed, optional_phase_event).
    pub fn tick(&mut self) -> (bool, Option<PhaseEvent>) {
        let settings = self.settings;
        let Some(timer) = self.timer.as_mut().filter(|t| t.is_running()) else {
            return (false, None);
        };

        let elapsed = timer.elapsed.saturating_add(1);
        match timer.target_secs() {
            Some(target) if elapsed >= target => {}
            _ => {
                timer.elapsed = elapsed;
                return (true, None);
            }
        }

        // Phase boundary: any overshoot is dropped with the reset.
        let (event, work_credit) = match timer.phase {
            Phase::Work => {
                timer.cycles_completed += 1;
                let next = settings.break_after(timer.cycles_completed);
                let credited = (timer.task_id.clone(), f64::from(timer.duration));
                timer.phase = next;
                timer.duration = settings.duration_for(next);
                (
                    PhaseEvent::WorkComplete {
                        cycles_completed: timer.cycles_completed,
                        next,
                    },
                    Some(credited),
                )
            }
            Phase::ShortBreak | Phase::LongBreak => {
                timer.phase = Phase::Work;
                timer.duration = settings.work_duration;
                (PhaseEvent::BreakComplete, None)
            }
        };
        timer.elapsed = 0;
        log::debug!("Phase complete on task {}: {:?}", timer.task_id, event);

        if let Some((task_id, minutes)) = work_credit {
            self.credit(&task_id, minutes, Credit::CycleComplete);
        }
        (true, Some(event))
    }

    /// Merges a settings update. A phase already in progress keeps its length.
    pub fn set_pomodoro_settings(&mut self, update: SettingsUpdate) {
        self.settings.apply(update);
        if let Err(e) = self.db.save_settings(&self.settings) {
            log::warn!("Failed to save settings: {}", e);
        }
    }

    /// Adds a task, replacing any task with the same id.
    pub fn add_task(&mut self, task: Task) {
        if let Err(e) = self.db.save_task(&task) {
            log::warn!("Failed to save task {}: {}", task.id, e);
        }
        if self.tasks.add_task(task).is_some() {
            log::debug!("Replaced existing task with the same id");
        }
    }

    pub fn update_task(&mut self, task_id: &str, update: TaskUpdate) {
        if self.tasks.update_task(task_id, update) {
            self.save_task(task_id);
        }
    }

    pub fn delete_task(&mut self, task_id: &str) {
        if self.tasks.delete_task(task_id).is_some() {
            if let Err(e) = self.db.delete_task(task_id) {
                log::warn!("Failed to delete task {}: {}", task_id, e);
            }
        }
    }

    pub fn assign_to_date(&mut self, task_id: &str, date: NaiveDate) {
        if self.tasks.assign_to_date(task_id, date) {
            self.save_task(task_id);
        }
    }

    pub fn remove_from_date(&mut self, task_id: &str, date: NaiveDate) {
        if self.tasks.remove_from_date(task_id, date) {
            self.save_task(task_id);
        }
    }

    pub fn add_folder(&mut self, folder: Folder) {
        if let Err(e) = self.db.save_folder(&folder) {
            log::warn!("Failed to save folder {}: {}", folder.id, e);
        }
        self.tasks.add_folder(folder);
    }

    pub fn update_folder(&mut self, folder_id: &str, update: FolderUpdate) {
        if !self.tasks.update_folder(folder_id, update) {
            return;
        }
        if let Some(folder) = self.tasks.folder(folder_id) {
            if let Err(e) = self.db.save_folder(folder) {
                log::warn!("Failed to save folder {}: {}", folder_id, e);
            }
        }
    }

    pub fn delete_folder(&mut self, folder_id: &str) {
        let Some(moved) = self.tasks.delete_folder(folder_id) else {
            return;
        };
        if let Err(e) = self.db.delete_folder(folder_id) {
            log::warn!("Failed to delete folder {}: {}", folder_id, e);
        }
        for task_id in &moved {
            self.save_task(task_id);
        }
    }

    fn credit(&mut self, task_id: &str, minutes: f64, credit: Credit) -> Option<Finalized> {
        let now = self.clock.now();
        let Some(finalized) = self
            .ledger
            .finalize(&mut self.tasks, task_id, minutes, credit, now)
        else {
            log::warn!("No task {} to credit {:.2} minutes to", task_id, minutes);
            return None;
        };

        self.save_task(task_id);
        let day_total = self.ledger.minutes_on(finalized.day);
        if let Err(e) = self.db.save_daily_minutes(finalized.day, day_total) {
            log::warn!("Failed to save daily activity for {}: {}", finalized.day, e);
        }
        if let Some(session) = &finalized.session {
            log::info!(
                "Recorded {} session of {:.2} minutes on task {}",
                session.timer_type.as_str(),
                session.duration,
                session.task_id
            );
            if let Err(e) = self.db.insert_session(session) {
                log::warn!("Failed to save session {}: {}", session.id, e);
            }
        }
        Some(finalized)
    }

    fn save_task(&self, task_id: &str) {
        if let Some(task) = self.tasks.get(task_id) {
            if let Err(e) = self.db.save_task(task) {
                log::warn!("Failed to save task {}: {}", task_id, e);
            }
        }
    }
}
