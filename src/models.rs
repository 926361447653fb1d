//! Data models for the FlowCal focus timer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of the folder every task falls back to.
pub const INBOX_FOLDER_ID: &str = "inbox";

/// Kind of timer attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerType {
    /// Counts down work and break phases.
    Pomodoro,
    /// Counts up without bound.
    Stopwatch,
}

impl TimerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pomodoro => "pomodoro",
            Self::Stopwatch => "stopwatch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pomodoro" => Some(Self::Pomodoro),
            "stopwatch" => Some(Self::Stopwatch),
            _ => None,
        }
    }
}

/// One segment of a pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(&self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Running,
    Paused,
}

impl TimerStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Running => Self::Paused,
            Self::Paused => Self::Running,
        }
    }
}

/// The single timer currently attached to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    pub task_id: String,
    #[serde(rename = "type")]
    pub timer_type: TimerType,
    /// Epoch milliseconds at which this timer was started.
    pub start_time: i64,
    /// Target length of the current phase in minutes. Zero for stopwatches.
    pub duration: u32,
    /// Seconds elapsed within the current phase.
    pub elapsed: u32,
    pub status: TimerStatus,
    pub phase: Phase,
    pub cycles_completed: u32,
}

impl ActiveTimer {
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    /// Returns true if elapsed time in the current phase counts as logged work.
    pub fn logs_work(&self) -> bool {
        self.timer_type == TimerType::Stopwatch || self.phase == Phase::Work
    }

    /// Target length of the current phase in seconds, if the timer counts down.
    pub fn target_secs(&self) -> Option<u32> {
        match self.timer_type {
            TimerType::Pomodoro => Some(self.duration.saturating_mul(60)),
            TimerType::Stopwatch => None,
        }
    }

    /// Seconds left in the current phase, if the timer counts down.
    pub fn remaining_secs(&self) -> Option<u32> {
        self.target_secs()
            .map(|target| target.saturating_sub(self.elapsed))
    }

    pub fn elapsed_minutes(&self) -> f64 {
        f64::from(self.elapsed) / 60.0
    }

    /// Returns the progress of the current phase (0.0 to 1.0), if it counts down.
    pub fn progress_percent(&self) -> Option<f32> {
        let target = self.target_secs()?;
        if target == 0 {
            return Some(1.0);
        }
        Some((self.elapsed as f32 / target as f32).min(1.0))
    }
}

/// User-configurable pomodoro lengths, all at least 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSettings {
    /// Length of a work phase in minutes.
    pub work_duration: u32,
    /// Length of a short break in minutes.
    pub short_break_duration: u32,
    /// Length of a long break in minutes.
    pub long_break_duration: u32,
    /// Number of completed work phases between long breaks.
    pub cycles_before_long_break: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            cycles_before_long_break: 4,
        }
    }
}

impl PomodoroSettings {
    /// Merges a partial update, coercing non-positive values to 1.
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(value) = update.work_duration {
            self.work_duration = at_least_one(value);
        }
        if let Some(value) = update.short_break_duration {
            self.short_break_duration = at_least_one(value);
        }
        if let Some(value) = update.long_break_duration {
            self.long_break_duration = at_least_one(value);
        }
        if let Some(value) = update.cycles_before_long_break {
            self.cycles_before_long_break = at_least_one(value);
        }
    }

    /// Returns the settings with any zero field raised to 1.
    pub fn coerced(self) -> Self {
        Self {
            work_duration: self.work_duration.max(1),
            short_break_duration: self.short_break_duration.max(1),
            long_break_duration: self.long_break_duration.max(1),
            cycles_before_long_break: self.cycles_before_long_break.max(1),
        }
    }

    /// Which break follows the work phase that brought the count to `cycles_completed`.
    pub fn break_after(&self, cycles_completed: u32) -> Phase {
        if cycles_completed % self.cycles_before_long_break.max(1) == 0 {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        }
    }

    pub fn duration_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_duration,
            Phase::ShortBreak => self.short_break_duration,
            Phase::LongBreak => self.long_break_duration,
        }
    }
}

fn at_least_one(value: i64) -> u32 {
    if value <= 0 {
        1
    } else {
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}

/// Partial settings update. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub work_duration: Option<i64>,
    pub short_break_duration: Option<i64>,
    pub long_break_duration: Option<i64>,
    pub cycles_before_long_break: Option<i64>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub enabled: bool,
    pub minutes_before: u32,
}

/// Pomodoro cycle counter kept on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroProgress {
    pub total_cycles: u32,
    pub completed_cycles: u32,
}

impl Default for PomodoroProgress {
    fn default() -> Self {
        Self {
            total_cycles: 4,
            completed_cycles: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Calendar days the task is scheduled on.
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Folder holding the task.
    pub list_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<Reminder>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Logged work in minutes.
    #[serde(default)]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pomodoro: Option<PomodoroProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<String>,
}

impl Task {
    /// Creates a todo task in the inbox.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            dates: Vec::new(),
            parent_id: None,
            list_id: INBOX_FOLDER_ID.to_string(),
            start_date: None,
            due_date: None,
            reminder: None,
            priority: Priority::Medium,
            tags: Vec::new(),
            duration: 0.0,
            pomodoro: None,
            color_theme: None,
        }
    }

    /// Merges the fields set in `update`.
    pub fn apply(&mut self, update: TaskUpdate) {
        let TaskUpdate {
            title,
            description,
            status,
            dates,
            parent_id,
            list_id,
            start_date,
            due_date,
            reminder,
            priority,
            tags,
            duration,
            pomodoro,
            color_theme,
        } = update;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(dates) = dates {
            self.dates = dates;
        }
        if let Some(parent_id) = parent_id {
            self.parent_id = parent_id;
        }
        if let Some(list_id) = list_id {
            self.list_id = list_id;
        }
        if let Some(start_date) = start_date {
            self.start_date = start_date;
        }
        if let Some(due_date) = due_date {
            self.due_date = due_date;
        }
        if let Some(reminder) = reminder {
            self.reminder = reminder;
        }
        if let Some(priority) = priority {
            self.priority = priority;
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        if let Some(duration) = duration {
            self.duration = duration;
        }
        if let Some(pomodoro) = pomodoro {
            self.pomodoro = pomodoro;
        }
        if let Some(color_theme) = color_theme {
            self.color_theme = color_theme;
        }
    }
}

/// Partial task edit. The outer `Option` says whether the field is touched;
/// for nullable fields the inner `Option` is the new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub dates: Option<Vec<NaiveDate>>,
    pub parent_id: Option<Option<String>>,
    pub list_id: Option<String>,
    pub start_date: Option<Option<NaiveDate>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub reminder: Option<Option<Reminder>>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub duration: Option<f64>,
    pub pomodoro: Option<Option<PomodoroProgress>>,
    pub color_theme: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_expanded: bool,
}

impl Folder {
    pub fn inbox() -> Self {
        Self {
            id: INBOX_FOLDER_ID.to_string(),
            name: "Inbox".to_string(),
            parent_id: None,
            color: None,
            icon: Some("inbox".to_string()),
            is_expanded: false,
        }
    }

    pub fn apply(&mut self, update: FolderUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(parent_id) = update.parent_id {
            self.parent_id = parent_id;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(icon) = update.icon {
            self.icon = icon;
        }
        if let Some(is_expanded) = update.is_expanded {
            self.is_expanded = is_expanded;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderUpdate {
    pub name: Option<String>,
    pub parent_id: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub is_expanded: Option<bool>,
}

/// Immutable record of one finalized interval of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub task_id: String,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds.
    pub end_time: i64,
    /// Credited minutes.
    pub duration: f64,
    #[serde(rename = "type")]
    pub timer_type: TimerType,
}

/// Minutes of finalized work per local calendar day.
pub type DailyActivity = BTreeMap<NaiveDate, f64>;
