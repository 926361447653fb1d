//! SQLite persistence layer for tasks, folders, sessions, daily activity and settings.

use crate::models::{DailyActivity, Folder, PomodoroSettings, Session, Task, TimerType};
use chrono::NaiveDate;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "FLOWCAL_DB";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
    #[error("Corrupt {column} value in stored row: {value}")]
    CorruptRow { column: &'static str, value: String },
}

/// Everything the store holds, as last written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub folders: Vec<Folder>,
    pub sessions: Vec<Session>,
    pub daily_activity: DailyActivity,
    pub settings: PomodoroSettings,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the database at the default location, initializing tables if needed.
    pub fn new() -> Result<Self, DatabaseError> {
        Self::open(&Self::default_path())
    }

    /// Opens (or creates) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|_| DatabaseError::DirectoryCreation)?;
        }

        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;
        log::info!("Opened database at {}", path.display());

        Ok(Self { conn })
    }

    /// Creates an in-memory database.
    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS folders (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                task_id TEXT NOT NULL,
                start_time INTEGER NOT NULL,
                end_time INTEGER NOT NULL,
                duration REAL NOT NULL,
                type TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_activity (
                date TEXT PRIMARY KEY,
                minutes REAL NOT NULL DEFAULT 0
            );
        "#,
        )?;
        Ok(())
    }

    /// Resolves the database path from the environment or the platform data directory.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(DB_PATH_ENV) {
            return PathBuf::from(path);
        }
        ProjectDirs::from("com", "flowcal", "FlowCal")
            .map(|dirs| dirs.data_dir().join("flowcal.db"))
            .unwrap_or_else(|| PathBuf::from("flowcal.db"))
    }

    /// Loads everything needed to restore the planner at startup.
    pub fn load_snapshot(&self) -> Result<Snapshot, DatabaseError> {
        Ok(Snapshot {
            tasks: self.load_tasks()?,
            folders: self.load_folders()?,
            sessions: self.load_sessions()?,
            daily_activity: self.load_daily_activity()?,
            settings: self.load_settings()?,
        })
    }

    /// Loads settings from the database, returning defaults if not found.
    pub fn load_settings(&self) -> Result<PomodoroSettings, DatabaseError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = 'config'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(j) => Ok(serde_json::from_str::<PomodoroSettings>(&j)?.coerced()),
            None => Ok(PomodoroSettings::default()),
        }
    }

    /// Saves settings to the database.
    pub fn save_settings(&self, settings: &PomodoroSettings) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(settings)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES ('config', ?)",
            [&json],
        )?;
        Ok(())
    }

    pub fn load_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        self.load_json_rows("SELECT value FROM tasks ORDER BY position, id")
    }

    /// Inserts or replaces a task, keeping its original position.
    pub fn save_task(&self, task: &Task) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(task)?;
        self.conn.execute(
            "INSERT INTO tasks (id, position, value)
             VALUES (?1, (SELECT COALESCE(MAX(position), -1) + 1 FROM tasks), ?2)
             ON CONFLICT(id) DO UPDATE SET value = excluded.value",
            params![task.id, json],
        )?;
        Ok(())
    }

    pub fn delete_task(&self, task_id: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?", [task_id])?;
        Ok(())
    }

    pub fn load_folders(&self) -> Result<Vec<Folder>, DatabaseError> {
        self.load_json_rows("SELECT value FROM folders ORDER BY position, id")
    }

    pub fn save_folder(&self, folder: &Folder) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(folder)?;
        self.conn.execute(
            "INSERT INTO folders (id, position, value)
             VALUES (?1, (SELECT COALESCE(MAX(position), -1) + 1 FROM folders), ?2)
             ON CONFLICT(id) DO UPDATE SET value = excluded.value",
            params![folder.id, json],
        )?;
        Ok(())
    }

    pub fn delete_folder(&self, folder_id: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM folders WHERE id = ?", [folder_id])?;
        Ok(())
    }

    fn load_json_rows<T: serde::de::DeserializeOwned>(
        &self,
        sql: &str,
    ) -> Result<Vec<T>, DatabaseError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut items = Vec::new();
        for json in rows {
            items.push(serde_json::from_str(&json?)?);
        }
        Ok(items)
    }

    /// Appends a session. Sessions are never rewritten.
    pub fn insert_session(&self, session: &Session) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (id, task_id, start_time, end_time, duration, type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.task_id,
                session.start_time,
                session.end_time,
                session.duration,
                session.timer_type.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn load_sessions(&self) -> Result<Vec<Session>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, start_time, end_time, duration, type
             FROM sessions ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, task_id, start_time, end_time, duration, kind) = row?;
            let timer_type = TimerType::parse(&kind).ok_or(DatabaseError::CorruptRow {
                column: "type",
                value: kind.clone(),
            })?;
            sessions.push(Session {
                id,
                task_id,
                start_time,
                end_time,
                duration,
                timer_type,
            });
        }
        Ok(sessions)
    }

    /// Stores the total minutes for a day.
    pub fn save_daily_minutes(&self, date: NaiveDate, minutes: f64) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO daily_activity (date, minutes) VALUES (?, ?)",
            params![date.to_string(), minutes],
        )?;
        Ok(())
    }

    pub fn load_daily_activity(&self) -> Result<DailyActivity, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, minutes FROM daily_activity")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut activity = DailyActivity::new();
        for row in rows {
            let (date, minutes) = row?;
            let day = date
                .parse::<NaiveDate>()
                .map_err(|_| DatabaseError::CorruptRow {
                    column: "date",
                    value: date.clone(),
                })?;
            activity.insert(day, minutes);
        }
        Ok(activity)
    }
}
