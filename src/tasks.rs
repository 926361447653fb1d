//! Task and folder collection.

use crate::models::{Folder, FolderUpdate, Task, TaskUpdate, INBOX_FOLDER_ID};
use chrono::NaiveDate;

/// Owned collection of tasks and the folders they live in.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskBook {
    tasks: Vec<Task>,
    folders: Vec<Folder>,
}

impl Default for TaskBook {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            folders: vec![Folder::inbox()],
        }
    }
}

impl TaskBook {
    /// Builds a book from stored rows, making sure the inbox exists.
    pub fn from_parts(tasks: Vec<Task>, mut folders: Vec<Folder>) -> Self {
        if !folders.iter().any(|f| f.id == INBOX_FOLDER_ID) {
            folders.insert(0, Folder::inbox());
        }
        Self { tasks, folders }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn folder(&self, folder_id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == folder_id)
    }

    /// Adds a task. A task with the same id is replaced in place and returned.
    pub fn add_task(&mut self, task: Task) -> Option<Task> {
        match self.get_mut(&task.id) {
            Some(existing) => Some(std::mem::replace(existing, task)),
            None => {
                self.tasks.push(task);
                None
            }
        }
    }

    /// Applies a partial edit. When the task ends up with both a start and
    /// due date in order, every day of that range is merged into `dates`.
    /// Returns false if the task does not exist.
    pub fn update_task(&mut self, task_id: &str, update: TaskUpdate) -> bool {
        let Some(task) = self.get_mut(task_id) else {
            return false;
        };
        task.apply(update);

        if let (Some(start), Some(due)) = (task.start_date, task.due_date) {
            if start <= due {
                let mut dates = task.dates.clone();
                dates.extend(start.iter_days().take_while(|d| *d <= due));
                dates.sort();
                dates.dedup();
                task.dates = dates;
            }
        }
        true
    }

    /// Removes a task. Sessions that reference it are left alone.
    pub fn delete_task(&mut self, task_id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == task_id)?;
        Some(self.tasks.remove(index))
    }

    /// Schedules a task on a day. Returns true if the task changed.
    pub fn assign_to_date(&mut self, task_id: &str, date: NaiveDate) -> bool {
        match self.get_mut(task_id) {
            Some(task) if !task.dates.contains(&date) => {
                task.dates.push(date);
                true
            }
            _ => false,
        }
    }

    /// Unschedules a task from a day. Returns true if the task changed.
    pub fn remove_from_date(&mut self, task_id: &str, date: NaiveDate) -> bool {
        let Some(task) = self.get_mut(task_id) else {
            return false;
        };
        let before = task.dates.len();
        task.dates.retain(|d| *d != date);
        task.dates.len() != before
    }

    pub fn add_folder(&mut self, folder: Folder) {
        self.folders.push(folder);
    }

    pub fn update_folder(&mut self, folder_id: &str, update: FolderUpdate) -> bool {
        match self.folders.iter_mut().find(|f| f.id == folder_id) {
            Some(folder) => {
                folder.apply(update);
                true
            }
            None => false,
        }
    }

    /// Deletes a folder and moves its tasks into the inbox.
    /// Returns the ids of the moved tasks, or `None` if nothing was deleted.
    pub fn delete_folder(&mut self, folder_id: &str) -> Option<Vec<String>> {
        if folder_id == INBOX_FOLDER_ID {
            log::warn!("Ignoring request to delete the inbox folder");
            return None;
        }
        let index = self.folders.iter().position(|f| f.id == folder_id)?;
        self.folders.remove(index);

        let mut moved = Vec::new();
        for task in self.tasks.iter_mut().filter(|t| t.list_id == folder_id) {
            task.list_id = INBOX_FOLDER_ID.to_string();
            moved.push(task.id.clone());
        }
        Some(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book_with(ids: &[&str]) -> TaskBook {
        let mut book = TaskBook::default();
        for id in ids {
            book.add_task(Task::new(*id, format!("Task {id}")));
        }
        book
    }

    #[test]
    fn test_default_has_inbox() {
        let book = TaskBook::default();
        assert!(book.tasks().is_empty());
        assert_eq!(book.folders().len(), 1);
        assert!(book.folder(INBOX_FOLDER_ID).is_some());
    }

    #[test]
    fn test_from_parts_restores_missing_inbox() {
        let work = Folder {
            id: "work".to_string(),
            name: "Work".to_string(),
            parent_id: None,
            color: None,
            icon: None,
            is_expanded: true,
        };
        let book = TaskBook::from_parts(Vec::new(), vec![work]);
        assert_eq!(book.folders()[0].id, INBOX_FOLDER_ID);
        assert_eq!(book.folders().len(), 2);
    }

    #[test]
    fn test_add_task_with_existing_id_replaces_in_place() {
        let mut book = book_with(&["1", "2"]);
        book.get_mut("1").unwrap().duration = 5.0;

        let previous = book.add_task(Task::new("1", "Replacement"));

        assert_eq!(previous.unwrap().duration, 5.0);
        assert_eq!(book.tasks().len(), 2);
        assert_eq!(book.tasks()[0].id, "1");
        assert_eq!(book.tasks()[0].title, "Replacement");
        assert_eq!(book.tasks()[0].duration, 0.0);
        assert!(book.add_task(Task::new("3", "New")).is_none());
        assert_eq!(book.tasks().len(), 3);
    }

    #[test]
    fn test_assign_to_date_is_idempotent() {
        let mut book = book_with(&["1"]);
        assert!(book.assign_to_date("1", date(2024, 3, 1)));
        assert!(!book.assign_to_date("1", date(2024, 3, 1)));
        assert_eq!(book.get("1").unwrap().dates, vec![date(2024, 3, 1)]);

        assert!(!book.assign_to_date("missing", date(2024, 3, 1)));
    }

    #[test]
    fn test_remove_from_date() {
        let mut book = book_with(&["1"]);
        book.assign_to_date("1", date(2024, 3, 1));
        book.assign_to_date("1", date(2024, 3, 2));

        assert!(book.remove_from_date("1", date(2024, 3, 1)));
        assert!(!book.remove_from_date("1", date(2024, 3, 1)));
        assert_eq!(book.get("1").unwrap().dates, vec![date(2024, 3, 2)]);
    }

    #[test]
    fn test_update_task_unions_date_range() {
        let mut book = book_with(&["1"]);
        book.assign_to_date("1", date(2024, 3, 10));
        book.assign_to_date("1", date(2024, 3, 2));

        let changed = book.update_task(
            "1",
            TaskUpdate {
                start_date: Some(Some(date(2024, 3, 1))),
                due_date: Some(Some(date(2024, 3, 3))),
                ..TaskUpdate::default()
            },
        );
        assert!(changed);
        assert_eq!(
            book.get("1").unwrap().dates,
            vec![
                date(2024, 3, 1),
                date(2024, 3, 2),
                date(2024, 3, 3),
                date(2024, 3, 10)
            ]
        );
    }

    #[test]
    fn test_update_task_inverted_range_leaves_dates() {
        let mut book = book_with(&["1"]);
        book.update_task(
            "1",
            TaskUpdate {
                start_date: Some(Some(date(2024, 3, 5))),
                due_date: Some(Some(date(2024, 3, 1))),
                ..TaskUpdate::default()
            },
        );
        assert!(book.get("1").unwrap().dates.is_empty());
    }

    #[test]
    fn test_update_missing_task_is_noop() {
        let mut book = book_with(&["1"]);
        let before = book.clone();
        assert!(!book.update_task("nope", TaskUpdate::default()));
        assert_eq!(book, before);
    }

    #[test]
    fn test_delete_task() {
        let mut book = book_with(&["1", "2"]);
        let removed = book.delete_task("1").unwrap();
        assert_eq!(removed.id, "1");
        assert!(book.get("1").is_none());
        assert!(book.delete_task("1").is_none());
        assert_eq!(book.tasks().len(), 1);
    }

    #[test]
    fn test_delete_folder_moves_tasks_to_inbox() {
        let mut book = book_with(&["1", "2"]);
        book.add_folder(Folder {
            id: "work".to_string(),
            name: "Work".to_string(),
            parent_id: None,
            color: Some("blue".to_string()),
            icon: None,
            is_expanded: false,
        });
        book.update_task(
            "1",
            TaskUpdate {
                list_id: Some("work".to_string()),
                ..TaskUpdate::default()
            },
        );

        let moved = book.delete_folder("work").unwrap();
        assert_eq!(moved, vec!["1".to_string()]);
        assert!(book.folder("work").is_none());
        assert_eq!(book.get("1").unwrap().list_id, INBOX_FOLDER_ID);
    }

    #[test]
    fn test_inbox_cannot_be_deleted() {
        let mut book = TaskBook::default();
        assert!(book.delete_folder(INBOX_FOLDER_ID).is_none());
        assert!(book.folder(INBOX_FOLDER_ID).is_some());
    }

    #[test]
    fn test_update_folder() {
        let mut book = TaskBook::default();
        assert!(book.update_folder(
            INBOX_FOLDER_ID,
            FolderUpdate {
                is_expanded: Some(true),
                ..FolderUpdate::default()
            }
        ));
        assert!(book.folder(INBOX_FOLDER_ID).unwrap().is_expanded);
        assert!(!book.update_folder("missing", FolderUpdate::default()));
    }
}
