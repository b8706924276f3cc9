//! Per-student task lists.
//!
//! Trainers assign exercises and students add their own practice items. A
//! student's list is kept as one JSON document in a [`KeyValueStore`] under
//! [`TASKS_KEY`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::KeyValueStore;

/// Key under which a user's task list is stored.
pub const TASKS_KEY: &str = "tasks";

/// Which tab of the student page a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Assigned exercises.
    Exercise,
    /// Self-directed practice.
    Practice,
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exercise => write!(f, "exercise"),
            Self::Practice => write!(f, "practice"),
        }
    }
}

/// A single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, unique within the owning list.
    pub id: u32,
    /// What to do.
    pub name: String,
    /// Which tab the task is shown on.
    pub category: TaskCategory,
    /// Whether the student ticked it off.
    pub completed: bool,
    /// When the task was added.
    pub created_at: DateTime<Utc>,
}

/// A student's tasks across all categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a user's list, or an empty one if nothing is stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the stored document is corrupt.
    pub fn load(store: &impl KeyValueStore, user_id: &str) -> Result<Self> {
        match store.get_value(user_id, TASKS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Self::new()),
        }
    }

    /// Persist the list for a user, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn save(&self, store: &impl KeyValueStore, user_id: &str) -> Result<()> {
        let json = serde_json::to_string(self)?;
        store.put_value(user_id, TASKS_KEY, &json)?;
        debug!("Saved {} tasks for {}", self.tasks.len(), user_id);
        Ok(())
    }

    /// Add a task and return it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is blank.
    pub fn add(&mut self, category: TaskCategory, name: &str) -> Result<&Task> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("task name is required"));
        }

        let id = self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.tasks.push(Task {
            id,
            name: name.to_string(),
            category,
            completed: false,
            created_at: Utc::now(),
        });
        let idx = self.tasks.len() - 1;
        Ok(&self.tasks[idx])
    }

    /// Flip a task's completion flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if no task has the given id.
    pub fn toggle(&mut self, id: u32) -> Result<bool> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::invalid_input(format!("no task with id {id}")))?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    /// Remove a task. Returns `true` if it existed.
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Get a task by id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// All tasks, in insertion order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks in one category, in insertion order.
    pub fn by_category(&self, category: TaskCategory) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.category == category)
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Fraction of tasks completed, from 0.0 to 1.0. An empty list is 0.0.
    #[must_use]
    pub fn completion_ratio(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        let done = self.tasks.iter().filter(|t| t.completed).count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = done as f64 / self.tasks.len() as f64;
        ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut list = TaskList::new();
        let first = list.add(TaskCategory::Exercise, "Warm-up").unwrap().id;
        let second = list.add(TaskCategory::Practice, "Dribbling").unwrap().id;
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let mut list = TaskList::new();
        list.add(TaskCategory::Exercise, "A").unwrap();
        list.add(TaskCategory::Exercise, "B").unwrap();
        assert!(list.remove(1));
        let id = list.add(TaskCategory::Exercise, "C").unwrap().id;
        assert_eq!(id, 3);
    }

    #[test]
    fn test_add_trims_and_rejects_blank() {
        let mut list = TaskList::new();
        assert_eq!(
            list.add(TaskCategory::Exercise, "  Shooting ").unwrap().name,
            "Shooting"
        );
        assert!(list.add(TaskCategory::Exercise, "   ").unwrap_err().is_invalid_input());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_toggle() {
        let mut list = TaskList::new();
        list.add(TaskCategory::Exercise, "Passing").unwrap();
        assert!(list.toggle(1).unwrap());
        assert!(!list.toggle(1).unwrap());
        assert!(list.toggle(99).is_err());
    }

    #[test]
    fn test_by_category() {
        let mut list = TaskList::new();
        list.add(TaskCategory::Exercise, "Warm-up").unwrap();
        list.add(TaskCategory::Practice, "Juggling").unwrap();
        list.add(TaskCategory::Exercise, "Cool down").unwrap();

        let names: Vec<&str> = list
            .by_category(TaskCategory::Exercise)
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["Warm-up", "Cool down"]);
    }

    #[test]
    fn test_completion_ratio() {
        let mut list = TaskList::new();
        assert_eq!(list.completion_ratio(), 0.0);
        list.add(TaskCategory::Exercise, "A").unwrap();
        list.add(TaskCategory::Exercise, "B").unwrap();
        list.toggle(2).unwrap();
        assert!((list.completion_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_is_empty() {
        let storage = Storage::open_in_memory().unwrap();
        let list = TaskList::load(&storage, "s1").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_save_and_load_per_user() {
        let storage = Storage::open_in_memory().unwrap();

        let mut list = TaskList::new();
        list.add(TaskCategory::Exercise, "Sprints").unwrap();
        list.toggle(1).unwrap();
        list.save(&storage, "s1").unwrap();

        let loaded = TaskList::load(&storage, "s1").unwrap();
        assert_eq!(loaded, list);
        assert!(loaded.get(1).unwrap().completed);

        assert!(TaskList::load(&storage, "s2").unwrap().is_empty());
    }

    #[test]
    fn test_load_corrupt_document() {
        let storage = Storage::open_in_memory().unwrap();
        storage.put_value("s1", TASKS_KEY, "{not json").unwrap();
        let err = TaskList::load(&storage, "s1").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(TaskCategory::Exercise.to_string(), "exercise");
        assert_eq!(TaskCategory::Practice.to_string(), "practice");
    }
}
