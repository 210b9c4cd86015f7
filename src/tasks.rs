use crate::clock::{Clock, format_timestamp};
use crate::errors::EditError;
use crate::models::{Category, CategoryFlags, Draft, EditSession, Task};
use tracing::{debug, warn};

/// The task list together with the page's transient input state.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    draft: Draft,
    editing: Option<EditSession>,
    last_id: u64,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        let tasks: Vec<Task> = tasks.into_iter().map(normalize).collect();
        let last_id = tasks.iter().map(|task| task.id).max().unwrap_or(0);
        Self {
            tasks,
            last_id,
            ..Self::default()
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    pub fn set_draft_category(&mut self, category: Category, value: bool) {
        self.draft.categories.set(category, value);
    }

    pub fn add_from_draft(&mut self, clock: &dyn Clock) -> Option<u64> {
        let Draft { text, categories } = self.draft.clone();
        self.add(&text, categories, clock)
    }

    /// Appends a task unless `text` is blank. The draft is cleared on success.
    pub fn add(&mut self, text: &str, categories: CategoryFlags, clock: &dyn Clock) -> Option<u64> {
        if text.trim().is_empty() {
            return None;
        }

        let now = clock.now();
        let id = self.next_id(now.timestamp_millis());
        self.tasks.push(Task {
            id,
            text: text.to_string(),
            completed: false,
            created_at: format_timestamp(&now, false),
            completed_at: None,
            categories,
        });
        self.draft = Draft::default();
        debug!(id, "task added");
        Some(id)
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.is_editing(id) {
            self.editing = None;
        }
        self.tasks.len() != before
    }

    pub fn toggle(&mut self, id: u64, clock: &dyn Clock) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };

        task.completed = !task.completed;
        task.completed_at = if task.completed {
            Some(format_timestamp(&clock.now(), false))
        } else {
            None
        };
        let completed = task.completed;

        if completed && self.is_editing(id) {
            self.editing = None;
        }
        true
    }

    pub fn begin_edit(&mut self, id: u64) -> Result<(), EditError> {
        let task = self.get(id).ok_or(EditError::NotFound(id))?;
        if task.completed {
            return Err(EditError::Completed(id));
        }

        let buffer = task.text.clone();
        self.editing = Some(EditSession { task_id: id, buffer });
        Ok(())
    }

    pub fn update_edit(&mut self, text: impl Into<String>) -> bool {
        match self.editing.as_mut() {
            Some(session) => {
                session.buffer = text.into();
                true
            }
            None => false,
        }
    }

    /// Commits the edit buffer and leaves edit mode. A blank buffer leaves the text as it was.
    pub fn save_edit(&mut self, id: u64) -> Result<(), EditError> {
        let session = match self.editing.take() {
            Some(session) if session.task_id == id => session,
            other => {
                self.editing = other;
                return Err(EditError::NotEditing(id));
            }
        };

        if session.buffer.trim().is_empty() {
            warn!(id, "ignoring blank edit");
            return Ok(());
        }

        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(EditError::NotFound(id))?;
        task.text = session.buffer;
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn set_category(&mut self, id: u64, category: Category, value: bool) -> bool {
        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.categories.set(category, value);
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.tasks.clear();
        self.editing = None;
    }

    fn is_editing(&self, id: u64) -> bool {
        self.editing
            .as_ref()
            .is_some_and(|session| session.task_id == id)
    }

    /// Time-derived, strictly increasing even when two adds land in the same millisecond.
    /// Once a stored id sits at the top of the range, the first unused id is taken instead.
    fn next_id(&mut self, millis: i64) -> u64 {
        let candidate = u64::try_from(millis).unwrap_or(0);
        match self.last_id.checked_add(1) {
            Some(next) => {
                self.last_id = candidate.max(next);
                self.last_id
            }
            None => {
                warn!("task ids exhausted the id range, reusing a free id");
                self.first_free_id(candidate)
            }
        }
    }

    fn first_free_id(&self, from: u64) -> u64 {
        (from..=u64::MAX)
            .chain(0..from)
            .find(|id| self.get(*id).is_none())
            .unwrap_or(from)
    }
}

fn normalize(mut task: Task) -> Task {
    if !task.completed && task.completed_at.is_some() {
        task.completed_at = None;
    } else if task.completed && task.completed_at.is_none() {
        warn!(id = task.id, "completed task has no completion timestamp");
    }
    task
}
