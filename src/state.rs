use crate::clock::{Clock, date_key};
use crate::errors::{EditError, StorageError};
use crate::history::HistoryLedger;
use crate::models::{Category, CategoryFlags, HistoryEntry, ViewState};
use crate::stats::{build_history_rows, build_stats};
use crate::storage::{HISTORY_KEY, KeyValueStore, TASKS_KEY, load_collection, save_collection};
use crate::tasks::TaskStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{error, info};

/// Task list and history ledger bound to the store they persist into.
pub struct Session {
    tasks: TaskStore,
    history: HistoryLedger,
    store: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    /// Last failed write per record, cleared only by a later successful write of that record.
    write_failures: BTreeMap<&'static str, String>,
}

impl Session {
    pub fn load(store: Box<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let tasks = TaskStore::new(load_collection(store.as_ref(), TASKS_KEY));
        let history = HistoryLedger::new(load_collection(store.as_ref(), HISTORY_KEY));
        info!(
            tasks = tasks.tasks().len(),
            history = history.entries().len(),
            "session loaded"
        );

        Self {
            tasks,
            history,
            store,
            clock,
            write_failures: BTreeMap::new(),
        }
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    /// Every record whose latest write failed, so memory and storage currently disagree.
    pub fn persistence_error(&self) -> Option<String> {
        if self.write_failures.is_empty() {
            return None;
        }
        let messages: Vec<&str> = self.write_failures.values().map(String::as_str).collect();
        Some(messages.join("; "))
    }

    pub fn view(&self, now: String) -> ViewState {
        let tasks = self.tasks.tasks();
        ViewState {
            now,
            tasks: tasks.to_vec(),
            stats: build_stats(tasks),
            draft: self.tasks.draft().clone(),
            editing: self.tasks.editing().cloned(),
            history: build_history_rows(self.history.entries(), tasks),
            persistence_error: self.persistence_error(),
        }
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.tasks.set_draft_text(text);
    }

    pub fn set_draft_category(&mut self, category: Category, value: bool) {
        self.tasks.set_draft_category(category, value);
    }

    /// Adds from the given fields, falling back to the draft for any that are missing.
    pub fn add(&mut self, text: Option<String>, categories: Option<CategoryFlags>) -> Option<u64> {
        let text = text.unwrap_or_else(|| self.tasks.draft().text.clone());
        let categories = categories.unwrap_or_else(|| self.tasks.draft().categories.clone());
        let id = self.tasks.add(&text, categories, self.clock.as_ref())?;
        self.persist_tasks();
        Some(id)
    }

    pub fn remove(&mut self, id: u64) {
        if self.tasks.remove(id) {
            self.persist_tasks();
        }
    }

    pub fn toggle(&mut self, id: u64) {
        if self.tasks.toggle(id, self.clock.as_ref()) {
            self.persist_tasks();
        }
    }

    pub fn set_category(&mut self, id: u64, category: Category, value: bool) {
        if self.tasks.set_category(id, category, value) {
            self.persist_tasks();
        }
    }

    pub fn begin_edit(&mut self, id: u64) -> Result<(), EditError> {
        self.tasks.begin_edit(id)
    }

    pub fn update_edit(&mut self, text: impl Into<String>) -> bool {
        self.tasks.update_edit(text)
    }

    pub fn save_edit(&mut self, id: u64) -> Result<(), EditError> {
        self.tasks.save_edit(id)?;
        self.persist_tasks();
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.tasks.cancel_edit();
    }

    pub fn reset_tasks(&mut self) {
        self.tasks.reset();
        self.persist_tasks();
    }

    pub fn save_snapshot(&mut self) -> HistoryEntry {
        let date = date_key(&self.clock.now());
        let stats = build_stats(self.tasks.tasks());
        let entry = self.history.save_snapshot(&date, &stats).clone();
        self.persist_history();
        entry
    }

    pub fn remove_history_entry(&mut self, date: &str) {
        if self.history.remove_entry(date) {
            self.persist_history();
        }
    }

    pub fn reset_history(&mut self) {
        self.history.reset();
        let result = self.store.remove(HISTORY_KEY);
        self.record_write(HISTORY_KEY, result);
    }

    fn persist_tasks(&mut self) {
        let result = save_collection(self.store.as_mut(), TASKS_KEY, self.tasks.tasks());
        self.record_write(TASKS_KEY, result);
    }

    fn persist_history(&mut self) {
        let result = save_collection(self.store.as_mut(), HISTORY_KEY, self.history.entries());
        self.record_write(HISTORY_KEY, result);
    }

    fn record_write(&mut self, key: &'static str, result: Result<(), StorageError>) {
        match result {
            Ok(()) => {
                if self.write_failures.remove(key).is_some() {
                    info!("record {key} written again after an earlier failure");
                }
            }
            Err(err) => {
                error!("failed to write record {key}: {err}");
                self.write_failures
                    .insert(key, format!("changes to {key} were not saved: {err}"));
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub clock_display: watch::Receiver<String>,
}

impl AppState {
    pub fn new(session: Session, clock_display: watch::Receiver<String>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            clock_display,
        }
    }

    pub fn now(&self) -> String {
        self.clock_display.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::Task;
    use crate::storage::MemoryStore;
    use chrono::{FixedOffset, TimeZone};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            FixedOffset::west_opt(3 * 3600)
                .unwrap()
                .with_ymd_and_hms(2025, 1, 1, 18, 45, 0)
                .unwrap(),
        ))
    }

    fn session_with(store: MemoryStore) -> Session {
        Session::load(Box::new(store), clock())
    }

    fn stored_tasks(session: &Session) -> Vec<Task> {
        load_collection(session.store.as_ref(), TASKS_KEY)
    }

    fn stored_history(session: &Session) -> Vec<HistoryEntry> {
        load_collection(session.store.as_ref(), HISTORY_KEY)
    }

    #[test]
    fn buy_milk_scenario() {
        let mut session = session_with(MemoryStore::new());
        let id = session
            .add(
                Some("Buy milk".into()),
                Some(CategoryFlags::with(&[Category::Leisure])),
            )
            .unwrap();

        let view = session.view(String::new());
        assert_eq!(view.stats.total, 1);
        assert_eq!(view.stats.completed, 0);
        assert_eq!(view.stats.completion_percentage, 0.0);

        session.toggle(id);
        let view = session.view(String::new());
        assert_eq!(view.stats.completed, 1);
        assert_eq!(view.stats.completion_percentage, 100.0);
        let leisure = view
            .stats
            .categories
            .iter()
            .find(|stat| stat.category == Category::Leisure)
            .unwrap();
        assert_eq!(leisure.completed_count, 1);
        assert_eq!(leisure.percentage, 100.0);

        let entry = session.save_snapshot();
        assert_eq!(entry.date, "01/01/2025");
        assert_eq!(session.history().entries().len(), 1);
        assert_eq!(entry.completed_tasks, 1);
        assert_eq!(entry.total_tasks, 1);
        assert_eq!(entry.completion_percentage, 100.0);

        session.remove(id);
        let view = session.view(String::new());
        let row = &view.history[0];
        assert_eq!(row.completed_tasks, 1);
        let leisure_row = row
            .categories
            .iter()
            .find(|category| category.category == Category::Leisure)
            .unwrap();
        assert_eq!(leisure_row.percentage, 100.0);
        assert_eq!(leisure_row.live_completed_count, 0);
    }

    #[test]
    fn every_mutation_is_persisted() {
        let mut session = session_with(MemoryStore::new());
        let id = session.add(Some("Water plants".into()), None).unwrap();
        assert_eq!(stored_tasks(&session).len(), 1);

        session.toggle(id);
        assert!(stored_tasks(&session)[0].completed);

        session.set_category(id, Category::Responsibility, true);
        assert!(stored_tasks(&session)[0].categories.get(Category::Responsibility));

        session.save_snapshot();
        assert_eq!(stored_history(&session).len(), 1);

        session.remove(id);
        assert!(stored_tasks(&session).is_empty());
        assert_eq!(stored_history(&session).len(), 1);
    }

    #[test]
    fn edits_are_persisted_on_save() {
        let mut session = session_with(MemoryStore::new());
        let id = session.add(Some("old".into()), None).unwrap();
        session.begin_edit(id).unwrap();
        session.update_edit("new");
        assert_eq!(stored_tasks(&session)[0].text, "old");

        session.save_edit(id).unwrap();
        assert_eq!(stored_tasks(&session)[0].text, "new");
    }

    #[test]
    fn add_falls_back_to_draft() {
        let mut session = session_with(MemoryStore::new());
        session.set_draft_text("Paint");
        session.set_draft_category(Category::Creation, true);

        let id = session.add(None, None).unwrap();
        let task = session.tasks().get(id).unwrap();
        assert_eq!(task.text, "Paint");
        assert!(task.categories.get(Category::Creation));
        assert!(session.tasks().draft().text.is_empty());
    }

    #[test]
    fn state_survives_reload() {
        let mut session = session_with(MemoryStore::new());
        session.add(Some("a".into()), None);
        session.save_snapshot();

        let store = std::mem::replace(&mut session.store, Box::new(MemoryStore::new()));
        let reloaded = Session::load(store, clock());
        assert_eq!(reloaded.tasks().tasks(), session.tasks().tasks());
        assert_eq!(reloaded.history().entries(), session.history().entries());
    }

    #[test]
    fn malformed_records_fall_back_to_empty() {
        let store = MemoryStore::new()
            .with_record(TASKS_KEY, "[{\"id\": \"oops\"}]")
            .with_record(HISTORY_KEY, "not json at all");
        let session = session_with(store);
        assert!(session.tasks().tasks().is_empty());
        assert!(session.history().entries().is_empty());
    }

    #[test]
    fn write_failures_are_reported_not_fatal() {
        let mut store = MemoryStore::new();
        store.fail_writes(true);
        let mut session = session_with(store);

        let id = session.add(Some("kept in memory".into()), None);
        assert!(id.is_some());
        assert_eq!(session.tasks().tasks().len(), 1);
        let message = session.persistence_error().unwrap();
        assert!(message.contains("quota exceeded"));
        assert!(session.view(String::new()).persistence_error.is_some());
    }

    #[test]
    fn failed_task_write_stays_reported_after_other_records_save() {
        let mut store = MemoryStore::new();
        store.fail_writes_to(TASKS_KEY);
        let mut session = session_with(store);

        session.add(Some("unsaved".into()), None);
        session.save_snapshot();

        assert!(stored_tasks(&session).is_empty());
        assert_eq!(stored_history(&session).len(), 1);
        assert_eq!(session.tasks().tasks().len(), 1);
        let message = session.persistence_error().unwrap();
        assert!(message.contains(TASKS_KEY), "{message}");
        assert!(!message.contains(HISTORY_KEY), "{message}");

        let id = session.tasks().tasks()[0].id;
        session.store = Box::new(MemoryStore::new());
        session.toggle(id);
        assert_eq!(stored_tasks(&session).len(), 1);
        assert_eq!(session.persistence_error(), None);
    }

    #[test]
    fn reset_history_clears_record() {
        let mut session = session_with(MemoryStore::new());
        session.save_snapshot();
        session.reset_history();

        assert!(session.history().entries().is_empty());
        assert!(session.store.load(HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn reset_tasks_keeps_history() {
        let mut session = session_with(MemoryStore::new());
        session.add(Some("a".into()), None);
        session.save_snapshot();
        session.reset_tasks();

        assert!(stored_tasks(&session).is_empty());
        assert_eq!(session.history().entries()[0].total_tasks, 1);
    }

    #[test]
    fn remove_history_entry_persists() {
        let mut session = session_with(MemoryStore::new());
        session.save_snapshot();
        session.remove_history_entry("01/01/2025");
        assert!(stored_history(&session).is_empty());
    }
}
