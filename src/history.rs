use crate::models::{HistoryEntry, TaskStats};
use tracing::debug;

/// Daily completion snapshots, at most one per date key.
#[derive(Debug, Default)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        let mut ledger = Self::default();
        // Collapse duplicates a hand-edited or older record may carry; the last one wins.
        for entry in entries {
            ledger.upsert(entry);
        }
        ledger
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn save_snapshot(&mut self, date: &str, stats: &TaskStats) -> &HistoryEntry {
        let entry = HistoryEntry {
            date: date.to_string(),
            completed_tasks: stats.completed,
            total_tasks: stats.total,
            completion_percentage: stats.completion_percentage,
            category_percentages: stats
                .categories
                .iter()
                .map(|stat| (stat.category, stat.percentage))
                .collect(),
        };
        debug!(date, completed = stats.completed, total = stats.total, "saving snapshot");
        let index = self.upsert(entry);
        &self.entries[index]
    }

    pub fn remove_entry(&mut self, date: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.date != date);
        self.entries.len() != before
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    fn upsert(&mut self, entry: HistoryEntry) -> usize {
        match self.entries.iter().position(|existing| existing.date == entry.date) {
            Some(index) => {
                self.entries[index] = entry;
                index
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        }
    }
}
