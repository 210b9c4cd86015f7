use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "responsabilidade")]
    Responsibility,
    #[serde(alias = "lazer")]
    Leisure,
    #[serde(alias = "criacao")]
    Creation,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Responsibility,
        Category::Leisure,
        Category::Creation,
    ];

    /// Resolves a stored key, including the names written by older versions of the page.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "responsibility" | "responsabilidade" => Some(Category::Responsibility),
            "leisure" | "lazer" => Some(Category::Leisure),
            "creation" | "criacao" => Some(Category::Creation),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Responsibility => "Responsibility",
            Category::Leisure => "Leisure",
            Category::Creation => "Creation",
        }
    }
}

/// Membership of a task in every known category. Always carries one entry per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryFlags(BTreeMap<Category, bool>);

impl CategoryFlags {
    pub fn with(categories: &[Category]) -> Self {
        let mut flags = Self::default();
        for category in categories {
            flags.set(*category, true);
        }
        flags
    }

    pub fn get(&self, category: Category) -> bool {
        self.0.get(&category).copied().unwrap_or(false)
    }

    pub fn set(&mut self, category: Category, value: bool) {
        self.0.insert(category, value);
    }
}

impl Default for CategoryFlags {
    fn default() -> Self {
        Self(Category::ALL.iter().map(|category| (*category, false)).collect())
    }
}

impl<'de> Deserialize<'de> for CategoryFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = lenient_category_map::<D, bool>(deserializer)?;
        let mut flags = Self::default();
        for (category, value) in stored {
            flags.set(category, value);
        }
        Ok(flags)
    }
}

/// Reads a category-keyed map, skipping keys that name no known category.
fn lenient_category_map<'de, D, V>(deserializer: D) -> Result<BTreeMap<Category, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw = BTreeMap::<String, V>::deserialize(deserializer)?;
    let mut map = BTreeMap::new();
    for (key, value) in raw {
        match Category::from_key(&key) {
            Some(category) => {
                map.insert(category, value);
            }
            None => warn!("skipping unknown category key {key:?}"),
        }
    }
    Ok(map)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub text: String,
    pub completed: bool,
    #[serde(rename = "date")]
    pub created_at: String,
    #[serde(
        rename = "completionDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<String>,
    #[serde(rename = "types", default)]
    pub categories: CategoryFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: String,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub completion_percentage: f64,
    #[serde(
        alias = "typePercentages",
        default,
        deserialize_with = "lenient_category_map"
    )]
    pub category_percentages: BTreeMap<Category, f64>,
}

/// Input box and category checkboxes for the next task.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Draft {
    pub text: String,
    pub categories: CategoryFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditSession {
    pub task_id: u64,
    pub buffer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: Category,
    pub label: &'static str,
    pub completed_count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub completion_percentage: f64,
    pub categories: Vec<CategoryStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryCategoryRow {
    pub category: Category,
    pub label: &'static str,
    /// Frozen at snapshot time.
    pub percentage: f64,
    /// Recomputed against the current task list, not the snapshot.
    pub live_completed_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub date: String,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub completion_percentage: f64,
    pub categories: Vec<HistoryCategoryRow>,
}

#[derive(Debug, Serialize)]
pub struct ViewState {
    pub now: String,
    pub tasks: Vec<Task>,
    pub stats: TaskStats,
    pub draft: Draft,
    pub editing: Option<EditSession>,
    pub history: Vec<HistoryRow>,
    pub persistence_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClockResponse {
    pub now: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddTaskRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub categories: Option<CategoryFlags>,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub value: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub category: Category,
    pub value: bool,
}

#[derive(Debug, Deserialize)]
pub struct EditTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveHistoryRequest {
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_category_keys_are_accepted() {
        let flags: CategoryFlags =
            serde_json::from_str(r#"{"responsabilidade":true,"lazer":false,"criacao":true}"#)
                .unwrap();
        assert!(flags.get(Category::Responsibility));
        assert!(!flags.get(Category::Leisure));
        assert!(flags.get(Category::Creation));
    }

    #[test]
    fn unknown_category_keys_are_skipped() {
        let flags: CategoryFlags =
            serde_json::from_str(r#"{"leisure":true,"gardening":true}"#).unwrap();
        assert!(flags.get(Category::Leisure));
        assert_eq!(flags, CategoryFlags::with(&[Category::Leisure]));
    }

    #[test]
    fn task_uses_stored_record_keys() {
        let task = Task {
            id: 1735689600000,
            text: "Buy milk".into(),
            completed: false,
            created_at: "01/01/2025 09:00".into(),
            completed_at: None,
            categories: CategoryFlags::with(&[Category::Leisure]),
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["date"], "01/01/2025 09:00");
        assert_eq!(value["types"]["leisure"], true);
        assert_eq!(value["types"]["creation"], false);
        assert!(value.get("completionDate").is_none());
    }

    #[test]
    fn history_entry_reads_legacy_percentages_key() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"date":"01/01/2025","completedTasks":1,"totalTasks":2,"completionPercentage":50,"typePercentages":{"lazer":100}}"#,
        )
        .unwrap();
        assert_eq!(entry.completed_tasks, 1);
        assert_eq!(entry.total_tasks, 2);
        assert_eq!(entry.category_percentages.get(&Category::Leisure), Some(&100.0));
    }
}
