use crate::models::{Category, CategoryStat, HistoryCategoryRow, HistoryEntry, HistoryRow, Task, TaskStats};

pub fn build_stats(tasks: &[Task]) -> TaskStats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.completed).count();

    let categories = Category::ALL
        .iter()
        .map(|category| {
            let count = completed_in_category(tasks, *category);
            CategoryStat {
                category: *category,
                label: category.label(),
                completed_count: count,
                percentage: percentage(count, completed),
            }
        })
        .collect();

    TaskStats {
        total,
        completed,
        incomplete: total - completed,
        completion_percentage: percentage(completed, total),
        categories,
    }
}

/// Aggregates come from the snapshot; per-category counts are taken from the live task list.
pub fn build_history_rows(history: &[HistoryEntry], tasks: &[Task]) -> Vec<HistoryRow> {
    history
        .iter()
        .map(|entry| HistoryRow {
            date: entry.date.clone(),
            completed_tasks: entry.completed_tasks,
            total_tasks: entry.total_tasks,
            completion_percentage: entry.completion_percentage,
            categories: entry
                .category_percentages
                .iter()
                .map(|(category, stored)| HistoryCategoryRow {
                    category: *category,
                    label: category.label(),
                    percentage: *stored,
                    live_completed_count: completed_in_category(tasks, *category),
                })
                .collect(),
        })
        .collect()
}

pub fn completed_in_category(tasks: &[Task], category: Category) -> usize {
    tasks
        .iter()
        .filter(|task| task.completed && task.categories.get(category))
        .count()
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}
