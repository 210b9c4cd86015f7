use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/state", get(handlers::get_state))
        .route("/api/clock", get(handlers::get_clock))
        .route("/api/draft", put(handlers::update_draft))
        .route("/api/tasks", post(handlers::add_task))
        .route("/api/tasks/reset", post(handlers::reset_tasks))
        .route("/api/tasks/:id", delete(handlers::remove_task))
        .route("/api/tasks/:id/toggle", post(handlers::toggle_task))
        .route("/api/tasks/:id/category", post(handlers::set_category))
        .route("/api/tasks/:id/edit", post(handlers::begin_edit))
        .route("/api/tasks/:id/save", post(handlers::save_edit))
        .route("/api/edit", put(handlers::update_edit))
        .route("/api/edit/cancel", post(handlers::cancel_edit))
        .route("/api/history/snapshot", post(handlers::save_snapshot))
        .route("/api/history/remove", post(handlers::remove_history_entry))
        .route("/api/history/reset", post(handlers::reset_history))
        .with_state(state)
}
