use crate::errors::AppError;
use crate::models::{
    AddTaskRequest, CategoryRequest, ClockResponse, DraftRequest, EditTextRequest,
    RemoveHistoryRequest, ViewState,
};
use crate::state::{AppState, Session};
use crate::ui::render_index;
use std::sync::Arc;
use tracing::error;
use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let view = current_view(&state).await;
    Html(render_index(&view))
}

pub async fn get_state(State(state): State<AppState>) -> Json<ViewState> {
    Json(current_view(&state).await)
}

pub async fn get_clock(State(state): State<AppState>) -> Json<ClockResponse> {
    Json(ClockResponse { now: state.now() })
}

pub async fn update_draft(
    State(state): State<AppState>,
    Json(payload): Json<DraftRequest>,
) -> Result<Json<ViewState>, AppError> {
    let category = match (payload.category, payload.value) {
        (Some(category), Some(value)) => Some((category, value)),
        (None, None) => None,
        _ => return Err(AppError::bad_request("category and value must be sent together")),
    };

    apply(&state, move |session| {
        if let Some(text) = payload.text {
            session.set_draft_text(text);
        }
        if let Some((category, value)) = category {
            session.set_draft_category(category, value);
        }
        Ok(())
    })
    .await
}

pub async fn add_task(
    State(state): State<AppState>,
    Json(payload): Json<AddTaskRequest>,
) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        session.add(payload.text, payload.categories);
        Ok(())
    })
    .await
}

pub async fn reset_tasks(State(state): State<AppState>) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        session.reset_tasks();
        Ok(())
    })
    .await
}

pub async fn remove_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        session.remove(id);
        Ok(())
    })
    .await
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        session.toggle(id);
        Ok(())
    })
    .await
}

pub async fn set_category(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        session.set_category(id, payload.category, payload.value);
        Ok(())
    })
    .await
}

pub async fn begin_edit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| Ok(session.begin_edit(id)?)).await
}

pub async fn update_edit(
    State(state): State<AppState>,
    Json(payload): Json<EditTextRequest>,
) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        if session.update_edit(payload.text) {
            Ok(())
        } else {
            Err(AppError::conflict("no task is being edited"))
        }
    })
    .await
}

pub async fn save_edit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| Ok(session.save_edit(id)?)).await
}

pub async fn cancel_edit(State(state): State<AppState>) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        session.cancel_edit();
        Ok(())
    })
    .await
}

pub async fn save_snapshot(State(state): State<AppState>) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        session.save_snapshot();
        Ok(())
    })
    .await
}

pub async fn remove_history_entry(
    State(state): State<AppState>,
    Json(payload): Json<RemoveHistoryRequest>,
) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        session.remove_history_entry(&payload.date);
        Ok(())
    })
    .await
}

pub async fn reset_history(State(state): State<AppState>) -> Result<Json<ViewState>, AppError> {
    apply(&state, move |session| {
        session.reset_history();
        Ok(())
    })
    .await
}

/// Runs one action under the session lock and answers with the resulting view. The action
/// writes through the synchronous store, so it runs on the blocking pool.
async fn apply<F>(state: &AppState, action: F) -> Result<Json<ViewState>, AppError>
where
    F: FnOnce(&mut Session) -> Result<(), AppError> + Send + 'static,
{
    let mut session = Arc::clone(&state.session).lock_owned().await;
    let now = state.now();
    let view = tokio::task::spawn_blocking(move || {
        action(&mut *session)?;
        Ok::<_, AppError>(session.view(now))
    })
    .await
    .map_err(|err| {
        error!("session action did not complete: {err}");
        AppError::internal("request could not be completed")
    })??;
    Ok(Json(view))
}

async fn current_view(state: &AppState) -> ViewState {
    let session = state.session.lock().await;
    session.view(state.now())
}
