use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateSessionRequest, Navigation, SessionView, SubmitOrderResponse};
use super::engine::OrderError;
use super::model::ExtraId;
use super::registry::SessionEntry;
use crate::state::AppState;

type HandlerResult<T> = Result<T, (StatusCode, String)>;

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(discard_session))
        .route(
            "/sessions/:id/extras/:extra_id/increment",
            post(increment_extra),
        )
        .route(
            "/sessions/:id/extras/:extra_id/decrement",
            post(decrement_extra),
        )
        .route("/sessions/:id/quantity/increment", post(increment_quantity))
        .route("/sessions/:id/quantity/decrement", post(decrement_quantity))
        .route("/sessions/:id/favorite", post(toggle_favorite))
        .route("/sessions/:id/order", post(submit_order))
}

fn lookup(state: &AppState, id: Uuid) -> HandlerResult<SessionEntry> {
    state
        .sessions
        .get(id)
        .ok_or((StatusCode::NOT_FOUND, "Session not found".into()))
}

fn view(id: Uuid, entry: &SessionEntry) -> Json<SessionView> {
    Json(SessionView::new(id, entry.opened_at, entry.engine.snapshot()))
}

fn order_error(e: OrderError) -> (StatusCode, String) {
    let status = match &e {
        OrderError::Load { .. } | OrderError::FavoriteSync(_) | OrderError::OrderSubmission(_) => {
            StatusCode::BAD_GATEWAY
        }
        OrderError::ExtraNotFound(_) => StatusCode::NOT_FOUND,
        OrderError::TotalOverflow => StatusCode::UNPROCESSABLE_ENTITY,
        OrderError::InvalidState(_) => StatusCode::CONFLICT,
        OrderError::Discarded => StatusCode::GONE,
    };
    (status, e.to_string())
}

#[instrument(skip(state))]
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> HandlerResult<(StatusCode, Json<SessionView>)> {
    let (id, entry) = state.sessions.insert(state.new_engine());

    if let Err(e) = entry.engine.load(body.food_id).await {
        error!(error = %e, session_id = %id, food_id = %body.food_id, "session load failed");
        state.sessions.remove(id);
        return Err(order_error(e));
    }

    info!(session_id = %id, food_id = %body.food_id, "session opened");
    Ok((StatusCode::CREATED, view(id, &entry)))
}

#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Json<SessionView>> {
    let entry = lookup(&state, id)?;
    Ok(view(id, &entry))
}

#[instrument(skip(state))]
pub async fn increment_extra(
    State(state): State<AppState>,
    Path((id, extra_id)): Path<(Uuid, u64)>,
) -> HandlerResult<Json<SessionView>> {
    let entry = lookup(&state, id)?;
    entry
        .engine
        .increment_extra(ExtraId(extra_id))
        .map_err(order_error)?;
    Ok(view(id, &entry))
}

#[instrument(skip(state))]
pub async fn decrement_extra(
    State(state): State<AppState>,
    Path((id, extra_id)): Path<(Uuid, u64)>,
) -> HandlerResult<Json<SessionView>> {
    let entry = lookup(&state, id)?;
    entry
        .engine
        .decrement_extra(ExtraId(extra_id))
        .map_err(order_error)?;
    Ok(view(id, &entry))
}

#[instrument(skip(state))]
pub async fn increment_quantity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Json<SessionView>> {
    let entry = lookup(&state, id)?;
    entry
        .engine
        .increment_base_quantity()
        .map_err(order_error)?;
    Ok(view(id, &entry))
}

#[instrument(skip(state))]
pub async fn decrement_quantity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Json<SessionView>> {
    let entry = lookup(&state, id)?;
    entry
        .engine
        .decrement_base_quantity()
        .map_err(order_error)?;
    Ok(view(id, &entry))
}

#[instrument(skip(state))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Json<SessionView>> {
    let entry = lookup(&state, id)?;
    if let Err(e) = entry.engine.toggle_favorite().await {
        warn!(error = %e, session_id = %id, "toggle favorite failed");
        return Err(order_error(e));
    }
    Ok(view(id, &entry))
}

/// POST /sessions/:id/order. The session is finished once the order is
/// accepted and the client is told to go back.
#[instrument(skip(state))]
pub async fn submit_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Json<SubmitOrderResponse>> {
    let entry = lookup(&state, id)?;
    let order = entry.engine.submit_order().await.map_err(|e| {
        warn!(error = %e, session_id = %id, "submit order failed");
        order_error(e)
    })?;
    state.sessions.release(id);
    Ok(Json(SubmitOrderResponse {
        order,
        navigate: Navigation::Back,
    }))
}

#[instrument(skip(state))]
pub async fn discard_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    state
        .sessions
        .remove(id)
        .ok_or((StatusCode::NOT_FOUND, "Session not found".into()))?;
    info!(session_id = %id, "session discarded");
    Ok(StatusCode::NO_CONTENT)
}
