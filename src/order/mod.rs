pub mod dto;
pub mod engine;
pub mod format;
pub mod handlers;
pub mod model;
pub mod registry;
pub mod session;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::session_routes())
}
