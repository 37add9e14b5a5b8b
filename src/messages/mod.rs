pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod views;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::message_routes()
}
