use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod hub;

pub use hub::EventHub;

pub fn router() -> Router<AppState> {
    handlers::event_routes()
}
