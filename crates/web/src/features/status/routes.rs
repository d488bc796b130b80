use axum::{Router, routing::get};

use super::handlers::get_status;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_status))
}
