use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{ask, get_rules};
use crate::AppState;

/// Mounted at the root: the rules and the assistant live under different prefixes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/rules", get(get_rules))
        .route("/api/assistant/ask", post(ask))
}
