use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{
    championship_events, create_championship, delete_championship, export_championship,
    get_championship, list_championships, publish_championship, unpublish_championship,
    update_championship,
};
use crate::AppState;
use crate::middleware::auth::{ApiKeys, require_auth};

/// Every championship route is judge-only
pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/", get(list_championships).post(create_championship))
        .route(
            "/:id",
            get(get_championship)
                .put(update_championship)
                .delete(delete_championship),
        )
        .route("/:id/publish", post(publish_championship))
        .route("/:id/unpublish", post(unpublish_championship))
        .route("/:id/events", get(championship_events))
        .route("/:id/export", get(export_championship))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
