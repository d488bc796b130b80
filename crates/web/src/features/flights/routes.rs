use axum::{
    Router, middleware,
    routing::{post, put},
};

use super::handlers::{add_flight, delete_flight, update_flight};
use crate::AppState;
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/", post(add_flight))
        .route("/:flight_id", put(update_flight).delete(delete_flight))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
