// HTTP tests over a local-only store and the offline rules assistant.

use std::sync::Arc;

use assistant::RulesAssistant;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use futures::StreamExt;
use serde_json::{Value, json};
use storage::repository::SyncedStore;
use tower::ServiceExt; // for oneshot
use web::{AppState, create_router, middleware::auth::ApiKeys};

const JUDGE_KEY: &str = "judge-key";

fn create_test_app() -> Router {
    let store = Arc::new(SyncedStore::local_only(None));
    let state = AppState::new(store, RulesAssistant::offline());
    create_router(state, ApiKeys::from_comma_separated(JUDGE_KEY))
}

async fn json_response(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&body).expect("Failed to parse JSON")
}

fn judge(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", JUDGE_KEY));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn public(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn create_championship(app: &Router, name: &str) -> String {
    let response = app
        .clone()
        .oneshot(judge("POST", "/api/championships", Some(json!({ "name": name }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_response(response).await;
    body["championship_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_status_reports_local_only() {
    let app = create_test_app();

    let response = app.oneshot(public("GET", "/api/status", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    assert_eq!(body["state"], "local_only");
}

#[tokio::test]
async fn test_judge_routes_require_key() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(public("GET", "/api/championships", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/championships")
                .header(header::AUTHORIZATION, "Bearer wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_list_championships() {
    let app = create_test_app();
    let id = create_championship(&app, "Spring Cup").await;

    let response = app
        .clone()
        .oneshot(judge("GET", "/api/championships", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    let championships = body.as_array().unwrap();
    assert_eq!(championships.len(), 1);
    assert_eq!(championships[0]["championship_id"], id.as_str());
    assert_eq!(championships[0]["is_public"], false);
}

#[tokio::test]
async fn test_create_rejects_empty_name() {
    let app = create_test_app();

    let response = app
        .oneshot(judge("POST", "/api/championships", Some(json!({ "name": "" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_response(response).await;
    assert_eq!(body["error"], "Validation failed");
}

#[tokio::test]
async fn test_unknown_championship_is_not_found() {
    let app = create_test_app();

    let response = app
        .oneshot(judge(
            "GET",
            "/api/championships/00000000-0000-0000-0000-000000000000",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_flight_entry_sanitises_numbers() {
    let app = create_test_app();
    let id = create_championship(&app, "Autumn Cup").await;

    let response = app
        .clone()
        .oneshot(judge(
            "POST",
            &format!("/api/championships/{}/flights", id),
            Some(json!({
                "falconer_name": "Marta",
                "falcon_name": "Rayo",
                "service_height_m": "150,5",
                "service_distance_m": 500,
                "flight_duration_secs": "abc",
                "dive_speed_kmh": -30,
                "capture": "no_capture"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_response(response).await;
    assert_eq!(body["flight"]["service_height_m"], 150.5);
    assert_eq!(body["flight"]["dive_speed_kmh"], 0.0);
    assert_eq!(body["breakdown"]["dive"], 0.0);
    assert_eq!(body["flight"]["total_points"], 15.05);
}

#[tokio::test]
async fn test_flight_update_and_delete() {
    let app = create_test_app();
    let id = create_championship(&app, "Cup").await;

    let response = app
        .clone()
        .oneshot(judge(
            "POST",
            &format!("/api/championships/{}/flights", id),
            Some(json!({
                "falconer_name": "Ana",
                "service_height_m": 100,
                "service_distance_m": 500
            })),
        ))
        .await
        .unwrap();
    let body = json_response(response).await;
    let flight_id = body["flight"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/championships/{}/flights/{}", id, flight_id);

    let response = app
        .clone()
        .oneshot(judge(
            "PUT",
            &uri,
            Some(json!({
                "falconer_name": "Ana",
                "service_height_m": 100,
                "service_distance_m": 500,
                "disqualifications": { "no_show": true }
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_response(response).await;
    assert_eq!(body["flight"]["total_points"], 0.0);
    assert_eq!(body["breakdown"]["disqualified"], true);

    let response = app.clone().oneshot(judge("DELETE", &uri, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(judge("DELETE", &uri, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_publishing_moves_the_leaderboard() {
    let app = create_test_app();
    let first = create_championship(&app, "First").await;
    let second = create_championship(&app, "Second").await;

    let response = app
        .clone()
        .oneshot(public("GET", "/api/leaderboard", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.clone()
        .oneshot(judge(
            "POST",
            &format!("/api/championships/{}/flights", first),
            Some(json!({
                "falconer_name": "Ana",
                "service_height_m": 200,
                "service_distance_m": 500
            })),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(judge("POST", &format!("/api/championships/{}/publish", first), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(public("GET", "/api/leaderboard", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_response(response).await;
    assert_eq!(body["championship"]["name"], "First");
    assert_eq!(body["entries"][0]["rank"], 1);
    assert_eq!(body["entries"][0]["total_points"], 20.0);

    app.clone()
        .oneshot(judge("POST", &format!("/api/championships/{}/publish", second), None))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(judge("GET", "/api/championships", None))
        .await
        .unwrap();
    let body = json_response(response).await;
    let public_names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["is_public"] == true)
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(public_names, vec!["Second"]);

    let response = app
        .clone()
        .oneshot(judge("POST", &format!("/api/championships/{}/unpublish", second), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(public("GET", "/api/leaderboard", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_leaderboard_events_start_with_snapshot() {
    let app = create_test_app();

    let response = app
        .oneshot(public("GET", "/api/leaderboard/events", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();
    let chunk = body.next().await.unwrap().unwrap();
    let text = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(text.contains("event: leaderboard"));
    assert!(text.contains("data: null"));
}

#[tokio::test]
async fn test_scoring_preview() {
    let app = create_test_app();

    let response = app
        .oneshot(public(
            "POST",
            "/api/scoring/preview",
            Some(json!({
                "service_height_m": 60,
                "flight_duration_secs": 60,
                "service_distance_m": 30,
                "dive_speed_kmh": 150
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_response(response).await;
    assert_eq!(body["climb_rate"], 60.0);
    assert_eq!(body["climb_rate_points"], 10.0);
    assert_eq!(body["service"], 15.0);
    assert_eq!(body["dive"], 5.0);
    assert_eq!(body["time_bonus"], 6.0);
    // 6 height + 15 service + 5 dive + 10 climb + 6 time
    assert_eq!(body["total"], 42.0);
}

#[tokio::test]
async fn test_export_returns_printable_sheet() {
    let app = create_test_app();
    let id = create_championship(&app, "Copa de Otoño").await;

    let response = app
        .oneshot(judge("GET", &format!("/api/championships/{}/export", id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"copa-de-otoo.html\""
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Copa de Otoño"));
}

#[tokio::test]
async fn test_rules_and_assistant() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(public("GET", "/api/rules", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_response(response).await;
    assert_eq!(body.as_array().unwrap().len(), 10);

    let response = app
        .clone()
        .oneshot(public(
            "POST",
            "/api/assistant/ask",
            Some(json!({ "question": "How many points for the time bonus?" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_response(response).await;
    assert_eq!(body["source"], "rules_lookup");

    let response = app
        .oneshot(public(
            "POST",
            "/api/assistant/ask",
            Some(json!({ "question": "   " })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
