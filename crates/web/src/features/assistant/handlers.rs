use assistant::{Answer, rules::RULE_SECTIONS};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::AppState;
use crate::error::WebError;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RuleEntry {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AskRequest {
    #[validate(length(max = 1000, message = "Question must be at most 1000 characters"))]
    pub question: String,
}

#[utoipa::path(
    get,
    path = "/api/rules",
    responses(
        (status = 200, description = "Plain-language restatement of the scoring rules", body = Vec<RuleEntry>)
    ),
    tag = "scoring"
)]
pub async fn get_rules() -> Json<Vec<RuleEntry>> {
    Json(
        RULE_SECTIONS
            .iter()
            .map(|section| RuleEntry {
                title: section.title.to_string(),
                body: section.body.to_string(),
            })
            .collect(),
    )
}

/// Answers are informative only; the scoring engine never reads them.
#[utoipa::path(
    post,
    path = "/api/assistant/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer from the model or the rules lookup", body = Answer),
        (status = 400, description = "Empty or overlong question"),
        (status = 503, description = "Assistant unavailable")
    ),
    tag = "assistant"
)]
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Answer>, WebError> {
    req.validate()?;

    let answer = state.assistant.answer(&req.question).await?;

    Ok(Json(answer))
}
