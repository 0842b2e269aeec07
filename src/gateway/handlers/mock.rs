//! Mock SMS injection handler (`mock-api` feature only)
//!
//! Runs the full parse/dispatch/compose pipeline for a hand-typed message
//! and returns what WOULD have been sent, without touching the SMS gateway.
//! State changes (users, codes, transfers) are real.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::sms::{compose, parse_message};

use super::super::state::AppState;
use super::super::types::{ApiResponse, error_codes};

/// Inject one inbound SMS
#[derive(Debug, Deserialize, ToSchema)]
pub struct MockSmsRequest {
    /// Message text as the user would type it
    #[schema(example = "REGISTER alice")]
    pub content: String,
    /// Sender phone number
    #[schema(example = "+15551230001")]
    pub from: String,
}

/// What the pipeline would have sent
#[derive(Debug, Serialize, ToSchema)]
pub struct MockSmsData {
    /// Composed reply to the sender, absent when suppressed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    /// Composed messages to other parties
    pub notifications: Vec<MockNotification>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MockNotification {
    pub to: String,
    pub content: String,
}

/// Dry-run SMS injection
///
/// Manual QA without an SMS provider: POST a message, read the composed
/// replies off the response. Goes through the real dispatcher, so wallets
/// and codes it creates persist.
#[utoipa::path(
    post,
    path = "/api/v1/mock/sms",
    request_body = MockSmsRequest,
    responses(
        (status = 200, description = "Pipeline output", body = MockSmsData),
        (status = 400, description = "Missing phone number")
    ),
    tag = "Mock"
)]
pub async fn mock_sms(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MockSmsRequest>,
) -> Result<Json<ApiResponse<MockSmsData>>, (StatusCode, Json<ApiResponse<()>>)> {
    if req.from.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(
                error_codes::INVALID_PARAMETER,
                "from must be a phone number",
            )),
        ));
    }

    let command = parse_message(&req.content, &req.from);
    info!(phone = %command.phone, verb = command.action.verb(), "Mock SMS injected");

    let outcome = state.dispatcher.dispatch(&command).await;

    Ok(Json(ApiResponse::success(MockSmsData {
        reply: outcome.reply.as_ref().map(compose),
        notifications: outcome
            .notifications
            .into_iter()
            .map(|n| MockNotification {
                to: n.to_phone,
                content: compose(&n.reply),
            })
            .collect(),
    })))
}
