//! Inbound SMS webhook handler

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::notify;
use crate::sms::{WebhookPayload, compose, is_sms_event, parse_message};

use super::super::state::AppState;
use super::super::types::ApiResponse;

/// Webhook acknowledgement
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    /// Whether the message produced a reply to the sender
    #[schema(example = true)]
    pub processed: bool,
}

/// Inbound SMS webhook
///
/// One POST per message received by the SMS gateway. The reply to the
/// sender goes out inline; notifications to other parties are queued for
/// the notify service.
///
/// Always answers 200: the gateway redelivers on 5xx, and a redelivered
/// command could consume a second code or double-send funds.
#[utoipa::path(
    post,
    path = "/sms-webhook",
    request_body = WebhookPayload,
    responses(
        (status = 200, description = "Message handled (processed=false when ignored)", body = WebhookAck)
    ),
    tag = "Webhook"
)]
pub async fn sms_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WebhookPayload>,
) -> Json<ApiResponse<WebhookAck>> {
    // 1. Only phone-received events carry a command
    if !is_sms_event(&payload) {
        debug!(event = %payload.event_type, "Ignoring non-SMS webhook event");
        return Json(ApiResponse::success(WebhookAck { processed: false }));
    }

    // 2. Parse and dispatch
    let command = parse_message(&payload.data.content, &payload.data.contact);
    info!(phone = %command.phone, verb = command.action.verb(), "Inbound SMS");

    let outcome = state.dispatcher.dispatch(&command).await;

    // 3. Direct reply inline; a failed send still ACKs
    let processed = match &outcome.reply {
        Some(reply) => {
            let content = compose(reply);
            if let Err(e) = state.sms.send(&command.phone, &content).await {
                warn!(phone = %command.phone, "Reply send failed: {}", e);
            }
            true
        }
        None => false,
    };

    // 4. Fan out third-party notifications through the queue
    for notification in outcome.notifications {
        notify::enqueue(&state.notify_queue, notification);
    }

    Json(ApiResponse::success(WebhookAck { processed }))
}
