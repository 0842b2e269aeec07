//! SMS command grammar
//!
//! Total parser: any input yields exactly one [`Command`]. A recognized verb
//! with a broken shape degrades to [`Action::Unknown`] rather than erroring,
//! so a typo costs the user one reply, never a dropped message.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use super::command::{Action, Command, FALLBACK_USERNAME};

/// Gateway event type carrying an inbound SMS
pub const SMS_RECEIVED_EVENT: &str = "message.phone.received";

/// Joined amount and token symbol, e.g. "10USDC" or "0.5EURC"
static AMOUNT_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+\.?\d*)([A-Za-z]+)$").expect("Failed to compile amount regex"));

/// Inbound webhook body from the SMS gateway
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    #[schema(example = "message.phone.received")]
    pub event_type: String,
    pub data: WebhookMessage,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WebhookMessage {
    /// Message text
    #[schema(example = "SEND 10USDC +15551230002")]
    pub content: String,
    /// Sender phone number
    #[schema(example = "+15551230001")]
    pub contact: String,
}

/// Whether this webhook event carries an SMS we should parse
pub fn is_sms_event(payload: &WebhookPayload) -> bool {
    payload.event_type == SMS_RECEIVED_EVENT
}

/// Normalize a phone number to a leading `+`
pub fn normalize_phone(phone: &str) -> String {
    let phone = phone.trim();
    if phone.starts_with('+') {
        phone.to_string()
    } else {
        format!("+{}", phone)
    }
}

/// Parse one SMS into a [`Command`]. Never fails.
pub fn parse_message(content: &str, phone: &str) -> Command {
    let raw = content.trim();
    let phone = normalize_phone(phone);
    let parts: Vec<&str> = raw.split_whitespace().collect();

    let action = match parts.first() {
        None => Action::Unknown,
        Some(verb) => match verb.to_ascii_uppercase().as_str() {
            "HELP" => Action::Help,
            "REGISTER" => Action::Register {
                username: parts
                    .get(1)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| FALLBACK_USERNAME.to_string()),
            },
            "SEND" => parse_transfer_args(&parts)
                .map(|(amount, token, recipient)| Action::Send {
                    amount,
                    token,
                    recipient,
                })
                .unwrap_or(Action::Unknown),
            "NOMINATE" => parse_nominate(&parts).unwrap_or(Action::Unknown),
            "ACCEPT" => parse_exact_code(&parts)
                .map(|code| Action::NominationResponse { code, accept: true })
                .unwrap_or(Action::Unknown),
            "DENY" => parse_exact_code(&parts)
                .map(|code| Action::NominationResponse {
                    code,
                    accept: false,
                })
                .unwrap_or(Action::Unknown),
            "APPROVE" => parse_exact_code(&parts)
                .map(|code| Action::ApprovalResponse {
                    code,
                    approve: true,
                })
                .unwrap_or(Action::Unknown),
            "REJECT" => parse_exact_code(&parts)
                .map(|code| Action::ApprovalResponse {
                    code,
                    approve: false,
                })
                .unwrap_or(Action::Unknown),
            "REQUEST" => parse_transfer_args(&parts)
                .map(|(amount, token, target)| Action::Request {
                    amount,
                    token,
                    target,
                })
                .unwrap_or(Action::Unknown),
            "PAY" => match parts.get(1) {
                Some(code) => Action::Pay {
                    code: code.to_string(),
                },
                None => Action::Unknown,
            },
            _ => Action::Unknown,
        },
    };

    Command {
        phone,
        raw: raw.to_string(),
        action,
    }
}

/// Shared shape of SEND and REQUEST: `<verb> <amount><token> <party>`
fn parse_transfer_args(parts: &[&str]) -> Option<(Decimal, String, String)> {
    if parts.len() < 3 {
        return None;
    }
    let (amount, token) = parse_amount_token(parts[1])?;
    Some((amount, token, parts[2].to_string()))
}

/// `NOMINATE <phone1> <phone2>`, exactly two nominees
fn parse_nominate(parts: &[&str]) -> Option<Action> {
    if parts.len() != 3 {
        return None;
    }
    Some(Action::Nominate {
        first: parts[1].to_string(),
        second: parts[2].to_string(),
    })
}

/// `<verb> <code>` with nothing else on the line
fn parse_exact_code(parts: &[&str]) -> Option<String> {
    if parts.len() != 2 {
        return None;
    }
    Some(parts[1].to_string())
}

/// Split "10USDC" into a positive amount and an uppercased token symbol
fn parse_amount_token(s: &str) -> Option<(Decimal, String)> {
    let caps = AMOUNT_TOKEN_RE.captures(s)?;
    let amount: Decimal = caps[1].parse().ok()?;
    if amount <= Decimal::ZERO {
        return None;
    }
    Some((amount, caps[2].to_ascii_uppercase()))
}
