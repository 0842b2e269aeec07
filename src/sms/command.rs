//! Parsed SMS command types

use rust_decimal::Decimal;

/// Substituted when REGISTER arrives without a username argument
pub const FALLBACK_USERNAME: &str = "Unknown username";

/// An inbound SMS after parsing.
///
/// Every message maps to exactly one `Command`; text that matches no verb
/// (or breaks a verb's shape) carries [`Action::Unknown`] instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Sender phone number, normalized to a leading `+`
    pub phone: String,
    /// Original message text (trimmed)
    pub raw: String,
    pub action: Action,
}

/// The verb and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Help,
    Register {
        username: String,
    },
    Send {
        amount: Decimal,
        token: String,
        recipient: String,
    },
    /// Nominate two cosigners by phone number
    Nominate {
        first: String,
        second: String,
    },
    /// ACCEPT (accept = true) or DENY a nomination code
    NominationResponse {
        code: String,
        accept: bool,
    },
    /// APPROVE (approve = true) or REJECT an approval code
    ApprovalResponse {
        code: String,
        approve: bool,
    },
    Request {
        amount: Decimal,
        token: String,
        target: String,
    },
    Pay {
        code: String,
    },
    Unknown,
}

impl Action {
    /// Verb name for logging
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Help => "HELP",
            Action::Register { .. } => "REGISTER",
            Action::Send { .. } => "SEND",
            Action::Nominate { .. } => "NOMINATE",
            Action::NominationResponse { accept: true, .. } => "ACCEPT",
            Action::NominationResponse { accept: false, .. } => "DENY",
            Action::ApprovalResponse { approve: true, .. } => "APPROVE",
            Action::ApprovalResponse { approve: false, .. } => "REJECT",
            Action::Request { .. } => "REQUEST",
            Action::Pay { .. } => "PAY",
            Action::Unknown => "UNKNOWN",
        }
    }
}
