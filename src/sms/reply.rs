//! Outbound reply catalog
//!
//! Everything the service can say, as data. Rendering to SMS text lives in
//! [`super::composer`]; the dispatcher builds these and never formats strings
//! itself. Party fields (`owner`, `requester`, ...) arrive pre-resolved to a
//! display name (registered name when present, else phone number).

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Help,
    /// New wallet created; `display` is the registered name or the address
    WalletCreated {
        display: String,
    },
    AlreadyRegistered {
        display: String,
    },
    NotRegistered,
    SendExecuted {
        amount: Decimal,
        token: String,
        recipient: String,
        tx_hash: String,
    },
    SendFailed {
        amount: Decimal,
        token: String,
        recipient: String,
    },
    SendPendingApproval {
        amount: Decimal,
        token: String,
        recipient: String,
    },
    /// Sent to each cosigner when a transfer needs their sign-off
    ApprovalRequest {
        owner: String,
        amount: Decimal,
        token: String,
        recipient: String,
        code: String,
    },
    ApprovalRecorded,
    RejectionRecorded,
    /// Sent to the transfer owner when the quorum completed and funds moved
    TransferApproved {
        amount: Decimal,
        token: String,
        recipient: String,
        tx_hash: String,
    },
    /// Sent to the transfer owner when a cosigner rejected
    TransferRejected {
        amount: Decimal,
        token: String,
        recipient: String,
    },
    NominationSent {
        first: String,
        second: String,
    },
    /// Sent to each nominee
    NominationRequest {
        nominator: String,
        code: String,
    },
    NominationAccepted {
        nominee: String,
    },
    NominationDenied {
        nominee: String,
    },
    NominationAnswerRecorded,
    RequestSent {
        amount: Decimal,
        token: String,
        target: String,
        code: String,
    },
    /// Sent to the party being asked to pay
    PaymentRequest {
        requester: String,
        amount: Decimal,
        token: String,
        code: String,
    },
    PaymentSent {
        amount: Decimal,
        token: String,
        tx_hash: String,
    },
    /// Sent to the requester once their request is paid
    PaymentReceived {
        payer: String,
        amount: Decimal,
        token: String,
        tx_hash: String,
    },
    PaymentFailed,
    /// Code missing, foreign, or already consumed; deliberately vague
    UnknownCode,
    /// Validation failure with a caller-supplied sentence
    Invalid {
        message: String,
    },
    /// Infrastructure trouble; tells the user nothing about internals
    Failure,
    Unrecognized,
}
