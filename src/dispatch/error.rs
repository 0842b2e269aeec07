//! Dispatch Error Types
//!
//! Every failure a command handler can hit, with its user-visible reply.
//! User mistakes (unknown codes, validation) log at warn; infrastructure
//! failures log at error. Neither ever surfaces internals over SMS.

use thiserror::Error;

use crate::clients::ClientError;
use crate::sms::Reply;
use crate::store::StoreError;

/// Dispatcher error taxonomy
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    // === User-visible failures ===
    #[error("Sender has no wallet")]
    NotRegistered,

    #[error("Unknown or already-used code")]
    UnknownCode,

    #[error("{0}")]
    Validation(String),

    // === Infrastructure ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Wallet service error: {0}")]
    Wallet(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Short code for logs
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::NotRegistered => "NOT_REGISTERED",
            DispatchError::UnknownCode => "UNKNOWN_CODE",
            DispatchError::Validation(_) => "VALIDATION",
            DispatchError::Database(_) => "DATABASE_ERROR",
            DispatchError::Wallet(_) => "WALLET_ERROR",
            DispatchError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures caused by the sender, not the service
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DispatchError::NotRegistered
                | DispatchError::UnknownCode
                | DispatchError::Validation(_)
        )
    }

    /// The SMS reply this failure turns into
    pub fn reply(&self) -> Reply {
        match self {
            DispatchError::NotRegistered => Reply::NotRegistered,
            DispatchError::UnknownCode => Reply::UnknownCode,
            DispatchError::Validation(message) => Reply::Invalid {
                message: message.clone(),
            },
            DispatchError::Database(_) | DispatchError::Wallet(_) | DispatchError::Internal(_) => {
                Reply::Failure
            }
        }
    }
}

impl From<StoreError> for DispatchError {
    fn from(e: StoreError) -> Self {
        DispatchError::Database(e.to_string())
    }
}

/// Only wallet calls propagate collaborator errors; name registration is
/// best-effort and SMS delivery happens after dispatch.
impl From<ClientError> for DispatchError {
    fn from(e: ClientError) -> Self {
        DispatchError::Wallet(e.to_string())
    }
}
