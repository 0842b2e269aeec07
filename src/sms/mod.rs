//! Inbound SMS protocol
//!
//! Everything between the raw webhook text and the dispatcher lives here:
//! the command grammar, the parsed [`Command`] type, and the outbound
//! [`Reply`] catalog with its template renderer.

pub mod command;
pub mod composer;
pub mod parser;
pub mod reply;

pub use command::{Action, Command};
pub use composer::compose;
pub use parser::{WebhookMessage, WebhookPayload, is_sms_event, normalize_phone, parse_message};
pub use reply::Reply;
