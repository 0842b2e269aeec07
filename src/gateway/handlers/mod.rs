//! Gateway HTTP handlers
//!
//! - [`webhook`]: the inbound SMS gate, one POST per received message
//! - [`health`]: liveness plus a rate-limited database ping
//! - [`mock`]: `mock-api` feature only, dry-run SMS injection for manual QA

pub mod health;
#[cfg(feature = "mock-api")]
pub mod mock;
pub mod webhook;

pub use health::{HealthResponse, health_check};
#[cfg(feature = "mock-api")]
pub use mock::mock_sms;
pub use webhook::{WebhookAck, sms_webhook};
