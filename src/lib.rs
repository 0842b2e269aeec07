//! CellFi - Stablecoin wallet you drive over SMS
//!
//! Registration, cosigned transfers, and payment requests from any feature
//! phone. The SMS gateway POSTs inbound messages to a webhook; everything
//! else follows from parsing those messages.
//!
//! # Modules
//!
//! - [`sms`] - Command grammar, webhook payload, and reply templates
//! - [`dispatch`] - Per-verb workflow logic (the core)
//! - [`store`] - Persistent workflow state (PostgreSQL + in-memory)
//! - [`clients`] - Wallet provider, name registry, and SMS gateway clients
//! - [`notify`] - Outbound notification fan-out
//! - [`gateway`] - HTTP surface (webhook, health, Swagger, mock injection)
//! - [`db`] - PostgreSQL pool management
//! - [`config`] - YAML configuration with per-env files
//! - [`logging`] - tracing setup with rolling file output

pub mod clients;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod gateway;
pub mod logging;
pub mod notify;
pub mod sms;
pub mod store;

// Convenient re-exports at crate root
pub use dispatch::{DispatchError, Dispatcher, Notification, Outcome};
pub use sms::{Action, Command, Reply, compose, normalize_phone, parse_message};
pub use store::{MemStore, PgStore, Store, StoreError};
