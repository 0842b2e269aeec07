//! Command Dispatch
//!
//! Turns parsed commands into state changes and outbound messages.
//!
//! # Architecture
//!
//! Each inbound SMS becomes exactly one [`Outcome`]:
//! - **reply** - the message composed for the sender (or none)
//! - **notifications** - messages for other parties (nominees, approvers,
//!   transfer owners, payment requesters)
//!
//! The dispatcher owns the workflow rules; it talks to the store and the
//! wallet/name providers but never sends SMS itself. Delivery is the
//! notify service's job.
//!
//! # Safety Invariants
//!
//! 1. **Codes are single-use**: every code is consumed by a compare-and-set
//!    on the pending row, so concurrent submissions have exactly one winner
//! 2. **Winner settles**: whichever request flips a transaction out of
//!    pending executes the transfer (or records the rejection) and notifies
//!    the owner, alone
//! 3. **Errors stay inside**: `dispatch()` is infallible; failures become
//!    the matching failure reply and only the sender sees it

#[cfg(test)]
mod integration_tests;

pub mod code;
pub mod coordinator;
pub mod error;
pub mod types;

pub use coordinator::Dispatcher;
pub use error::DispatchError;
pub use types::{Notification, Outcome};
