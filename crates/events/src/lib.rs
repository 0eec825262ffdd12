//! Labtrack event bus.
//!
//! In-process publish/subscribe hub for domain events emitted by the
//! reservation service:
//!
//! - [`EventBus`]: fan-out hub backed by `tokio::sync::broadcast`.
//! - [`DomainEvent`]: the canonical event envelope.
//! - [`EventLog`]: background subscriber that logs every event.

pub mod bus;
pub mod log;

pub use bus::{DomainEvent, EventBus};
pub use log::EventLog;
