//! Domain model for the shared-lab hardware tracker.
//!
//! Pure types, validation rules, and the domain error enum shared by the
//! ledger and API crates. This crate holds no state and performs no IO.

pub mod error;
pub mod hardware;
pub mod project;
pub mod reservation;
pub mod types;
pub mod validation;
