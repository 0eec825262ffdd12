//! Stateful reservation core for the shared-lab hardware tracker.
//!
//! Components, leaves first:
//!
//! - [`ProjectRegistry`]: projects, owners, members, id uniqueness.
//! - [`HardwarePool`]: per-project hardware kinds with fixed capacities.
//! - [`ReservationLedger`]: active holdings; the single source of truth
//!   for how much of each kind is committed.
//! - [`ReservationService`]: the façade that enforces membership and
//!   capacity invariants atomically for every request.
//!
//! Only the service mutates state on behalf of callers; the leaf
//! components expose narrow operations so invariant enforcement stays in
//! one place.

pub mod keyed_lock;
pub mod ledger;
pub mod pool;
pub mod registry;
pub mod service;

pub use keyed_lock::KeyedLock;
pub use ledger::{PoolKey, ReservationLedger};
pub use pool::HardwarePool;
pub use registry::ProjectRegistry;
pub use service::{ReservationService, ServiceConfig};
