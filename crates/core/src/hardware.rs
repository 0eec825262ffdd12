//! Hardware kind records and availability snapshots.

use serde::Serialize;

use crate::types::{ProjectId, Units};

/// A named hardware kind scoped to a project.
///
/// Capacity is fixed at introduction; administrative updates go through
/// the pool so a decrease below the committed total is rejected.
#[derive(Debug, Clone, Serialize)]
pub struct HardwareKind {
    pub project_id: ProjectId,
    pub name: String,
    pub capacity: Units,
}

/// Point-in-time availability for one hardware kind.
///
/// `available` is always derived as `capacity - committed` from the
/// reservation ledger; it is a snapshot, never an authoritative counter.
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub name: String,
    pub capacity: Units,
    pub available: Units,
}

impl Availability {
    /// Build a snapshot from a capacity and the ledger's committed total.
    ///
    /// `committed` can never exceed `capacity` under the ledger's
    /// invariants; saturate anyway so a snapshot is never nonsense.
    pub fn derive(name: impl Into<String>, capacity: Units, committed: Units) -> Self {
        Self {
            name: name.into(),
            capacity,
            available: capacity.saturating_sub(committed),
        }
    }
}
