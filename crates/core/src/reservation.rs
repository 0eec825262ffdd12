//! Active reservation records.

use serde::Serialize;
use uuid::Uuid;

use crate::types::{Identity, ProjectId, Timestamp, Units};

/// A committed checkout: `holder` holds `amount` units of `kind_name`
/// in `project_id`, pending check-in.
///
/// There is at most one active reservation per (project, kind, holder)
/// triple; a repeat checkout accumulates onto the existing record and a
/// full release removes it.
#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub id: Uuid,
    pub project_id: ProjectId,
    pub kind_name: String,
    pub holder: Identity,
    pub amount: Units,
    pub created_at: Timestamp,
}

impl Reservation {
    /// Open a new reservation for a first-time checkout.
    pub fn open(
        project_id: ProjectId,
        kind_name: String,
        holder: Identity,
        amount: Units,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            kind_name,
            holder,
            amount,
            created_at: chrono::Utc::now(),
        }
    }
}

/// One holder's position against one hardware kind, as reported by
/// `HeldBy` queries.
#[derive(Debug, Clone, Serialize)]
pub struct Holding {
    pub kind_name: String,
    pub amount: Units,
}
