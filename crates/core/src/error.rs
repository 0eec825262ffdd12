use crate::types::Units;

/// Domain-level errors for the reservation core.
///
/// Every failure the service can report to a caller is one of these
/// variants; nothing is swallowed. Business-rule failures are terminal for
/// a request; only [`CoreError::Busy`] indicates transient contention.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Project id already exists: {0}")]
    DuplicateId(String),

    #[error("Hardware kind already exists in project {project_id}: {kind}")]
    DuplicateKind { project_id: String, kind: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{identity} is not a member of project {project_id}")]
    NotAMember {
        project_id: String,
        identity: String,
    },

    #[error("{identity} is already a member of project {project_id}")]
    AlreadyMember {
        project_id: String,
        identity: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Amount must be a positive number of units")]
    InvalidAmount,

    #[error("Not enough {kind} available: requested {requested}, available {available}")]
    InsufficientCapacity {
        kind: String,
        requested: Units,
        available: Units,
    },

    #[error("Cannot release {requested} units of {kind}: holder has {held}")]
    OverRelease {
        kind: String,
        requested: Units,
        held: Units,
    },

    #[error("Resource busy: {0}")]
    Busy(String),
}

impl CoreError {
    /// Whether a bounded automatic retry is permissible for this error.
    ///
    /// Only lock-contention timeouts qualify; every business-rule failure
    /// must be surfaced to the caller as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Busy(_))
    }
}
