/// Project ids are opaque caller-chosen strings, unique across the registry.
pub type ProjectId = String;

/// Users are identified by an already-authenticated username.
pub type Identity = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Hardware unit counts (capacities, holdings, amounts).
pub type Units = u64;
