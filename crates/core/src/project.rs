//! Project entity and membership relation.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::{Identity, ProjectId, Timestamp};

/// A project: an owner, a member set, and an opaque unique id.
///
/// The owner is always a member; `members` is the canonical membership
/// relation and the single-owner form is just the one-element case.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub owner: Identity,
    pub members: BTreeSet<Identity>,
    pub created_at: Timestamp,
}

impl Project {
    /// Create a project with the owner as its sole initial member.
    ///
    /// Inputs are assumed to be already validated (see
    /// [`crate::validation`]); this constructor does not trim or reject.
    pub fn new(id: ProjectId, name: String, owner: Identity) -> Self {
        let mut members = BTreeSet::new();
        members.insert(owner.clone());
        Self {
            id,
            name,
            owner,
            members,
            created_at: chrono::Utc::now(),
        }
    }

    /// Whether `identity` may reserve this project's hardware.
    pub fn is_member(&self, identity: &str) -> bool {
        self.owner == identity || self.members.contains(identity)
    }
}
