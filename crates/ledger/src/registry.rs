//! Project registry: ownership, membership, and id uniqueness.

use std::collections::HashMap;

use tokio::sync::RwLock;

use labtrack_core::error::CoreError;
use labtrack_core::project::Project;
use labtrack_core::types::ProjectId;

/// Owns every project record and the membership relation.
///
/// All mutations go through the map's write lock, so duplicate-id
/// detection and membership-set updates cannot race. Inputs are assumed
/// to be normalized by the service before they arrive here.
pub struct ProjectRegistry {
    projects: RwLock<HashMap<ProjectId, Project>>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new project with `owner` as its sole initial member.
    ///
    /// Creating with an existing id fails with `DuplicateId` and never
    /// overwrites the original record.
    pub async fn create(&self, owner: &str, id: &str, name: &str) -> Result<Project, CoreError> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(id) {
            return Err(CoreError::DuplicateId(id.to_string()));
        }

        let project = Project::new(id.to_string(), name.to_string(), owner.to_string());
        projects.insert(id.to_string(), project.clone());
        Ok(project)
    }

    /// Add `identity` to a project's member set.
    ///
    /// A repeat join fails with `AlreadyMember` rather than silently
    /// succeeding, so callers can tell the two outcomes apart.
    pub async fn join(&self, identity: &str, id: &str) -> Result<Project, CoreError> {
        let mut projects = self.projects.write().await;
        let project = projects.get_mut(id).ok_or(CoreError::NotFound {
            entity: "Project",
            id: id.to_string(),
        })?;

        if project.is_member(identity) {
            return Err(CoreError::AlreadyMember {
                project_id: id.to_string(),
                identity: identity.to_string(),
            });
        }

        project.members.insert(identity.to_string());
        Ok(project.clone())
    }

    /// Look up one project by id.
    pub async fn get(&self, id: &str) -> Option<Project> {
        self.projects.read().await.get(id).cloned()
    }

    /// Whether `identity` is a member (owner or joined) of the project.
    ///
    /// Unknown projects answer `false`; the service reports `NotFound`
    /// separately where it matters.
    pub async fn is_member(&self, project_id: &str, identity: &str) -> bool {
        self.projects
            .read()
            .await
            .get(project_id)
            .is_some_and(|p| p.is_member(identity))
    }

    /// All projects where `identity` is a member, sorted by id.
    pub async fn projects_for_member(&self, identity: &str) -> Vec<Project> {
        let projects = self.projects.read().await;
        let mut result: Vec<Project> = projects
            .values()
            .filter(|p| p.is_member(identity))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        result
    }

    /// Global listing for the discovery/join UI, sorted by id.
    pub async fn all(&self) -> Vec<Project> {
        let projects = self.projects.read().await;
        let mut result: Vec<Project> = projects.values().cloned().collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        result
    }
}

impl Default for ProjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}
