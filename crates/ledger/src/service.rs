//! The reservation service: the only surface callers mutate state through.
//!
//! Every operation runs its checks read-before-write: membership and
//! existence gates first (no mutation, so a later failure needs no
//! rollback), then the ledger commit inside the key's critical section.
//! Business-rule failures are terminal; only `Busy` gets one bounded
//! retry here, since it signals transient contention rather than a logic
//! violation.

use std::sync::Arc;
use std::time::Duration;

use labtrack_core::error::CoreError;
use labtrack_core::hardware::{Availability, HardwareKind};
use labtrack_core::project::Project;
use labtrack_core::reservation::{Holding, Reservation};
use labtrack_core::types::{ProjectId, Units};
use labtrack_core::validation::{
    normalize_display_name, normalize_identifier, normalize_identity, validate_amount,
};
use labtrack_events::{DomainEvent, EventBus};

use crate::ledger::ReservationLedger;
use crate::pool::HardwarePool;
use crate::registry::ProjectRegistry;

/// How long to back off before the single retry of a `Busy` failure.
const BUSY_RETRY_DELAY: Duration = Duration::from_millis(25);

/// Tunables and bootstrap data for the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bound on waiting for a (project, kind) critical section.
    pub lock_wait: Duration,
    /// Kinds seeded into every newly created project, as (name, capacity).
    pub default_kinds: Vec<(String, Units)>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            lock_wait: Duration::from_secs(2),
            default_kinds: vec![("HWSet1".to_string(), 100), ("HWSet2".to_string(), 100)],
        }
    }
}

/// Façade over registry, pool, and ledger.
///
/// Owns all three components; nothing else mutates them.
pub struct ReservationService {
    registry: ProjectRegistry,
    pool: HardwarePool,
    ledger: ReservationLedger,
    events: Arc<EventBus>,
    config: ServiceConfig,
}

impl ReservationService {
    pub fn new(config: ServiceConfig, events: Arc<EventBus>) -> Self {
        Self {
            registry: ProjectRegistry::new(),
            pool: HardwarePool::new(),
            ledger: ReservationLedger::new(config.lock_wait),
            events,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Create a project and seed it with the configured default kinds.
    pub async fn create_project(
        &self,
        identity: &str,
        project_id: &str,
        project_name: &str,
    ) -> Result<Project, CoreError> {
        let owner = normalize_identity(identity)?;
        let id = normalize_identifier(project_id, "project_id")?;
        let name = normalize_display_name(project_name, "project_name")?;

        let project = self.registry.create(&owner, &id, &name).await?;

        for (kind, capacity) in &self.config.default_kinds {
            self.pool.define_kind(&id, kind, *capacity).await?;
        }

        tracing::info!(project_id = %id, owner = %owner, "project created");
        self.events.publish(
            DomainEvent::new("project.created")
                .with_source("project", id)
                .with_actor(owner),
        );

        Ok(project)
    }

    /// Join an existing project.
    ///
    /// A repeat join fails with `AlreadyMember`; the member set ends up
    /// containing the identity exactly once either way.
    pub async fn join_project(
        &self,
        identity: &str,
        project_id: &str,
    ) -> Result<Project, CoreError> {
        let identity = normalize_identity(identity)?;
        let id = normalize_identifier(project_id, "project_id")?;

        let project = self.registry.join(&identity, &id).await?;

        tracing::info!(project_id = %id, identity = %identity, "project joined");
        self.events.publish(
            DomainEvent::new("project.joined")
                .with_source("project", id)
                .with_actor(identity),
        );

        Ok(project)
    }

    /// All projects where `identity` is a member.
    pub async fn projects_for(&self, identity: &str) -> Result<Vec<Project>, CoreError> {
        let identity = normalize_identity(identity)?;
        Ok(self.registry.projects_for_member(&identity).await)
    }

    /// Global project listing.
    pub async fn all_projects(&self) -> Vec<Project> {
        self.registry.all().await
    }

    /// Look up one project by id.
    pub async fn project(&self, project_id: &str) -> Result<Project, CoreError> {
        let id = normalize_identifier(project_id, "project_id")?;
        self.registry.get(&id).await.ok_or(CoreError::NotFound {
            entity: "Project",
            id,
        })
    }

    // -----------------------------------------------------------------------
    // Hardware kinds
    // -----------------------------------------------------------------------

    /// Introduce a new hardware kind in a project (administrative).
    pub async fn define_kind(
        &self,
        project_id: &str,
        kind_name: &str,
        capacity: Units,
    ) -> Result<HardwareKind, CoreError> {
        let id = normalize_identifier(project_id, "project_id")?;
        let kind = normalize_identifier(kind_name, "kind_name")?;
        self.require_project(&id).await?;

        let record = self.pool.define_kind(&id, &kind, capacity).await?;

        tracing::info!(project_id = %id, kind = %kind, capacity, "hardware kind defined");
        self.events.publish(
            DomainEvent::new("hardware.kind_defined")
                .with_source("hardware_kind", kind)
                .with_payload(serde_json::json!({ "project_id": id, "capacity": capacity })),
        );

        Ok(record)
    }

    /// Administrative capacity update; never invalidates live reservations.
    pub async fn update_capacity(
        &self,
        project_id: &str,
        kind_name: &str,
        new_capacity: Units,
    ) -> Result<Availability, CoreError> {
        let id = normalize_identifier(project_id, "project_id")?;
        let kind = normalize_identifier(kind_name, "kind_name")?;
        self.require_project(&id).await?;

        let availability = self
            .pool
            .update_capacity(&self.ledger, &id, &kind, new_capacity)
            .await?;

        tracing::info!(project_id = %id, kind = %kind, new_capacity, "capacity updated");
        self.events.publish(
            DomainEvent::new("hardware.capacity_updated")
                .with_source("hardware_kind", kind)
                .with_payload(serde_json::json!({ "project_id": id, "capacity": new_capacity })),
        );

        Ok(availability)
    }

    /// Availability snapshots for every kind in one project.
    pub async fn list_hardware(&self, project_id: &str) -> Result<Vec<Availability>, CoreError> {
        let id = normalize_identifier(project_id, "project_id")?;
        self.require_project(&id).await?;
        Ok(self.pool.list_kinds(&self.ledger, &id).await)
    }

    /// Availability across all projects, for the unscoped discovery view.
    pub async fn hardware_overview(&self) -> Vec<(ProjectId, Vec<Availability>)> {
        let mut overview = Vec::new();
        for project_id in self.pool.projects_with_kinds().await {
            let kinds = self.pool.list_kinds(&self.ledger, &project_id).await;
            overview.push((project_id, kinds));
        }
        overview
    }

    // -----------------------------------------------------------------------
    // Checkout / check-in
    // -----------------------------------------------------------------------

    /// Check out `amount` units of a kind for the caller.
    ///
    /// Gate order: project exists, caller is a member, amount is positive;
    /// only then does the ledger commit inside the key's critical section.
    /// Returns the authoritative post-mutation availability snapshot.
    pub async fn checkout(
        &self,
        identity: &str,
        project_id: &str,
        kind_name: &str,
        amount: Units,
    ) -> Result<Availability, CoreError> {
        let holder = normalize_identity(identity)?;
        let id = normalize_identifier(project_id, "project_id")?;
        let kind = normalize_identifier(kind_name, "kind_name")?;
        validate_amount(amount)?;
        self.require_member(&id, &holder).await?;

        let (reservation, committed, capacity) = self
            .with_busy_retry(|| self.try_reserve(&id, &kind, &holder, amount))
            .await?;

        tracing::info!(
            project_id = %id,
            kind = %kind,
            holder = %holder,
            amount,
            "hardware checked out"
        );
        self.events.publish(
            DomainEvent::new("hardware.checked_out")
                .with_source("reservation", reservation.id.to_string())
                .with_actor(holder)
                .with_payload(serde_json::json!({
                    "project_id": id,
                    "kind": kind.clone(),
                    "amount": amount,
                })),
        );

        Ok(Availability::derive(kind, capacity, committed))
    }

    /// Check in `amount` units previously checked out by the caller.
    ///
    /// A caller can only release their own holdings; releasing more than
    /// held fails with `OverRelease` and changes nothing.
    pub async fn checkin(
        &self,
        identity: &str,
        project_id: &str,
        kind_name: &str,
        amount: Units,
    ) -> Result<Availability, CoreError> {
        let holder = normalize_identity(identity)?;
        let id = normalize_identifier(project_id, "project_id")?;
        let kind = normalize_identifier(kind_name, "kind_name")?;
        validate_amount(amount)?;
        self.require_member(&id, &holder).await?;

        let (committed, capacity) = self
            .with_busy_retry(|| self.try_release(&id, &kind, &holder, amount))
            .await?;

        tracing::info!(
            project_id = %id,
            kind = %kind,
            holder = %holder,
            amount,
            "hardware checked in"
        );
        self.events.publish(
            DomainEvent::new("hardware.checked_in")
                .with_source("hardware_kind", kind.clone())
                .with_actor(holder)
                .with_payload(serde_json::json!({
                    "project_id": id,
                    "kind": kind.clone(),
                    "amount": amount,
                })),
        );

        Ok(Availability::derive(kind, capacity, committed))
    }

    /// The caller's own active holdings within one project.
    pub async fn holdings(
        &self,
        identity: &str,
        project_id: &str,
    ) -> Result<Vec<Holding>, CoreError> {
        let holder = normalize_identity(identity)?;
        let id = normalize_identifier(project_id, "project_id")?;
        self.require_member(&id, &holder).await?;
        Ok(self.ledger.held_by(&id, &holder).await)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Fail with `NotFound` unless the project exists.
    async fn require_project(&self, project_id: &str) -> Result<(), CoreError> {
        if self.registry.get(project_id).await.is_none() {
            return Err(CoreError::NotFound {
                entity: "Project",
                id: project_id.to_string(),
            });
        }
        Ok(())
    }

    /// Fail with `NotFound` or `NotAMember` unless `identity` may act on
    /// the project. Performs no mutation.
    async fn require_member(&self, project_id: &str, identity: &str) -> Result<(), CoreError> {
        self.require_project(project_id).await?;
        if !self.registry.is_member(project_id, identity).await {
            return Err(CoreError::NotAMember {
                project_id: project_id.to_string(),
                identity: identity.to_string(),
            });
        }
        Ok(())
    }

    /// Enter the key's critical section, read capacity under it, and
    /// commit the reservation.
    ///
    /// The kind's existence is checked before taking the key, so requests
    /// against unknown names never add lock-map entries. Kinds are never
    /// deleted, so the answer cannot change while we wait for the key;
    /// capacity itself is still read under the guard.
    async fn try_reserve(
        &self,
        project_id: &str,
        kind: &str,
        holder: &str,
        amount: Units,
    ) -> Result<(Reservation, Units, Units), CoreError> {
        self.pool.capacity(project_id, kind).await?;

        let guard = self.ledger.lock_key(project_id, kind).await?;
        let capacity = self.pool.capacity(project_id, kind).await?;
        let (reservation, committed) = self.ledger.reserve(&guard, holder, amount, capacity).await?;
        Ok((reservation, committed, capacity))
    }

    /// Critical-section counterpart for check-in.
    async fn try_release(
        &self,
        project_id: &str,
        kind: &str,
        holder: &str,
        amount: Units,
    ) -> Result<(Units, Units), CoreError> {
        self.pool.capacity(project_id, kind).await?;

        let guard = self.ledger.lock_key(project_id, kind).await?;
        let capacity = self.pool.capacity(project_id, kind).await?;
        let committed = self.ledger.release(&guard, holder, amount).await?;
        Ok((committed, capacity))
    }

    /// Run `op`, retrying exactly once after a short backoff if it fails
    /// with `Busy`. Every other failure is surfaced as-is.
    async fn with_busy_retry<T, F, Fut>(&self, op: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        match op().await {
            Err(err) if err.is_retryable() => {
                tracing::debug!(error = %err, "key contended, retrying once");
                tokio::time::sleep(BUSY_RETRY_DELAY).await;
                op().await
            }
            other => other,
        }
    }
}
