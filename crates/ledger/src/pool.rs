//! Hardware pool: per-project kinds and their fixed capacities.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use labtrack_core::error::CoreError;
use labtrack_core::hardware::{Availability, HardwareKind};
use labtrack_core::types::{ProjectId, Units};

use crate::ledger::ReservationLedger;

/// Owns every hardware kind record.
///
/// The pool stores only capacities; `available` is always derived from
/// the [`ReservationLedger`] at read time, so the ledger stays the single
/// source of truth. Kinds are never deleted.
pub struct HardwarePool {
    kinds: RwLock<HashMap<ProjectId, BTreeMap<String, Units>>>,
}

impl HardwarePool {
    pub fn new() -> Self {
        Self {
            kinds: RwLock::new(HashMap::new()),
        }
    }

    /// Introduce a new kind with a fixed capacity.
    ///
    /// Kind names are unique within a project; a duplicate fails and the
    /// existing capacity is untouched.
    pub async fn define_kind(
        &self,
        project_id: &str,
        name: &str,
        capacity: Units,
    ) -> Result<HardwareKind, CoreError> {
        let mut kinds = self.kinds.write().await;
        let project_kinds = kinds.entry(project_id.to_string()).or_default();

        if project_kinds.contains_key(name) {
            return Err(CoreError::DuplicateKind {
                project_id: project_id.to_string(),
                kind: name.to_string(),
            });
        }

        project_kinds.insert(name.to_string(), capacity);
        Ok(HardwareKind {
            project_id: project_id.to_string(),
            name: name.to_string(),
            capacity,
        })
    }

    /// The fixed capacity of one kind.
    pub async fn capacity(&self, project_id: &str, name: &str) -> Result<Units, CoreError> {
        self.kinds
            .read()
            .await
            .get(project_id)
            .and_then(|project_kinds| project_kinds.get(name))
            .copied()
            .ok_or(CoreError::NotFound {
                entity: "Hardware kind",
                id: name.to_string(),
            })
    }

    /// Availability snapshot for one kind, computed against the ledger.
    pub async fn availability(
        &self,
        ledger: &ReservationLedger,
        project_id: &str,
        name: &str,
    ) -> Result<Availability, CoreError> {
        let capacity = self.capacity(project_id, name).await?;
        let committed = ledger.committed(project_id, name).await;
        Ok(Availability::derive(name, capacity, committed))
    }

    /// Availability snapshots for every kind in a project, in name order.
    ///
    /// A project with no defined kinds yields an empty list.
    pub async fn list_kinds(
        &self,
        ledger: &ReservationLedger,
        project_id: &str,
    ) -> Vec<Availability> {
        let capacities: Vec<(String, Units)> = {
            let kinds = self.kinds.read().await;
            kinds
                .get(project_id)
                .map(|project_kinds| {
                    project_kinds
                        .iter()
                        .map(|(name, cap)| (name.clone(), *cap))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut result = Vec::with_capacity(capacities.len());
        for (name, capacity) in capacities {
            let committed = ledger.committed(project_id, &name).await;
            result.push(Availability::derive(name, capacity, committed));
        }
        result
    }

    /// Every project that has at least one kind defined, in id order.
    pub async fn projects_with_kinds(&self) -> Vec<ProjectId> {
        let kinds = self.kinds.read().await;
        let mut ids: Vec<ProjectId> = kinds.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Administrative capacity update.
    ///
    /// Runs inside the ledger's critical section for the kind's key: an
    /// increase is always accepted, a decrease below the committed total
    /// is rejected so outstanding reservations are never invalidated.
    pub async fn update_capacity(
        &self,
        ledger: &ReservationLedger,
        project_id: &str,
        name: &str,
        new_capacity: Units,
    ) -> Result<Availability, CoreError> {
        // Existence check up front; kinds are never deleted, so the
        // answer cannot change while we wait for the key.
        self.capacity(project_id, name).await?;

        let _guard = ledger.lock_key(project_id, name).await?;
        let committed = ledger.committed(project_id, name).await;

        if new_capacity < committed {
            return Err(CoreError::Validation(format!(
                "capacity {new_capacity} is below the {committed} units currently reserved for {name}"
            )));
        }

        let mut kinds = self.kinds.write().await;
        if let Some(cap) = kinds
            .get_mut(project_id)
            .and_then(|project_kinds| project_kinds.get_mut(name))
        {
            *cap = new_capacity;
        }

        Ok(Availability::derive(name, new_capacity, committed))
    }
}

impl Default for HardwarePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    fn ledger() -> ReservationLedger {
        ReservationLedger::new(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn define_and_list_kinds() {
        let pool = HardwarePool::new();
        let ledger = ledger();

        pool.define_kind("p1", "HWSet2", 50).await.unwrap();
        pool.define_kind("p1", "HWSet1", 100).await.unwrap();

        let kinds = pool.list_kinds(&ledger, "p1").await;
        assert_eq!(kinds.len(), 2);
        // Name-ordered.
        assert_eq!(kinds[0].name, "HWSet1");
        assert_eq!(kinds[0].available, 100);
        assert_eq!(kinds[1].name, "HWSet2");
    }

    #[tokio::test]
    async fn duplicate_kind_rejected() {
        let pool = HardwarePool::new();
        pool.define_kind("p1", "HWSet1", 100).await.unwrap();

        let err = pool.define_kind("p1", "HWSet1", 10).await.unwrap_err();
        assert_matches!(err, CoreError::DuplicateKind { .. });

        // Original capacity untouched.
        assert_eq!(pool.capacity("p1", "HWSet1").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn same_kind_name_is_scoped_per_project() {
        let pool = HardwarePool::new();
        pool.define_kind("p1", "HWSet1", 100).await.unwrap();
        pool.define_kind("p2", "HWSet1", 5).await.unwrap();

        assert_eq!(pool.capacity("p2", "HWSet1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn availability_reflects_ledger() {
        let pool = HardwarePool::new();
        let ledger = ledger();
        pool.define_kind("p1", "HWSet1", 10).await.unwrap();

        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();
        ledger.reserve(&guard, "alice", 4, 10).await.unwrap();
        drop(guard);

        let a = pool.availability(&ledger, "p1", "HWSet1").await.unwrap();
        assert_eq!(a.capacity, 10);
        assert_eq!(a.available, 6);
    }

    #[tokio::test]
    async fn unknown_kind_not_found() {
        let pool = HardwarePool::new();
        let ledger = ledger();
        assert_matches!(
            pool.availability(&ledger, "p1", "missing").await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn capacity_increase_accepted() {
        let pool = HardwarePool::new();
        let ledger = ledger();
        pool.define_kind("p1", "HWSet1", 10).await.unwrap();

        let a = pool
            .update_capacity(&ledger, "p1", "HWSet1", 20)
            .await
            .unwrap();
        assert_eq!(a.capacity, 20);
        assert_eq!(a.available, 20);
    }

    #[tokio::test]
    async fn capacity_decrease_below_committed_rejected() {
        let pool = HardwarePool::new();
        let ledger = ledger();
        pool.define_kind("p1", "HWSet1", 10).await.unwrap();

        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();
        ledger.reserve(&guard, "alice", 6, 10).await.unwrap();
        drop(guard);

        let err = pool
            .update_capacity(&ledger, "p1", "HWSet1", 5)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
        assert_eq!(pool.capacity("p1", "HWSet1").await.unwrap(), 10);

        // Decrease to exactly the committed total is allowed.
        let a = pool
            .update_capacity(&ledger, "p1", "HWSet1", 6)
            .await
            .unwrap();
        assert_eq!(a.capacity, 6);
        assert_eq!(a.available, 0);
    }
}
