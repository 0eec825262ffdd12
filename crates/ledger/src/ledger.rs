//! The reservation ledger: who holds how many units of which kind.
//!
//! The ledger is the single source of truth for committed amounts; any
//! `available` figure elsewhere is derived from it. All mutations on one
//! (project, kind) key happen inside that key's critical section, entered
//! via [`ReservationLedger::lock_key`], so a capacity check and the commit
//! it guards can never interleave with another writer on the same key.

use std::collections::HashMap;

use tokio::sync::{OwnedMutexGuard, RwLock};

use labtrack_core::error::CoreError;
use labtrack_core::reservation::{Holding, Reservation};
use labtrack_core::types::{Identity, ProjectId, Units};
use labtrack_core::validation::validate_amount;

use crate::keyed_lock::KeyedLock;

/// Identifies one hardware kind within one project.
pub type PoolKey = (ProjectId, String);

/// Proof that the caller holds the critical section for one key.
///
/// [`ReservationLedger::reserve`] and [`ReservationLedger::release`]
/// operate on the guard's own key, so a mutation can never slip outside
/// the section that serializes it. Dropping the guard releases the key.
pub struct KeyGuard {
    key: PoolKey,
    _guard: OwnedMutexGuard<()>,
}

impl KeyGuard {
    /// The (project_id, kind_name) key this guard serializes.
    pub fn key(&self) -> &PoolKey {
        &self.key
    }
}

/// Active reservations, keyed by (project, kind) and then by holder.
///
/// One record per (project, kind, holder) triple: repeat checkouts
/// accumulate onto the record, a full release removes it.
pub struct ReservationLedger {
    entries: RwLock<HashMap<PoolKey, HashMap<Identity, Reservation>>>,
    locks: KeyedLock<PoolKey>,
}

impl ReservationLedger {
    /// Create an empty ledger whose per-key sections time out after
    /// `lock_wait`.
    pub fn new(lock_wait: std::time::Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            locks: KeyedLock::new(lock_wait),
        }
    }

    /// Enter the critical section for one (project, kind) key.
    ///
    /// Fails with `Busy` after the configured bound; nothing is committed
    /// in that case. Sections for different keys are independent.
    pub async fn lock_key(&self, project_id: &str, kind_name: &str) -> Result<KeyGuard, CoreError> {
        let key = (project_id.to_string(), kind_name.to_string());
        let guard = self.locks.acquire(&key).await?;
        Ok(KeyGuard { key, _guard: guard })
    }

    /// Commit a checkout of `amount` units for `holder`.
    ///
    /// The committed-total check and the commit happen in one step under
    /// the caller's key guard: two concurrent checkouts can never both
    /// pass the check and jointly overcommit. `capacity` must be read
    /// while the same guard is held.
    pub async fn reserve(
        &self,
        guard: &KeyGuard,
        holder: &str,
        amount: Units,
        capacity: Units,
    ) -> Result<(Reservation, Units), CoreError> {
        validate_amount(amount)?;

        let mut entries = self.entries.write().await;
        let key = guard.key();
        let holdings = entries.entry(key.clone()).or_default();

        let committed: Units = holdings.values().map(|r| r.amount).sum();
        // A demand near u64::MAX must fail the capacity check, not wrap it.
        let total = match committed.checked_add(amount) {
            Some(total) if total <= capacity => total,
            _ => {
                return Err(CoreError::InsufficientCapacity {
                    kind: key.1.clone(),
                    requested: amount,
                    available: capacity.saturating_sub(committed),
                })
            }
        };

        // r.amount + amount <= total <= capacity, so this cannot overflow.
        let reservation = holdings
            .entry(holder.to_string())
            .and_modify(|r| r.amount += amount)
            .or_insert_with(|| {
                Reservation::open(key.0.clone(), key.1.clone(), holder.to_string(), amount)
            })
            .clone();

        Ok((reservation, total))
    }

    /// Release `amount` units previously reserved by `holder`.
    ///
    /// Partial release is allowed; releasing more than held is rejected
    /// rather than clamped, so client bugs surface instead of silently
    /// correcting inventory. Returns the committed total after release.
    pub async fn release(
        &self,
        guard: &KeyGuard,
        holder: &str,
        amount: Units,
    ) -> Result<Units, CoreError> {
        validate_amount(amount)?;

        let mut entries = self.entries.write().await;
        let key = guard.key();

        let held = entries
            .get(key)
            .and_then(|holdings| holdings.get(holder))
            .map(|r| r.amount)
            .unwrap_or(0);

        if amount > held {
            return Err(CoreError::OverRelease {
                kind: key.1.clone(),
                requested: amount,
                held,
            });
        }

        // held >= amount > 0, so the entry exists.
        let holdings = entries.get_mut(key).ok_or(CoreError::OverRelease {
            kind: key.1.clone(),
            requested: amount,
            held: 0,
        })?;

        let remaining = held - amount;
        if remaining == 0 {
            holdings.remove(holder);
        } else if let Some(r) = holdings.get_mut(holder) {
            r.amount = remaining;
        }

        let committed: Units = holdings.values().map(|r| r.amount).sum();
        Ok(committed)
    }

    /// The committed total for one key.
    ///
    /// A plain read: it may be stale by at most one in-flight mutation on
    /// that key. Hold the key's guard when the value must not move.
    pub async fn committed(&self, project_id: &str, kind_name: &str) -> Units {
        let key = (project_id.to_string(), kind_name.to_string());
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .map(|holdings| holdings.values().map(|r| r.amount).sum())
            .unwrap_or(0)
    }

    /// How many units `holder` currently has reserved for one kind.
    pub async fn held(&self, project_id: &str, kind_name: &str, holder: &str) -> Units {
        let key = (project_id.to_string(), kind_name.to_string());
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .and_then(|holdings| holdings.get(holder))
            .map(|r| r.amount)
            .unwrap_or(0)
    }

    /// Number of keys with a lock entry, for leak checks in tests.
    #[cfg(test)]
    pub(crate) async fn lock_count(&self) -> usize {
        self.locks.len().await
    }

    /// All of `holder`'s active holdings within one project, sorted by
    /// kind name.
    pub async fn held_by(&self, project_id: &str, holder: &str) -> Vec<Holding> {
        let entries = self.entries.read().await;
        let mut holdings: Vec<Holding> = entries
            .iter()
            .filter(|((pid, _), _)| pid == project_id)
            .filter_map(|((_, kind), holders)| {
                holders.get(holder).map(|r| Holding {
                    kind_name: kind.clone(),
                    amount: r.amount,
                })
            })
            .collect();
        holdings.sort_by(|a, b| a.kind_name.cmp(&b.kind_name));
        holdings
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
    async fn reserve_commits_within_capacity() {
        let ledger = ledger();
        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();

        let (reservation, committed) = ledger.reserve(&guard, "alice", 3, 10).await.unwrap();
        assert_eq!(reservation.amount, 3);
        assert_eq!(committed, 3);
        drop(guard);

        assert_eq!(ledger.committed("p1", "HWSet1").await, 3);
    }

    #[tokio::test]
    async fn reserve_beyond_capacity_rejected() {
        let ledger = ledger();
        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();
        ledger.reserve(&guard, "alice", 8, 10).await.unwrap();

        let err = ledger.reserve(&guard, "bob", 3, 10).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::InsufficientCapacity {
                requested: 3,
                available: 2,
                ..
            }
        );

        // The failed reserve committed nothing.
        drop(guard);
        assert_eq!(ledger.committed("p1", "HWSet1").await, 8);
    }

    #[tokio::test]
    async fn repeat_reserve_accumulates_one_record() {
        let ledger = ledger();
        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();

        let (first, _) = ledger.reserve(&guard, "alice", 2, 10).await.unwrap();
        let (second, committed) = ledger.reserve(&guard, "alice", 3, 10).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.amount, 5);
        assert_eq!(committed, 5);
        drop(guard);

        let holdings = ledger.held_by("p1", "alice").await;
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].amount, 5);
    }

    #[tokio::test]
    async fn huge_amount_fails_capacity_check_without_wrapping() {
        let ledger = ledger();
        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();
        ledger.reserve(&guard, "alice", 5, 10).await.unwrap();

        // committed + u64::MAX would wrap past the capacity check.
        let err = ledger
            .reserve(&guard, "bob", u64::MAX, 10)
            .await
            .unwrap_err();
        assert_matches!(
            err,
            CoreError::InsufficientCapacity {
                requested: u64::MAX,
                available: 5,
                ..
            }
        );
        drop(guard);

        assert_eq!(ledger.committed("p1", "HWSet1").await, 5);
    }

    #[tokio::test]
    async fn zero_amount_rejected() {
        let ledger = ledger();
        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();

        assert_matches!(
            ledger.reserve(&guard, "alice", 0, 10).await,
            Err(CoreError::InvalidAmount)
        );
        assert_matches!(
            ledger.release(&guard, "alice", 0).await,
            Err(CoreError::InvalidAmount)
        );
    }

    #[tokio::test]
    async fn partial_release_keeps_remainder() {
        let ledger = ledger();
        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();
        ledger.reserve(&guard, "alice", 5, 10).await.unwrap();

        let committed = ledger.release(&guard, "alice", 2).await.unwrap();
        assert_eq!(committed, 3);
        drop(guard);

        assert_eq!(ledger.held("p1", "HWSet1", "alice").await, 3);
    }

    #[tokio::test]
    async fn full_release_removes_record() {
        let ledger = ledger();
        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();
        ledger.reserve(&guard, "alice", 5, 10).await.unwrap();
        ledger.release(&guard, "alice", 5).await.unwrap();
        drop(guard);

        assert_eq!(ledger.held("p1", "HWSet1", "alice").await, 0);
        assert!(ledger.held_by("p1", "alice").await.is_empty());
    }

    #[tokio::test]
    async fn over_release_rejected_and_leaves_state() {
        let ledger = ledger();
        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();
        ledger.reserve(&guard, "alice", 2, 10).await.unwrap();

        let err = ledger.release(&guard, "alice", 3).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::OverRelease {
                requested: 3,
                held: 2,
                ..
            }
        );
        drop(guard);

        assert_eq!(ledger.held("p1", "HWSet1", "alice").await, 2);
    }

    #[tokio::test]
    async fn release_with_no_reservation_rejected() {
        let ledger = ledger();
        let guard = ledger.lock_key("p1", "HWSet1").await.unwrap();

        let err = ledger.release(&guard, "alice", 1).await.unwrap_err();
        assert_matches!(err, CoreError::OverRelease { held: 0, .. });
    }

    #[tokio::test]
    async fn held_by_spans_kinds_not_projects() {
        let ledger = ledger();

        let g1 = ledger.lock_key("p1", "HWSet1").await.unwrap();
        ledger.reserve(&g1, "alice", 2, 10).await.unwrap();
        drop(g1);

        let g2 = ledger.lock_key("p1", "HWSet2").await.unwrap();
        ledger.reserve(&g2, "alice", 4, 10).await.unwrap();
        drop(g2);

        let g3 = ledger.lock_key("p2", "HWSet1").await.unwrap();
        ledger.reserve(&g3, "alice", 1, 10).await.unwrap();
        drop(g3);

        let holdings = ledger.held_by("p1", "alice").await;
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].kind_name, "HWSet1");
        assert_eq!(holdings[0].amount, 2);
        assert_eq!(holdings[1].kind_name, "HWSet2");
        assert_eq!(holdings[1].amount, 4);
    }
}
