use crate::clock::{Clock, SystemClock};
use crate::config::{LeaseDuration, LeaseDurationSource};
use crate::error::StoreError;
use crate::infrastructure::{LeaseFilter, LeaseStore};
use crate::resolver::LeaseResolver;
use crate::sweeper::Sweeper;
use crate::types::{Holder, Lease, LeaseResult, LockConflict, NewLease, ResourceRef, Timestamp};

/// Decides acquire / renew / conflict for edit requests and applies the
/// outcome to the store.
///
/// The coordinator keeps no lease state of its own. The clock and the lease
/// duration are read on every call.
pub struct LeaseCoordinator<S, C = SystemClock, D = LeaseDuration> {
    store: S,
    clock: C,
    duration: D,
}

impl<S: LeaseStore> LeaseCoordinator<S> {
    /// Wall-clock coordinator with the default five minute lease.
    pub fn with_store(store: S) -> Self {
        Self::new(store, SystemClock, LeaseDuration::default())
    }
}

impl<S, C, D> LeaseCoordinator<S, C, D>
where
    S: LeaseStore,
    C: Clock,
    D: LeaseDurationSource,
{
    pub fn new(store: S, clock: C, duration: D) -> Self {
        Self {
            store,
            clock,
            duration,
        }
    }

    /// Acquire the lease on `resource` for `holder`, or renew it if `holder`
    /// already has it. Another holder's live lease yields
    /// [`LeaseResult::Conflict`].
    pub fn try_acquire_or_renew(
        &mut self,
        holder: &Holder,
        resource: &ResourceRef,
    ) -> Result<LeaseResult, StoreError> {
        let now = self.clock.now();
        self.acquire_or_renew_at(holder, resource, now)
    }

    /// [`LeaseCoordinator::try_acquire_or_renew`] at an explicit instant.
    ///
    /// The live-lease read and the insert are not atomic. Two callers racing
    /// on a free resource can both insert; the resolver then masks the
    /// duplicate by always answering with the lowest row ID.
    pub fn acquire_or_renew_at(
        &mut self,
        holder: &Holder,
        resource: &ResourceRef,
        now: Timestamp,
    ) -> Result<LeaseResult, StoreError> {
        let duration = self.duration.lease_duration_minutes();

        if let Some(mut existing) = LeaseResolver::find_live_lease(&mut self.store, resource, now, duration)? {
            if !existing.is_held_by(holder) {
                tracing::info!(
                    resource = %resource,
                    requested_by = %holder,
                    held_by = %existing.holder,
                    "lease conflict"
                );
                return Ok(LeaseResult::Conflict(LockConflict {
                    existing_lease: existing,
                }));
            }

            existing.updated_at = Some(renewal_timestamp(&existing, now));
            self.store.update_existing(&existing)?;
            tracing::debug!(lease_id = existing.id, resource = %resource, holder = %holder, "lease renewed");
            return Ok(LeaseResult::Renewed { lease: existing });
        }

        let new_lease = NewLease::first_acquisition(holder.clone(), resource.clone(), now);
        let id = self.store.insert(&new_lease)?;
        tracing::debug!(lease_id = id, resource = %resource, holder = %holder, "lease acquired");
        Ok(LeaseResult::Acquired {
            lease: new_lease.with_id(id),
        })
    }

    /// Drop every lease held by `holder`, live or expired, on any resource.
    pub fn release(&mut self, holder: &Holder) -> Result<usize, StoreError> {
        let released = self.store.delete_where(&LeaseFilter::HeldBy {
            holder: holder.clone(),
        })?;
        tracing::debug!(holder = %holder, released, "released leases of holder");
        Ok(released)
    }

    /// The live lease on `resource` right now, after sweeping.
    pub fn find_live_lease(&mut self, resource: &ResourceRef) -> Result<Option<Lease>, StoreError> {
        let now = self.clock.now();
        let duration = self.duration.lease_duration_minutes();
        LeaseResolver::find_live_lease(&mut self.store, resource, now, duration)
    }

    /// Delete every expired lease right now. Unlike the sweep that precedes
    /// each lookup, store failures are reported.
    pub fn sweep_expired(&mut self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let duration = self.duration.lease_duration_minutes();
        Sweeper::sweep(&mut self.store, now, duration)
    }

    /// Every stored row, expired ones included, ordered by ID.
    pub fn list_leases(&self) -> Result<Vec<Lease>, StoreError> {
        self.store.query_where(&LeaseFilter::All)
    }

    pub fn lease_duration_minutes(&self) -> u64 {
        self.duration.lease_duration_minutes()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn duration(&self) -> &D {
        &self.duration
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

/// `updated_at` for a renewal at `now`.
///
/// Renewal timestamps must move strictly forward past both `created_at` and
/// any earlier renewal, even when the clock has not (same millisecond, or a
/// peer process with a lagging clock).
fn renewal_timestamp(lease: &Lease, now: Timestamp) -> Timestamp {
    now.max(lease.last_touched().saturating_add(1))
}
