use crate::error::StoreError;
use crate::expiry::ExpiryPolicy;
use crate::infrastructure::{LeaseFilter, LeaseStore};
use crate::sweeper::Sweeper;
use crate::types::{Lease, ResourceRef, Timestamp};

/// Looks up the live lease on a resource.
pub struct LeaseResolver;

impl LeaseResolver {
    /// Sweep expired rows, then return the live lease on `resource`, if any.
    ///
    /// Two live rows for one resource can only come from the unfenced
    /// read-then-insert race or manual tampering. The lowest ID wins.
    pub fn find_live_lease<S: LeaseStore + ?Sized>(
        store: &mut S,
        resource: &ResourceRef,
        now: Timestamp,
        duration_minutes: u64,
    ) -> Result<Option<Lease>, StoreError> {
        Sweeper::sweep_quietly(store, now, duration_minutes);

        let live = store.query_where(&LeaseFilter::LiveOn {
            resource: resource.clone(),
            threshold: ExpiryPolicy::threshold(now, duration_minutes),
        })?;

        if live.len() > 1 {
            tracing::warn!(
                resource = %resource,
                count = live.len(),
                "multiple live leases on one resource, using the oldest row"
            );
        }

        let lease = live.into_iter().min_by_key(|l| l.id);
        tracing::debug!(resource = %resource, found = lease.is_some(), "resolved live lease");
        Ok(lease)
    }
}
