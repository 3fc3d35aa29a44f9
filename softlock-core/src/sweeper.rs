use crate::error::StoreError;
use crate::expiry::ExpiryPolicy;
use crate::infrastructure::{LeaseFilter, LeaseStore};
use crate::types::Timestamp;

/// Global garbage collection of expired leases.
pub struct Sweeper;

impl Sweeper {
    /// Delete every expired lease across all resources. Returns the number
    /// of rows removed; zero is a normal outcome.
    pub fn sweep<S: LeaseStore + ?Sized>(
        store: &mut S,
        now: Timestamp,
        duration_minutes: u64,
    ) -> Result<usize, StoreError> {
        let threshold = ExpiryPolicy::threshold(now, duration_minutes);
        let swept = store.delete_where(&LeaseFilter::Expired { threshold })?;
        tracing::debug!(swept, threshold, "swept expired leases");
        Ok(swept)
    }

    /// Sweep, logging and discarding any store failure. A later call retries.
    pub fn sweep_quietly<S: LeaseStore + ?Sized>(store: &mut S, now: Timestamp, duration_minutes: u64) -> usize {
        match Self::sweep(store, now, duration_minutes) {
            Ok(swept) => swept,
            Err(e) => {
                tracing::warn!(error = %e, "sweep of expired leases failed, continuing");
                0
            }
        }
    }
}
