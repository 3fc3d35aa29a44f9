use crate::infrastructure::LeaseStore;
use crate::types::{Holder, Lease, NewLease, ResourceRef, Timestamp, MILLIS_PER_MINUTE};

/// A fixed "now" far enough from zero that subtracting an hour stays positive.
pub const NOW: Timestamp = 1_700_000_000_000;

pub fn minutes(n: u64) -> u64 {
    n * MILLIS_PER_MINUTE
}

pub fn alice() -> Holder {
    Holder::new("1", "127.0.0.1")
}

pub fn bob() -> Holder {
    Holder::new("2", "10.0.0.2")
}

/// Write a lease row directly, bypassing the coordinator.
pub fn seed<S: LeaseStore + ?Sized>(
    store: &mut S,
    holder: Holder,
    resource: ResourceRef,
    created_at: Timestamp,
    updated_at: Option<Timestamp>,
) -> Lease {
    let lease = NewLease {
        holder,
        resource,
        created_at,
        updated_at,
    };
    let id = store.insert(&lease).expect("seed insert");
    lease.with_id(id)
}
