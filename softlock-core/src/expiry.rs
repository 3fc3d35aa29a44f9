use crate::types::{Lease, Timestamp, MILLIS_PER_MINUTE};

/// Pure expiry rules shared by the sweeper, the resolver and every store
/// backend's predicate evaluation.
///
/// A lease is live iff its latest timestamp (`updated_at` when present,
/// `created_at` otherwise) is strictly after `now - duration`. A lease
/// sitting exactly on the threshold is expired.
pub struct ExpiryPolicy;

impl ExpiryPolicy {
    /// The instant at or before which a lease counts as expired.
    pub fn threshold(now: Timestamp, duration_minutes: u64) -> Timestamp {
        now.saturating_sub(duration_minutes.saturating_mul(MILLIS_PER_MINUTE))
    }

    pub fn is_expired(lease: &Lease, now: Timestamp, duration_minutes: u64) -> bool {
        Self::is_expired_at(lease, Self::threshold(now, duration_minutes))
    }

    pub fn is_live(lease: &Lease, now: Timestamp, duration_minutes: u64) -> bool {
        !Self::is_expired(lease, now, duration_minutes)
    }

    /// Same as [`ExpiryPolicy::is_expired`] against a precomputed threshold.
    pub fn is_expired_at(lease: &Lease, threshold: Timestamp) -> bool {
        match lease.updated_at {
            None => lease.created_at <= threshold,
            Some(updated_at) => updated_at <= threshold,
        }
    }

    /// When the lease stops being live if nobody renews it.
    pub fn expires_at(lease: &Lease, duration_minutes: u64) -> Timestamp {
        lease
            .last_touched()
            .saturating_add(duration_minutes.saturating_mul(MILLIS_PER_MINUTE))
    }
}
