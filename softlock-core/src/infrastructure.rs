use crate::error::StoreError;
use crate::expiry::ExpiryPolicy;
use crate::types::{Holder, Lease, LeaseId, NewLease, ResourceRef, Timestamp};

/// Row predicates understood by every store backend.
///
/// Kept as data rather than closures so a SQL backend can translate them into
/// a `WHERE` clause while the in-memory backend evaluates [`LeaseFilter::matches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseFilter {
    /// Every row
    All,
    /// Rows whose latest timestamp is at or before `threshold`
    Expired { threshold: Timestamp },
    /// Rows on `resource` whose latest timestamp is after `threshold`
    LiveOn {
        resource: ResourceRef,
        threshold: Timestamp,
    },
    /// Rows held by `holder`, regardless of resource or liveness
    HeldBy { holder: Holder },
}

impl LeaseFilter {
    pub fn matches(&self, lease: &Lease) -> bool {
        match self {
            LeaseFilter::All => true,
            LeaseFilter::Expired { threshold } => ExpiryPolicy::is_expired_at(lease, *threshold),
            LeaseFilter::LiveOn {
                resource,
                threshold,
            } => lease.resource == *resource && !ExpiryPolicy::is_expired_at(lease, *threshold),
            LeaseFilter::HeldBy { holder } => lease.is_held_by(holder),
        }
    }
}

/// Defines the contract for lease storage backends.
///
/// Stores provide no test-and-set: callers read with
/// [`LeaseStore::query_where`] and then write, and concurrent writers may
/// interleave between the two.
pub trait LeaseStore {
    /// Persist a new lease and return its assigned ID
    fn insert(&mut self, lease: &NewLease) -> Result<LeaseId, StoreError>;

    /// Overwrite an existing row by ID. Fails with [`StoreError::NotFound`]
    /// if the row is gone.
    fn update_existing(&mut self, lease: &Lease) -> Result<(), StoreError>;

    /// Delete all rows matching the filter, returning how many went away
    fn delete_where(&mut self, filter: &LeaseFilter) -> Result<usize, StoreError>;

    /// Read all rows matching the filter, ordered by ascending ID
    fn query_where(&self, filter: &LeaseFilter) -> Result<Vec<Lease>, StoreError>;
}

impl<S: LeaseStore + ?Sized> LeaseStore for Box<S> {
    fn insert(&mut self, lease: &NewLease) -> Result<LeaseId, StoreError> {
        (**self).insert(lease)
    }

    fn update_existing(&mut self, lease: &Lease) -> Result<(), StoreError> {
        (**self).update_existing(lease)
    }

    fn delete_where(&mut self, filter: &LeaseFilter) -> Result<usize, StoreError> {
        (**self).delete_where(filter)
    }

    fn query_where(&self, filter: &LeaseFilter) -> Result<Vec<Lease>, StoreError> {
        (**self).query_where(filter)
    }
}

/// Row-level constraints every backend enforces on write.
pub fn check_constraints(
    holder: &Holder,
    created_at: Timestamp,
    updated_at: Option<Timestamp>,
) -> Result<(), StoreError> {
    if holder.address.is_empty() {
        return Err(StoreError::ConstraintViolation(
            "holder_address must not be empty".to_string(),
        ));
    }
    if let Some(updated_at) = updated_at {
        if updated_at <= created_at {
            return Err(StoreError::ConstraintViolation(format!(
                "updated_at ({}) must be after created_at ({})",
                updated_at, created_at
            )));
        }
    }
    Ok(())
}
