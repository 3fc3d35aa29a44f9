use serde::{Deserialize, Serialize};

use super::{Holder, LeaseId, ResourceRef, Timestamp};

/// A lease that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLease {
    pub holder: Holder,
    pub resource: ResourceRef,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl NewLease {
    /// A fresh lease as written on first acquisition: no renewal yet.
    pub fn first_acquisition(holder: Holder, resource: ResourceRef, now: Timestamp) -> Self {
        Self {
            holder,
            resource,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn with_id(self, id: LeaseId) -> Lease {
        Lease {
            id,
            holder: self.holder,
            resource: self.resource,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A time-bound advisory claim of edit ownership over a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// Store-assigned lease ID
    pub id: LeaseId,
    /// Who holds the lease, and from where
    pub holder: Holder,
    /// The leased resource
    pub resource: ResourceRef,
    /// When the lease was first acquired. Never changes.
    pub created_at: Timestamp,
    /// Last renewal, absent until the first one
    pub updated_at: Option<Timestamp>,
}

impl Lease {
    /// The most recent sign of life: the last renewal, or creation if none.
    pub fn last_touched(&self) -> Timestamp {
        self.updated_at.unwrap_or(self.created_at)
    }

    pub fn is_held_by(&self, holder: &Holder) -> bool {
        self.holder == *holder
    }
}

/// Raised to the caller when another holder owns a live lease on the resource.
///
/// This is an expected outcome, not a fault: callers surface it to the
/// rejected actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConflict {
    pub existing_lease: Lease,
}

impl std::fmt::Display for LockConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lease = &self.existing_lease;
        write!(
            f,
            "{} is being edited by {} from {}",
            lease.resource, lease.holder.id, lease.holder.address
        )
    }
}

impl std::error::Error for LockConflict {}

impl LockConflict {
    pub fn holder(&self) -> &Holder {
        &self.existing_lease.holder
    }

    pub fn created_at(&self) -> Timestamp {
        self.existing_lease.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.existing_lease.updated_at
    }
}

/// Result of attempting to acquire or renew a lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseResult {
    /// No live lease existed; a new one was written
    Acquired { lease: Lease },
    /// The caller already held the live lease; it was extended
    Renewed { lease: Lease },
    /// Somebody else holds the live lease
    Conflict(LockConflict),
}

impl LeaseResult {
    pub fn lease(&self) -> Option<&Lease> {
        match self {
            LeaseResult::Acquired { lease } | LeaseResult::Renewed { lease } => Some(lease),
            LeaseResult::Conflict(_) => None,
        }
    }

    pub fn into_lease(self) -> Result<Lease, LockConflict> {
        match self {
            LeaseResult::Acquired { lease } | LeaseResult::Renewed { lease } => Ok(lease),
            LeaseResult::Conflict(conflict) => Err(conflict),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, LeaseResult::Conflict(_))
    }
}
