use crate::error::StoreError;
use crate::infrastructure::{check_constraints, LeaseFilter, LeaseStore};
use crate::types::{Lease, LeaseId, NewLease};
use std::collections::BTreeMap;

/// Process-local lease table. Leases vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryLeaseStore {
    // Map of Lease ID -> Lease, ordered so queries come back by ID
    leases: BTreeMap<LeaseId, Lease>,
    next_id: LeaseId,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

impl LeaseStore for InMemoryLeaseStore {
    fn insert(&mut self, lease: &NewLease) -> Result<LeaseId, StoreError> {
        check_constraints(&lease.holder, lease.created_at, lease.updated_at)?;

        self.next_id += 1;
        let id = self.next_id;
        self.leases.insert(id, lease.clone().with_id(id));
        Ok(id)
    }

    fn update_existing(&mut self, lease: &Lease) -> Result<(), StoreError> {
        check_constraints(&lease.holder, lease.created_at, lease.updated_at)?;

        match self.leases.get_mut(&lease.id) {
            Some(stored) => {
                *stored = lease.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(lease.id)),
        }
    }

    fn delete_where(&mut self, filter: &LeaseFilter) -> Result<usize, StoreError> {
        let before = self.leases.len();
        self.leases.retain(|_, lease| !filter.matches(lease));
        Ok(before - self.leases.len())
    }

    fn query_where(&self, filter: &LeaseFilter) -> Result<Vec<Lease>, StoreError> {
        Ok(self
            .leases
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }
}
