//! High-level client that wraps the lease engine + pluggable storage.
//! The CLI and HTTP server delegate to this.

use crate::clock::{Clock, SystemClock};
use crate::config::{LeaseDuration, LeaseDurationSource};
use crate::coordinator::LeaseCoordinator;
use crate::error::{ConfigError, StoreError};
use crate::infrastructure::LeaseStore;
use crate::infrastructure_in_memory::InMemoryLeaseStore;
use crate::navigation::{Navigation, NavigationVerdict, ReleasePolicy};
use crate::types::*;

pub type DynLeaseStore = Box<dyn LeaseStore + Send>;
pub type DynClock = Box<dyn Clock + Send>;

/// The main entry point for using softlock. Owns the store, the clock, the
/// lease duration and the navigation release rules.
pub struct SoftLockClient {
    coordinator: LeaseCoordinator<DynLeaseStore, DynClock, LeaseDuration>,
    policy: ReleasePolicy,
}

impl SoftLockClient {
    /// Create a new client with an empty in-memory store.
    pub fn new() -> Self {
        Self::with_store(Box::new(InMemoryLeaseStore::new()))
    }

    /// Create a new client backed by SQLite at the given path.
    /// Leases persist across restarts and are shared with other processes
    /// opening the same file.
    #[cfg(feature = "sqlite")]
    pub fn with_sqlite(path: &str) -> Result<Self, StoreError> {
        let store = crate::infrastructure_sqlite::SqliteLeaseStore::open(path)?;
        Ok(Self::with_store(Box::new(store)))
    }

    pub fn with_store(store: DynLeaseStore) -> Self {
        Self::with_parts(store, Box::new(SystemClock))
    }

    /// A client over an explicit store and time source.
    pub fn with_parts(store: DynLeaseStore, clock: DynClock) -> Self {
        Self {
            coordinator: LeaseCoordinator::new(store, clock, LeaseDuration::default()),
            policy: ReleasePolicy::default(),
        }
    }

    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Acquire or renew the edit lease on a resource.
    pub fn acquire_lease(
        &mut self,
        holder_id: &str,
        holder_address: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<LeaseResult, StoreError> {
        let holder = Holder::new(holder_id, holder_address);
        let resource = ResourceRef::new(resource_type, resource_id);
        self.coordinator.try_acquire_or_renew(&holder, &resource)
    }

    /// Release every lease of a holder. Returns how many were dropped.
    pub fn release(&mut self, holder_id: &str, holder_address: &str) -> Result<usize, StoreError> {
        self.coordinator.release(&Holder::new(holder_id, holder_address))
    }

    /// The live lease on a resource, if any.
    pub fn find_live_lease(&mut self, resource_type: &str, resource_id: &str) -> Result<Option<Lease>, StoreError> {
        self.coordinator
            .find_live_lease(&ResourceRef::new(resource_type, resource_id))
    }

    /// Sweep expired leases. Returns the number of leases removed.
    pub fn sweep_expired(&mut self) -> Result<usize, StoreError> {
        self.coordinator.sweep_expired()
    }

    /// All stored leases, including expired rows not yet swept.
    pub fn list_leases(&self) -> Result<Vec<Lease>, StoreError> {
        self.coordinator.list_leases()
    }

    /// Apply the release rules to a navigation and release the holder's
    /// leases when they say so. Returns the verdict and the release count.
    pub fn handle_navigation(
        &mut self,
        holder_id: &str,
        holder_address: &str,
        navigation: &Navigation,
    ) -> Result<(NavigationVerdict, usize), StoreError> {
        let verdict = self.policy.evaluate(navigation);
        let released = match verdict {
            NavigationVerdict::Release => self.release(holder_id, holder_address)?,
            NavigationVerdict::Keep | NavigationVerdict::Exempt(_) => 0,
        };
        Ok((verdict, released))
    }

    pub fn lease_duration_minutes(&self) -> u64 {
        self.coordinator.duration().lease_duration_minutes()
    }

    /// Change the lease duration. Applies from the next call on.
    pub fn set_lease_duration_minutes(&self, minutes: u64) -> Result<(), ConfigError> {
        self.coordinator.duration().set_minutes(minutes)
    }

    /// Milliseconds-since-epoch at which `lease` lapses unless renewed.
    pub fn expires_at(&self, lease: &Lease) -> Timestamp {
        crate::expiry::ExpiryPolicy::expires_at(lease, self.lease_duration_minutes())
    }
}

impl Default for SoftLockClient {
    fn default() -> Self {
        Self::new()
    }
}
