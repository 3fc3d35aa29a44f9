//! Lease duration configuration.
//!
//! The duration is read through [`LeaseDurationSource`] on every call rather
//! than captured at construction, so changing it takes effect for the very
//! next acquisition or sweep.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ConfigError;

pub const DEFAULT_LEASE_DURATION_MINUTES: u64 = 5;

/// Anything that can report the current lease duration.
pub trait LeaseDurationSource {
    fn lease_duration_minutes(&self) -> u64;
}

/// Shared, runtime-adjustable lease duration. Clones observe each other's updates.
#[derive(Debug, Clone)]
pub struct LeaseDuration(Arc<AtomicU64>);

impl LeaseDuration {
    pub fn minutes(minutes: u64) -> Result<Self, ConfigError> {
        Self::validate(minutes)?;
        Ok(Self(Arc::new(AtomicU64::new(minutes))))
    }

    pub fn set_minutes(&self, minutes: u64) -> Result<(), ConfigError> {
        Self::validate(minutes)?;
        self.0.store(minutes, Ordering::SeqCst);
        tracing::debug!(minutes, "lease duration updated");
        Ok(())
    }

    fn validate(minutes: u64) -> Result<(), ConfigError> {
        if minutes == 0 {
            return Err(ConfigError::InvalidLeaseDuration(minutes));
        }
        Ok(())
    }
}

impl Default for LeaseDuration {
    fn default() -> Self {
        Self(Arc::new(AtomicU64::new(DEFAULT_LEASE_DURATION_MINUTES)))
    }
}

impl LeaseDurationSource for LeaseDuration {
    fn lease_duration_minutes(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
