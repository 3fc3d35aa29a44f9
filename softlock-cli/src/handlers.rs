use serde::{Deserialize, Serialize};

use softlock_core::navigation::{Navigation, NavigationVerdict};
use softlock_core::types::{Lease, LockConflict, Timestamp};

// ─── Validation Helpers ─────────────────────────────────────────────────────

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}

fn require_if_present(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) => require(field, v),
        None => Ok(()),
    }
}

// ─── Request Types ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AcquireLockRequest {
    pub holder_id: String,
    pub resource_type: String,
    pub resource_id: String,
    /// Overrides the address taken from the connection
    pub holder_address: Option<String>,
}

impl AcquireLockRequest {
    pub fn validate(&self) -> Result<(), String> {
        require("holder_id", &self.holder_id)?;
        require("resource_type", &self.resource_type)?;
        require("resource_id", &self.resource_id)?;
        require_if_present("holder_address", self.holder_address.as_deref())
    }
}

#[derive(Deserialize)]
pub struct ReleaseRequest {
    pub holder_id: String,
    pub holder_address: Option<String>,
}

impl ReleaseRequest {
    pub fn validate(&self) -> Result<(), String> {
        require("holder_id", &self.holder_id)?;
        require_if_present("holder_address", self.holder_address.as_deref())
    }
}

#[derive(Deserialize)]
pub struct NavigateRequest {
    pub holder_id: String,
    pub holder_address: Option<String>,
    #[serde(flatten)]
    pub navigation: Navigation,
}

impl NavigateRequest {
    pub fn validate(&self) -> Result<(), String> {
        require("holder_id", &self.holder_id)?;
        require("path", &self.navigation.path)?;
        require_if_present("holder_address", self.holder_address.as_deref())
    }
}

#[derive(Deserialize)]
pub struct ConfigRequest {
    pub lease_duration_minutes: u64,
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeaseResponse {
    pub lease_id: u64,
    pub holder_id: String,
    pub holder_address: String,
    pub resource: String,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub expires_at: Timestamp,
}

impl LeaseResponse {
    pub fn new(lease: &Lease, expires_at: Timestamp) -> Self {
        Self {
            lease_id: lease.id,
            holder_id: lease.holder.id.clone(),
            holder_address: lease.holder.address.clone(),
            resource: lease.resource.key(),
            created_at: lease.created_at,
            updated_at: lease.updated_at,
            expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConflictResponse {
    pub holder_id: String,
    pub holder_address: String,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub message: String,
}

impl From<&LockConflict> for ConflictResponse {
    fn from(conflict: &LockConflict) -> Self {
        Self {
            holder_id: conflict.holder().id.clone(),
            holder_address: conflict.holder().address.clone(),
            created_at: conflict.created_at(),
            updated_at: conflict.updated_at(),
            message: conflict.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ReleaseResponse {
    pub released: usize,
}

#[derive(Serialize)]
pub struct NavigateResponse {
    pub verdict: NavigationVerdict,
    pub released: usize,
}

#[derive(Serialize)]
pub struct SweepResponse {
    pub swept: usize,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub lease_duration_minutes: u64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub stored_leases: usize,
    pub lease_duration_minutes: u64,
    pub version: String,
}
