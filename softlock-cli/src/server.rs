use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

use axum::{
    extract::{ConnectInfo, Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;

use softlock_core::client::SoftLockClient;
use softlock_core::error::StoreError;
use softlock_core::navigation::client_address;
use softlock_core::types::{Lease, LeaseResult};

use crate::handlers::*;

pub type AppState = Arc<Mutex<SoftLockClient>>;

/// Address of the caller as the lease table should record it.
#[derive(Debug, Clone)]
pub struct ClientAddress(pub String);

pub async fn run(
    host: &str,
    port: u16,
    client: SoftLockClient,
    max_concurrent_requests: usize,
) -> std::io::Result<()> {
    let state: AppState = Arc::new(Mutex::new(client));
    let app = router(state).layer(ConcurrencyLimitLayer::new(max_concurrent_requests));

    let addr = format!("{}:{}", host, port);

    if std::env::var("SOFTLOCK_API_KEY").is_ok() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!("No SOFTLOCK_API_KEY set, server is open (dev mode)");
    }

    tracing::info!("softlock server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Health is always open (no auth)
        .route("/health", get(health))
        // Protected routes
        .route("/locks", post(acquire_lock).get(list_locks))
        .route("/locks/{resource_type}/{resource_id}", get(get_lock))
        .route("/release", post(release))
        .route("/navigate", post(navigate))
        .route("/sweep", post(sweep))
        .route("/config", put(update_config))
        .layer(middleware::from_fn(client_address_middleware))
        .layer(middleware::from_fn(auth_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Middleware ─────────────────────────────────────────────────────────────

async fn auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // If no API key is configured, allow all requests (dev mode)
    let expected_key = match std::env::var("SOFTLOCK_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => return Ok(next.run(request).await),
    };

    // Always allow health check without auth
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth_header.strip_prefix("Bearer ").unwrap_or("");

    if token == expected_key {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Unauthorized request to {}", request.uri().path());
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn client_address_middleware(mut request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let forwarded_for = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());

    let address = client_address(forwarded_for, &peer);
    request.extensions_mut().insert(ClientAddress(address));
    next.run(request).await
}

// ─── Error Mapping ──────────────────────────────────────────────────────────

fn store_failure<T: Serialize>(e: StoreError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match e {
        StoreError::ConstraintViolation(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound(_) => StatusCode::CONFLICT,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    tracing::error!(error = %e, "lease store failure");
    (status, Json(ApiResponse::err(e.to_string())))
}

fn bad_request<T: Serialize>(e: String) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e)))
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let client = state.lock().await;
    match client.list_leases() {
        Ok(leases) => (
            StatusCode::OK,
            Json(ApiResponse::ok(HealthResponse {
                status: "ok".to_string(),
                stored_leases: leases.len(),
                lease_duration_minutes: client.lease_duration_minutes(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            })),
        ),
        Err(e) => store_failure(e),
    }
}

async fn acquire_lock(
    State(state): State<AppState>,
    Extension(ClientAddress(peer_address)): Extension<ClientAddress>,
    Json(req): Json<AcquireLockRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": e,
            })),
        );
    }

    let address = req.holder_address.clone().unwrap_or(peer_address);
    let mut client = state.lock().await;
    let result = client.acquire_lease(&req.holder_id, &address, &req.resource_type, &req.resource_id);

    match result {
        Ok(LeaseResult::Acquired { lease }) => lease_granted(&client, lease, false),
        Ok(LeaseResult::Renewed { lease }) => lease_granted(&client, lease, true),
        Ok(LeaseResult::Conflict(conflict)) => {
            tracing::info!(holder_id = %req.holder_id, "{}", conflict);
            (
                StatusCode::CONFLICT,
                Json(serde_json::json!({
                    "success": false,
                    "reason": "LOCKED",
                    "conflict": ConflictResponse::from(&conflict),
                })),
            )
        }
        Err(e) => {
            let (status, Json(body)) = store_failure::<()>(e);
            (status, Json(serde_json::json!(body)))
        }
    }
}

fn lease_granted(client: &SoftLockClient, lease: Lease, renewed: bool) -> (StatusCode, Json<serde_json::Value>) {
    tracing::info!(
        holder = %lease.holder,
        lease_id = lease.id,
        resource = %lease.resource,
        renewed,
        "Lease granted"
    );
    let status = if renewed { StatusCode::OK } else { StatusCode::CREATED };
    (
        status,
        Json(serde_json::json!({
            "success": true,
            "renewed": renewed,
            "data": LeaseResponse::new(&lease, client.expires_at(&lease)),
        })),
    )
}

async fn list_locks(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<Vec<LeaseResponse>>>) {
    let client = state.lock().await;
    match client.list_leases() {
        Ok(leases) => {
            let leases = leases
                .iter()
                .map(|l| LeaseResponse::new(l, client.expires_at(l)))
                .collect();
            (StatusCode::OK, Json(ApiResponse::ok(leases)))
        }
        Err(e) => store_failure(e),
    }
}

async fn get_lock(
    State(state): State<AppState>,
    Path((resource_type, resource_id)): Path<(String, String)>,
) -> (StatusCode, Json<ApiResponse<LeaseResponse>>) {
    let mut client = state.lock().await;
    match client.find_live_lease(&resource_type, &resource_id) {
        Ok(Some(lease)) => {
            let expires_at = client.expires_at(&lease);
            (StatusCode::OK, Json(ApiResponse::ok(LeaseResponse::new(&lease, expires_at))))
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(format!("No live lease on {}:{}", resource_type, resource_id))),
        ),
        Err(e) => store_failure(e),
    }
}

async fn release(
    State(state): State<AppState>,
    Extension(ClientAddress(peer_address)): Extension<ClientAddress>,
    Json(req): Json<ReleaseRequest>,
) -> (StatusCode, Json<ApiResponse<ReleaseResponse>>) {
    if let Err(e) = req.validate() {
        return bad_request(e);
    }

    let address = req.holder_address.unwrap_or(peer_address);
    let mut client = state.lock().await;
    match client.release(&req.holder_id, &address) {
        Ok(released) => {
            tracing::info!(holder_id = %req.holder_id, holder_address = %address, released, "Leases released");
            (StatusCode::OK, Json(ApiResponse::ok(ReleaseResponse { released })))
        }
        Err(e) => store_failure(e),
    }
}

async fn navigate(
    State(state): State<AppState>,
    Extension(ClientAddress(peer_address)): Extension<ClientAddress>,
    Json(req): Json<NavigateRequest>,
) -> (StatusCode, Json<ApiResponse<NavigateResponse>>) {
    if let Err(e) = req.validate() {
        return bad_request(e);
    }

    let address = req.holder_address.clone().unwrap_or(peer_address);
    let mut client = state.lock().await;
    match client.handle_navigation(&req.holder_id, &address, &req.navigation) {
        Ok((verdict, released)) => {
            if released > 0 {
                tracing::info!(holder_id = %req.holder_id, path = %req.navigation.path, released, "Leases released on navigation");
            }
            (StatusCode::OK, Json(ApiResponse::ok(NavigateResponse { verdict, released })))
        }
        Err(e) => store_failure(e),
    }
}

async fn sweep(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<SweepResponse>>) {
    let mut client = state.lock().await;
    match client.sweep_expired() {
        Ok(swept) => {
            tracing::info!(swept, "Expired leases swept");
            (StatusCode::OK, Json(ApiResponse::ok(SweepResponse { swept })))
        }
        Err(e) => store_failure(e),
    }
}

async fn update_config(
    State(state): State<AppState>,
    Json(req): Json<ConfigRequest>,
) -> (StatusCode, Json<ApiResponse<ConfigResponse>>) {
    let client = state.lock().await;
    match client.set_lease_duration_minutes(req.lease_duration_minutes) {
        Ok(()) => {
            tracing::info!(minutes = req.lease_duration_minutes, "Lease duration updated");
            (
                StatusCode::OK,
                Json(ApiResponse::ok(ConfigResponse {
                    lease_duration_minutes: client.lease_duration_minutes(),
                })),
            )
        }
        Err(e) => bad_request(e.to_string()),
    }
}

// ─── Storage Backend Selection ──────────────────────────────────────────────

/// Build a client for a storage spec: `memory` or `sqlite:<path>`.
pub fn create_client(storage: &str, lease_duration_minutes: u64) -> Result<SoftLockClient, String> {
    let client = if storage == "memory" {
        tracing::info!("Storage backend: in-memory (leases will not persist)");
        SoftLockClient::new()
    } else if let Some(path) = storage.strip_prefix("sqlite:") {
        open_sqlite(path)?
    } else {
        return Err(format!(
            "Unknown storage backend: '{}'. Use 'memory' or 'sqlite:<path>'",
            storage
        ));
    };

    client
        .set_lease_duration_minutes(lease_duration_minutes)
        .map_err(|e| e.to_string())?;
    Ok(client)
}

#[cfg(feature = "sqlite")]
fn open_sqlite(path: &str) -> Result<SoftLockClient, String> {
    tracing::info!("Storage backend: SQLite ({})", path);
    SoftLockClient::with_sqlite(path)
        .map_err(|e| format!("Failed to open SQLite database at '{}': {}", path, e))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(path: &str) -> Result<SoftLockClient, String> {
    Err(format!(
        "SQLite storage requested ({}) but the `sqlite` feature is not enabled. \
         Rebuild with: cargo build --features sqlite",
        path
    ))
}
