//! Health tracking and the health check endpoint for hetzner-ddns
//!
//! [`HealthState`] is written by the daemon after every cycle and read by the
//! HTTP handlers. [`HealthServer`] exposes it on four read-only routes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info};

//==============================================================================
// State
//==============================================================================

#[derive(Debug)]
struct Inner {
    start_time: DateTime<Utc>,
    last_successful_update: Option<DateTime<Utc>>,
    last_update_attempt: Option<DateTime<Utc>>,
    current_ip: String,
    last_error: String,
    is_healthy: bool,
}

/// Shared, mutex-protected health information
///
/// Cloning is cheap and every clone refers to the same state. Each write
/// method updates all of its fields under one lock, so a snapshot never sees
/// a half-applied outcome.
#[derive(Debug, Clone)]
pub struct HealthState {
    inner: Arc<Mutex<Inner>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                start_time: Utc::now(),
                last_successful_update: None,
                last_update_attempt: None,
                current_ip: "unknown".to_string(),
                last_error: String::new(),
                is_healthy: true,
            })),
        }
    }

    /// Marks the start of a cycle
    pub async fn record_attempt(&self) {
        let mut inner = self.inner.lock().await;
        inner.last_update_attempt = Some(Utc::now());
    }

    /// Records a successful cycle, including one that found nothing to change
    pub async fn record_success(&self, ip: &str) {
        let mut inner = self.inner.lock().await;
        inner.last_successful_update = Some(Utc::now());
        inner.current_ip = ip.to_string();
        inner.last_error.clear();
        inner.is_healthy = true;
    }

    /// Records a failed cycle
    pub async fn record_failure(&self, message: &str) {
        let mut inner = self.inner.lock().await;
        inner.last_update_attempt = Some(Utc::now());
        inner.last_error = message.to_string();
        inner.is_healthy = false;
    }

    /// Returns a consistent copy of the state with derived durations
    pub async fn snapshot(&self) -> HealthStatus {
        let inner = self.inner.lock().await;
        HealthStatus::from_inner(&inner, Utc::now())
    }
}

//==============================================================================
// Snapshot
//==============================================================================

/// Point-in-time view of [`HealthState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub is_healthy: bool,
    pub start_time: DateTime<Utc>,
    pub last_successful_update: Option<DateTime<Utc>>,
    pub last_update_attempt: Option<DateTime<Utc>>,
    pub current_ip: String,
    pub last_error: String,
    pub uptime: Duration,
    /// Whole minutes since the last success, `-1` if there never was one
    pub minutes_since_last_update: i64,
    /// Whole minutes since the last attempt, `-1` if there never was one
    pub minutes_since_last_attempt: i64,
}

impl HealthStatus {
    fn from_inner(inner: &Inner, now: DateTime<Utc>) -> Self {
        Self {
            is_healthy: inner.is_healthy,
            start_time: inner.start_time,
            last_successful_update: inner.last_successful_update,
            last_update_attempt: inner.last_update_attempt,
            current_ip: inner.current_ip.clone(),
            last_error: inner.last_error.clone(),
            uptime: now - inner.start_time,
            minutes_since_last_update: minutes_since(inner.last_successful_update, now),
            minutes_since_last_attempt: minutes_since(inner.last_update_attempt, now),
        }
    }

    /// Ready once at least one cycle succeeded and nothing failed since
    pub fn is_ready(&self) -> bool {
        self.is_healthy && self.last_successful_update.is_some()
    }
}

fn minutes_since(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    ts.map_or(-1, |ts| (now - ts).num_minutes().max(0))
}

/// Formats a duration as `[d.]hh:mm:ss`
fn format_uptime(uptime: Duration) -> String {
    let total = uptime.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{}.{:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Body of `GET /status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub healthy: bool,
    pub uptime: String,
    pub start_time: DateTime<Utc>,
    pub last_successful_update: Option<DateTime<Utc>>,
    pub last_update_attempt: Option<DateTime<Utc>>,
    pub time_since_last_update_minutes: i64,
    pub time_since_last_attempt_minutes: i64,
    pub current_ip: String,
    pub last_error: String,
}

impl From<HealthStatus> for StatusResponse {
    fn from(status: HealthStatus) -> Self {
        Self {
            healthy: status.is_healthy,
            uptime: format_uptime(status.uptime),
            start_time: status.start_time,
            last_successful_update: status.last_successful_update,
            last_update_attempt: status.last_update_attempt,
            time_since_last_update_minutes: status.minutes_since_last_update,
            time_since_last_attempt_minutes: status.minutes_since_last_attempt,
            current_ip: status.current_ip,
            last_error: status.last_error,
        }
    }
}

//==============================================================================
// Server
//==============================================================================

/// Health check server
pub struct HealthServer {
    local_addr: SocketAddr,
    /// Shutdown channel sender
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl HealthServer {
    /// Binds `addr` and serves the health routes in a background task
    pub async fn start(addr: SocketAddr, state: HealthState) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Health check server listening on {}", local_addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(state);

        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("Health server error: {}", e);
            }
        });

        Ok(Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Address the server actually bound (useful when started on port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the health check server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("Health check server stopped");
        }
    }
}

impl Drop for HealthServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
        .route("/status", get(status))
        .fallback(not_found)
        .with_state(state)
}

async fn health(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    if state.snapshot().await.is_healthy {
        (StatusCode::OK, Json(json!({ "status": "healthy" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy" })),
        )
    }
}

async fn live() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "alive" })))
}

async fn ready(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    if state.snapshot().await.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready" })),
        )
    }
}

async fn status(State(state): State<HealthState>) -> Json<StatusResponse> {
    Json(state.snapshot().await.into())
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

//==============================================================================
// Tests
//==============================================================================
