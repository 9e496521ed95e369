// Inbound HTTP boundary. The Google Form's Apps Script trigger POSTs each
// submission to `/webhook`, and the uptime monitor polls `/`.
//
// The handlers never touch Discord directly: each submission is handed off
// to a dispatcher task through an mpsc channel and the handler waits on a
// oneshot reply under a bounded timeout. A timeout fails that submission
// only; the worker and the bot keep running.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::core::announce::{AnnounceError, AnnounceService, DispatchOutcome, SubmissionEvent};

// ============================================================================
// PAYLOAD
// ============================================================================

fn not_available() -> String {
    "N/A".to_string()
}

/// JSON body of a form submission. Display fields fall back to "N/A" when
/// the form omits them; `work` defaults to empty, which makes the whole
/// submission a no-op.
#[derive(Debug, Deserialize)]
pub struct SubmissionPayload {
    #[serde(default = "not_available")]
    pub timestamp: String,
    #[serde(default = "not_available")]
    pub game: String,
    #[serde(default = "not_available")]
    pub branch: String,
    #[serde(default = "not_available")]
    pub name: String,
    #[serde(default)]
    pub work: String,
}

impl SubmissionPayload {
    pub fn into_event(self) -> SubmissionEvent {
        SubmissionEvent {
            timestamp: self.timestamp.trim().to_string(),
            game: self.game.trim().to_string(),
            branch: self.branch.trim().to_string(),
            name: self.name.trim().to_string(),
            work: self.work.trim().to_string(),
        }
    }
}

// ============================================================================
// DISPATCH HAND-OFF
// ============================================================================

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatcher is not running")]
    WorkerGone,
    #[error("timed out waiting for dispatch result")]
    Timeout,
    #[error(transparent)]
    Announce(#[from] AnnounceError),
}

struct DispatchRequest {
    event: SubmissionEvent,
    reply: oneshot::Sender<Result<DispatchOutcome, AnnounceError>>,
}

/// Cheaply cloneable sender half of the hand-off; this is the axum state.
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::Sender<DispatchRequest>,
    timeout: Duration,
}

impl DispatchHandle {
    /// Enqueue one event and wait (bounded) for the dispatcher's verdict.
    pub async fn dispatch(
        &self,
        event: SubmissionEvent,
    ) -> Result<DispatchOutcome, DispatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(DispatchRequest {
                event,
                reply: reply_tx,
            })
            .await
            .map_err(|_| DispatchError::WorkerGone)?;

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Err(_) => Err(DispatchError::Timeout),
            Ok(Err(_)) => Err(DispatchError::WorkerGone),
            Ok(Ok(result)) => Ok(result?),
        }
    }
}

/// Spawn the dispatcher worker on the bot's runtime and return the handle
/// the HTTP handlers talk to. Events are processed strictly one at a time,
/// in arrival order.
pub fn spawn_dispatcher(service: Arc<AnnounceService>, timeout: Duration) -> DispatchHandle {
    let (tx, mut rx) = mpsc::channel::<DispatchRequest>(32);

    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let result = service.handle(&request.event).await;
            // The handler may have timed out and dropped its receiver.
            let _ = request.reply.send(result);
        }
        tracing::info!("Dispatcher worker shutting down");
    });

    DispatchHandle { tx, timeout }
}

// ============================================================================
// HTTP SURFACE
// ============================================================================

pub fn router(handle: DispatchHandle) -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/webhook", post(receive_submission))
        .with_state(handle)
}

async fn alive() -> &'static str {
    "Bot is alive!"
}

async fn receive_submission(
    State(handle): State<DispatchHandle>,
    Json(payload): Json<SubmissionPayload>,
) -> StatusCode {
    // Empty work never reaches the dispatcher.
    if payload.work.trim().is_empty() {
        tracing::info!("Webhook payload has empty work field; ignoring");
        return StatusCode::OK;
    }

    match handle.dispatch(payload.into_event()).await {
        Ok(outcome) => {
            tracing::info!(?outcome, "Webhook submission processed");
            StatusCode::OK
        }
        Err(err) => {
            tracing::error!(error = %err, "Webhook submission failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn serve(port: u16, handle: DispatchHandle) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Webhook server listening");
    axum::serve(listener, router(handle)).await?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
