//! Blocking bridge from a [`PendingResponse`] to a terminal response.

use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::warn;
use wirecall_proto::CompletedResponse;

use crate::error::TransportError;
use crate::transport::PendingResponse;

/// Block the calling thread until `pending` resolves or `timeout` elapses.
///
/// On timeout the exchange is aborted exactly once. A result that arrived
/// before the abort took effect is kept. Must not be called from inside an
/// async runtime.
pub fn call_sync(
    runtime: &Runtime,
    pending: PendingResponse,
    timeout: Option<Duration>,
) -> CompletedResponse {
    runtime.block_on(wait(pending, timeout))
}

/// Async form of [`call_sync`].
pub async fn wait(mut pending: PendingResponse, timeout: Option<Duration>) -> CompletedResponse {
    let Some(limit) = timeout else {
        return complete(pending.finish().await);
    };

    tokio::select! {
        outcome = pending.finish() => return complete(outcome),
        _ = tokio::time::sleep(limit) => {}
    }

    warn!(?limit, "call deadline passed, aborting exchange");
    pending.abort();
    match pending.finish().await {
        Err(TransportError::Aborted) => TransportError::TimedOut(limit).into_completed(),
        outcome => complete(outcome),
    }
}

fn complete(outcome: Result<wirecall_proto::RawResponse, TransportError>) -> CompletedResponse {
    match outcome {
        Ok(raw) => CompletedResponse::Received(raw),
        Err(e) => e.into_completed(),
    }
}
