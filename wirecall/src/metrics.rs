//! wirecall client metrics.
//!
//! Process-wide counters for call outcomes, connections and bytes. Any
//! metriken exposition layer picks them up.

use metriken::{Counter, metric};
use wirecall_proto::{CallStatus, TransportErrorCode};

// ── Calls ────────────────────────────────────────────────────────

#[metric(name = "wirecall/calls/started", description = "Calls handed to the transport")]
pub static CALLS_STARTED: Counter = Counter::new();

#[metric(name = "wirecall/calls/ok", description = "Calls that completed with status OK")]
pub static CALLS_OK: Counter = Counter::new();

#[metric(
    name = "wirecall/calls/transport_error",
    description = "Calls that failed below the gRPC layer"
)]
pub static CALLS_TRANSPORT_ERROR: Counter = Counter::new();

#[metric(
    name = "wirecall/calls/protocol_error",
    description = "Calls answered with a non-zero grpc-status"
)]
pub static CALLS_PROTOCOL_ERROR: Counter = Counter::new();

#[metric(
    name = "wirecall/calls/malformed",
    description = "Calls whose response body failed to decode"
)]
pub static CALLS_MALFORMED: Counter = Counter::new();

#[metric(
    name = "wirecall/calls/timeout",
    description = "Calls aborted by the call deadline"
)]
pub static CALLS_TIMEOUT: Counter = Counter::new();

// ── Connections ──────────────────────────────────────────────────

#[metric(
    name = "wirecall/connections/opened",
    description = "HTTP/2 connections established"
)]
pub static CONNECTIONS_OPENED: Counter = Counter::new();

// ── Bytes ────────────────────────────────────────────────────────

#[metric(name = "wirecall/bytes/sent", description = "Request body bytes sent")]
pub static BYTES_SENT: Counter = Counter::new();

#[metric(name = "wirecall/bytes/received", description = "Response body bytes received")]
pub static BYTES_RECEIVED: Counter = Counter::new();

/// Count a finished call by outcome.
pub(crate) fn record(status: &CallStatus) {
    match status {
        CallStatus::Ok => {
            CALLS_OK.increment();
        }
        CallStatus::Transport { code, .. } => {
            CALLS_TRANSPORT_ERROR.increment();
            if *code == TransportErrorCode::Timeout {
                CALLS_TIMEOUT.increment();
            }
        }
        CallStatus::Protocol { .. } => {
            CALLS_PROTOCOL_ERROR.increment();
        }
        CallStatus::Malformed(_) => {
            CALLS_MALFORMED.increment();
        }
    }
}
