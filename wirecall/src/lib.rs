//! Blocking unary gRPC calls over HTTP/2.
//!
//! Wraps the sans-IO `wirecall-proto` framing with an `h2` client running on
//! a small tokio runtime owned by each [`Channel`]. Callers hand over raw,
//! already-encoded request messages and get raw response messages back; no
//! protobuf or gRPC runtime is involved.
//!
//! # Architecture
//!
//! `Channel::call` builds the request with `wirecall_proto::request`, hands
//! it to the [`Transport`], which spawns the exchange on the runtime and
//! returns a [`PendingResponse`]. The call driver blocks the calling thread
//! on that handle with a deadline ([`DEFAULT_CALL_TIMEOUT`]), aborting the
//! exchange (HTTP/2 `RST_STREAM CANCEL`) when it passes. The terminal
//! response goes through `wirecall_proto::interpret`.
//!
//! Every per-call failure ends up in [`CallResult::status`]; nothing panics
//! and nothing is retried.
//!
//! # Example
//!
//! ```rust,no_run
//! use wirecall::Channel;
//!
//! let channel = Channel::new("http://127.0.0.1:15480")?;
//! let result = channel.call(
//!     "GetStats",
//!     "v2ray.core.app.stats.command.StatsService",
//!     b"\n'inbound>>>socks-in-1>>>traffic>>>uplink",
//! );
//! match result.into_result() {
//!     Ok(payload) => println!("{} bytes", payload.len()),
//!     Err(e) => eprintln!("call failed: {e}"),
//! }
//! # Ok::<(), wirecall::ChannelError>(())
//! ```
//!
//! # Streaming handles
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use wirecall::{CallDescriptor, Channel};
//!
//! let channel = Channel::new("127.0.0.1:50051")?;
//! let call = CallDescriptor::streaming("pkg.Svc", "Watch", Bytes::new());
//! let mut pending = channel.start(&call)?;
//!
//! // No deadline applies; the caller decides when to give up.
//! pending.abort();
//! let result = channel.wait(pending);
//! assert!(!result.is_ok());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod channel;
mod config;
mod driver;
mod endpoint;
mod error;
pub mod metrics;
mod transport;

pub use channel::{Channel, IO_THREAD_NAME};
pub use config::{
    ChannelConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_WORKER_THREADS,
};
pub use driver::{call_sync, wait};
pub use endpoint::{ALPN_H2, DEFAULT_SCHEME, Endpoint, default_tls_config};
pub use error::{ChannelError, EndpointError, TransportError};
pub use transport::{PendingResponse, PendingState, Transport};

pub use wirecall_proto::{
    CallDescriptor, CallError, CallResult, CallStatus, CompletedResponse, FrameError, GrpcStatus,
    LengthCheck, TransportErrorCode,
};
