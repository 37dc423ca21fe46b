use std::sync::Arc;

use bytes::Bytes;
use tokio::runtime::Runtime;
use tracing::debug;
use wirecall_proto::{CallDescriptor, CallResult, CallStatus, interpret, request};

use crate::config::ChannelConfig;
use crate::driver;
use crate::endpoint::Endpoint;
use crate::error::{ChannelError, TransportError};
use crate::metrics;
use crate::transport::{PendingResponse, Transport};

/// Name of the channel's io threads.
pub const IO_THREAD_NAME: &str = "wirecall-io";

/// Synchronous unary gRPC client for one endpoint.
///
/// Owns a small tokio runtime that drives the HTTP/2 connection. Calls block
/// the calling thread and may be issued from several threads at once. Calls
/// from inside an async runtime fail with
/// [`TransportErrorCode::BlockingInAsyncContext`](wirecall_proto::TransportErrorCode::BlockingInAsyncContext).
pub struct Channel {
    endpoint: Arc<Endpoint>,
    transport: Arc<Transport>,
    config: ChannelConfig,
    // Taken on drop so the runtime can shut down from any context.
    runtime: Option<Runtime>,
}

impl Channel {
    /// Channel to `url` with the default configuration.
    pub fn new(url: &str) -> Result<Self, ChannelError> {
        Self::with_config(Endpoint::parse(url)?, ChannelConfig::default())
    }

    pub fn with_config(endpoint: Endpoint, config: ChannelConfig) -> Result<Self, ChannelError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name(IO_THREAD_NAME)
            .enable_all()
            .build()
            .map_err(ChannelError::Runtime)?;

        let endpoint = Arc::new(endpoint);
        let transport = Arc::new(Transport::new(
            Arc::clone(&endpoint),
            config.connect_timeout,
        ));

        Ok(Self {
            endpoint,
            transport,
            config,
            runtime: Some(runtime),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Invoke `service/method` with an encoded request message.
    pub fn call(&self, method: &str, service: &str, args: &[u8]) -> CallResult {
        self.invoke(CallDescriptor::unary(service, method, Bytes::copy_from_slice(args)))
    }

    /// Run one call to completion.
    ///
    /// Non-streaming calls are bounded by
    /// [`call_timeout`](ChannelConfig::call_timeout); streaming calls wait
    /// without a deadline.
    pub fn invoke(&self, call: CallDescriptor) -> CallResult {
        let result = match self.blocking_runtime() {
            Ok(runtime) => match self.send(runtime, &call) {
                Ok(pending) => {
                    let timeout = (!call.streaming).then_some(self.config.call_timeout);
                    let completed = driver::call_sync(runtime, pending, timeout);
                    interpret(completed, self.config.length_check)
                }
                Err(e) => CallResult::failed(status_of(e)),
            },
            Err(e) => CallResult::failed(status_of(e)),
        };

        metrics::record(&result.status);
        debug!(
            path = %call.path(),
            status = ?result.status,
            payload = %Hex(&result.payload),
            "call finished"
        );
        result
    }

    /// Send a call and return its pending handle without waiting.
    ///
    /// No deadline applies; finish it with [`wait`](Self::wait) or
    /// [`PendingResponse::finish`], or cancel it with
    /// [`PendingResponse::abort`]. Usable from async code.
    pub fn start(&self, call: &CallDescriptor) -> Result<PendingResponse, TransportError> {
        let runtime = self.runtime.as_ref().ok_or(TransportError::Dropped)?;
        self.send(runtime, call)
    }

    /// Block until a started call resolves.
    pub fn wait(&self, pending: PendingResponse) -> CallResult {
        let result = match self.blocking_runtime() {
            Ok(runtime) => interpret(
                driver::call_sync(runtime, pending, None),
                self.config.length_check,
            ),
            Err(e) => CallResult::failed(status_of(e)),
        };
        metrics::record(&result.status);
        result
    }

    fn send(&self, runtime: &Runtime, call: &CallDescriptor) -> Result<PendingResponse, TransportError> {
        let request = request::build_call(self.endpoint.target(), call)?;
        debug!(uri = %request.uri(), size = request.body().len(), "sending call");
        Ok(self.transport.send(runtime.handle(), request, call.streaming))
    }

    fn blocking_runtime(&self) -> Result<&Runtime, TransportError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(TransportError::BlockingInAsyncContext);
        }
        self.runtime.as_ref().ok_or(TransportError::Dropped)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish()
    }
}

fn status_of(e: TransportError) -> CallStatus {
    CallStatus::Transport {
        code: e.code(),
        detail: e.to_string(),
    }
}

/// Lowercase hex rendering for log fields.
struct Hex<'a>(&'a [u8]);

impl std::fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}
