use std::time::Duration;

use wirecall_proto::LengthCheck;

/// Deadline applied to every non-streaming call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(6000);

/// Deadline for TCP + TLS + HTTP/2 connection setup.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of io worker threads per channel.
pub const DEFAULT_WORKER_THREADS: usize = 1;

/// Configuration for a [`Channel`](crate::Channel).
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Deadline for unary calls, measured from send to terminal state.
    pub call_timeout: Duration,
    /// Deadline for establishing a connection. `None` waits for the OS.
    pub connect_timeout: Option<Duration>,
    /// How strictly response frames are checked.
    pub length_check: LengthCheck,
    /// Worker threads driving the HTTP/2 connection. At least 1.
    pub worker_threads: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            length_check: LengthCheck::Strict,
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}
