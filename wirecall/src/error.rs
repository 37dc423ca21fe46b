use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use wirecall_proto::{CompletedResponse, TransportErrorCode};

/// Failures of the transport layer for a single exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// DNS lookup failed.
    #[error("dns lookup for {host} failed: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// DNS lookup succeeded but returned nothing.
    #[error("no address found for {0}")]
    NoAddress(String),

    /// TCP connect failed.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// TCP + TLS + HTTP/2 setup did not finish in time.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The endpoint host is not a valid TLS server name.
    #[error("invalid tls server name: {0}")]
    ServerName(String),

    /// TLS handshake failed.
    #[error("tls handshake failed: {0}")]
    Tls(#[source] io::Error),

    /// HTTP/2 framing, reset, GOAWAY or connection I/O error.
    #[error("h2 error: {0}")]
    H2(#[from] h2::Error),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    /// No response within the call deadline; the exchange was aborted.
    #[error("no response within {0:?}")]
    TimedOut(Duration),

    /// The pending handle was aborted by its owner.
    #[error("exchange aborted")]
    Aborted,

    /// The exchange task went away without reporting.
    #[error("exchange ended without a result")]
    Dropped,

    /// A blocking call was attempted on a thread that drives an async runtime.
    #[error("blocking call from inside an async runtime")]
    BlockingInAsyncContext,
}

impl TransportError {
    /// Category reported to callers.
    pub fn code(&self) -> TransportErrorCode {
        match self {
            Self::Resolve { .. } | Self::NoAddress(_) => TransportErrorCode::HostNotFound,
            Self::Connect { source, .. } if source.kind() == io::ErrorKind::ConnectionRefused => {
                TransportErrorCode::ConnectionRefused
            }
            Self::Connect { .. } => TransportErrorCode::ConnectFailed,
            Self::ConnectTimeout(_) | Self::TimedOut(_) => TransportErrorCode::Timeout,
            Self::ServerName(_) | Self::Tls(_) => TransportErrorCode::Tls,
            Self::H2(e) if e.is_io() => TransportErrorCode::ConnectionClosed,
            Self::H2(e) if e.reason() == Some(h2::Reason::CANCEL) => TransportErrorCode::Cancelled,
            Self::H2(_) => TransportErrorCode::Protocol,
            Self::InvalidRequest(_) => TransportErrorCode::InvalidRequest,
            Self::Aborted => TransportErrorCode::Cancelled,
            Self::Dropped => TransportErrorCode::ConnectionClosed,
            Self::BlockingInAsyncContext => TransportErrorCode::BlockingInAsyncContext,
        }
    }

    /// Terminal state for the response interpreter.
    pub fn into_completed(self) -> CompletedResponse {
        CompletedResponse::failed(self.code(), self.to_string())
    }
}

/// Errors parsing an endpoint URL.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] http::uri::InvalidUri),

    #[error("url has no host: {0}")]
    MissingHost(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Errors creating a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("endpoint: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("failed to start io runtime: {0}")]
    Runtime(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_refused_code() {
        let err = TransportError::Connect {
            addr: "127.0.0.1:1".parse().unwrap(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(err.code(), TransportErrorCode::ConnectionRefused);

        let err = TransportError::Connect {
            addr: "127.0.0.1:1".parse().unwrap(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.code(), TransportErrorCode::ConnectFailed);
    }

    #[test]
    fn timeout_codes() {
        assert_eq!(
            TransportError::TimedOut(Duration::from_millis(6000)).code(),
            TransportErrorCode::Timeout
        );
        assert_eq!(
            TransportError::ConnectTimeout(Duration::from_secs(1)).code(),
            TransportErrorCode::Timeout
        );
    }

    #[test]
    fn h2_reset_codes() {
        let cancel = TransportError::H2(h2::Error::from(h2::Reason::CANCEL));
        assert_eq!(cancel.code(), TransportErrorCode::Cancelled);

        let refused = TransportError::H2(h2::Error::from(h2::Reason::REFUSED_STREAM));
        assert_eq!(refused.code(), TransportErrorCode::Protocol);
    }

    #[test]
    fn into_completed_keeps_message() {
        let completed = TransportError::TimedOut(Duration::from_millis(250)).into_completed();
        match completed {
            CompletedResponse::Failed(failure) => {
                assert_eq!(failure.code, TransportErrorCode::Timeout);
                assert_eq!(failure.detail, "no response within 250ms");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
