/// gRPC status codes (<https://grpc.github.io/grpc/core/md_doc_statuscodes.html>).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GrpcStatus {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl GrpcStatus {
    /// Map a raw status code. Codes outside the defined range are `Unknown`.
    pub fn from_code(v: i64) -> Self {
        match v {
            0 => Self::Ok,
            1 => Self::Cancelled,
            2 => Self::Unknown,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for GrpcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            Self::DeadlineExceeded => write!(f, "DEADLINE_EXCEEDED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::AlreadyExists => write!(f, "ALREADY_EXISTS"),
            Self::PermissionDenied => write!(f, "PERMISSION_DENIED"),
            Self::ResourceExhausted => write!(f, "RESOURCE_EXHAUSTED"),
            Self::FailedPrecondition => write!(f, "FAILED_PRECONDITION"),
            Self::Aborted => write!(f, "ABORTED"),
            Self::OutOfRange => write!(f, "OUT_OF_RANGE"),
            Self::Unimplemented => write!(f, "UNIMPLEMENTED"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::DataLoss => write!(f, "DATA_LOSS"),
            Self::Unauthenticated => write!(f, "UNAUTHENTICATED"),
        }
    }
}

/// Transport-level failure categories, reported to callers in place of the
/// concrete I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorCode {
    /// DNS resolution produced no address.
    HostNotFound,
    /// The remote refused the TCP connection.
    ConnectionRefused,
    /// Any other failure while establishing TCP.
    ConnectFailed,
    /// TLS handshake or configuration failure.
    Tls,
    /// The connection closed before the exchange completed.
    ConnectionClosed,
    /// HTTP/2 protocol failure (stream reset, GOAWAY, framing).
    Protocol,
    /// The call did not resolve in time and was aborted.
    Timeout,
    /// The caller aborted the exchange.
    Cancelled,
    /// The response carried an HTTP status other than 200.
    HttpStatus(u16),
    /// The request could not be constructed (e.g. names not valid in a path).
    InvalidRequest,
    /// A blocking call was made from inside an async runtime.
    BlockingInAsyncContext,
}

impl std::fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HostNotFound => write!(f, "host not found"),
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::Tls => write!(f, "tls failure"),
            Self::ConnectionClosed => write!(f, "connection closed"),
            Self::Protocol => write!(f, "http/2 protocol failure"),
            Self::Timeout => write!(f, "timed out"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::HttpStatus(code) => write!(f, "http status {code}"),
            Self::InvalidRequest => write!(f, "invalid request"),
            Self::BlockingInAsyncContext => write!(f, "blocking call inside async runtime"),
        }
    }
}

/// Violations of the length-prefixed framing contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than the 5-byte prefix.
    #[error("frame too short: {len} bytes, need at least 5")]
    TooShort { len: usize },
    /// The prefix announces a different payload size than what arrived.
    #[error("frame declares {declared} payload bytes but carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    /// The compressed flag is set; decompression is not supported.
    #[error("compressed frame (flag {flag}) not supported")]
    Compressed { flag: u8 },
}

/// A failed call, for callers that prefer `Result` over inspecting
/// [`CallStatus`](crate::CallStatus).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// Network, TLS, HTTP/2 or timeout failure.
    #[error("transport error ({code}): {detail}")]
    Transport {
        code: TransportErrorCode,
        detail: String,
    },
    /// The server answered with a non-zero `grpc-status`.
    #[error("grpc status {status} ({code}): {message}")]
    Protocol {
        status: GrpcStatus,
        code: i64,
        message: String,
    },
    /// The response body violated the framing contract.
    #[error("malformed response: {0}")]
    Malformed(#[from] FrameError),
}
