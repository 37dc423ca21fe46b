//! Interpretation of a completed exchange into a [`CallResult`].

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::{CallError, FrameError, GrpcStatus, TransportErrorCode};
use crate::message::{self, LengthCheck};

/// Trailer (or trailers-only header) carrying the integer status.
pub const GRPC_STATUS: &str = "grpc-status";

/// Trailer carrying the human-readable status message.
pub const GRPC_MESSAGE: &str = "grpc-message";

/// Everything the server sent back on one stream.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub trailers: Option<HeaderMap>,
}

impl RawResponse {
    /// Look a field up in the trailers, then in the headers.
    pub fn metadata(&self, name: &str) -> Option<&http::HeaderValue> {
        self.trailers
            .as_ref()
            .and_then(|t| t.get(name))
            .or_else(|| self.headers.get(name))
    }
}

/// A transport failure reduced to its category plus a diagnostic string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub code: TransportErrorCode,
    pub detail: String,
}

/// Terminal state of one exchange.
#[derive(Debug, Clone)]
pub enum CompletedResponse {
    Received(RawResponse),
    Failed(TransportFailure),
}

impl CompletedResponse {
    pub fn failed(code: TransportErrorCode, detail: impl Into<String>) -> Self {
        Self::Failed(TransportFailure {
            code,
            detail: detail.into(),
        })
    }
}

/// Outcome classification of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStatus {
    Ok,
    Transport {
        code: TransportErrorCode,
        detail: String,
    },
    Protocol {
        status: GrpcStatus,
        code: i64,
        message: String,
    },
    Malformed(FrameError),
}

/// Status plus payload. The payload is empty unless the status is `Ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub status: CallStatus,
    pub payload: Bytes,
}

impl CallResult {
    pub fn ok(payload: Bytes) -> Self {
        Self {
            status: CallStatus::Ok,
            payload,
        }
    }

    pub fn failed(status: CallStatus) -> Self {
        Self {
            status,
            payload: Bytes::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CallStatus::Ok
    }

    pub fn into_result(self) -> Result<Bytes, CallError> {
        match self.status {
            CallStatus::Ok => Ok(self.payload),
            CallStatus::Transport { code, detail } => Err(CallError::Transport { code, detail }),
            CallStatus::Protocol {
                status,
                code,
                message,
            } => Err(CallError::Protocol {
                status,
                code,
                message,
            }),
            CallStatus::Malformed(e) => Err(CallError::Malformed(e)),
        }
    }
}

/// Classify a completed exchange.
///
/// Order: transport failure, non-200 HTTP status, non-zero `grpc-status`,
/// then body framing.
pub fn interpret(completed: CompletedResponse, check: LengthCheck) -> CallResult {
    let response = match completed {
        CompletedResponse::Received(response) => response,
        CompletedResponse::Failed(TransportFailure { code, detail }) => {
            return CallResult::failed(CallStatus::Transport { code, detail });
        }
    };

    if response.status != StatusCode::OK {
        return CallResult::failed(CallStatus::Transport {
            code: TransportErrorCode::HttpStatus(response.status.as_u16()),
            detail: response
                .status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        });
    }

    if let Some(code) = extract_status_code(&response)
        && code != 0
    {
        return CallResult::failed(CallStatus::Protocol {
            status: GrpcStatus::from_code(code),
            code,
            message: extract_message(&response),
        });
    }

    match message::decode(&response.body, check) {
        Ok(payload) => CallResult::ok(response.body.slice_ref(payload)),
        Err(e) => CallResult::failed(CallStatus::Malformed(e)),
    }
}

/// `grpc-status` as an integer. Absent means success; a value that is not an
/// integer reads as `Unknown`.
fn extract_status_code(response: &RawResponse) -> Option<i64> {
    let value = response.metadata(GRPC_STATUS)?;
    let code = value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(GrpcStatus::Unknown as i64);
    Some(code)
}

/// `grpc-message`, empty if absent.
fn extract_message(response: &RawResponse) -> String {
    response
        .metadata(GRPC_MESSAGE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}
