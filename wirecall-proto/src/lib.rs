//! Sans-IO gRPC unary call framing.
//!
//! This crate holds the protocol logic of a unary gRPC call with no I/O and
//! no protobuf dependency: the caller provides raw `&[u8]` messages and an
//! HTTP/2 client that can send an `http::Request<Bytes>`.
//!
//! # Architecture
//!
//! ```text
//!   service, method, payload
//!        |
//!   +----v------------+
//!   | request::build  |  path, grpc headers, length-prefixed body
//!   +----+------------+
//!        |  http::Request<Bytes>
//!   [ HTTP/2 transport ]   (not here; see the `wirecall` crate)
//!        |  CompletedResponse
//!   +----v----------------+
//!   | response::interpret |  transport error / grpc-status / framing
//!   +----+----------------+
//!        |
//!     CallResult
//! ```
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::uri::{Authority, Scheme};
//! use wirecall_proto::{
//!     CallStatus, CompletedResponse, LengthCheck, RawResponse, Target, interpret, request,
//! };
//!
//! let target = Target::new(Scheme::HTTP, Authority::from_static("127.0.0.1:15480"));
//! let req = request::build(&target, "pkg.Svc", "Get", b"\x08\x01").unwrap();
//! assert_eq!(req.uri().path(), "/pkg.Svc/Get");
//!
//! // An echo server would answer with the same framed body.
//! let completed = CompletedResponse::Received(RawResponse {
//!     status: http::StatusCode::OK,
//!     headers: http::HeaderMap::new(),
//!     body: req.body().clone(),
//!     trailers: None,
//! });
//! let result = interpret(completed, LengthCheck::Strict);
//! assert_eq!(result.status, CallStatus::Ok);
//! assert_eq!(&result.payload[..], b"\x08\x01");
//! ```

pub mod error;
pub mod message;
pub mod request;
pub mod response;

pub use error::{CallError, FrameError, GrpcStatus, TransportErrorCode};
pub use message::{FRAME_HEADER_SIZE, LengthCheck};
pub use request::{CallDescriptor, Target};
pub use response::{
    CallResult, CallStatus, CompletedResponse, RawResponse, TransportFailure, interpret,
};
