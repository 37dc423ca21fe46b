//! gRPC request construction.
//!
//! Produces an `http::Request<Bytes>` whose body is already length-prefixed,
//! ready for any HTTP/2 client.

use bytes::Bytes;
use http::header::{ACCEPT_ENCODING, CONTENT_TYPE, TE};
use http::uri::{Authority, Scheme};
use http::{Method, Request, Uri, Version};

use crate::message;

/// Media type of gRPC requests and responses.
pub const GRPC_CONTENT_TYPE: &str = "application/grpc";

/// Message encodings the client advertises to the server.
pub const GRPC_ACCEPT_ENCODING: &str = "grpc-accept-encoding";
pub const GRPC_ACCEPT_ENCODING_VALUE: &str = "identity,deflate,gzip";

/// Transfer encodings advertised on the HTTP layer.
pub const ACCEPT_ENCODING_VALUE: &str = "identity,gzip";

/// `te` value that requests trailer support.
pub const TE_TRAILERS: &str = "trailers";

/// The scheme + authority a request is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    scheme: Scheme,
    authority: Authority,
}

impl Target {
    pub fn new(scheme: Scheme, authority: Authority) -> Self {
        Self { scheme, authority }
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Whether requests to this target travel over TLS.
    pub fn is_secure(&self) -> bool {
        self.scheme == Scheme::HTTPS
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// One call: what to invoke and with which payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescriptor {
    pub service: String,
    pub method: String,
    pub payload: Bytes,
    /// Streaming calls get no implicit deadline; the caller owns the handle.
    pub streaming: bool,
}

impl CallDescriptor {
    /// A unary call.
    pub fn unary(service: impl Into<String>, method: impl Into<String>, payload: Bytes) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            payload,
            streaming: false,
        }
    }

    /// A call whose lifetime the caller manages.
    pub fn streaming(
        service: impl Into<String>,
        method: impl Into<String>,
        payload: Bytes,
    ) -> Self {
        Self {
            streaming: true,
            ..Self::unary(service, method, payload)
        }
    }

    /// `/<service>/<method>`.
    pub fn path(&self) -> String {
        call_path(&self.service, &self.method)
    }
}

/// `/<service>/<method>`. Names are not validated.
pub fn call_path(service: &str, method: &str) -> String {
    format!("/{service}/{method}")
}

/// Build the HTTP/2 request for a call.
///
/// Fails only when `service`/`method` cannot form a URI path.
pub fn build(
    target: &Target,
    service: &str,
    method: &str,
    payload: &[u8],
) -> Result<Request<Bytes>, http::Error> {
    let uri = Uri::builder()
        .scheme(target.scheme.clone())
        .authority(target.authority.clone())
        .path_and_query(call_path(service, method))
        .build()?;

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .version(Version::HTTP_2)
        .header(CONTENT_TYPE, GRPC_CONTENT_TYPE)
        .header(GRPC_ACCEPT_ENCODING, GRPC_ACCEPT_ENCODING_VALUE)
        .header(ACCEPT_ENCODING, ACCEPT_ENCODING_VALUE)
        .header(TE, TE_TRAILERS)
        .body(message::encode_to_bytes(payload))
}

/// [`build`] for a [`CallDescriptor`].
pub fn build_call(target: &Target, call: &CallDescriptor) -> Result<Request<Bytes>, http::Error> {
    build(target, &call.service, &call.method, &call.payload)
}
