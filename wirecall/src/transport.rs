//! HTTP/2 transport adapter.
//!
//! Each call is one exchange spawned on the channel's runtime. The caller
//! gets a [`PendingResponse`] whose completion is delivered through a
//! one-shot channel. The connection is dialed lazily and reused while it
//! stays open.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use h2::client::SendRequest;
use http::Request;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, trace};
use wirecall_proto::RawResponse;

use crate::endpoint::Endpoint;
use crate::error::TransportError;
use crate::metrics;

type Outcome = Result<RawResponse, TransportError>;

/// Lifecycle of a [`PendingResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState {
    Running,
    Finished,
    Aborted,
}

/// Handle to one in-flight exchange.
///
/// Dropping the handle cancels the exchange if it is still running.
#[derive(Debug)]
pub struct PendingResponse {
    done: Option<oneshot::Receiver<Outcome>>,
    abort: Option<oneshot::Sender<()>>,
    state: PendingState,
    streaming: bool,
}

impl PendingResponse {
    pub fn state(&self) -> PendingState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Cancel the exchange. The underlying HTTP/2 stream is reset.
    ///
    /// Returns `true` for the first call only. If the exchange already
    /// completed, its result is still returned by [`finish`](Self::finish).
    pub fn abort(&mut self) -> bool {
        let Some(abort) = self.abort.take() else {
            return false;
        };
        let _ = abort.send(());
        if self.state == PendingState::Running {
            self.state = PendingState::Aborted;
        }
        true
    }

    /// Wait for the exchange to reach a terminal state.
    ///
    /// The result can be taken once; later calls return
    /// [`TransportError::Dropped`].
    pub async fn finish(&mut self) -> Outcome {
        let Some(done) = self.done.as_mut() else {
            return Err(TransportError::Dropped);
        };
        let outcome = done.await.unwrap_or(Err(TransportError::Dropped));
        self.done = None;
        self.abort = None;
        self.state = match &outcome {
            Err(TransportError::Aborted) => PendingState::Aborted,
            _ => PendingState::Finished,
        };
        outcome
    }
}

/// Sends requests to one endpoint over a shared HTTP/2 connection.
pub struct Transport {
    endpoint: Arc<Endpoint>,
    connect_timeout: Option<Duration>,
    sender: Mutex<Option<SendRequest<Bytes>>>,
}

impl Transport {
    pub fn new(endpoint: Arc<Endpoint>, connect_timeout: Option<Duration>) -> Self {
        Self {
            endpoint,
            connect_timeout,
            sender: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Start an exchange on `runtime` and return immediately.
    pub fn send(
        self: &Arc<Self>,
        runtime: &Handle,
        request: Request<Bytes>,
        streaming: bool,
    ) -> PendingResponse {
        let (done_tx, done_rx) = oneshot::channel();
        let (abort_tx, abort_rx) = oneshot::channel::<()>();
        let transport = Arc::clone(self);

        metrics::CALLS_STARTED.increment();

        runtime.spawn(async move {
            // Losing the race drops the exchange future, and with it the
            // h2 stream handles, which resets the stream with CANCEL.
            let outcome = tokio::select! {
                outcome = transport.exchange(request) => outcome,
                _ = abort_rx => Err(TransportError::Aborted),
            };
            let _ = done_tx.send(outcome);
        });

        PendingResponse {
            done: Some(done_rx),
            abort: Some(abort_tx),
            state: PendingState::Running,
            streaming,
        }
    }

    async fn exchange(&self, request: Request<Bytes>) -> Outcome {
        let mut sender = self.ready_sender().await?;

        let (parts, body) = request.into_parts();
        let sent = body.len();
        let (response, mut stream) = sender.send_request(Request::from_parts(parts, ()), false)?;
        stream.send_data(body, true)?;
        metrics::BYTES_SENT.add(sent as u64);

        let response = response.await?;
        let (parts, mut recv) = response.into_parts();

        let mut body = BytesMut::new();
        while let Some(chunk) = recv.data().await {
            let chunk = chunk?;
            let _ = recv.flow_control().release_capacity(chunk.len());
            body.extend_from_slice(&chunk);
        }
        let trailers = recv.trailers().await?;
        metrics::BYTES_RECEIVED.add(body.len() as u64);

        trace!(status = %parts.status, len = body.len(), trailers = trailers.is_some(), "response complete");

        Ok(RawResponse {
            status: parts.status,
            headers: parts.headers,
            body: body.freeze(),
            trailers,
        })
    }

    /// The cached sender once it has stream capacity, or a fresh connection.
    async fn ready_sender(&self) -> Result<SendRequest<Bytes>, TransportError> {
        let cached = self.sender.lock().await.clone();
        if let Some(sender) = cached {
            match sender.ready().await {
                Ok(sender) => return Ok(sender),
                Err(e) => debug!(error = %e, "cached connection unusable, reconnecting"),
            }
        }

        let mut slot = self.sender.lock().await;
        let sender = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, self.connect())
                .await
                .map_err(|_| TransportError::ConnectTimeout(limit))??,
            None => self.connect().await?,
        };
        *slot = Some(sender.clone());
        drop(slot);

        Ok(sender.ready().await?)
    }

    async fn connect(&self) -> Result<SendRequest<Bytes>, TransportError> {
        let host = self.endpoint.host();
        let tcp = dial(host, self.endpoint.port()).await?;

        match self.endpoint.tls_config() {
            Some(config) => {
                let name = rustls::pki_types::ServerName::try_from(host.to_owned())
                    .map_err(|_| TransportError::ServerName(host.to_owned()))?;
                let tls = tokio_rustls::TlsConnector::from(Arc::clone(config))
                    .connect(name, tcp)
                    .await
                    .map_err(TransportError::Tls)?;
                if tls.get_ref().1.alpn_protocol() != Some(crate::endpoint::ALPN_H2) {
                    debug!(%host, "server did not negotiate h2 via alpn");
                }
                handshake(tls, &self.endpoint).await
            }
            None => handshake(tcp, &self.endpoint).await,
        }
    }
}

async fn dial(host: &str, port: u16) -> Result<TcpStream, TransportError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolve {
            host: host.to_owned(),
            source,
        })?
        .collect();

    let mut last = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                stream
                    .set_nodelay(true)
                    .map_err(|source| TransportError::Connect { addr, source })?;
                debug!(%addr, "tcp connected");
                return Ok(stream);
            }
            Err(source) => {
                trace!(%addr, error = %source, "connect attempt failed");
                last = Some(TransportError::Connect { addr, source });
            }
        }
    }
    Err(last.unwrap_or_else(|| TransportError::NoAddress(host.to_owned())))
}

async fn handshake<T>(io: T, endpoint: &Endpoint) -> Result<SendRequest<Bytes>, TransportError>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sender, connection) = h2::client::handshake(io).await?;
    metrics::CONNECTIONS_OPENED.increment();
    debug!(%endpoint, "http/2 connection established");

    let target = endpoint.to_string();
    tokio::spawn(async move {
        match connection.await {
            Ok(()) => debug!(%target, "http/2 connection closed"),
            Err(e) => debug!(%target, error = %e, "http/2 connection failed"),
        }
    });

    Ok(sender)
}
