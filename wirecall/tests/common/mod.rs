//! In-process HTTP/2 gRPC server for integration tests.
//!
//! Each server runs on its own tokio runtime and answers every request the
//! same way, recording what it received.

#![allow(dead_code)]

use std::future::poll_fn;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use h2::server::SendResponse;
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio_rustls::TlsAcceptor;

pub const STATS_SERVICE: &str = "v2ray.core.app.stats.command.StatsService";
pub const UPLINK_QUERY: &[u8] = b"\n'inbound>>>socks-in-1>>>traffic>>>uplink";

/// How the server answers.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Echo the request body with `grpc-status: 0` in trailers.
    Echo,
    /// Headers, empty body, then `grpc-status`/`grpc-message` trailers.
    Status(u32, &'static str),
    /// A single HEADERS frame carrying `grpc-status`, end of stream.
    TrailersOnly(u32),
    /// A non-200 HTTP status, end of stream.
    Http(u16),
    /// This exact body with `grpc-status: 0`.
    Body(&'static [u8]),
    /// Read the request, never answer, record the reset.
    Never,
}

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: http::Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Default)]
pub struct Log {
    pub connections: AtomicUsize,
    pub requests: Mutex<Vec<Seen>>,
    pub resets: Mutex<Vec<h2::Reason>>,
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub log: Arc<Log>,
    _runtime: Runtime,
}

impl MockServer {
    pub fn start(reply: Reply) -> Self {
        Self::spawn(reply, None)
    }

    pub fn start_tls(reply: Reply, config: Arc<rustls::ServerConfig>) -> Self {
        Self::spawn(reply, Some(TlsAcceptor::from(config)))
    }

    fn spawn(reply: Reply, acceptor: Option<TlsAcceptor>) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("mock-grpc")
            .enable_all()
            .build()
            .unwrap();

        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Log::default());

        runtime.spawn(accept_loop(listener, acceptor, reply, Arc::clone(&log)));

        Self {
            addr,
            log,
            _runtime: runtime,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.log.requests.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.log.connections.load(Ordering::SeqCst)
    }

    /// Wait up to `limit` for the server to see a stream reset.
    pub fn wait_for_reset(&self, limit: Duration) -> Option<h2::Reason> {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if let Some(reason) = self.log.resets.lock().unwrap().first() {
                return Some(*reason);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        None
    }
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
    reply: Reply,
    log: Arc<Log>,
) {
    while let Ok((tcp, _)) = listener.accept().await {
        log.connections.fetch_add(1, Ordering::SeqCst);
        let acceptor = acceptor.clone();
        let reply = reply.clone();
        let log = Arc::clone(&log);
        tokio::spawn(async move {
            match acceptor {
                Some(acceptor) => {
                    if let Ok(tls) = acceptor.accept(tcp).await {
                        serve_conn(tls, reply, log).await;
                    }
                }
                None => serve_conn(tcp, reply, log).await,
            }
        });
    }
}

async fn serve_conn<T>(io: T, reply: Reply, log: Arc<Log>)
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let Ok(mut conn) = h2::server::handshake(io).await else {
        return;
    };
    while let Some(Ok((request, respond))) = conn.accept().await {
        tokio::spawn(handle(request, respond, reply.clone(), Arc::clone(&log)));
    }
}

async fn handle(
    request: Request<h2::RecvStream>,
    mut respond: SendResponse<Bytes>,
    reply: Reply,
    log: Arc<Log>,
) {
    let (parts, mut recv) = request.into_parts();
    let mut body = BytesMut::new();
    while let Some(chunk) = recv.data().await {
        let Ok(chunk) = chunk else { return };
        let _ = recv.flow_control().release_capacity(chunk.len());
        body.extend_from_slice(&chunk);
    }
    let body = body.freeze();

    log.requests.lock().unwrap().push(Seen {
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body: body.clone(),
    });

    match reply {
        Reply::Echo => respond_ok(&mut respond, body, grpc_trailers(0, None)),
        Reply::Body(bytes) => respond_ok(&mut respond, Bytes::from_static(bytes), grpc_trailers(0, None)),
        Reply::Status(code, message) => {
            respond_ok(&mut respond, Bytes::new(), grpc_trailers(code, Some(message)))
        }
        Reply::TrailersOnly(code) => {
            let response = Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/grpc")
                .header("grpc-status", code.to_string())
                .body(())
                .unwrap();
            let _ = respond.send_response(response, true);
        }
        Reply::Http(status) => {
            let response = Response::builder().status(status).body(()).unwrap();
            let _ = respond.send_response(response, true);
        }
        Reply::Never => {
            if let Ok(reason) = poll_fn(|cx| respond.poll_reset(cx)).await {
                log.resets.lock().unwrap().push(reason);
            }
        }
    }
}

fn respond_ok(respond: &mut SendResponse<Bytes>, body: Bytes, trailers: HeaderMap) {
    let response = Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/grpc")
        .body(())
        .unwrap();
    let Ok(mut stream) = respond.send_response(response, false) else {
        return;
    };
    if !body.is_empty() {
        let _ = stream.send_data(body, false);
    }
    let _ = stream.send_trailers(trailers);
}

fn grpc_trailers(code: u32, message: Option<&'static str>) -> HeaderMap {
    let mut trailers = HeaderMap::new();
    trailers.insert("grpc-status", HeaderValue::from(code));
    if let Some(message) = message {
        trailers.insert("grpc-message", HeaderValue::from_static(message));
    }
    trailers
}

// -- TLS --

pub fn generate_self_signed() -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());
    let cert_der = CertificateDer::from(cert.cert);
    (vec![cert_der], key.into())
}

pub fn server_tls_config(
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Arc<rustls::ServerConfig> {
    let mut config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .unwrap();
    config.alpn_protocols = vec![b"h2".to_vec()];
    Arc::new(config)
}

pub fn client_tls_config(certs: &[CertificateDer<'static>]) -> Arc<rustls::ClientConfig> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in certs {
        roots.add(cert.clone()).unwrap();
    }
    let mut config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![wirecall::ALPN_H2.to_vec()];
    Arc::new(config)
}
