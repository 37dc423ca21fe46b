//! Target origin of a channel.

use std::sync::Arc;

use http::Uri;
use http::uri::Scheme;
use wirecall_proto::Target;

use crate::error::EndpointError;

/// ALPN protocol id for HTTP/2 over TLS.
pub const ALPN_H2: &[u8] = b"h2";

/// Scheme assumed when a URL has none.
pub const DEFAULT_SCHEME: &str = "http";

/// Where calls go, and how to secure the connection.
///
/// Immutable once handed to a channel.
#[derive(Clone)]
pub struct Endpoint {
    target: Target,
    host: String,
    port: u16,
    tls: Option<Arc<rustls::ClientConfig>>,
}

impl Endpoint {
    /// Parse a URL such as `http://127.0.0.1:15480` or `example.com:443`.
    ///
    /// A URL without a scheme is treated as `http`. Any path is ignored;
    /// each call sets its own. `https` endpoints get [`default_tls_config`].
    pub fn parse(url: &str) -> Result<Self, EndpointError> {
        let uri: Uri = if url.contains("://") {
            url.parse()?
        } else {
            format!("{DEFAULT_SCHEME}://{url}").parse()?
        };

        let scheme = match uri.scheme_str() {
            Some(s) if s.eq_ignore_ascii_case("http") => Scheme::HTTP,
            Some(s) if s.eq_ignore_ascii_case("https") => Scheme::HTTPS,
            Some(other) => return Err(EndpointError::UnsupportedScheme(other.to_string())),
            None => return Err(EndpointError::MissingHost(url.to_string())),
        };

        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| EndpointError::MissingHost(url.to_string()))?;

        // IPv6 literals keep their brackets in the authority only.
        let host = authority
            .host()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        if host.is_empty() {
            return Err(EndpointError::MissingHost(url.to_string()));
        }

        let secure = scheme == Scheme::HTTPS;
        let port = authority.port_u16().unwrap_or(if secure { 443 } else { 80 });

        Ok(Self {
            target: Target::new(scheme, authority),
            host,
            port,
            tls: secure.then(default_tls_config),
        })
    }

    /// Replace the TLS configuration used for `https` endpoints.
    ///
    /// The config should advertise [`ALPN_H2`].
    pub fn with_tls_config(mut self, config: Arc<rustls::ClientConfig>) -> Self {
        self.tls = Some(config);
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.target.is_secure()
    }

    /// TLS config to dial with, `None` for plaintext endpoints.
    pub fn tls_config(&self) -> Option<&Arc<rustls::ClientConfig>> {
        if self.is_secure() {
            self.tls.as_ref()
        } else {
            None
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("target", &self.target.to_string())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls.is_some())
            .finish()
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.target.fmt(f)
    }
}

/// TLS config trusting the webpki roots, negotiating HTTP/2.
pub fn default_tls_config() -> Arc<rustls::ClientConfig> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let mut config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![ALPN_H2.to_vec()];
    Arc::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_scheme_defaults_to_http() {
        let ep = Endpoint::parse("127.0.0.1:15480").unwrap();
        assert_eq!(ep.target().scheme(), &Scheme::HTTP);
        assert_eq!(ep.host(), "127.0.0.1");
        assert_eq!(ep.port(), 15480);
        assert!(!ep.is_secure());
        assert!(ep.tls_config().is_none());
        assert_eq!(ep.to_string(), "http://127.0.0.1:15480");
    }

    #[test]
    fn hostname_without_scheme() {
        let ep = Endpoint::parse("localhost:50051").unwrap();
        assert_eq!(ep.host(), "localhost");
        assert_eq!(ep.port(), 50051);
        assert!(!ep.is_secure());
    }

    #[test]
    fn https_gets_default_tls() {
        let ep = Endpoint::parse("https://example.com").unwrap();
        assert!(ep.is_secure());
        assert_eq!(ep.port(), 443);
        let tls = ep.tls_config().unwrap();
        assert_eq!(tls.alpn_protocols, vec![b"h2".to_vec()]);
    }

    #[test]
    fn default_http_port() {
        let ep = Endpoint::parse("http://example.com/ignored/path").unwrap();
        assert_eq!(ep.port(), 80);
        assert_eq!(ep.target().authority().as_str(), "example.com");
    }

    #[test]
    fn ipv6_literal() {
        let ep = Endpoint::parse("http://[::1]:50051").unwrap();
        assert_eq!(ep.host(), "::1");
        assert_eq!(ep.port(), 50051);
        assert_eq!(ep.target().authority().as_str(), "[::1]:50051");
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(
            Endpoint::parse("ftp://example.com"),
            Err(EndpointError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Endpoint::parse("http://exa mple.com").is_err());
        assert!(Endpoint::parse("").is_err());
    }

    #[test]
    fn tls_config_ignored_for_plaintext() {
        let ep = Endpoint::parse("http://127.0.0.1:1").unwrap().with_tls_config(default_tls_config());
        assert!(ep.tls_config().is_none());
    }
}
