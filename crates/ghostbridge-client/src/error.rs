//! Error types for the client crate.

use thiserror::Error;

/// Errors raised while installing trust for a bridge or talking to it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The certificate PEM could not be read.
    #[error("failed to parse certificate PEM: {0}")]
    Pem(#[source] std::io::Error),

    /// The PEM text held no `CERTIFICATE` block.
    #[error("no certificate found in PEM")]
    NoCertificate,

    /// The certificate could not be installed as a trust anchor, or the TLS
    /// client configuration was rejected.
    #[error("TLS trust error: {0}")]
    Trust(#[from] rustls::Error),

    /// The fallback chain verifier could not be built from its root store.
    #[error("failed to build certificate verifier: {0}")]
    Verifier(#[from] rustls::client::VerifierBuilderError),

    /// The request host is not a valid TLS server name.
    #[error("invalid TLS server name: {0}")]
    ServerName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// The token cannot be carried in an HTTP header.
    #[error("bearer token is not a valid header value")]
    InvalidToken(#[source] http::header::InvalidHeaderValue),

    /// The request URI has no host to connect to.
    #[error("request URI {0} has no host")]
    MissingHost(http::Uri),

    /// The request URI scheme is neither `http` nor `https`.
    #[error("unsupported URI scheme {0:?}")]
    UnsupportedScheme(Option<String>),

    /// Failed to rebuild the request URI.
    #[error("invalid request URI: {0}")]
    Uri(#[from] http::Error),

    /// Failed to open the TCP connection.
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// The TLS handshake failed, typically because the server presented
    /// neither the pinned certificate nor one that chains to a trusted root.
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    /// HTTP exchange failed.
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),
}
