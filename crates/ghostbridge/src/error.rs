//! Error types for the bridge crate.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors that can occur while constructing or closing a bridge.
///
/// Authorization failures are not represented here: a request with a missing
/// or wrong bearer token is answered with `403 Forbidden` and the bridge keeps
/// serving.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Failed to generate the key pair or the self-signed certificate.
    #[error("failed to generate TLS identity: {0}")]
    Identity(#[from] rcgen::Error),

    /// The system randomness source could not be read.
    #[error("failed to read system randomness: {0}")]
    Randomness(#[source] rand::rand_core::OsError),

    /// Failed to build the TLS server configuration.
    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    /// Failed to bind the loopback listener.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },

    /// Construction was attempted outside a tokio runtime.
    #[error("a bridge must be constructed inside a tokio runtime")]
    NoRuntime,

    /// `close` was called on a bridge that is already closed.
    #[error("bridge is already closed")]
    AlreadyClosed,

    /// The accept loop task panicked or was aborted.
    #[error("serving task failed: {0}")]
    Serve(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_randomness_wraps_os_error() {
        // OsError has no public constructor; pin the variant's payload type.
        let _: fn(rand::rand_core::OsError) -> BridgeError = BridgeError::Randomness;
    }

    #[test]
    fn test_bind_keeps_io_source() {
        let err = BridgeError::Bind {
            address: SocketAddr::from(([127, 0, 0, 1], 0)),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        let source = err.source().unwrap();
        assert!(source.downcast_ref::<std::io::Error>().is_some());
        assert!(err.to_string().starts_with("failed to bind to 127.0.0.1:0"));
    }
}
