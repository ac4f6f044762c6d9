//! Loopback TLS listener and its accept loop.

use crate::error::BridgeError;
use axum::Router;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use rustls::ServerConfig;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;
use tower::Service;

/// Pause after an accept error before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A TCP listener bound to an OS-assigned loopback port, paired with the TLS
/// acceptor for the bridge identity.
pub struct SecureListener {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    local_addr: SocketAddr,
}

impl SecureListener {
    /// Bind `127.0.0.1:0` and wrap it with `server_config`.
    ///
    /// Binding is synchronous; it must run inside a tokio runtime so the
    /// socket can be registered with the reactor.
    pub fn bind(server_config: Arc<ServerConfig>) -> Result<Self, BridgeError> {
        let address = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        let bind_failed = |source| BridgeError::Bind { address, source };

        let std_listener = std::net::TcpListener::bind(address).map_err(bind_failed)?;
        std_listener.set_nonblocking(true).map_err(bind_failed)?;
        let listener = TcpListener::from_std(std_listener).map_err(bind_failed)?;
        let local_addr = listener.local_addr().map_err(bind_failed)?;

        Ok(Self {
            listener,
            acceptor: TlsAcceptor::from(server_config),
            local_addr,
        })
    }

    /// The address the socket is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The OS-assigned port.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Accept connections and serve `router` on each of them until `shutdown`
    /// fires or its sender is dropped.
    ///
    /// Every connection runs on its own task and outlives the loop; only the
    /// listening socket is released when this returns.
    pub async fn serve(self, router: Router, mut shutdown: oneshot::Receiver<()>) {
        let Self {
            listener,
            acceptor,
            local_addr,
        } = self;

        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(ACCEPT_BACKOFF) => continue,
                    }
                }
            };

            tracing::trace!(peer = %peer, "New connection");
            tokio::spawn(serve_connection(
                stream,
                peer,
                acceptor.clone(),
                router.clone(),
            ));
        }

        drop(listener);
        tracing::debug!(address = %local_addr, "Listener closed");
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    acceptor: TlsAcceptor,
    router: Router,
) {
    let tls = match acceptor.accept(stream).await {
        Ok(tls) => tls,
        Err(e) => {
            tracing::debug!(peer = %peer, error = %e, "TLS handshake failed");
            return;
        }
    };

    let service = hyper::service::service_fn(move |req: hyper::Request<Incoming>| {
        router.clone().call(req)
    });

    if let Err(e) = Builder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(tls), service)
        .await
    {
        tracing::debug!(peer = %peer, error = %e, "Connection error");
    }
}
