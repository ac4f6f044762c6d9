//! The bridge handle: construction, bootstrap accessors and close.

use crate::auth;
use crate::error::BridgeError;
use crate::identity::Identity;
use crate::listener::SecureListener;
use crate::token::BearerToken;
use axum::extract::Request;
use axum::response::IntoResponse;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::Service;

/// An HTTPS server on an ephemeral loopback port that only answers clients
/// trusting its self-signed certificate and presenting its bearer token.
///
/// The port, certificate and token are fixed when the bridge is built and
/// never change afterwards; the accessors are plain reads and need no
/// synchronization. Rotating either secret would mean building a new bridge.
///
/// Dropping a bridge without calling [`Bridge::close`] still stops the
/// accept loop, but does not wait for the socket to be released.
pub struct Bridge {
    local_addr: SocketAddr,
    cert: String,
    token: BearerToken,
    serving: Mutex<Option<Serving>>,
}

struct Serving {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Bridge {
    /// Generate a fresh identity and token, bind a loopback TLS listener and
    /// start serving `handler` behind the bearer guard.
    ///
    /// Returns as soon as the listener is bound and the serving task is
    /// spawned. Must be called from within a tokio runtime. On error nothing
    /// is left behind: no socket stays bound and no task is running.
    pub fn new<H>(handler: H) -> Result<Self, BridgeError>
    where
        H: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        H::Response: IntoResponse + 'static,
        H::Future: Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;

        let identity = Identity::generate()?;
        let cert = identity.cert_pem().to_string();
        let token = BearerToken::generate()?;

        let listener = SecureListener::bind(identity.into_server_config()?)?;
        let local_addr = listener.local_addr();

        let router = auth::guard(handler, token.clone());
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = runtime.spawn(listener.serve(router, shutdown_rx));

        tracing::info!(port = local_addr.port(), "Ghost bridge listening");

        Ok(Self {
            local_addr,
            cert,
            token,
            serving: Mutex::new(Some(Serving { shutdown, task })),
        })
    }

    /// The loopback port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// The full listening address, always `127.0.0.1:<port>`.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The self-signed certificate as a PEM `CERTIFICATE` block.
    pub fn cert(&self) -> &str {
        &self.cert
    }

    /// The bearer token clients must send as `Authorization: Bearer <token>`.
    pub fn token(&self) -> &str {
        self.token.as_str()
    }

    /// Whether [`Bridge::close`] has already run.
    pub fn is_closed(&self) -> bool {
        self.lock_serving().is_none()
    }

    /// Stop accepting connections and release the listening socket.
    ///
    /// Connections already being served are left to finish. Closing twice
    /// returns [`BridgeError::AlreadyClosed`].
    pub async fn close(&self) -> Result<(), BridgeError> {
        let serving = self.lock_serving().take();
        let Some(Serving { shutdown, task }) = serving else {
            return Err(BridgeError::AlreadyClosed);
        };

        // The loop only ends early if it panicked; the join below reports that.
        let _ = shutdown.send(());
        task.await?;

        tracing::info!(port = self.port(), "Ghost bridge closed");
        Ok(())
    }

    fn lock_serving(&self) -> std::sync::MutexGuard<'_, Option<Serving>> {
        self.serving.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("local_addr", &self.local_addr)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
