//! A minimal HTTPS client bound to one bridge.

use crate::error::ClientError;
use crate::interceptor::{DEFAULT_LOGICAL_HOST, Interceptor};
use crate::trust::{BRIDGE_SERVER_NAME, default_roots, pinned_client_config_with_roots};
use bytes::Bytes;
use http::header::HOST;
use http::{HeaderValue, Request, Response, Uri};
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper_util::rt::TokioIo;
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// The three values a bridge hands to its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bootstrap {
    /// Loopback port the bridge listens on.
    pub port: u16,
    /// The bridge's self-signed certificate, PEM encoded.
    pub cert: String,
    /// Bearer token expected in the `Authorization` header.
    pub token: String,
}

impl Bootstrap {
    pub fn new(port: u16, cert: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            port,
            cert: cert.into(),
            token: token.into(),
        }
    }
}

/// Client-side options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Host name callers use to address the bridge.
    #[serde(default = "default_logical_host")]
    pub logical_host: String,
}

fn default_logical_host() -> String {
    DEFAULT_LOGICAL_HOST.to_string()
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            logical_host: default_logical_host(),
        }
    }
}

/// Sends requests to a bridge over TLS pinned to its certificate.
///
/// Requests for the logical host go to the bridge. Anything else is sent to
/// its own host unchanged, verified against the fallback roots. Each call to
/// [`BridgeClient::send`] opens a fresh connection.
#[derive(Clone)]
pub struct BridgeClient {
    interceptor: Interceptor,
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl BridgeClient {
    /// Build a client whose fallback trust is the public web roots.
    pub fn new(bootstrap: &Bootstrap, options: &ClientOptions) -> Result<Self, ClientError> {
        Self::with_roots(bootstrap, options, default_roots())
    }

    /// Build a client with an explicit fallback root store.
    pub fn with_roots(
        bootstrap: &Bootstrap,
        options: &ClientOptions,
        fallback_roots: RootCertStore,
    ) -> Result<Self, ClientError> {
        let connector = TlsConnector::from(pinned_client_config_with_roots(
            &bootstrap.cert,
            fallback_roots,
        )?);
        let interceptor = Interceptor::new(
            options.logical_host.clone(),
            bootstrap.port,
            &bootstrap.token,
        )?;
        Ok(Self {
            interceptor,
            connector,
            server_name: ServerName::try_from(BRIDGE_SERVER_NAME)?,
        })
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Send a request and collect the response.
    ///
    /// A request for the logical host is redirected to the bridge and gains
    /// the bearer header. Any other absolute `http` or `https` request is sent
    /// as given. Method, path, query, other headers and body are never changed.
    pub async fn send<B>(&self, mut req: Request<B>) -> Result<Response<Bytes>, ClientError>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let to_bridge = self.interceptor.rewrite(&mut req)?;

        let uri = req.uri().clone();
        let secure = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            other => return Err(ClientError::UnsupportedScheme(other.map(str::to_string))),
        };
        let host = uri
            .host()
            .ok_or_else(|| ClientError::MissingHost(uri.clone()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = uri.port_u16().unwrap_or(if secure { 443 } else { 80 });
        tracing::debug!(%host, port, bridge = to_bridge, "Sending request");

        // HTTP/1.1 on the wire: origin-form target plus an explicit Host.
        let (mut parts, body) = req.into_parts();
        if let Some(authority) = parts.uri.authority() {
            let value = HeaderValue::from_str(authority.as_str())
                .map_err(|e| ClientError::Uri(e.into()))?;
            parts.headers.entry(HOST).or_insert(value);
        }
        if let Some(path_and_query) = parts.uri.path_and_query().cloned() {
            parts.uri = Uri::from(path_and_query);
        }
        let req = Request::from_parts(parts, body);

        let tcp = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|source| ClientError::Connect {
                host: host.clone(),
                port,
                source,
            })?;

        if !secure {
            return exchange(tcp, req).await;
        }

        let server_name = if to_bridge {
            self.server_name.clone()
        } else {
            ServerName::try_from(host)?
        };
        let tls = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(ClientError::Handshake)?;
        exchange(tls, req).await
    }
}

/// Run one HTTP/1.1 request over `io` and collect the response body.
async fn exchange<IO, B>(io: IO, req: Request<B>) -> Result<Response<Bytes>, ClientError>
where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(io)).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(error = %e, "Connection error");
        }
    });

    let response = sender.send_request(req).await?;
    let (parts, body) = response.into_parts();
    let body = body.collect().await?.to_bytes();
    Ok(Response::from_parts(parts, body))
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("interceptor", &self.interceptor)
            .finish_non_exhaustive()
    }
}
