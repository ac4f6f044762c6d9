//! Request rewriting for requests addressed to the bridge.
//!
//! Callers address the bridge by a stable logical host name (by default
//! `ghost-bridge`) and never see the ephemeral port. The interceptor swaps the
//! logical host for `127.0.0.1:<port>` and attaches the bearer header.

use crate::error::ClientError;
use http::header::AUTHORIZATION;
use http::uri::{PathAndQuery, Scheme};
use http::{HeaderValue, Request, Uri};

/// Logical host name used when none is configured.
pub const DEFAULT_LOGICAL_HOST: &str = "ghost-bridge";

/// Rewrites requests for the logical host into authenticated requests for the
/// bridge's loopback endpoint.
#[derive(Clone)]
pub struct Interceptor {
    logical_host: String,
    port: u16,
    authorization: HeaderValue,
}

impl Interceptor {
    pub fn new(
        logical_host: impl Into<String>,
        port: u16,
        token: &str,
    ) -> Result<Self, ClientError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(ClientError::InvalidToken)?;
        authorization.set_sensitive(true);

        Ok(Self {
            logical_host: logical_host.into(),
            port,
            authorization,
        })
    }

    pub fn logical_host(&self) -> &str {
        &self.logical_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether `uri` addresses the bridge's logical host.
    pub fn targets_bridge(&self, uri: &Uri) -> bool {
        uri.host()
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.logical_host))
    }

    /// Redirect `req` to the bridge if it targets the logical host.
    ///
    /// Returns `false` and leaves the request untouched otherwise. Path, query,
    /// method, body and other headers are kept; any `Authorization` header
    /// already present is replaced.
    pub fn rewrite<B>(&self, req: &mut Request<B>) -> Result<bool, ClientError> {
        if !self.targets_bridge(req.uri()) {
            return Ok(false);
        }

        let path_and_query = req
            .uri()
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        let uri = Uri::builder()
            .scheme(Scheme::HTTPS)
            .authority(format!("127.0.0.1:{}", self.port))
            .path_and_query(path_and_query)
            .build()?;

        *req.uri_mut() = uri;
        req.headers_mut()
            .insert(AUTHORIZATION, self.authorization.clone());
        Ok(true)
    }
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("logical_host", &self.logical_host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}
