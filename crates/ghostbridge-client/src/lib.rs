//! # ghostbridge-client
//!
//! The host side of a ghostbridge. Given the three bootstrap values a bridge
//! exposes (port, certificate PEM, token), this crate:
//! - trusts that certificate by exact match for TLS, while every other
//!   server is still verified against a root store ([`trust`])
//! - redirects requests for a stable logical host (default `ghost-bridge`)
//!   to `127.0.0.1:<port>` and attaches `Authorization: Bearer <token>`
//!   ([`interceptor`])
//! - sends such requests over a pinned HTTPS connection, and passes requests
//!   for any other host through unchanged ([`BridgeClient`])
//!
//! Callers therefore never hard-code the ephemeral port or handle the token.

pub mod client;
pub mod error;
pub mod interceptor;
pub mod trust;

pub use client::{Bootstrap, BridgeClient, ClientOptions};
pub use error::ClientError;
pub use interceptor::{DEFAULT_LOGICAL_HOST, Interceptor};
pub use trust::{PinnedServerVerifier, pinned_client_config, pinned_client_config_with_roots};
