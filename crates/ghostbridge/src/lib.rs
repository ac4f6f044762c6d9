//! # ghostbridge
//!
//! A secure in-process HTTPS bridge between a host application's UI layer and
//! a Rust service, bootstrapped with no pre-shared secret, no fixed port and
//! no certificate authority.
//!
//! Building a [`Bridge`] does three things:
//! - generates an ECDSA P-256 key and a self-signed certificate for
//!   `localhost`, valid for one year
//! - draws a 256-bit random bearer token
//! - binds a TLS listener on an OS-assigned loopback port and serves the
//!   given handler behind a bearer token check
//!
//! The host then hands the three bootstrap values (port, certificate PEM,
//! token) to its HTTP client, which pins the certificate and attaches
//! `Authorization: Bearer <token>` to every request.
//!
//! ```text
//!  UI layer (HTTP client)
//!        │  https://127.0.0.1:<port>
//!        │  Authorization: Bearer <token>
//!        ▼
//! ┌──────────────────────┐
//! │  TLS (self-signed)   │  ← identity
//! │  Bearer guard        │  ← token, auth  (403 on mismatch)
//! │  Wrapped handler     │
//! └──────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use axum::Router;
//! use ghostbridge::Bridge;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ghostbridge::BridgeError> {
//!     let app = Router::new().fallback(|| async { "Yay, it works!" });
//!     let bridge = Bridge::new(app)?;
//!
//!     println!("port:  {}", bridge.port());
//!     println!("token: {}", bridge.token());
//!     println!("{}", bridge.cert());
//!
//!     bridge.close().await
//! }
//! ```

pub mod auth;
pub mod bridge;
pub mod error;
pub mod identity;
pub mod listener;
pub mod token;

pub use bridge::Bridge;
pub use error::BridgeError;
pub use identity::Identity;
pub use listener::SecureListener;
pub use token::BearerToken;
