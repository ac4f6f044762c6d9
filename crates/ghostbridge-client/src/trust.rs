//! Pinned trust for the bridge's self-signed certificate.
//!
//! The bridge certificate is accepted by exact match. Every other server is
//! verified the usual way, by chain validation against a root store.

use crate::error::ClientError;
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;

/// Host name the bridge certificate is issued for, used as TLS server name.
pub const BRIDGE_SERVER_NAME: &str = "localhost";

/// Parse every `CERTIFICATE` block in `pem`.
pub fn parse_certificates(pem: &str) -> Result<Vec<CertificateDer<'static>>, ClientError> {
    let mut reader = pem.as_bytes();
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ClientError::Pem)?;
    if certs.is_empty() {
        return Err(ClientError::NoCertificate);
    }
    Ok(certs)
}

/// The public web roots shipped with `webpki-roots`.
pub fn default_roots() -> RootCertStore {
    RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    }
}

/// Accepts the pinned certificates as-is and hands every other server
/// certificate to a chain-validating verifier.
#[derive(Debug)]
pub struct PinnedServerVerifier {
    pinned: Vec<CertificateDer<'static>>,
    fallback: Arc<WebPkiServerVerifier>,
}

impl PinnedServerVerifier {
    pub fn new(
        pinned: Vec<CertificateDer<'static>>,
        fallback_roots: RootCertStore,
        provider: Arc<CryptoProvider>,
    ) -> Result<Self, ClientError> {
        let fallback =
            WebPkiServerVerifier::builder_with_provider(Arc::new(fallback_roots), provider)
                .build()?;
        Ok(Self { pinned, fallback })
    }

    fn is_pinned(&self, cert: &CertificateDer<'_>) -> bool {
        self.pinned.iter().any(|p| p.as_ref() == cert.as_ref())
    }
}

impl ServerCertVerifier for PinnedServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if self.is_pinned(end_entity) {
            return Ok(ServerCertVerified::assertion());
        }
        self.fallback
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    // Signatures are checked against the presented leaf key for pinned and
    // chained certificates alike.
    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.fallback.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.fallback.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.fallback.supported_verify_schemes()
    }
}

/// Build a TLS client configuration that trusts the certificate in
/// `cert_pem` and falls back to the public web roots for everything else.
pub fn pinned_client_config(cert_pem: &str) -> Result<Arc<ClientConfig>, ClientError> {
    pinned_client_config_with_roots(cert_pem, default_roots())
}

/// Like [`pinned_client_config`], with an explicit fallback root store.
pub fn pinned_client_config_with_roots(
    cert_pem: &str,
    fallback_roots: RootCertStore,
) -> Result<Arc<ClientConfig>, ClientError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = PinnedServerVerifier::new(
        parse_certificates(cert_pem)?,
        fallback_roots,
        provider.clone(),
    )?;

    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}
