//! Self-signed TLS identity for the bridge listener.
//!
//! Every bridge gets a fresh ECDSA P-256 key pair and a self-signed leaf
//! certificate for `localhost`. Trust in the certificate is established by
//! handing its PEM to the client in-process, never by chain validation, so
//! subject, serial and validity are fixed policy rather than parameters.

use crate::error::BridgeError;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose, PKCS_ECDSA_P256_SHA256, SerialNumber,
};
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// Host name the certificate is issued for.
pub const LOOPBACK_HOST: &str = "localhost";

/// Organization placed in the certificate subject.
pub const ORGANIZATION: &str = "Ghost Bridge";

/// Certificate lifetime in days.
pub const VALIDITY_DAYS: i64 = 365;

/// Serial number of every bridge certificate. Each instance issues exactly one
/// certificate and never chains it, so a constant does not collide.
const SERIAL: u8 = 1;

/// A freshly generated certificate and the private key it certifies.
pub struct Identity {
    cert_pem: String,
    cert_der: CertificateDer<'static>,
    key_der: PrivatePkcs8KeyDer<'static>,
}

impl Identity {
    /// Generate a new key pair and a self-signed certificate for it.
    pub fn generate() -> Result<Self, BridgeError> {
        let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)?;

        let mut params = CertificateParams::new(vec![LOOPBACK_HOST.to_string()])?;
        params.serial_number = Some(SerialNumber::from_slice(&[SERIAL]));

        let mut subject = DistinguishedName::new();
        subject.push(DnType::OrganizationName, ORGANIZATION);
        params.distinguished_name = subject;

        let now = OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + Duration::days(VALIDITY_DAYS);

        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        params.is_ca = IsCa::ExplicitNoCa;

        let cert = params.self_signed(&key_pair)?;

        Ok(Self {
            cert_pem: cert.pem(),
            cert_der: cert.der().clone(),
            key_der: PrivatePkcs8KeyDer::from(key_pair.serialize_der()),
        })
    }

    /// The certificate as a PEM `CERTIFICATE` block.
    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    /// The certificate in DER form.
    pub fn cert_der(&self) -> &CertificateDer<'static> {
        &self.cert_der
    }

    /// Build the listener's TLS configuration, consuming the private key.
    pub fn into_server_config(self) -> Result<Arc<ServerConfig>, BridgeError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let mut config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_no_client_auth()
            .with_single_cert(vec![self.cert_der], PrivateKeyDer::Pkcs8(self.key_der))?;
        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

        Ok(Arc::new(config))
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("cert_pem", &self.cert_pem)
            .finish_non_exhaustive()
    }
}
