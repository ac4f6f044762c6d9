//! Requests for hosts other than the bridge go out unchanged and are verified
//! by chain validation, not by the pinned certificate.

use bytes::Bytes;
use ghostbridge_client::{Bootstrap, BridgeClient, ClientError, ClientOptions};
use http::header::AUTHORIZATION;
use http::{Request, Response, StatusCode};
use http_body_util::{Empty, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{RootCertStore, ServerConfig};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// A root certificate and a TLS server config for `localhost` issued by it.
fn ca_issued_server() -> (CertificateDer<'static>, Arc<ServerConfig>) {
    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = CertificateParams::new(Vec::new()).unwrap();
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "Test Root");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let ca = ca_params.self_signed(&ca_key).unwrap();

    let leaf_key = KeyPair::generate().unwrap();
    let leaf = CertificateParams::new(vec!["localhost".to_string()])
        .unwrap()
        .signed_by(&leaf_key, &ca, &ca_key)
        .unwrap();

    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(
        vec![leaf.der().clone()],
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(leaf_key.serialize_der())),
    )
    .unwrap();

    (ca.der().clone(), Arc::new(config))
}

/// Serve TLS on a loopback port, answering with whether an `Authorization`
/// header arrived.
async fn spawn_server(config: Arc<ServerConfig>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let acceptor = TlsAcceptor::from(config);

    tokio::spawn(async move {
        loop {
            let Ok((tcp, _)) = listener.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(tls) = acceptor.accept(tcp).await else {
                    return;
                };
                let service = service_fn(|req: Request<Incoming>| async move {
                    let body = format!(
                        "{} {} authorization={}",
                        req.method(),
                        req.uri(),
                        req.headers().contains_key(AUTHORIZATION)
                    );
                    Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(body))))
                });
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(tls), service)
                    .await;
            });
        }
    });

    port
}

/// Bootstrap values for a bridge that is not running; only its certificate
/// and token matter here.
fn unrelated_bridge() -> Bootstrap {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .unwrap()
        .cert
        .pem();
    Bootstrap::new(1, cert, "c2VjcmV0")
}

#[tokio::test]
async fn test_other_host_is_sent_unchanged_and_chain_validated() {
    let (ca, config) = ca_issued_server();
    let port = spawn_server(config).await;

    let mut roots = RootCertStore::empty();
    roots.add(ca).unwrap();
    let client =
        BridgeClient::with_roots(&unrelated_bridge(), &ClientOptions::default(), roots).unwrap();

    let req = Request::get(format!("https://localhost:{port}/status?x=1"))
        .body(Empty::<Bytes>::new())
        .unwrap();
    let response = client.send(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // Not redirected, and the bearer token is not attached.
    assert_eq!(
        &response.body()[..],
        b"GET /status?x=1 authorization=false"
    );
}

#[tokio::test]
async fn test_other_host_with_unknown_issuer_fails_handshake() {
    let (_, config) = ca_issued_server();
    let port = spawn_server(config).await;

    // Default fallback roots do not include the test root.
    let client = BridgeClient::new(&unrelated_bridge(), &ClientOptions::default()).unwrap();

    let req = Request::get(format!("https://localhost:{port}/"))
        .body(Empty::<Bytes>::new())
        .unwrap();
    let err = client.send(req).await.unwrap_err();
    assert!(matches!(err, ClientError::Handshake(_)));
}
