use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use certwatch_core::CertStatus;
use certwatch_engine::{
    install_crypto_provider, leaf_not_after, CheckSettings, Checker, FailureKind, TlsChecker,
};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use rcgen::{date_time_ymd, CertificateParams, KeyPair};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

fn midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(at.year(), at.month(), at.day(), 0, 0, 0)
        .unwrap()
}

/// Self-signed certificate expiring at midnight of the day `days` from now.
fn certificate(days: i64) -> (CertificateDer<'static>, PrivateKeyDer<'static>, DateTime<Utc>) {
    let not_before = Utc::now() - Duration::days(400);
    let not_after = midnight(Utc::now() + Duration::days(days));

    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    params.not_before = date_time_ymd(
        not_before.year(),
        not_before.month() as u8,
        not_before.day() as u8,
    );
    params.not_after = date_time_ymd(
        not_after.year(),
        not_after.month() as u8,
        not_after.day() as u8,
    );
    let cert = params.self_signed(&key).unwrap();
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der()));
    (cert.der().clone(), key_der, not_after)
}

/// Accepts one TLS connection presenting a certificate expiring in `days`.
async fn serve_once(days: i64) -> (SocketAddr, DateTime<Utc>) {
    let (cert, key, not_after) = certificate(days);
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((tcp, _)) = listener.accept().await {
            let _ = acceptor.accept(tcp).await;
        }
    });
    (addr, not_after)
}

#[tokio::test]
async fn probe_reads_leaf_expiry_and_ip() {
    let (addr, not_after) = serve_once(20).await;
    let checker = TlsChecker::new(CheckSettings::default()).unwrap();

    let outcome = checker
        .check(&format!("https://127.0.0.1:{}", addr.port()))
        .await;

    assert_eq!(outcome.status, CertStatus::ExpiresSoonWarning);
    assert_eq!(outcome.expiry_date, Some(not_after));
    assert_eq!(outcome.ip.as_deref(), Some("127.0.0.1"));
}

#[tokio::test]
async fn expired_certificate_is_measured_not_refused() {
    let (addr, not_after) = serve_once(-10).await;
    let checker = TlsChecker::new(CheckSettings::default()).unwrap();

    let outcome = checker
        .check(&format!("https://127.0.0.1:{}/", addr.port()))
        .await;

    assert_eq!(outcome.status, CertStatus::Expired);
    assert_eq!(outcome.expiry_date, Some(not_after));
}

#[tokio::test]
async fn refused_connection_is_an_error_outcome() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let checker = TlsChecker::new(CheckSettings::default()).unwrap();
    let url = format!("https://127.0.0.1:{port}");
    let err = checker.probe(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Connect);

    let outcome = checker.check(&url).await;
    assert_eq!(outcome.status, CertStatus::Error);
    assert_eq!(outcome.expiry_date, None);
    assert_eq!(outcome.ip, None);
}

#[tokio::test]
async fn silent_server_hits_the_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        // Accept and hold the socket without ever answering the ClientHello.
        let held = listener.accept().await;
        tokio::time::sleep(StdDuration::from_secs(5)).await;
        drop(held);
    });

    let settings = CheckSettings {
        timeout: StdDuration::from_millis(200),
        ..CheckSettings::default()
    };
    let checker = TlsChecker::new(settings).unwrap();
    let started = Instant::now();
    let outcome = checker.check(&format!("https://127.0.0.1:{port}")).await;

    assert_eq!(outcome.status, CertStatus::Error);
    assert!(started.elapsed() < StdDuration::from_secs(3));
}

#[tokio::test]
async fn unparseable_urls_are_rejected_before_connecting() {
    let checker = TlsChecker::new(CheckSettings::default()).unwrap();
    for url in ["https://", "not a url", "https://bad host.example"] {
        let err = checker.probe(url).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl, "url {url}");
    }
}

#[test]
fn leaf_not_after_parses_der_and_rejects_garbage() {
    let (cert, _, not_after) = certificate(90);
    assert_eq!(leaf_not_after(cert.as_ref()).unwrap(), not_after);

    let err = leaf_not_after(b"definitely not der").unwrap_err();
    assert_eq!(err.kind, FailureKind::Certificate);
}

#[test]
fn crypto_provider_install_is_repeatable() {
    install_crypto_provider();
    install_crypto_provider();
    assert!(rustls::crypto::CryptoProvider::get_default().is_some());
}
