use std::net::SocketAddr;
use std::sync::Arc;

use certwatch_core::CheckOutcome;
use certwatch_logging::{cw_debug, cw_warn};
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::cert::leaf_not_after;
use crate::{CheckError, CheckSettings, Checker, FailureKind};

/// Makes ring the process-wide rustls provider unless one is already set.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// What a successful probe learned about the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertProbe {
    pub not_after: DateTime<Utc>,
    pub ip: String,
}

/// Connects to the site directly and reads the leaf certificate.
///
/// The chain is not validated; expired and self-signed certificates are
/// measured like any other.
pub struct TlsChecker {
    settings: CheckSettings,
    connector: TlsConnector,
}

impl TlsChecker {
    pub fn new(settings: CheckSettings) -> Result<Self, CheckError> {
        install_crypto_provider();
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let algorithms = provider.signature_verification_algorithms;
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|err| CheckError::new(FailureKind::Handshake, err.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(CaptureOnlyVerifier { algorithms }))
            .with_no_client_auth();
        Ok(Self {
            settings,
            connector: TlsConnector::from(Arc::new(config)),
        })
    }

    /// Resolves, connects and handshakes without the overall timeout.
    pub async fn probe(&self, url: &str) -> Result<CertProbe, CheckError> {
        let parsed = url::Url::parse(url)
            .map_err(|err| CheckError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let host = match parsed.host() {
            Some(url::Host::Domain(domain)) => domain.to_string(),
            Some(url::Host::Ipv4(ip)) => ip.to_string(),
            Some(url::Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(CheckError::new(FailureKind::InvalidUrl, "missing host")),
        };
        // The scheme's default port is irrelevant: certificates live on the TLS port.
        let port = parsed.port().unwrap_or(self.settings.default_port);

        let addr = resolve(&host, port).await?;
        cw_debug!("probing {} via {}", host, addr);
        let tcp = TcpStream::connect(addr)
            .await
            .map_err(|err| CheckError::new(FailureKind::Connect, err.to_string()))?;

        let server_name = ServerName::try_from(host.clone())
            .map_err(|err| CheckError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let stream = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|err| CheckError::new(FailureKind::Handshake, err.to_string()))?;

        let (_, conn) = stream.get_ref();
        let leaf = conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| CheckError::new(FailureKind::Certificate, "no peer certificate"))?;
        let not_after = leaf_not_after(leaf.as_ref())?;

        Ok(CertProbe {
            not_after,
            ip: addr.ip().to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Checker for TlsChecker {
    async fn check(&self, url: &str) -> CheckOutcome {
        match tokio::time::timeout(self.settings.timeout, self.probe(url)).await {
            Ok(Ok(probe)) => CheckOutcome::from_expiry(probe.not_after, Some(probe.ip), Utc::now()),
            Ok(Err(err)) => {
                cw_warn!("check of {} failed: {}", url, err);
                CheckOutcome::failed(Utc::now())
            }
            Err(_) => {
                cw_warn!(
                    "check of {} timed out after {:?}",
                    url,
                    self.settings.timeout
                );
                CheckOutcome::failed(Utc::now())
            }
        }
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, CheckError> {
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|err| CheckError::new(FailureKind::Dns, err.to_string()))?
        .next()
        .ok_or_else(|| CheckError::new(FailureKind::Dns, format!("no addresses for {host}")))
}

/// Accepts any certificate chain but still checks handshake signatures, so
/// the peer must hold the key of the certificate it presents.
#[derive(Debug)]
struct CaptureOnlyVerifier {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for CaptureOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
