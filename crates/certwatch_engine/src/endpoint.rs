use certwatch_core::{CertStatus, CheckOutcome};
use certwatch_logging::cw_warn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tls::install_crypto_provider;
use crate::{CheckError, CheckSettings, Checker, FailureKind};

#[derive(Debug, Serialize)]
struct CheckRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckResponse {
    status: String,
    expiry_date: Option<String>,
    ip: Option<String>,
}

/// Delegates the lookup to a remote check service.
///
/// Request: `POST {endpoint}` with `{"url": "..."}`. Response:
/// `{"status": "...", "expiryDate": "<RFC 3339>", "ip": "..."}` where the
/// last two are absent on error.
#[derive(Debug, Clone)]
pub struct EndpointChecker {
    endpoint: String,
    client: reqwest::Client,
}

impl EndpointChecker {
    pub fn new(endpoint: impl Into<String>, settings: &CheckSettings) -> Result<Self, CheckError> {
        install_crypto_provider();
        let client = reqwest::Client::builder()
            .connect_timeout(settings.timeout)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| CheckError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub async fn request(&self, url: &str) -> Result<CheckOutcome, CheckError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CheckRequest { url })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: CheckResponse = serde_json::from_slice(&body)
            .map_err(|err| CheckError::new(FailureKind::MalformedResponse, err.to_string()))?;
        let checked_at = Utc::now();
        let status: CertStatus = parsed
            .status
            .parse()
            .map_err(|err: certwatch_core::UnknownStatus| {
                CheckError::new(FailureKind::MalformedResponse, err.to_string())
            })?;
        if status == CertStatus::Error {
            return Ok(CheckOutcome::failed(checked_at));
        }

        let expiry_date = parsed
            .expiry_date
            .as_deref()
            .map(DateTime::parse_from_rfc3339)
            .transpose()
            .map_err(|err| CheckError::new(FailureKind::MalformedResponse, err.to_string()))?
            .map(|date| date.with_timezone(&Utc));

        Ok(CheckOutcome {
            status,
            expiry_date,
            ip: parsed.ip,
            checked_at,
        })
    }
}

#[async_trait::async_trait]
impl Checker for EndpointChecker {
    async fn check(&self, url: &str) -> CheckOutcome {
        match self.request(url).await {
            Ok(outcome) => outcome,
            Err(err) => {
                cw_warn!("check of {} via {} failed: {}", url, self.endpoint, err);
                CheckOutcome::failed(Utc::now())
            }
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CheckError {
    if err.is_timeout() {
        return CheckError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return CheckError::new(FailureKind::MalformedResponse, err.to_string());
    }
    CheckError::new(FailureKind::Network, err.to_string())
}
