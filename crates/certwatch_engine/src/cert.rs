use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

use crate::{CheckError, FailureKind};

/// `notAfter` of a DER-encoded certificate.
pub fn leaf_not_after(der: &[u8]) -> Result<DateTime<Utc>, CheckError> {
    let (_, cert) = X509Certificate::from_der(der).map_err(|err| {
        CheckError::new(
            FailureKind::Certificate,
            format!("failed to parse certificate: {err}"),
        )
    })?;
    let timestamp = cert.validity().not_after.timestamp();
    DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        CheckError::new(
            FailureKind::Certificate,
            format!("notAfter out of range: {timestamp}"),
        )
    })
}
