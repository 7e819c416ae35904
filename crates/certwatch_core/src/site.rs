use chrono::{DateTime, Utc};

use crate::status::{classify_days_remaining, days_remaining, CertStatus};

pub type SiteId = u64;

/// A monitored website.
///
/// `status`, `expiry_date`, `ip` and `last_checked` are written together by
/// [`Site::apply_outcome`]; nothing else touches them after creation, except
/// `update` which refreshes `last_checked` alongside the new URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: SiteId,
    pub url: String,
    pub status: CertStatus,
    pub expiry_date: Option<DateTime<Utc>>,
    pub last_checked: DateTime<Utc>,
    pub ip: Option<String>,
    pub ignored: bool,
}

impl Site {
    /// New site awaiting its first check.
    pub fn pending(id: SiteId, url: String, at: DateTime<Utc>) -> Self {
        Self {
            id,
            url,
            status: CertStatus::Error,
            expiry_date: None,
            last_checked: at,
            ip: None,
            ignored: false,
        }
    }

    pub(crate) fn apply_outcome(&mut self, outcome: CheckOutcome) {
        self.status = outcome.status;
        self.expiry_date = outcome.expiry_date;
        self.ip = outcome.ip;
        self.last_checked = outcome.checked_at;
    }
}

/// Result of one certificate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub status: CertStatus,
    pub expiry_date: Option<DateTime<Utc>>,
    pub ip: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl CheckOutcome {
    pub fn failed(checked_at: DateTime<Utc>) -> Self {
        Self {
            status: CertStatus::Error,
            expiry_date: None,
            ip: None,
            checked_at,
        }
    }

    /// Classifies a certificate from its `notAfter` as seen at `checked_at`.
    pub fn from_expiry(
        expiry: DateTime<Utc>,
        ip: Option<String>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: classify_days_remaining(days_remaining(expiry, checked_at)),
            expiry_date: Some(expiry),
            ip,
            checked_at,
        }
    }
}

/// A check request addressed by site identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTarget {
    pub site_id: SiteId,
    pub url: String,
}

/// The persisted unit: the ordered collection plus the id allocator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectionSnapshot {
    pub sites: Vec<Site>,
    pub next_id: SiteId,
}

/// Status chip filter of the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Non-ignored sites with this status.
    Status(CertStatus),
    /// Ignored sites, whatever their status.
    Ignored,
}

impl StatusFilter {
    pub fn matches(self, site: &Site) -> bool {
        match self {
            StatusFilter::Status(status) => !site.ignored && site.status == status,
            StatusFilter::Ignored => site.ignored,
        }
    }
}

/// Which sites a bulk recheck targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteSelection {
    All,
    NotIgnored,
    Filter(StatusFilter),
}

impl SiteSelection {
    pub fn matches(self, site: &Site) -> bool {
        match self {
            SiteSelection::All => true,
            SiteSelection::NotIgnored => !site.ignored,
            SiteSelection::Filter(filter) => filter.matches(site),
        }
    }
}
