use chrono::{DateTime, Utc};

use crate::normalize::host_of;
use crate::{CertStatus, Site, SiteId, StatusFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportStats {
    pub added: usize,
    pub skipped: usize,
}

/// Per-status counts over non-ignored sites; ignored sites are counted apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusStats {
    pub valid: usize,
    pub expires_soon_warning: usize,
    pub expires_soon: usize,
    pub expired: usize,
    pub error: usize,
    pub ignored: usize,
}

impl StatusStats {
    pub fn tally(sites: &[Site]) -> Self {
        let mut stats = Self::default();
        for site in sites {
            if site.ignored {
                stats.ignored += 1;
            } else {
                *stats.slot(site.status) += 1;
            }
        }
        stats
    }

    pub fn count(&self, status: CertStatus) -> usize {
        match status {
            CertStatus::Valid => self.valid,
            CertStatus::ExpiresSoonWarning => self.expires_soon_warning,
            CertStatus::ExpiresSoon => self.expires_soon,
            CertStatus::Expired => self.expired,
            CertStatus::Error => self.error,
        }
    }

    /// Non-empty buckets as filter chips, in display order.
    pub fn chips(&self) -> Vec<(StatusFilter, usize)> {
        CertStatus::ALL
            .into_iter()
            .map(|status| (StatusFilter::Status(status), self.count(status)))
            .chain(std::iter::once((StatusFilter::Ignored, self.ignored)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    fn slot(&mut self, status: CertStatus) -> &mut usize {
        match status {
            CertStatus::Valid => &mut self.valid,
            CertStatus::ExpiresSoonWarning => &mut self.expires_soon_warning,
            CertStatus::ExpiresSoon => &mut self.expires_soon,
            CertStatus::Expired => &mut self.expired,
            CertStatus::Error => &mut self.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    /// Rows passing the active filter, in collection order.
    pub sites: Vec<SiteRowView>,
    pub site_count: usize,
    pub stats: StatusStats,
    pub active_filter: Option<StatusFilter>,
    pub last_import: Option<ImportStats>,
    pub checks_in_flight: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRowView {
    pub site_id: SiteId,
    pub url: String,
    pub host: String,
    pub status: CertStatus,
    pub expiry_date: Option<DateTime<Utc>>,
    pub last_checked: DateTime<Utc>,
    pub ip: Option<String>,
    pub ignored: bool,
    pub checking: bool,
}

impl SiteRowView {
    pub(crate) fn from_site(site: &Site, checking: bool) -> Self {
        Self {
            site_id: site.id,
            url: site.url.clone(),
            host: host_of(&site.url),
            status: site.status,
            expiry_date: site.expiry_date,
            last_checked: site.last_checked,
            ip: site.ip.clone(),
            ignored: site.ignored,
            checking,
        }
    }
}
