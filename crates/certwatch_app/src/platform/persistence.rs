use anyhow::Context;
use certwatch_core::{CertStatus, CollectionSnapshot, Site, SiteId};
use certwatch_engine::BlobStore;
use certwatch_logging::{cw_info, cw_warn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSite {
    id: SiteId,
    url: String,
    status: String,
    #[serde(default)]
    expiry_date: Option<DateTime<Utc>>,
    last_checked: DateTime<Utc>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    ignored: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    /// Absent in hand-written files; restore then derives it from the ids.
    #[serde(default)]
    next_id: SiteId,
    sites: Vec<PersistedSite>,
}

impl From<&Site> for PersistedSite {
    fn from(site: &Site) -> Self {
        Self {
            id: site.id,
            url: site.url.clone(),
            status: site.status.as_str().to_string(),
            expiry_date: site.expiry_date,
            last_checked: site.last_checked,
            ip: site.ip.clone(),
            ignored: site.ignored,
        }
    }
}

impl PersistedSite {
    fn into_site(self) -> Site {
        let status = self.status.parse().unwrap_or_else(|err| {
            cw_warn!("site {}: {}; treating as error", self.id, err);
            CertStatus::Error
        });
        Site {
            id: self.id,
            url: self.url,
            status,
            expiry_date: self.expiry_date,
            last_checked: self.last_checked,
            ip: self.ip,
            ignored: self.ignored,
        }
    }
}

pub(crate) fn encode_snapshot(snapshot: &CollectionSnapshot) -> anyhow::Result<String> {
    let state = PersistedState {
        next_id: snapshot.next_id,
        sites: snapshot.sites.iter().map(PersistedSite::from).collect(),
    };
    let pretty = ron::ser::PrettyConfig::new();
    ron::ser::to_string_pretty(&state, pretty).context("failed to serialize site collection")
}

pub(crate) fn decode_snapshot(text: &str) -> anyhow::Result<CollectionSnapshot> {
    let state: PersistedState = ron::from_str(text).context("failed to parse site collection")?;
    Ok(CollectionSnapshot {
        next_id: state.next_id,
        sites: state
            .sites
            .into_iter()
            .map(PersistedSite::into_site)
            .collect(),
    })
}

/// Absent or unreadable data yields an empty collection.
pub(crate) fn load_snapshot(store: &dyn BlobStore) -> CollectionSnapshot {
    let text = match store.load() {
        Ok(Some(text)) => text,
        Ok(None) => {
            cw_info!("no saved site collection; starting empty");
            return CollectionSnapshot::default();
        }
        Err(err) => {
            cw_warn!("failed to read saved site collection: {}", err);
            return CollectionSnapshot::default();
        }
    };

    match decode_snapshot(&text) {
        Ok(snapshot) => {
            cw_info!("loaded {} saved sites", snapshot.sites.len());
            snapshot
        }
        Err(err) => {
            cw_warn!("{:#}; starting empty", err);
            CollectionSnapshot::default()
        }
    }
}

pub(crate) fn save_snapshot(store: &dyn BlobStore, snapshot: &CollectionSnapshot) -> anyhow::Result<()> {
    let content = encode_snapshot(snapshot)?;
    store
        .save(&content)
        .context("failed to save site collection")?;
    cw_info!("saved {} sites", snapshot.sites.len());
    Ok(())
}
