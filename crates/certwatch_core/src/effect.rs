use crate::{CheckTarget, CollectionSnapshot, SiteId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckSite { site_id: SiteId, url: String },
    /// Run every check concurrently and report once all have settled.
    CheckBatch { targets: Vec<CheckTarget> },
    /// Save the complete collection under the fixed store key.
    PersistSnapshot(CollectionSnapshot),
    ExportText(String),
}

impl From<CheckTarget> for Effect {
    fn from(target: CheckTarget) -> Self {
        Effect::CheckSite {
            site_id: target.site_id,
            url: target.url,
        }
    }
}
