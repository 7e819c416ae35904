use chrono::{DateTime, Utc};

use crate::{CheckOutcome, CollectionSnapshot, SiteId, SiteSelection, StatusFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted a URL to monitor.
    AddRequested { raw_url: String, at: DateTime<Utc> },
    /// User edited the URL of an existing site.
    UpdateRequested {
        site_id: SiteId,
        raw_url: String,
        at: DateTime<Utc>,
    },
    RemoveRequested { site_id: SiteId },
    /// Confirmation is the caller's job.
    RemoveAllRequested,
    ToggleIgnoreRequested { site_id: SiteId },
    /// Complete new ordering after a drag-reorder.
    Reordered { order: Vec<SiteId> },
    RecheckRequested { site_id: SiteId },
    RecheckManyRequested { selection: SiteSelection },
    /// Newline-separated URLs from an import file.
    ImportRequested { text: String, at: DateTime<Utc> },
    ExportRequested,
    /// User picked (or cleared) a status chip.
    FilterChanged(Option<StatusFilter>),
    /// Restore the persisted collection at startup.
    RestoreSnapshot(CollectionSnapshot),
    /// Engine completion for a single-site check.
    CheckCompleted {
        site_id: SiteId,
        outcome: CheckOutcome,
    },
    /// Engine completion for a bulk recheck, once every check has settled.
    BatchCheckCompleted {
        outcomes: Vec<(SiteId, CheckOutcome)>,
    },
}
