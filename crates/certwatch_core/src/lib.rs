//! Certwatch core: pure collection state machine, URL normalizer and
//! certificate status classifier.
mod effect;
mod msg;
mod normalize;
mod site;
mod state;
mod status;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use normalize::{host_of, normalize_url};
pub use site::{
    CheckOutcome, CheckTarget, CollectionSnapshot, Site, SiteId, SiteSelection, StatusFilter,
};
pub use state::AppState;
pub use status::{
    classify_days_remaining, days_remaining, time_remaining, CertStatus, TimeRemaining,
    UnknownStatus,
};
pub use update::update;
pub use view_model::{AppViewModel, ImportStats, SiteRowView, StatusStats};
