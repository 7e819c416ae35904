use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Certificate lifecycle category of a monitored site.
///
/// The 1–7 day tier is `ExpiresSoon` and the 8–30 day tier is
/// `ExpiresSoonWarning`. The names are kept as the persisted and wire names
/// have always been; use [`CertStatus::severity`] for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertStatus {
    Valid,
    ExpiresSoonWarning,
    ExpiresSoon,
    Expired,
    /// Placeholder before the first check, and the result of a failed check.
    Error,
}

impl CertStatus {
    pub const ALL: [CertStatus; 5] = [
        CertStatus::Valid,
        CertStatus::ExpiresSoonWarning,
        CertStatus::ExpiresSoon,
        CertStatus::Expired,
        CertStatus::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CertStatus::Valid => "valid",
            CertStatus::ExpiresSoonWarning => "expires-soon-warning",
            CertStatus::ExpiresSoon => "expires-soon",
            CertStatus::Expired => "expired",
            CertStatus::Error => "error",
        }
    }

    /// Human label used in the status statistics line.
    pub fn label(self) -> &'static str {
        match self {
            CertStatus::Valid => "valid",
            CertStatus::ExpiresSoonWarning => "expiring this month",
            CertStatus::ExpiresSoon => "expiring soon",
            CertStatus::Expired => "expired",
            CertStatus::Error => "with errors",
        }
    }

    /// Rank among the classified tiers: higher is more urgent.
    /// `Error` is outside the expiry scale and ranks lowest.
    pub fn severity(self) -> u8 {
        match self {
            CertStatus::Error => 0,
            CertStatus::Valid => 1,
            CertStatus::ExpiresSoonWarning => 2,
            CertStatus::ExpiresSoon => 3,
            CertStatus::Expired => 4,
        }
    }
}

impl fmt::Display for CertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown certificate status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for CertStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CertStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Maps signed days-until-expiry onto the four expiry tiers.
///
/// Thresholds: `<= 0` expired, `1..=7` expires-soon, `8..=30`
/// expires-soon-warning, `> 30` valid. Never yields [`CertStatus::Error`].
pub fn classify_days_remaining(days: i64) -> CertStatus {
    match days {
        i64::MIN..=0 => CertStatus::Expired,
        1..=7 => CertStatus::ExpiresSoon,
        8..=30 => CertStatus::ExpiresSoonWarning,
        _ => CertStatus::Valid,
    }
}

/// Whole days from `now` until `expiry`, truncated toward zero.
pub fn days_remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expiry - now).num_days()
}

/// Display-only remaining validity, recomputed at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Days(i64),
    Hours(i64),
    Expired,
}

pub fn time_remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let left = expiry - now;
    let days = left.num_days();
    if days >= 1 {
        return TimeRemaining::Days(days);
    }
    let hours = left.num_hours();
    if hours >= 1 {
        TimeRemaining::Hours(hours)
    } else {
        TimeRemaining::Expired
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TimeRemaining::Days(n) => write!(f, "{n} day{} remaining", plural(n)),
            TimeRemaining::Hours(n) => write!(f, "{n} hour{} remaining", plural(n)),
            TimeRemaining::Expired => f.write_str("Expired"),
        }
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
