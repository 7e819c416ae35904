use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::normalize::normalize_url;
use crate::site::{CheckOutcome, CheckTarget, CollectionSnapshot, Site, SiteId, StatusFilter};
use crate::view_model::{AppViewModel, ImportStats, SiteRowView, StatusStats};

/// The monitored-site collection and its bookkeeping.
///
/// Only [`crate::update`] mutates it; readers get slices and snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    sites: Vec<Site>,
    next_id: SiteId,
    /// Outstanding checks per site. Entries outlive removed sites until the
    /// late result arrives, so the total stays an accurate in-flight count.
    in_flight: BTreeMap<SiteId, usize>,
    filter: Option<StatusFilter>,
    last_import: Option<ImportStats>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            next_id: 1,
            in_flight: BTreeMap::new(),
            filter: None,
            last_import: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site(&self, site_id: SiteId) -> Option<&Site> {
        self.sites.iter().find(|site| site.id == site_id)
    }

    /// Sites matching `predicate`, in collection order.
    pub fn select(&self, predicate: impl Fn(&Site) -> bool) -> Vec<&Site> {
        self.sites.iter().filter(|site| predicate(site)).collect()
    }

    pub fn checks_in_flight(&self) -> usize {
        self.in_flight.values().sum()
    }

    pub fn is_checking(&self, site_id: SiteId) -> bool {
        self.in_flight.get(&site_id).is_some_and(|count| *count > 0)
    }

    pub fn active_filter(&self) -> Option<StatusFilter> {
        self.filter
    }

    pub fn snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            sites: self.sites.clone(),
            next_id: self.next_id,
        }
    }

    /// Canonical URLs in collection order, one per line.
    pub fn export_text(&self) -> String {
        self.sites
            .iter()
            .map(|site| site.url.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn view(&self) -> AppViewModel {
        let sites = self
            .sites
            .iter()
            .filter(|site| self.filter.is_none_or(|filter| filter.matches(site)))
            .map(|site| SiteRowView::from_site(site, self.is_checking(site.id)))
            .collect();
        AppViewModel {
            sites,
            site_count: self.sites.len(),
            stats: StatusStats::tally(&self.sites),
            active_filter: self.filter,
            last_import: self.last_import,
            checks_in_flight: self.checks_in_flight(),
        }
    }

    /// Returns whether a re-render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn url_taken(&self, url: &str, except: Option<SiteId>) -> bool {
        self.sites
            .iter()
            .any(|site| site.url == url && Some(site.id) != except)
    }

    fn allocate_id(&mut self) -> SiteId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn begin_check(&mut self, site_id: SiteId, url: String) -> CheckTarget {
        *self.in_flight.entry(site_id).or_default() += 1;
        CheckTarget { site_id, url }
    }

    /// Appends a new pending site; `None` when the canonical URL is taken.
    pub(crate) fn insert_site(&mut self, raw_url: &str, at: DateTime<Utc>) -> Option<CheckTarget> {
        let url = normalize_url(raw_url);
        if self.url_taken(&url, None) {
            return None;
        }
        let id = self.allocate_id();
        self.sites.push(Site::pending(id, url.clone(), at));
        self.mark_dirty();
        Some(self.begin_check(id, url))
    }

    /// Rewrites a site's URL; status fields stay stale until the re-check lands.
    pub(crate) fn update_url(
        &mut self,
        site_id: SiteId,
        raw_url: &str,
        at: DateTime<Utc>,
    ) -> Option<CheckTarget> {
        let url = normalize_url(raw_url);
        if self.url_taken(&url, Some(site_id)) {
            return None;
        }
        let site = self.sites.iter_mut().find(|site| site.id == site_id)?;
        site.url = url.clone();
        site.last_checked = at;
        self.mark_dirty();
        Some(self.begin_check(site_id, url))
    }

    /// Starts a recheck unless one is already outstanding for the site.
    pub(crate) fn begin_recheck(&mut self, site_id: SiteId) -> Option<CheckTarget> {
        if self.is_checking(site_id) {
            return None;
        }
        let url = self.site(site_id)?.url.clone();
        self.mark_dirty();
        Some(self.begin_check(site_id, url))
    }

    /// Snapshots the matching, idle sites and starts a check for each.
    pub(crate) fn begin_recheck_many(
        &mut self,
        predicate: impl Fn(&Site) -> bool,
    ) -> Vec<CheckTarget> {
        let picked: Vec<(SiteId, String)> = self
            .sites
            .iter()
            .filter(|site| predicate(site) && !self.is_checking(site.id))
            .map(|site| (site.id, site.url.clone()))
            .collect();
        if !picked.is_empty() {
            self.mark_dirty();
        }
        picked
            .into_iter()
            .map(|(site_id, url)| self.begin_check(site_id, url))
            .collect()
    }

    /// Settles one outstanding check and merges its outcome by identity.
    /// Returns whether a live site was updated.
    pub(crate) fn finish_check(&mut self, site_id: SiteId, outcome: CheckOutcome) -> bool {
        if let Some(count) = self.in_flight.get_mut(&site_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.in_flight.remove(&site_id);
            }
            self.mark_dirty();
        }
        match self.sites.iter_mut().find(|site| site.id == site_id) {
            Some(site) => {
                site.apply_outcome(outcome);
                self.mark_dirty();
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, site_id: SiteId) -> bool {
        let before = self.sites.len();
        self.sites.retain(|site| site.id != site_id);
        let removed = self.sites.len() != before;
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn remove_all(&mut self) -> bool {
        if self.sites.is_empty() {
            return false;
        }
        self.sites.clear();
        self.mark_dirty();
        true
    }

    pub(crate) fn toggle_ignore(&mut self, site_id: SiteId) -> bool {
        match self.sites.iter_mut().find(|site| site.id == site_id) {
            Some(site) => {
                site.ignored = !site.ignored;
                self.mark_dirty();
                true
            }
            None => false,
        }
    }

    /// Applies a complete new ordering. Anything other than a permutation of
    /// the current ids is a caller error and leaves the order untouched.
    pub(crate) fn reorder(&mut self, order: &[SiteId]) -> bool {
        if order.len() != self.sites.len() {
            return false;
        }
        let mut remaining: BTreeMap<SiteId, Site> = self
            .sites
            .iter()
            .map(|site| (site.id, site.clone()))
            .collect();
        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            match remaining.remove(id) {
                Some(site) => reordered.push(site),
                None => return false,
            }
        }
        if reordered == self.sites {
            return false;
        }
        self.sites = reordered;
        self.mark_dirty();
        true
    }

    /// Replaces the collection with a persisted snapshot, re-establishing
    /// URL uniqueness and an id counter above every stored id.
    /// `SiteId::MAX` leaves no id to allocate after it, so such sites are dropped.
    pub(crate) fn restore(&mut self, snapshot: CollectionSnapshot) {
        let mut seen = HashSet::new();
        let mut sites = Vec::with_capacity(snapshot.sites.len());
        let mut ids = HashSet::new();
        for mut site in snapshot.sites {
            if site.id == SiteId::MAX {
                continue;
            }
            site.url = normalize_url(&site.url);
            if seen.insert(site.url.clone()) && ids.insert(site.id) {
                sites.push(site);
            }
        }
        let floor = sites.iter().map(|site| site.id.saturating_add(1)).max().unwrap_or(1);
        self.next_id = snapshot.next_id.max(floor);
        self.sites = sites;
        self.mark_dirty();
    }

    pub(crate) fn set_filter(&mut self, filter: Option<StatusFilter>) {
        if self.filter != filter {
            self.filter = filter;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_last_import(&mut self, added: usize, skipped: usize) {
        self.last_import = Some(ImportStats { added, skipped });
        self.mark_dirty();
    }
}
