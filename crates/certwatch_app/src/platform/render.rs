use certwatch_core::{
    host_of, time_remaining, AppViewModel, CertStatus, Site, SiteRowView, StatusFilter,
    StatusStats,
};
use chrono::{DateTime, Utc};

/// Full list: header, one row per visible site, then the stats line.
pub fn render(view: &AppViewModel, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    out.push_str(&status_text(view));
    out.push('\n');

    if view.sites.is_empty() {
        out.push_str(if view.site_count == 0 {
            "No sites yet. Add one with `add <url>`.\n"
        } else {
            "No sites match the filter.\n"
        });
        return out;
    }

    out.push_str(&format!(
        "{:>4}  {:<22} {:<20} {:<40} {:<16} {}\n",
        "ID", "STATUS", "REMAINING", "URL", "IP", "LAST CHECKED"
    ));
    for row in &view.sites {
        out.push_str(&render_row(row, now));
        out.push('\n');
    }
    out.push_str(&stats_line(&view.stats));
    out.push('\n');
    out
}

pub fn render_row(row: &SiteRowView, now: DateTime<Utc>) -> String {
    let mut flags = Vec::new();
    if row.ignored {
        flags.push("ignored");
    }
    if row.checking {
        flags.push("checking");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    format!(
        "{:>4}  {:<22} {:<20} {:<40} {:<16} {}{}",
        row.site_id,
        row.status.as_str(),
        remaining_text(row.status, row.expiry_date, now),
        row.url,
        row.ip.as_deref().unwrap_or("-"),
        row.last_checked.format("%Y-%m-%d %H:%M UTC"),
        flags
    )
}

/// Shell notice for a finished check.
pub fn check_notice(site: &Site, now: DateTime<Utc>) -> String {
    format!(
        "checked {} ({}): {}, {}",
        host_of(&site.url),
        site.id,
        site.status.as_str(),
        remaining_text(site.status, site.expiry_date, now)
    )
}

fn remaining_text(status: CertStatus, expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match (status, expiry) {
        (CertStatus::Error, _) | (_, None) => "-".to_string(),
        (_, Some(expiry)) => time_remaining(expiry, now).to_string(),
    }
}

fn status_text(view: &AppViewModel) -> String {
    let mut text = format!("Sites: {}", view.site_count);
    if let Some(filter) = view.active_filter {
        text.push_str(&format!(" | Showing: {}", filter_label(filter)));
    }
    if view.checks_in_flight > 0 {
        text.push_str(&format!(" | Checking: {}", view.checks_in_flight));
    }
    if let Some(stats) = view.last_import {
        text.push_str(&format!(
            " | Last import: added {}, skipped {}",
            stats.added, stats.skipped
        ));
    }
    text
}

/// e.g. `3 valid · 1 expiring soon · 2 ignored`.
pub fn stats_line(stats: &StatusStats) -> String {
    stats
        .chips()
        .into_iter()
        .map(|(filter, count)| format!("{count} {}", filter_label(filter)))
        .collect::<Vec<_>>()
        .join(" · ")
}

fn filter_label(filter: StatusFilter) -> &'static str {
    match filter {
        StatusFilter::Status(status) => status.label(),
        StatusFilter::Ignored => "ignored",
    }
}
