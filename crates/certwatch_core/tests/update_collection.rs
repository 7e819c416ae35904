use std::collections::HashSet;
use std::sync::Once;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;

use certwatch_core::{update, AppState, CertStatus, CheckTarget, Effect, ImportStats, Msg, SiteId};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(certwatch_logging::initialize_for_tests);
}

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
}

fn add(state: AppState, raw: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::AddRequested {
            raw_url: raw.to_string(),
            at: at(),
        },
    )
}

fn urls(state: &AppState) -> Vec<&str> {
    state.sites().iter().map(|site| site.url.as_str()).collect()
}

fn ids(state: &AppState) -> Vec<SiteId> {
    state.sites().iter().map(|site| site.id).collect()
}

fn check_effects(effects: &[Effect]) -> Vec<(SiteId, String)> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::CheckSite { site_id, url } => Some((*site_id, url.clone())),
            _ => None,
        })
        .collect()
}

fn assert_unique_urls(state: &AppState) {
    let set: HashSet<_> = state.sites().iter().map(|site| &site.url).collect();
    assert_eq!(set.len(), state.sites().len());
}

#[test]
fn add_creates_pending_site_and_requests_check() {
    init_logging();
    let (mut state, effects) = add(AppState::new(), "example.com");

    let site = &state.sites()[0];
    assert_eq!(site.id, 1);
    assert_eq!(site.url, "https://example.com");
    assert_eq!(site.status, CertStatus::Error);
    assert_eq!(site.expiry_date, None);
    assert_eq!(site.ip, None);
    assert_eq!(site.last_checked, at());
    assert!(!site.ignored);
    assert!(state.is_checking(1));
    assert!(state.consume_dirty());

    assert_eq!(effects.len(), 2);
    assert_eq!(effects[0], Effect::PersistSnapshot(state.snapshot()));
    assert_eq!(
        effects[1],
        Effect::CheckSite {
            site_id: 1,
            url: "https://example.com".to_string(),
        }
    );
}

#[test]
fn duplicate_add_is_a_silent_noop() {
    init_logging();
    let (state, _) = add(AppState::new(), "example.com");
    let (mut state, effects) = add(state, "https://EXAMPLE.com/");

    assert_eq!(state.sites().len(), 1);
    assert!(effects.is_empty());
    assert!(state.consume_dirty());

    let (mut state, effects) = add(state, "  HTTPS://example.com//  ");
    assert_eq!(state.sites().len(), 1);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn adds_append_in_order_with_fresh_ids() {
    init_logging();
    let (state, _) = add(AppState::new(), "b.example.com");
    let (state, _) = add(state, "a.example.com");
    let (state, _) = add(state, "c.example.com");

    assert_eq!(
        urls(&state),
        vec![
            "https://b.example.com",
            "https://a.example.com",
            "https://c.example.com"
        ]
    );
    assert_eq!(ids(&state), vec![1, 2, 3]);
}

#[test]
fn ids_are_never_reused_after_removal() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, _) = add(state, "b.example.com");
    let (state, _) = update(state, Msg::RemoveRequested { site_id: 2 });
    let (state, _) = add(state, "c.example.com");

    assert_eq!(ids(&state), vec![1, 3]);
}

#[test]
fn update_rewrites_url_keeps_status_and_rechecks() {
    init_logging();
    let (state, _) = add(AppState::new(), "old.example.com");
    let later = at() + chrono::Duration::minutes(5);
    let (state, effects) = update(
        state,
        Msg::UpdateRequested {
            site_id: 1,
            raw_url: "New.Example.com/".to_string(),
            at: later,
        },
    );

    let site = &state.sites()[0];
    assert_eq!(site.id, 1);
    assert_eq!(site.url, "https://new.example.com");
    assert_eq!(site.last_checked, later);
    assert_eq!(site.status, CertStatus::Error);
    assert!(matches!(effects[0], Effect::PersistSnapshot(_)));
    assert_eq!(
        check_effects(&effects),
        vec![(1, "https://new.example.com".to_string())]
    );
}

#[test]
fn update_to_another_sites_url_is_rejected() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, _) = add(state, "b.example.com");
    let before = state.sites().to_vec();

    let (state, effects) = update(
        state,
        Msg::UpdateRequested {
            site_id: 2,
            raw_url: "A.EXAMPLE.COM".to_string(),
            at: at(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.sites(), before.as_slice());
    assert_unique_urls(&state);
}

#[test]
fn update_to_own_url_still_rechecks() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, effects) = update(
        state,
        Msg::UpdateRequested {
            site_id: 1,
            raw_url: "https://a.example.com/".to_string(),
            at: at(),
        },
    );
    assert_eq!(state.sites().len(), 1);
    assert_eq!(check_effects(&effects).len(), 1);
}

#[test]
fn update_unknown_site_is_noop() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, effects) = update(
        state,
        Msg::UpdateRequested {
            site_id: 42,
            raw_url: "z.example.com".to_string(),
            at: at(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(urls(&state), vec!["https://a.example.com"]);
}

#[test]
fn remove_keeps_order_of_others() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, _) = add(state, "b.example.com");
    let (state, _) = add(state, "c.example.com");

    let (state, effects) = update(state, Msg::RemoveRequested { site_id: 2 });
    assert_eq!(ids(&state), vec![1, 3]);
    assert_eq!(effects, vec![Effect::PersistSnapshot(state.snapshot())]);

    let (state, effects) = update(state, Msg::RemoveRequested { site_id: 2 });
    assert_eq!(ids(&state), vec![1, 3]);
    assert!(effects.is_empty());
}

#[test]
fn remove_all_clears_and_persists_empty_snapshot() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, _) = add(state, "b.example.com");

    let (state, effects) = update(state, Msg::RemoveAllRequested);
    assert!(state.sites().is_empty());
    match &effects[..] {
        [Effect::PersistSnapshot(snapshot)] => {
            assert!(snapshot.sites.is_empty());
            assert_eq!(snapshot.next_id, 3);
        }
        other => panic!("unexpected effects {other:?}"),
    }

    let (_state, effects) = update(state, Msg::RemoveAllRequested);
    assert!(effects.is_empty());
}

#[test]
fn toggle_ignore_flips_flag_without_check() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, effects) = update(state, Msg::ToggleIgnoreRequested { site_id: 1 });
    assert!(state.sites()[0].ignored);
    assert_eq!(state.sites()[0].id, 1);
    assert_eq!(effects, vec![Effect::PersistSnapshot(state.snapshot())]);

    let (state, _) = update(state, Msg::ToggleIgnoreRequested { site_id: 1 });
    assert!(!state.sites()[0].ignored);
}

#[test]
fn reorder_replaces_sequence() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, _) = add(state, "b.example.com");
    let (state, _) = add(state, "c.example.com");

    let (state, effects) = update(
        state,
        Msg::Reordered {
            order: vec![3, 1, 2],
        },
    );
    assert_eq!(ids(&state), vec![3, 1, 2]);
    assert_eq!(effects, vec![Effect::PersistSnapshot(state.snapshot())]);
    assert_eq!(
        state.export_text(),
        "https://c.example.com\nhttps://a.example.com\nhttps://b.example.com"
    );
}

#[test]
fn reorder_with_foreign_ids_leaves_order_untouched() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, _) = add(state, "b.example.com");

    let (state, effects) = update(state, Msg::Reordered { order: vec![2, 9] });
    assert_eq!(ids(&state), vec![1, 2]);
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::Reordered { order: vec![2] });
    assert_eq!(ids(&state), vec![1, 2]);
    assert!(effects.is_empty());
}

#[test]
fn import_dedupes_against_collection_and_batch() {
    init_logging();
    let (state, _) = add(AppState::new(), "existing.example.com");
    let text = "new.example.com\n\n  EXISTING.example.com/ \nhttps://new.example.com\n   \nother.example.com\n";

    let (state, effects) = update(
        state,
        Msg::ImportRequested {
            text: text.to_string(),
            at: at(),
        },
    );

    assert_eq!(
        urls(&state),
        vec![
            "https://existing.example.com",
            "https://new.example.com",
            "https://other.example.com",
        ]
    );
    assert!(matches!(effects[0], Effect::PersistSnapshot(_)));
    assert_eq!(
        check_effects(&effects),
        vec![
            (2, "https://new.example.com".to_string()),
            (3, "https://other.example.com".to_string()),
        ]
    );
    assert_eq!(
        state.view().last_import,
        Some(ImportStats {
            added: 2,
            skipped: 2
        })
    );
    assert_unique_urls(&state);
}

#[test]
fn import_of_only_duplicates_does_not_persist() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, effects) = update(
        state,
        Msg::ImportRequested {
            text: "a.example.com\nhttps://A.example.com/\n".to_string(),
            at: at(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.view().last_import,
        Some(ImportStats {
            added: 0,
            skipped: 2
        })
    );
}

#[test]
fn export_then_import_reproduces_url_set() {
    init_logging();
    let (state, _) = add(AppState::new(), "b.example.com");
    let (state, _) = add(state, "http://a.example.com");
    let (state, _) = add(state, "c.example.com/x");

    let (_, effects) = update(state.clone(), Msg::ExportRequested);
    let exported = match &effects[..] {
        [Effect::ExportText(text)] => text.clone(),
        other => panic!("unexpected effects {other:?}"),
    };
    assert_eq!(exported, state.export_text());

    let (fresh, _) = update(
        AppState::new(),
        Msg::ImportRequested {
            text: exported,
            at: at(),
        },
    );
    assert_eq!(urls(&fresh), urls(&state));
}

#[test]
fn uniqueness_holds_across_mixed_operations() {
    init_logging();
    let mut state = AppState::new();
    let inputs = [
        "a.example.com",
        "A.example.com/",
        "http://a.example.com",
        "b.example.com",
    ];
    for raw in inputs {
        state = add(state, raw).0;
    }
    state = update(
        state,
        Msg::UpdateRequested {
            site_id: 3,
            raw_url: "b.example.com".to_string(),
            at: at(),
        },
    )
    .0;
    state = update(
        state,
        Msg::ImportRequested {
            text: "b.example.com\nc.example.com\nhttp://a.example.com/".to_string(),
            at: at(),
        },
    )
    .0;
    state = update(
        state,
        Msg::UpdateRequested {
            site_id: 1,
            raw_url: "c.example.com".to_string(),
            at: at(),
        },
    )
    .0;

    assert_unique_urls(&state);
    assert_eq!(
        urls(&state),
        vec![
            "https://a.example.com",
            "http://a.example.com",
            "https://b.example.com",
            "https://c.example.com",
        ]
    );
}

#[test]
fn selection_helper_follows_collection_order() {
    init_logging();
    let (state, _) = add(AppState::new(), "a.example.com");
    let (state, _) = add(state, "b.example.com");
    let (state, _) = update(state, Msg::ToggleIgnoreRequested { site_id: 1 });

    let picked: Vec<CheckTarget> = state
        .select(|site| !site.ignored)
        .into_iter()
        .map(|site| CheckTarget {
            site_id: site.id,
            url: site.url.clone(),
        })
        .collect();
    assert_eq!(
        picked,
        vec![CheckTarget {
            site_id: 2,
            url: "https://b.example.com".to_string()
        }]
    );
}
