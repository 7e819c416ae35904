use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every message that changes the collection starts its effect list with a
/// single [`Effect::PersistSnapshot`] of the post-change collection, so the
/// store is written before any check is issued.
/// Duplicates, unknown ids and late results for removed sites change nothing
/// and emit nothing.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let (changed, mut effects) = match msg {
        Msg::AddRequested { raw_url, at } => match state.insert_site(&raw_url, at) {
            Some(target) => (true, vec![target.into()]),
            None => (false, Vec::new()),
        },
        Msg::UpdateRequested {
            site_id,
            raw_url,
            at,
        } => match state.update_url(site_id, &raw_url, at) {
            Some(target) => (true, vec![target.into()]),
            None => (false, Vec::new()),
        },
        Msg::RemoveRequested { site_id } => (state.remove(site_id), Vec::new()),
        Msg::RemoveAllRequested => (state.remove_all(), Vec::new()),
        Msg::ToggleIgnoreRequested { site_id } => (state.toggle_ignore(site_id), Vec::new()),
        Msg::Reordered { order } => (state.reorder(&order), Vec::new()),
        Msg::RecheckRequested { site_id } => {
            let effects: Vec<Effect> = state
                .begin_recheck(site_id)
                .map(Effect::from)
                .into_iter()
                .collect();
            (false, effects)
        }
        Msg::RecheckManyRequested { selection } => {
            let targets = state.begin_recheck_many(|site| selection.matches(site));
            if targets.is_empty() {
                (false, Vec::new())
            } else {
                (false, vec![Effect::CheckBatch { targets }])
            }
        }
        Msg::ImportRequested { text, at } => {
            let mut effects = Vec::new();
            let mut skipped = 0;
            for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
                match state.insert_site(line, at) {
                    Some(target) => effects.push(target.into()),
                    None => skipped += 1,
                }
            }
            state.set_last_import(effects.len(), skipped);
            (!effects.is_empty(), effects)
        }
        Msg::ExportRequested => (false, vec![Effect::ExportText(state.export_text())]),
        Msg::FilterChanged(filter) => {
            state.set_filter(filter);
            (false, Vec::new())
        }
        Msg::RestoreSnapshot(snapshot) => {
            state.restore(snapshot);
            (false, Vec::new())
        }
        Msg::CheckCompleted { site_id, outcome } => {
            (state.finish_check(site_id, outcome), Vec::new())
        }
        Msg::BatchCheckCompleted { outcomes } => {
            let mut changed = false;
            for (site_id, outcome) in outcomes {
                changed |= state.finish_check(site_id, outcome);
            }
            (changed, Vec::new())
        }
    };

    if changed {
        effects.insert(0, Effect::PersistSnapshot(state.snapshot()));
    }
    (state, effects)
}
