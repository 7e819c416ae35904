use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use anyhow::Context;
use certwatch_core::{Effect, Msg};
use certwatch_engine::{BlobStore, EngineEvent, EngineHandle, EventSink};
use certwatch_logging::{cw_info, cw_warn};

use super::app::Input;
use super::persistence::save_snapshot;

/// Where the next export lands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportTarget {
    #[default]
    Stdout,
    File(PathBuf),
}

pub struct EffectRunner {
    engine: EngineHandle,
    store: Arc<dyn BlobStore>,
    export_target: ExportTarget,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, store: Arc<dyn BlobStore>) -> Self {
        Self {
            engine,
            store,
            export_target: ExportTarget::default(),
        }
    }

    pub fn export_to(&mut self, target: ExportTarget) {
        self.export_target = target;
    }

    /// Runs every effect and returns the first failure. Checks are issued even
    /// after a failed save: the state already counts them as in flight.
    pub fn run(&self, effects: Vec<Effect>) -> anyhow::Result<()> {
        let mut first_err = None;
        for effect in effects {
            let result = match effect {
                Effect::CheckSite { site_id, url } => {
                    self.engine.check(site_id, url);
                    Ok(())
                }
                Effect::CheckBatch { targets } => {
                    self.engine.check_batch(targets);
                    Ok(())
                }
                Effect::PersistSnapshot(snapshot) => save_snapshot(self.store.as_ref(), &snapshot),
                Effect::ExportText(text) => self.write_export(&text),
            };
            if let Err(err) = result {
                cw_warn!("effect failed: {:#}", err);
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn write_export(&self, text: &str) -> anyhow::Result<()> {
        let mut content = text.to_string();
        if !content.is_empty() {
            content.push('\n');
        }
        match &self.export_target {
            ExportTarget::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(content.as_bytes())?;
                stdout.flush()?;
            }
            ExportTarget::File(path) => {
                fs::write(path, content)
                    .with_context(|| format!("failed to write export to {}", path.display()))?;
                cw_info!("exported {} urls to {:?}", text.lines().count(), path);
            }
        }
        Ok(())
    }
}

/// Feeds engine results into the application loop as messages.
pub struct MsgEventSink {
    tx: mpsc::Sender<Input>,
}

impl MsgEventSink {
    pub fn new(tx: mpsc::Sender<Input>) -> Self {
        Self { tx }
    }
}

impl EventSink for MsgEventSink {
    fn emit(&self, event: EngineEvent) {
        let msg = match event {
            EngineEvent::CheckCompleted { site_id, outcome } => {
                Msg::CheckCompleted { site_id, outcome }
            }
            EngineEvent::BatchCompleted { outcomes } => Msg::BatchCheckCompleted { outcomes },
        };
        if self.tx.send(Input::Msg(msg)).is_err() {
            cw_warn!("application loop gone; check result dropped");
        }
    }
}
