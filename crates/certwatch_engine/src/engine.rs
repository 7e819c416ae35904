use std::sync::{mpsc, Arc};
use std::thread;

use certwatch_core::{CheckTarget, SiteId};
use certwatch_logging::{cw_debug, cw_info, cw_warn};
use futures_util::future::join_all;

use crate::{Checker, EngineError, EngineEvent};

/// Receives engine results. Called from runtime worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    Check { site_id: SiteId, url: String },
    CheckBatch { targets: Vec<CheckTarget> },
}

/// Runs certificate checks off the caller's thread.
///
/// Commands are fire-and-forget; each result goes to the sink tagged with the
/// site identity it was issued for. Results arrive in completion order.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn with_checker(
        checker: Arc<dyn Checker>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("certwatch-engine")
            .build()?;

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let checker = checker.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    handle_command(checker.as_ref(), command, sink.as_ref()).await;
                });
            }
            cw_debug!("engine command channel closed");
        });

        Ok(Self { cmd_tx })
    }

    pub fn check(&self, site_id: SiteId, url: impl Into<String>) {
        let url = url.into();
        cw_info!("check site_id={} url={}", site_id, url);
        if self
            .cmd_tx
            .send(EngineCommand::Check { site_id, url })
            .is_err()
        {
            cw_warn!("engine stopped; check for site {} dropped", site_id);
        }
    }

    pub fn check_batch(&self, targets: Vec<CheckTarget>) {
        cw_info!("batch check of {} sites", targets.len());
        if self
            .cmd_tx
            .send(EngineCommand::CheckBatch { targets })
            .is_err()
        {
            cw_warn!("engine stopped; batch check dropped");
        }
    }
}

async fn handle_command(checker: &dyn Checker, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::Check { site_id, url } => {
            let outcome = checker.check(&url).await;
            sink.emit(EngineEvent::CheckCompleted { site_id, outcome });
        }
        EngineCommand::CheckBatch { targets } => {
            let outcomes = join_all(targets.into_iter().map(|target| async move {
                (target.site_id, checker.check(&target.url).await)
            }))
            .await;
            sink.emit(EngineEvent::BatchCompleted { outcomes });
        }
    }
}
