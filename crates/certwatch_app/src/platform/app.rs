use std::io::{self, BufRead};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use certwatch_core::{update, AppState, Msg, SiteId};
use certwatch_engine::{
    ensure_state_dir, install_crypto_provider, BlobStore, Checker, EndpointChecker, EngineHandle,
    FileBlobStore, TlsChecker,
};
use certwatch_logging::{cw_debug, cw_error, cw_info, cw_warn};
use chrono::Utc;
use clap::Parser;

use super::cli::{parse_shell_line, Action, Cli};
use super::config::{AppConfig, CheckerChoice, SNAPSHOT_KEY};
use super::effects::{EffectRunner, ExportTarget, MsgEventSink};
use super::logging;
use super::persistence::load_snapshot;
use super::render;

/// Everything the single application loop consumes: engine results and
/// user commands share one channel so one owner applies them in order.
#[derive(Debug)]
pub enum Input {
    Msg(Msg),
    Action(Action),
}

enum Flow {
    Continue,
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli)?;
    ensure_state_dir(&config.state_dir)
        .with_context(|| format!("state directory {}", config.state_dir.display()))?;
    logging::initialize(config.log, &config.log_path());
    install_crypto_provider();
    cw_info!(
        "certwatch starting: state_dir={:?} checker={:?} timeout={:?}",
        config.state_dir,
        config.checker,
        config.check.timeout
    );

    let action = cli.command.into_action(Utc::now())?;

    let (tx, rx) = mpsc::channel::<Input>();
    let checker: Arc<dyn Checker> = match &config.checker {
        CheckerChoice::Direct => Arc::new(TlsChecker::new(config.check.clone())?),
        CheckerChoice::Endpoint(endpoint) => {
            Arc::new(EndpointChecker::new(endpoint.clone(), &config.check)?)
        }
    };
    let engine = EngineHandle::with_checker(checker, Arc::new(MsgEventSink::new(tx.clone())))?;
    let store: Arc<dyn BlobStore> = Arc::new(FileBlobStore::new(&config.state_dir, SNAPSHOT_KEY));

    let mut app = App::new(EffectRunner::new(engine, store.clone()), rx);
    app.dispatch(Msg::RestoreSnapshot(load_snapshot(store.as_ref())))?;

    match action {
        Action::Shell => {
            spawn_stdin_reader(tx);
            app.run_shell()
        }
        action => {
            let show_list = matches!(action, Action::Dispatch(_));
            app.perform(action)?;
            app.settle()?;
            if show_list {
                app.print_list();
            }
            Ok(())
        }
    }
}

struct App {
    state: AppState,
    runner: EffectRunner,
    rx: mpsc::Receiver<Input>,
}

impl App {
    fn new(runner: EffectRunner, rx: mpsc::Receiver<Input>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            rx,
        }
    }

    fn dispatch(&mut self, msg: Msg) -> anyhow::Result<()> {
        cw_debug!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.run(effects)
    }

    fn perform(&mut self, action: Action) -> anyhow::Result<Flow> {
        match action {
            Action::Dispatch(msg) => self.dispatch(msg)?,
            Action::List(filter) => {
                self.dispatch(Msg::FilterChanged(filter))?;
                self.print_list();
            }
            Action::Export(file) => {
                self.runner
                    .export_to(file.map_or(ExportTarget::Stdout, ExportTarget::File));
                self.dispatch(Msg::ExportRequested)?;
            }
            Action::Shell => println!("already in the shell"),
            Action::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Applies engine results until no check is outstanding. Every check is
    /// bounded by the checker timeout, so this terminates.
    fn settle(&mut self) -> anyhow::Result<()> {
        while self.state.checks_in_flight() > 0 {
            match self.rx.recv() {
                Ok(Input::Msg(msg)) => self.dispatch(msg)?,
                Ok(Input::Action(action)) => cw_debug!("ignoring {:?} while settling", action),
                Err(_) => break,
            }
        }
        Ok(())
    }

    /// Result dispatch failures end the shell; command failures are reported
    /// and the shell continues.
    fn run_shell(&mut self) -> anyhow::Result<()> {
        println!("certwatch shell: type `help` for commands, `quit` to leave");
        self.print_list();

        while let Ok(input) = self.rx.recv() {
            match input {
                Input::Msg(msg) => {
                    let checked = checked_sites(&msg);
                    self.dispatch(msg)?;
                    if self.state.consume_dirty() {
                        self.print_notices(&checked);
                    }
                }
                Input::Action(action) => {
                    let redraw = matches!(action, Action::Dispatch(_));
                    match self.perform(action) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Quit) => break,
                        Err(err) => {
                            cw_error!("command failed: {:#}", err);
                            eprintln!("error: {err:#}");
                        }
                    }
                    if self.state.consume_dirty() && redraw {
                        self.print_list();
                    }
                }
            }
        }

        if self.state.checks_in_flight() > 0 {
            println!(
                "waiting for {} outstanding checks",
                self.state.checks_in_flight()
            );
            self.settle()?;
        }
        cw_info!("shell closed");
        Ok(())
    }

    fn print_list(&self) {
        print!("{}", render::render(&self.state.view(), Utc::now()));
    }

    /// Sites removed while their check ran are skipped.
    fn print_notices(&self, site_ids: &[SiteId]) {
        let now = Utc::now();
        for site in site_ids.iter().filter_map(|id| self.state.site(*id)) {
            println!("{}", render::check_notice(site, now));
        }
    }
}

fn checked_sites(msg: &Msg) -> Vec<SiteId> {
    match msg {
        Msg::CheckCompleted { site_id, .. } => vec![*site_id],
        Msg::BatchCheckCompleted { outcomes } => outcomes.iter().map(|(id, _)| *id).collect(),
        _ => Vec::new(),
    }
}

fn spawn_stdin_reader(tx: mpsc::Sender<Input>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    cw_warn!("stdin read failed: {}", err);
                    break;
                }
            };
            match parse_shell_line(&line, Utc::now()) {
                Ok(Some(action)) => {
                    if tx.send(Input::Action(action)).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => eprintln!("{err:#}"),
            }
        }
        let _ = tx.send(Input::Action(Action::Quit));
    });
}
