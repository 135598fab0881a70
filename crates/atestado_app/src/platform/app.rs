use std::collections::VecDeque;
use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use atestado_core::{update, ActionKind, AppState, Msg, SelectedFile, StatusKind};
use atestado_engine::EngineHandle;
use atestado_logging::{atestado_debug, atestado_info, atestado_warn};
use clap::Parser;

use super::cli::{Cli, Command, Step};
use super::config::AppConfig;
use super::effects::{map_event, EffectRunner, ManualGraphSource};
use super::logging::{self, LogDestination};
use super::ui;

const EVENT_WAIT: Duration = Duration::from_millis(250);
const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "doc"];

pub fn run_app() -> Result<ExitCode> {
    let cli = Cli::parse();
    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(
        destination,
        atestado_logging::level_for_verbosity(cli.verbose),
    );

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    atestado_debug!("Effective configuration: {:?}", config);

    let engine = EngineHandle::new(config.backend_settings())
        .with_context(|| format!("configuring backend at {}", config.base_url))?;
    let manual_graph = match &cli.command {
        Command::Export { graph } | Command::Infer { graph, .. } => {
            ManualGraphSource::File(graph.clone())
        }
        Command::Run { .. } => ManualGraphSource::Prompt,
    };
    let runner = EffectRunner::new(engine, config.output_dir.clone(), manual_graph);
    let mut driver = Driver::new(AppState::with_import_settings(config.import_settings()), runner);

    let succeeded = match cli.command {
        Command::Run { file, stop_after } => driver.run_pipeline(&file, stop_after)?,
        Command::Export { .. } => driver.perform(Msg::ExportClicked, ActionKind::Download)?,
        Command::Infer { import, .. } => {
            driver.perform(Msg::InferClicked, ActionKind::Infer)?
                && (!import || driver.perform(Msg::ImportClicked, ActionKind::Import)?)
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Feeds user steps and engine events into the core one message at a time.
struct Driver {
    state: AppState,
    runner: EffectRunner,
}

impl Driver {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        Self { state, runner }
    }

    fn run_pipeline(&mut self, file: &Path, stop_after: Step) -> Result<bool> {
        let accepted = file
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()));
        if !accepted {
            atestado_warn!(
                "{} is not a PDF or Word document; the backend may reject it",
                file.display()
            );
        }
        self.dispatch(Msg::FileSelected(SelectedFile::from_path(file)));

        let steps = [
            (Step::Process, Msg::ProcessClicked, ActionKind::Process),
            (Step::Export, Msg::ExportClicked, ActionKind::Download),
            (Step::Infer, Msg::InferClicked, ActionKind::Infer),
            (Step::Import, Msg::ImportClicked, ActionKind::Import),
        ];
        for (step, msg, action) in steps {
            if !self.perform(msg, action)? {
                return Ok(false);
            }
            if step == stop_after {
                break;
            }
        }
        Ok(true)
    }

    /// Sends one user step and waits for its action to settle.
    ///
    /// Returns whether the action ended `Ok`.
    fn perform(&mut self, msg: Msg, action: ActionKind) -> Result<bool> {
        self.dispatch(msg);
        self.settle(action)?;
        let status = self.state.actions().get(action);
        match status.kind {
            StatusKind::Ok => Ok(true),
            StatusKind::Error => {
                atestado_warn!("{} failed: {}", action, status.message);
                Ok(false)
            }
            StatusKind::Waiting | StatusKind::Processing => {
                atestado_warn!("{} was not started", action);
                Ok(false)
            }
        }
    }

    fn settle(&mut self, action: ActionKind) -> Result<()> {
        while self.is_busy(action) {
            match self.runner.engine().recv_timeout(EVENT_WAIT) {
                Ok(event) => {
                    if let Some(msg) = map_event(event) {
                        self.dispatch(msg);
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.dispatch(Msg::Tick),
                Err(RecvTimeoutError::Disconnected) => bail!("engine stopped unexpectedly"),
            }
        }
        Ok(())
    }

    fn is_busy(&self, action: ActionKind) -> bool {
        let processing = self.state.actions().is_processing(action);
        match action {
            ActionKind::Process => processing || self.state.polling_task().is_some(),
            _ => processing,
        }
    }

    /// Applies `msg` and every message its effects resolve to synchronously.
    fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            if self.state.consume_dirty() {
                self.render();
            }
            inbox.extend(self.runner.run(effects));
        }
    }

    fn render(&self) {
        let view = self.state.view();
        for line in ui::render::render(&view) {
            println!("{line}");
        }
        println!();
        if let Some(debug) = &view.debug_json {
            atestado_debug!("Debug view:\n{}", debug);
        }
        if view.current_step == 6 {
            atestado_info!("All steps completed");
        }
    }
}
