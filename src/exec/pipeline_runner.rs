use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use contract::ModuleId;
use util::IdVec;

use crate::context::RunContext;
use crate::errors::Errors;
use crate::fs::Status;
use crate::resolve;
use crate::ui::Ui;

use super::Phase;

/// How a run that didn't fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every module is complete.
    Complete,
    /// Every pending module passed its dependency check; nothing ran.
    PrecheckComplete,
    /// A stop module was reached; the label is the stop module's.
    Stopped(String),
}

/// `PipelineRunner` is the struct that actually runs a pipeline.
///
/// Modules that are already complete on disk are skipped. Every other
/// module has its inputs bound and its dependencies checked before any of
/// them runs, so configuration problems surface all at once and before
/// any work is done. Then the modules run in order: each one's inputs
/// must be ready, it executes, and its cleanup runs no matter what.
/// Status markers are written as modules move through their phases, so a
/// later run can pick up where this one stopped.
pub struct PipelineRunner {
    ctx: RunContext,
    ui: Ui,
    precheck: bool,
    phases: IdVec<ModuleId, Phase>,
}

impl PipelineRunner {
    pub fn new(ctx: RunContext, ui: Ui, precheck: bool) -> Self {
        let mut phases = IdVec::with_capacity(ctx.modules.len());
        for _ in ctx.modules.iter() {
            phases.push(Phase::Unstarted);
        }
        Self {
            ctx,
            ui,
            precheck,
            phases,
        }
    }

    pub fn run(&mut self) -> Result<RunOutcome> {
        let root = self.ctx.root();
        let pending = self.pending_modules()?;

        if pending.is_empty() {
            eprintln!("{}", "All modules are already complete.".green());
            if !self.precheck {
                self.mark(&root, Status::Complete);
            }
            return Ok(RunOutcome::Complete);
        }

        let (started, failed) = if self.precheck {
            (Status::PrecheckStarted, Status::PrecheckFailed)
        } else {
            (Status::Started, Status::Failed)
        };
        self.mark(&root, started);

        if let Err(e) = self.check_dependencies(&pending) {
            self.mark(&root, failed);
            return Err(e);
        }

        if self.precheck {
            self.mark(&root, Status::PrecheckComplete);
            eprintln!("\n{}\n", "Precheck complete.".green());
            return Ok(RunOutcome::PrecheckComplete);
        }

        eprintln!("\n{}.\n", "Starting pipeline execution".magenta());
        for &id in &pending {
            let label = self.ctx.entry(id)?.label.clone();
            if let Err(e) = self.run_module(id) {
                self.mark(&root, Status::Failed);
                return Err(e.context(format!("while running module \"{label}\"")));
            }
            if self.ctx.entry(id)?.module.is_stop() {
                eprintln!("{} at {label}. Restart the pipeline to continue.\n", "STOPPED".yellow());
                return Ok(RunOutcome::Stopped(label));
            }
        }

        self.mark(&root, Status::Complete);
        eprintln!("{}\n", "Completed pipeline.".green());
        Ok(RunOutcome::Complete)
    }

    /// Modules without a complete marker, in execution order.
    fn pending_modules(&self) -> Result<Vec<ModuleId>> {
        let mut pending = Vec::with_capacity(self.ctx.modules.len());
        for (id, entry) in self.ctx.modules.enumerate() {
            if self.ctx.status(id)?.is_complete() {
                eprintln!("{} {}", "COMPLETE".green(), entry.label);
            } else {
                pending.push(id);
            }
        }
        Ok(pending)
    }

    /// Bind inputs and check dependencies of every pending module,
    /// failing with all the problems found if there are any.
    fn check_dependencies(&mut self, pending: &[ModuleId]) -> Result<()> {
        self.ui.verbose_progress("Checking module dependencies");
        let (checking, failed) = if self.precheck {
            (Phase::PrecheckStarted, Phase::PrecheckFailed)
        } else {
            (Phase::CheckingDependencies, Phase::Failed)
        };

        let mut errors = Errors::default();
        for &id in pending {
            self.set_phase(id, checking)?;
            match self.check_module(id) {
                Ok(()) if self.precheck => self.set_phase(id, Phase::PrecheckComplete)?,
                Ok(()) => self.set_phase(id, Phase::DependenciesChecked)?,
                Err(e) => {
                    self.set_phase(id, failed)?;
                    let label = &self.ctx.entry(id)?.label;
                    errors.add_context(e, format!("while checking module \"{label}\""));
                }
            }
        }
        self.ui.done();
        errors.print_recap("checking module dependencies")?;
        Ok(())
    }

    fn check_module(&mut self, id: ModuleId) -> Result<()> {
        self.ctx.resolve(id)?;
        let env = self.ctx.env(id)?;
        self.ctx.entry(id)?.module.check_dependencies(&env)
    }

    fn run_module(&mut self, id: ModuleId) -> Result<()> {
        self.ui.start_timer();
        let label = self.ctx.entry(id)?.label.clone();
        eprintln!("{} {label}", "RUN".green());

        let ready = {
            let entry = self.ctx.entry(id)?;
            resolve::check_ready(&entry.label, &entry.bindings, &self.ctx.fs)
        };
        if let Err(e) = ready {
            self.set_phase(id, Phase::Failed)?;
            return Err(e.into());
        }

        self.set_phase(id, Phase::Executing)?;
        let executed = {
            let env = self.ctx.env(id)?;
            self.ctx.entry(id)?.module.execute(&env)
        };

        self.set_phase(id, Phase::CleaningUp)?;
        let cleaned = {
            let env = self.ctx.env(id)?;
            self.ctx.entry(id)?.module.cleanup(&env)
        };

        let result = match (executed, cleaned) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(e)) => Err(e.context("during cleanup")),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup_err)) => {
                log::warn!("{label}: cleanup after failed execution also failed: {cleanup_err:#}");
                Err(e)
            }
        };

        match result {
            Ok(()) => {
                self.set_phase(id, Phase::Complete)?;
                self.ui.print_elapsed(&label);
                eprintln!("{} {label}\n", "COMPLETED".green());
                Ok(())
            }
            Err(e) => {
                self.set_phase(id, Phase::Failed)?;
                eprintln!("{} {label}\n", "FAILED".red());
                Err(e)
            }
        }
    }

    /// Move module `id` to `next`, updating its marker if its status changes.
    fn set_phase(&mut self, id: ModuleId, next: Phase) -> Result<()> {
        let phase = self
            .phases
            .get_mut(id)
            .with_context(|| format!("no phase for module {id}"))?;
        let prev = *phase;
        *phase = prev.advance(next)?;
        log::debug!("module {id}: {prev} -> {next}");

        if let Some(status) = next.status() {
            if prev.status() != Some(status) {
                let dir = self.ctx.entry(id)?.dirs.root.clone();
                self.mark(&dir, status);
            }
        }
        Ok(())
    }

    /// Write a status marker. Failing to do so is logged, not returned,
    /// so it can't hide the result of the work being marked.
    fn mark(&self, dir: &Path, status: Status) {
        if let Err(e) = self.ctx.fs.set_status(dir, status) {
            log::error!("unable to mark {:?} as {}: {e:#}", dir, status);
        }
    }
}
