use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use mount::{PathMapper, RequiredRoot};

use crate::config::{self, Config};
use crate::context::RunContext;
use crate::discover::Pipeline;
use crate::exec::{PipelineRunner, RunOutcome};
use crate::fs::Fs;
use crate::settings::{Mode, Settings};
use crate::ui::Ui;

const DEFAULT_RUNTIME: &str = "docker";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Pipeline {0:?} already exists; use --restart to resume it")]
    PipelineExists(PathBuf),
    #[error("Can't name pipeline after config file {0:?}; set pipeline.name")]
    NoPipelineName(PathBuf),
    #[error("No container id: set docker.containerId")]
    NoContainerId,
}

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let ui = Ui::new(&settings);
        Self { settings, ui }
    }

    /// Run the app, using settings to determine what to do.
    pub fn run(self) -> Result<Option<RunOutcome>> {
        match self.settings.mode.clone() {
            Mode::Status(dir) => {
                let pipeline = Pipeline::open(&dir)?;
                self.ui.print_status(&pipeline)?;
                Ok(None)
            }
            Mode::Restart(dir) => self.restart(&dir),
            Mode::Run => self.run_new(),
        }
    }

    fn run_new(self) -> Result<Option<RunOutcome>> {
        let config_path = self.settings.config.clone();
        self.ui.verbose_progress_debug("Reading config file", &config_path);
        let mut config = Config::load(&Fs::new(&self.settings.pipelines, true), &config_path)?;
        self.ui.done();

        config.absolutize_paths(self.settings.config_parent_dir()?);

        let name = match config.pipeline_name() {
            Some(name) => name.to_owned(),
            None => config_path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| Error::NoPipelineName(config_path.clone()))?
                .to_owned(),
        };
        config.set(config::PIPELINE_NAME, &name);

        let root = self.settings.pipelines.join(&name);
        if Pipeline::try_open(&root).is_some() {
            return Err(Error::PipelineExists(root).into());
        }
        self.run_pipeline(&root, &name, config)
    }

    fn restart(self, dir: &Path) -> Result<Option<RunOutcome>> {
        let pipeline = Pipeline::open(dir)?;
        if self.settings.verbose > 0 {
            eprintln!("Restarting pipeline {} in {:?}", pipeline.name(), pipeline.root());
        }
        let config = Config::load(&Fs::new(pipeline.root(), true), pipeline.master_config())
            .context("while reading master config")?;
        self.run_pipeline(pipeline.root(), pipeline.id(), config)
    }

    fn run_pipeline(self, root: &Path, id: &str, config: Config) -> Result<Option<RunOutcome>> {
        let mapper = self.path_mapper(&config, root)?;
        let fs = Fs::new(root, self.settings.dry_run);

        self.ui.verbose_progress("Creating modules");
        let mut ctx = RunContext::new(id, config, fs, mapper, self.ui.verbose)?;
        self.ui.done();

        ctx.print_plan()?;
        if self.settings.dry_run || !self.ui.confirm("Proceed?")? {
            return Ok(None);
        }

        ctx.bootstrap()
            .context("while preparing pipeline directory")?;
        eprintln!("\n{}.", "Pipeline preparation complete".green());

        let mut runner = PipelineRunner::new(ctx, self.ui, self.settings.precheck);
        let outcome = runner.run().context("while running pipeline")?;
        Ok(Some(outcome))
    }

    /// Identity outside a container; otherwise a map built from the
    /// container runtime's view of our volume mounts.
    fn path_mapper(&self, config: &Config, root: &Path) -> Result<PathMapper> {
        let enabled = self.settings.docker || config.get_bool(config::DOCKER_ENABLED)?.unwrap_or(false);
        if !enabled {
            return Ok(PathMapper::Identity);
        }
        if !mount::in_docker() {
            log::warn!("docker mode is on, but this doesn't look like a container");
        }

        let runtime = config.get_str(config::DOCKER_RUNTIME).unwrap_or(DEFAULT_RUNTIME);
        // docker sets a container's hostname to its short id:
        let container_id = match config.get_str(config::DOCKER_CONTAINER_ID) {
            Some(id) => id.to_owned(),
            None => std::env::var("HOSTNAME").map_err(|_| Error::NoContainerId)?,
        };
        // without an explicit pipeline mount, the pipeline dir must still
        // be on some volume or nothing we write would reach the host.
        let root = root.to_str().ok_or(util::PathEncodingError)?;
        let required_root = match config.get_str(config::DOCKER_PIPELINE_MOUNT) {
            Some(mount) => RequiredRoot::MountedAt(mount),
            None => RequiredRoot::Covering(root),
        };
        let mapper = PathMapper::for_container(runtime, &container_id, required_root)?;
        Ok(mapper)
    }
}
