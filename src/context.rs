use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use contract::{ModuleId, Registry};
use mount::PathMapper;
use util::{HashMap, IdVec};

use crate::config::{self, Config};
use crate::fs::{Fs, ModuleDirs, Status};
use crate::metadata::{MetadataTable, TsvMetadata};
use crate::module::{self, Module, ModuleEnv};
use crate::resolve::{BoundInput, Resolver};

/// A module in its place in the pipeline.
pub struct ModuleEntry {
    pub label: String,
    pub dirs: ModuleDirs,
    pub module: Box<dyn Module>,
    /// Filled in when the module's dependencies are checked.
    pub bindings: Vec<BoundInput>,
}

/// Everything needed to run one pipeline: its config, its modules in
/// execution order, and the services modules use while they run.
pub struct RunContext {
    pub id: String,
    pub config: Config,
    pub fs: Fs,
    pub modules: IdVec<ModuleId, ModuleEntry>,
    pub mapper: PathMapper,
    pub metadata: Option<TsvMetadata>,
    pub registry: Registry,
    /// `input.paths`, as this process sees them.
    pub external_inputs: Vec<PathBuf>,
    pub verbose: bool,
}

impl RunContext {
    /// Instantiate every module declared in `config`. Nothing is written to disk.
    pub fn new(id: &str, config: Config, fs: Fs, mapper: PathMapper, verbose: bool) -> Result<Self> {
        config.ensure_has_modules()?;

        let mut modules = IdVec::with_capacity(config.modules().len());
        let mut labels: HashMap<String, ModuleId> = HashMap::default();
        for (index, decl) in config.modules().iter().enumerate() {
            let id = ModuleId::try_new(index).context("too many modules in pipeline")?;
            let module = module::create(decl, id, &config, &labels)
                .with_context(|| format!("while creating module \"{}\"", decl.label))?;
            modules.push(ModuleEntry {
                label: decl.label.clone(),
                dirs: fs.module_dirs(index, &decl.label),
                module,
                bindings: Vec::with_capacity(0),
            });
            labels.insert(decl.label.clone(), id);
        }

        // config paths are host paths:
        let mut external_inputs = Vec::with_capacity(4);
        for path in config.get_list(config::INPUT_PATHS) {
            external_inputs.push(mapper.to_container_path(Path::new(path))?);
        }
        let metadata = match config.get_path(config::METADATA_FILE) {
            Some(path) => Some(TsvMetadata::new(mapper.to_container_path(&path)?)),
            None => None,
        };

        Ok(Self {
            id: id.to_owned(),
            config,
            fs,
            modules,
            mapper,
            metadata,
            registry: Registry::default(),
            external_inputs,
            verbose,
        })
    }

    pub fn name(&self) -> &str {
        self.config.pipeline_name().unwrap_or(&self.id)
    }

    pub fn root(&self) -> PathBuf {
        self.fs.root().to_path_buf()
    }

    /// Create the pipeline dir, its master config (unless one exists
    /// already) and every module's dirs.
    pub fn bootstrap(&mut self) -> Result<()> {
        self.fs.ensure_root_exists()?;
        // root may have been canonicalized:
        for (index, entry) in self.modules.iter_mut().enumerate() {
            entry.dirs = self.fs.module_dirs(index, &entry.label);
        }

        let master = self.fs.master_config(&self.id);
        if !self.fs.exists(&master) {
            log::info!("writing master config {:?}", master);
            self.fs
                .write_file(&master, &self.config.to_text())
                .context("while writing master config")?;
        }

        for entry in self.modules.iter() {
            for dir in [&entry.dirs.root, &entry.dirs.output, &entry.dirs.log, &entry.dirs.temp] {
                self.fs.create_dir(dir)?;
            }
        }
        Ok(())
    }

    pub fn metadata(&self) -> Option<&dyn MetadataTable> {
        self.metadata.as_ref().map(|m| m as &dyn MetadataTable)
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(
            &self.modules,
            &self.external_inputs,
            self.metadata(),
            &self.registry,
            &self.fs,
        )
    }

    /// Bind module `id`'s inputs and keep the bindings for execution.
    pub fn resolve(&mut self, id: ModuleId) -> Result<()> {
        let bindings = self.resolver().resolve(id)?;
        if let Some(entry) = self.modules.get_mut(id) {
            entry.bindings = bindings;
        }
        Ok(())
    }

    pub fn entry(&self, id: ModuleId) -> Result<&ModuleEntry> {
        self.modules
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("no module with id {id}"))
    }

    pub fn env(&self, id: ModuleId) -> Result<ModuleEnv<'_>> {
        let entry = self.entry(id)?;
        Ok(ModuleEnv {
            label: &entry.label,
            dirs: &entry.dirs,
            config: &self.config,
            fs: &self.fs,
            mapper: &self.mapper,
            metadata: self.metadata(),
            inputs: &entry.bindings,
            registry: &self.registry,
            verbose: self.verbose,
        })
    }

    pub fn status(&self, id: ModuleId) -> Result<Status> {
        Ok(self.fs.status(&self.entry(id)?.dirs.root))
    }

    /// Print the modules in this pipeline and what will happen to each.
    pub fn print_plan(&self) -> Result<()> {
        eprintln!(
            "\nPipeline {} in {:?}:",
            self.name().magenta(),
            self.fs.root()
        );
        for (id, entry) in self.modules.enumerate() {
            let action = match self.status(id)? {
                Status::Complete => "COMPLETE".green(),
                Status::Failed => "RERUN".yellow(),
                _ => "RUN".green(),
            };
            eprintln!(
                "{action} {} ({})",
                entry.label,
                entry.module.type_name()
            );
        }
        if self.verbose && self.mapper.in_container() {
            eprintln!("Paths are mapped through the container's volume mounts.");
        }
        Ok(())
    }
}
