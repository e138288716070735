use anyhow::{Context, Result};

use contract::{DataKind, DataUnit, InputSpecs, ModuleId, ModuleInput, ModuleOutput, OutputSpecs};
use util::HashMap;

use crate::check::{available_threads, CheckResult, MIN_THREADS};
use crate::config::Config;
use crate::exec::run_cmd;

use super::{input_env_var, Error, Module, ModuleEnv};

const COMMAND: &str = "command";
const INPUT_KIND: &str = "inputKind";
const INPUT_FROM: &str = "inputFrom";
const INPUT_OPTIONAL: &str = "inputOptional";
const OUTPUT_KIND: &str = "outputKind";
const NUM_THREADS: &str = "numThreads";

const INPUT_LABEL: &str = "input";
const OUTPUT_LABEL: &str = "output";

/// Runs `<label>.command` with `sh -c`, inside its own output dir.
///
/// The command sees its inputs and dirs through environment variables:
/// - `LOCKSTEP_INPUT_INPUT`: space-separated paths bound to its input;
///   unset when `<label>.inputOptional` is true and nothing was found
/// - `LOCKSTEP_OUTPUT_DIR`: where it should write its output
/// - `LOCKSTEP_HOST_OUTPUT_DIR`: the same dir as the host sees it
/// - `LOCKSTEP_TEMP_DIR`: scratch space, emptied after every run
/// - `LOCKSTEP_THREADS`: `<label>.numThreads`, default 1
/// - `LOCKSTEP_METADATA`: the metadata table, if one is configured
pub struct Command {
    command: Option<String>,
    num_threads: Option<u32>,
    inputs: InputSpecs,
    outputs: OutputSpecs,
}

impl Command {
    pub const TYPE: &'static str = "Command";

    pub fn new(
        label: &str,
        id: ModuleId,
        config: &Config,
        earlier: &HashMap<String, ModuleId>,
    ) -> Result<Self> {
        let mut inputs = InputSpecs::with_capacity(1);
        if let Some(kind) = config.get_module_str(label, INPUT_KIND) {
            let kind: DataKind = kind
                .parse()
                .with_context(|| format!("while reading {label}.{INPUT_KIND}"))?;
            let template = DataUnit::template(kind, format!("input to {label}"));
            let mut input = ModuleInput::new(INPUT_LABEL, "data the command reads", template);

            if let Some(from) = config.get_module_str(label, INPUT_FROM) {
                let producer = earlier.get(from).copied().ok_or_else(|| Error::UnknownLabel {
                    module: label.to_owned(),
                    label: from.to_owned(),
                })?;
                let filter = input.filter().clone().and_produced_by(producer);
                input = input.with_filter(filter);
            }
            if config.get_bool(&format!("{label}.{INPUT_OPTIONAL}"))?.unwrap_or(false) {
                input = input.optional();
            }
            inputs.push(input);
        }

        let mut outputs = OutputSpecs::with_capacity(1);
        if let Some(kind) = config.get_module_str(label, OUTPUT_KIND) {
            let kind: DataKind = kind
                .parse()
                .with_context(|| format!("while reading {label}.{OUTPUT_KIND}"))?;
            let template = DataUnit::template(kind, format!("output of {label}"));
            outputs.push(ModuleOutput::new(
                OUTPUT_LABEL,
                "data the command writes",
                template,
                id,
            ));
        }

        Ok(Self {
            command: config.get_module_str(label, COMMAND).map(str::to_owned),
            num_threads: config.get_u32(&format!("{label}.{NUM_THREADS}"))?,
            inputs,
            outputs,
        })
    }

    fn threads(&self) -> u32 {
        self.num_threads.unwrap_or(1)
    }
}

impl Module for Command {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn inputs(&self) -> &InputSpecs {
        &self.inputs
    }

    fn outputs(&self) -> &OutputSpecs {
        &self.outputs
    }

    fn check_dependencies(&self, env: &ModuleEnv) -> Result<()> {
        if self.command.is_none() {
            return Err(Error::MissingProperty {
                module: env.label.to_owned(),
                key: format!("{}.{COMMAND}", env.label),
            }
            .into());
        }

        let (wanted, available) = (self.threads(), available_threads());
        let check = CheckResult::evaluate(MIN_THREADS, env.label, env.config, wanted > available)?;
        let msg = format!("{} wants {wanted} threads; {available} available", env.label);
        if check.escalate(&msg) {
            return Err(Error::TooManyThreads {
                module: env.label.to_owned(),
                wanted,
                available,
            }
            .into());
        }
        Ok(())
    }

    fn execute(&self, env: &ModuleEnv) -> Result<()> {
        let command = self.command.as_deref().ok_or_else(|| Error::MissingProperty {
            module: env.label.to_owned(),
            key: format!("{}.{COMMAND}", env.label),
        })?;

        env.fs.create_dir(&env.dirs.output)?;
        env.fs.create_dir(&env.dirs.temp)?;

        let mut cmd = std::process::Command::new("sh");
        cmd.arg("-c").arg(command).current_dir(&env.dirs.output);

        // an optional input left unbound leaves its variable unset.
        for input in env.inputs.iter().filter(|i| i.is_bound()) {
            let paths: Vec<String> = input
                .paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            cmd.env(input_env_var(input.label()), paths.join(" "));
        }
        let host_output = env.mapper.to_host_path(&env.dirs.output)?;
        cmd.env("LOCKSTEP_OUTPUT_DIR", &env.dirs.output)
            .env("LOCKSTEP_HOST_OUTPUT_DIR", host_output)
            .env("LOCKSTEP_TEMP_DIR", &env.dirs.temp)
            .env("LOCKSTEP_THREADS", self.threads().to_string());
        if let Some(metadata) = env.metadata {
            cmd.env("LOCKSTEP_METADATA", metadata.file());
        }

        log::info!("{}: running `{command}`", env.label);
        if run_cmd(&mut cmd, env.fs, env.dirs, env.verbose)? {
            Ok(())
        } else {
            Err(Error::CommandFailed(env.label.to_owned()).into())
        }
    }

    fn cleanup(&self, env: &ModuleEnv) -> Result<()> {
        let temp = &env.dirs.temp;
        if env.fs.exists(temp) {
            env.fs.delete_dir(temp)?;
            env.fs.create_dir(temp)?;
        }
        Ok(())
    }
}
