use anyhow::Result;

use contract::{InputSpecs, OutputSpecs};

use super::{Module, ModuleEnv};

/// Halts a run once reached. It's marked complete, so restarting the
/// pipeline picks up with the module after it.
#[derive(Default)]
pub struct Stop {
    inputs: InputSpecs,
    outputs: OutputSpecs,
}

impl Stop {
    pub const TYPE: &'static str = "Stop";
}

impl Module for Stop {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn inputs(&self) -> &InputSpecs {
        &self.inputs
    }

    fn outputs(&self) -> &OutputSpecs {
        &self.outputs
    }

    fn check_dependencies(&self, _env: &ModuleEnv) -> Result<()> {
        Ok(())
    }

    fn execute(&self, env: &ModuleEnv) -> Result<()> {
        log::info!("{}: stopping pipeline", env.label);
        Ok(())
    }

    fn is_stop(&self) -> bool {
        true
    }
}
