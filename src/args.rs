use clap::Parser;

const CMD_NAME: &str = "lks";
const DEFAULT_CONFIG: &str = "pipeline.properties";
const DEFAULT_PIPELINES: &str = "pipelines";

/// Stores our command-line args format.
#[derive(Parser)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Pipeline config file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    #[arg(env = "LOCKSTEP_CONFIG")]
    pub config: String,

    /// Directory new pipelines are created in
    #[arg(short = 'o', long, value_name = "DIR", default_value = DEFAULT_PIPELINES)]
    #[arg(env = "LOCKSTEP_PIPELINES")]
    pub pipelines: String,

    /// Resume the pipeline in DIR
    #[arg(short, long, value_name = "DIR", conflicts_with = "status")]
    pub restart: Option<String>,

    /// Print the status of the pipeline in DIR
    #[arg(short, long, value_name = "DIR")]
    pub status: Option<String>,

    /// Check every module's dependencies without running anything
    #[arg(short, long)]
    pub precheck: bool,

    /// Running in a container; map paths through its volume mounts
    #[arg(short, long)]
    pub docker: bool,

    /// Bypass user confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Print additional debugging info (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Dry run; print info but don't modify anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}
