/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// Disableable sanity checks
mod check;
/// Pipeline config files
mod config;
/// A pipeline's modules and the services they run with
mod context;
/// Finding existing pipelines on disk
mod discover;
/// Aggregating errors across modules
mod errors;
/// Pipeline execution
mod exec;
/// Filesystem operations
mod fs;
/// Sample metadata tables
mod metadata;
/// The module trait and built-in modules
mod module;
/// Binding module inputs to data sources
mod resolve;
/// Combined command-line and config file run settings
mod settings;
/// Text UI
mod ui;

// exported for tests:
pub use app::App;
pub use args::Args;
pub use discover::Pipeline;
pub use exec::RunOutcome;
pub use fs::Status;
pub use settings::Settings;

/// Run the command-line app.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    // INTERPRET SETTINGS ///////////////
    let settings: Settings = args.try_into()?;

    let log_level = match settings.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    simple_logging::log_to_stderr(log_level);

    // RUN THE THING /////////////////
    let app = App::new(settings);
    app.run()?;

    Ok(())
}
