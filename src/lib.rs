/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// Job execution: subprocesses, supervision, the workflow runner
mod exec;
/// Local and remote file access
mod files;
/// Filesystem operations
mod fs;
/// Workflow definition file
mod job;
/// Result parsers, selected by name
mod parsers;
/// Combined command-line and workflow file run settings
mod settings;
/// Task types that make up a job
mod tasks;
/// Text UI
mod ui;

// exported for tests:
pub use app::App;
pub use args::Args;
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
