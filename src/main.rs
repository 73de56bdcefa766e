use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use yeah_build_core::reporter::platform;
use yeah_build_core::tui::App;
use yeah_build_core::{
    BuildScheduler, ChannelSink, Cli, Commands, CommandRunner, Config, FileSink, LogLevel,
    Logger, ProjectBuilder, Reporter, SelectionState, SharedSink, TeeSink,
};

fn with_log_file(sink: SharedSink, config: &Config) -> Result<SharedSink> {
    match config.global.log_path() {
        Some(path) => {
            let file: SharedSink = Arc::new(FileSink::open(&path)?);
            let tee: SharedSink = Arc::new(TeeSink::new(vec![sink, file]));
            Ok(tee)
        }
        None => Ok(sink),
    }
}

fn scheduler(config: &Config, sink: SharedSink) -> BuildScheduler {
    let runner = Arc::new(CommandRunner::new(sink.clone(), config.global.timeout()));
    BuildScheduler::new(ProjectBuilder::new(runner, sink))
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    Config::example()
        .save_to_file(path)
        .context("Failed to write example configuration")?;

    println!("Created {}", path.display());
    Ok(())
}

fn load_config(path: &Path) -> Config {
    match Config::load_from_file(path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if !path.exists() {
                match Config::example().save_to_file(path) {
                    Ok(()) => println!(
                        "Created a default configuration at {}. Edit it and run again.",
                        path.display()
                    ),
                    Err(err) => eprintln!("Error: {:#}", err),
                }
            }
            std::process::exit(1);
        }
    }
}

async fn run_batch(config: Config) -> Result<()> {
    let sink = with_log_file(Arc::new(Logger::new()), &config)?;

    sink.emit(LogLevel::Success, "yeah-build - multi-project build");
    sink.info(&format!("Platform: {}", platform()));

    let scheduler = scheduler(&config, sink.clone());
    let report = scheduler
        .execute(config.enabled_projects(), &config.global)
        .await;

    if report.should_summarize() {
        Reporter::new(sink).summarize(&report.outcomes);
    }

    match report.exit_code() {
        0 => Ok(()),
        code => std::process::exit(code),
    }
}

async fn run_interactive(config: Config) -> Result<()> {
    let (log_tx, log_rx) = mpsc::unbounded_channel();
    let sink = with_log_file(Arc::new(ChannelSink::new(log_tx)), &config)?;

    let selection = SelectionState::new(&config.projects);
    let scheduler = scheduler(&config, sink.clone());

    let mut app = App::new(selection, scheduler, config.global.clone(), sink, log_rx);
    app.run().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_lenient();
    let config_path = cli.config_path();

    if let Some(Commands::Init { force }) = &cli.command {
        return init_config(&config_path, *force);
    }

    let config = load_config(&config_path);

    if cli.no_interactive || !config.interactive {
        run_batch(config).await
    } else {
        run_interactive(config).await
    }
}
