//! Voxloop CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voxloop::cli::{
    app::{load_merged_config, run_listen, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    ListenOptions,
};
use voxloop::domain::config::AppConfig;
use voxloop::domain::listening::LanguageTag;
use voxloop::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    // Diagnostics go to stderr so the transcript on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Handle subcommands
    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Build CLI config from args
    let cli_config = AppConfig {
        language: cli.language.clone(),
        partial_results: if cli.no_partials { Some(false) } else { None },
    };

    // Merge config
    let config = load_merged_config(cli_config).await;

    let language = match config.language.as_ref() {
        Some(s) => match s.parse::<LanguageTag>() {
            Ok(tag) => tag,
            Err(e) => {
                presenter.error(&format!("Invalid language: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => LanguageTag::default(),
    };

    let options = ListenOptions {
        language,
        partial_results: config.partial_results_or_default(),
    };

    run_listen(options).await
}
