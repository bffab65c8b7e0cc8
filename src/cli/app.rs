//! Live listening runner

use std::process::ExitCode;
use std::sync::{Arc, Mutex as StdMutex};

use tracing::warn;

use crate::application::ports::{AttemptOptions, ConfigStore};
use crate::application::{ContinuousListener, ListenerConfig, StartOutcome, TranscriptSink};
use crate::domain::config::AppConfig;
use crate::infrastructure::{platform_speech, XdgConfigStore};

use super::args::ListenOptions;
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Load file config and merge CLI overrides on top (CLI wins)
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable config file");
            AppConfig::empty()
        }
    };
    file_config.merge(cli_config)
}

/// Run a live listening session until interrupted.
///
/// This is the caller side of the listener: it keeps the latest recognized
/// text and repaints the live status line on every sink delivery, the same
/// data a view layer would bind to.
pub async fn run_listen(options: ListenOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let (backend, gate) = match platform_speech() {
        Ok(pair) => pair,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let config = ListenerConfig {
        options: AttemptOptions {
            language: options.language.clone(),
            partial_results: options.partial_results,
        },
        ..ListenerConfig::default()
    };
    let listener = ContinuousListener::with_config(backend, gate, config);

    presenter.start_transcript(&format!("Listening ({})… press Ctrl-C to stop", options.language));

    let transcript = Arc::new(StdMutex::new(String::new()));
    let sink: TranscriptSink = {
        let transcript = transcript.clone();
        let repaint = presenter.live_updater();
        Arc::new(move |result| {
            if let Ok(mut latest) = transcript.lock() {
                *latest = result.text.clone();
            }
            repaint(&result.text);
        })
    };

    match listener.start_listening(sink).await {
        Ok(StartOutcome::Started) => {}
        Ok(StartOutcome::AlreadyListening) => {}
        Ok(StartOutcome::PermissionRequested) => {
            presenter.finish_transcript();
            presenter.warn("Microphone permission was requested. Grant it and run voxloop again.");
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            presenter.finish_transcript();
            presenter.error(&format!("Could not start listening: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        presenter.error(&format!("Failed to wait for Ctrl-C: {}", e));
    }

    listener.cleanup().await;
    presenter.finish_transcript();

    let final_text = transcript
        .lock()
        .map(|latest| latest.clone())
        .unwrap_or_default();
    if !final_text.is_empty() {
        presenter.output(&final_text);
    }
    presenter.success("Stopped listening");

    ExitCode::from(EXIT_SUCCESS)
}
