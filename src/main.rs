use anyhow::{Context, Result};
use clap::Parser;
use parley::capabilities::{
    ConsoleSpeechOutput, HttpFetch, LineSpeechInput, LoggingPlayback, SystemClock,
    UnavailableCamera,
};
use parley::handlers::Services;
use parley::session::format_countdown;
use parley::store::{JsonFileStore, ShortcutStore};
use parley::{
    spawn_listener, AssistantConfig, AssistantEvent, Dispatcher, Orchestrator, Outputs,
    ParleyError, SideEffect,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Voice-command assistant reading one utterance per line from stdin
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for persisted app shortcuts
    #[arg(long)]
    store: Option<PathBuf>,

    /// Treat the host as an insecure context (disables the camera)
    #[arg(long)]
    insecure: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AssistantConfig::from_file(path)?,
        None => AssistantConfig::load_default()?,
    };
    if let Some(dir) = cli.store {
        config = config.with_store_dir(dir);
    }
    if cli.insecure {
        config = config.insecure();
    }

    info!("Starting Parley voice assistant");
    info!("Shortcuts stored in {}", config.store_dir.display());

    let shortcuts = ShortcutStore::load(Box::new(JsonFileStore::new(config.store_dir.clone())));
    let network = HttpFetch::new(config.http_timeout()).context("Failed to build HTTP client")?;
    let services = Services {
        network: Box::new(network),
        camera: Box::new(UnavailableCamera),
        clock: Box::new(SystemClock),
    };
    let shutdown_timeout = config.shutdown_timeout();

    let dispatcher = Dispatcher::new(config, shortcuts, services);
    let (orchestrator, handle) = Orchestrator::new(
        dispatcher,
        Outputs {
            speech: Box::new(ConsoleSpeechOutput),
            playback: Box::new(LoggingPlayback),
        },
    );
    let worker = orchestrator.start();

    let input = LineSpeechInput::new(io::BufReader::new(io::stdin()));
    let listener = spawn_listener(Box::new(input), handle.command_sender());

    let mut deadline: Option<Instant> = None;
    loop {
        if deadline.is_none() && listener.is_finished() {
            handle.shutdown()?;
            deadline = Some(Instant::now() + shutdown_timeout);
        }
        if deadline.is_some_and(|d| Instant::now() > d) {
            warn!("Shutdown timed out, exiting without waiting for the worker");
            return Ok(());
        }

        let event = match handle.recv_event_timeout(Duration::from_millis(100)) {
            Ok(event) => event,
            Err(_) => continue,
        };

        match event {
            AssistantEvent::Heard(text) => println!("You said: {}", text),
            AssistantEvent::Response { speech, display } if display != speech => {
                println!("{}", display)
            }
            AssistantEvent::Response { .. } => {}
            AssistantEvent::Effect(effect) => show_effect(&effect),
            AssistantEvent::Settings(entries) => {
                for (name, url) in entries {
                    println!("{}: {}", name, url);
                }
            }
            AssistantEvent::ListeningError(message) => println!("{}", message),
            AssistantEvent::ListeningDisabled(message) => println!("{}", message),
            AssistantEvent::Shutdown => break,
        }
    }

    worker
        .join()
        .map_err(|_| ParleyError::OrchestratorError("worker thread panicked".to_string()))?;
    info!("Goodbye");

    Ok(())
}

fn show_effect(effect: &SideEffect) {
    match effect {
        SideEffect::OpenUrl { url } => println!("[open] {}", url),
        SideEffect::SetIcon { url } => println!("[icon] {}", url),
        SideEffect::ShowTimer { remaining } => println!("[timer] {}", format_countdown(*remaining)),
        SideEffect::HideTimer => println!("[timer] hidden"),
        SideEffect::PlayBeep => println!("[beep]"),
        SideEffect::ShowCamera => println!("[camera] on"),
        SideEffect::HideCamera => println!("[camera] off"),
        _ => {}
    }
}
