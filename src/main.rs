use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use handover_player::audio::AudioTap;
use handover_player::cli::{CliApp, Commands, ConfigAction, RunArgs, StatusDisplay};
use handover_player::config::{ConfigManager, EngineConfig};
use handover_player::error::HandoverError;
use handover_player::handover::HandoverOrchestrator;
use handover_player::logging::StreamLogger;
use handover_player::models::Parameters;
use handover_player::player::{SimScript, SimulatedPlayer};
use handover_player::registry::NodeRegistry;

const PLAYER_PATH: &str = "/project1/player1";
const TAP_PATH: &str = "/project1/audio1";
const TAP_SAMPLE_RATE: f64 = 48_000.0;
const TAP_CHANNELS: usize = 2;

#[tokio::main]
async fn main() {
    // Default to 'warn' so the status lines stay readable
    if std::env::var("HANDOVER_LOG_LEVEL").is_err() {
        std::env::set_var("HANDOVER_LOG_LEVEL", "warn");
    }
    if let Err(e) = StreamLogger::init() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let cli = CliApp::parse();
    if let Err(e) = execute(cli).await {
        error!("{}", e);
        StatusDisplay::display_error(&e);
        std::process::exit(1);
    }

    info!("Application shutdown complete");
}

async fn execute(cli: CliApp) -> Result<(), HandoverError> {
    let mut config_manager = match cli.config_path() {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };

    match cli.command {
        Commands::Run(args) => run(args, config_manager.get_config().clone()).await,
        Commands::Config { action } => configure(&mut config_manager, action),
    }
}

fn configure(manager: &mut ConfigManager, action: ConfigAction) -> Result<(), HandoverError> {
    match action {
        ConfigAction::Show => StatusDisplay::display_config(manager.get_config()),
        ConfigAction::Path => println!("{}", manager.config_path().display()),
        ConfigAction::Reset => {
            manager.reset_to_defaults()?;
            println!("Configuration reset to defaults");
        }
        ConfigAction::Threshold { value } => {
            manager.set_ready_threshold(value)?;
            println!("Handover ready threshold set to {:.0}%", value);
        }
        ConfigAction::Volume { level } => {
            manager.set_volume(level)?;
            println!("Default volume set to {}%", level);
        }
        ConfigAction::Overrun { policy } => {
            manager.set_overrun_policy(policy.into())?;
            println!("Overrun policy set to {:?}", manager.get_config().audio.overrun_policy);
        }
    }
    Ok(())
}

/// Drive simulated players through the orchestrator at the configured tick rate
async fn run(args: RunArgs, config: EngineConfig) -> Result<(), HandoverError> {
    let script = SimScript {
        total_time_ms: args.stream_length.as_millis() as i64,
        ..SimScript::default()
    };
    let first = SimulatedPlayer::with_script("player-a", script.clone());
    let second = SimulatedPlayer::with_script("player-b", script.clone());
    let preview = SimulatedPlayer::with_script("preview", script);
    let players = [first.clone(), second.clone(), preview.clone()];

    let logger = StreamLogger::new();
    let registry = Arc::new(NodeRegistry::new());
    let mut orchestrator = HandoverOrchestrator::new(
        Arc::new(first),
        Arc::new(second),
        Arc::new(preview),
        config.clone(),
    )
    .with_logger(logger.clone());
    orchestrator.publish(registry.clone(), PLAYER_PATH)?;

    let mut tap = AudioTap::new(TAP_PATH, "player1", &config.audio).with_logger(logger.clone());

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        shutdown_flag.store(true, Ordering::Relaxed);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let period = Duration::from_secs_f64(1.0 / config.tick_rate_hz);
    let block = (TAP_SAMPLE_RATE * period.as_secs_f64()).round() as usize;
    let mut interval = tokio::time::interval(period);

    let mut params = Parameters::with_url(args.url.clone());
    params.looping = args.looping;
    params.seamless = !args.cued;
    params.start_time_sec = args.start.map_or(0.0, |start| start.as_secs_f64());
    params.preview_url = args.preview.clone().unwrap_or_default();

    println!("Playing {} (Ctrl-C to stop)", args.url);
    let started = tokio::time::Instant::now();
    let mut last_status = Duration::ZERO;

    loop {
        interval.tick().await;
        if shutdown.load(Ordering::Relaxed) {
            println!("\nReceived interrupt signal. Shutting down gracefully...");
            break;
        }
        let elapsed = started.elapsed();
        if elapsed >= args.duration {
            break;
        }

        for player in &players {
            player.step(period);
        }

        if let Some(next) = &args.next {
            if elapsed >= args.switch_at && params.url != *next {
                println!("Requesting {}", next);
                params.url = next.clone();
            }
            if args.cued {
                params.switch_cue = elapsed >= args.switch_at + Duration::from_secs(1);
            }
        }
        if args.preview.is_some() {
            let midpoint = args.duration / 2;
            params.preview_enabled = elapsed >= midpoint && elapsed < midpoint + Duration::from_secs(1);
        }

        match orchestrator.tick(&params) {
            Ok(report) => {
                if let Some(reason) = report.swapped {
                    println!("Swapped streams ({})", reason.as_str());
                }
            }
            Err(e) => StatusDisplay::display_simple_error(&e),
        }

        tap.bind(&registry);
        if let Err(e) = tap.pull(block, TAP_CHANNELS) {
            StatusDisplay::display_simple_error(&e);
        }

        if elapsed - last_status >= Duration::from_secs(1) {
            last_status = elapsed;
            StatusDisplay::display_compact(&orchestrator.diagnostics());
        }
    }

    StatusDisplay::display_full(&orchestrator.diagnostics(), tap.binding_status(), &tap.ring_status());

    let stats = logger.get_event_statistics();
    println!(
        "Swaps: {} | Deferred loops: {} | Dropped seeks: {} | Playback errors: {} | Overruns: {}",
        stats.swaps, stats.deferred_loops, stats.dropped_seeks, stats.playback_errors, stats.buffer_overruns
    );
    Ok(())
}
