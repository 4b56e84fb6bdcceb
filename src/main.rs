//! Paws CLI
//!
//! Locks the session when a cat walks across the keyboard.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use paws::{
    collector::{check_permission, Collector, KeyId, ReplayCollector},
    config::{Config, RuleSpec},
    core::{AdjacencyIndex, LayoutSource},
    logging::init_logging,
    rules::RuleKind,
    transparency::{create_shared_log_with_persistence, TransparencyLog},
    actions::{default_lock_command, default_lock_note},
    Detector, LockAction, PRIVACY_DECLARATION, VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "paws")]
#[command(version = VERSION)]
#[command(about = "Locks your session when a cat walks across the keyboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start watching the keyboard
    Start {
        /// Layout preset to use instead of the configured one (qwerty, caps_as_ctrl)
        #[arg(long)]
        layout: Option<String>,

        /// Report detections without running the lock command
        #[arg(long)]
        dry_run: bool,
    },

    /// Pause detection in a running agent
    Pause,

    /// Resume detection in a running agent
    Resume,

    /// Show current status and cumulative statistics
    Status,

    /// Display privacy declaration
    Privacy,

    /// Show configuration
    Config,

    /// Show which keys count as near a key
    Neighbors {
        /// Key name (e.g. "s", "left shift") or a raw key code such as "#54"
        key: String,

        /// Neighborhood size; defaults to the configured adjacency rule
        #[arg(long)]
        distance: Option<usize>,

        /// Layout preset to use instead of the configured one
        #[arg(long)]
        layout: Option<String>,
    },

    /// Run a JSON-lines key recording through the detector
    Replay {
        /// Recording with one key event per line
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    let _log_guard = init_logging(
        &config.logging.level,
        config.logging.json,
        config.logging.log_dir.clone(),
    )
    .context("Failed to initialize logging")?;

    match cli.command {
        Commands::Start { layout, dry_run } => cmd_start(config, layout, dry_run),
        Commands::Pause => cmd_set_paused(config, true),
        Commands::Resume => cmd_set_paused(config, false),
        Commands::Status => {
            cmd_status(&config);
            Ok(())
        }
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
            Ok(())
        }
        Commands::Config => cmd_config(&config),
        Commands::Neighbors {
            key,
            distance,
            layout,
        } => cmd_neighbors(config, &key, distance, layout),
        Commands::Replay { file } => cmd_replay(&config, file),
    }
}

fn cmd_start(mut config: Config, layout: Option<String>, dry_run: bool) -> Result<()> {
    println!("Paws v{VERSION}");
    println!();

    if !check_permission() {
        eprintln!("Error: Input Monitoring permission not granted.");
        eprintln!();
        eprintln!("To grant permission:");
        eprintln!("1. Open System Settings > Privacy & Security");
        eprintln!("2. Select 'Input Monitoring'");
        eprintln!("3. Add this application to the allowed list");
        eprintln!("4. Restart the application");
        bail!("missing Input Monitoring permission");
    }

    if let Some(name) = layout {
        config.layout = parse_layout(&name)?;
    }
    let chain = config.build_chain().context("Invalid rule configuration")?;

    if let Err(e) = config.ensure_directories() {
        tracing::warn!(error = %e, "Could not create data directory");
    }

    println!("Starting detection...");
    println!("  Layout: {}", config.layout.label());
    for spec in &config.rules {
        println!("  Rule: {}", describe_rule(spec));
    }
    if dry_run {
        println!("  Action: none (dry run)");
    } else {
        println!("  Action: {}", config.action.command.join(" "));
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let transparency_log = create_shared_log_with_persistence(config.transparency_path());
    let action = LockAction::new(config.action.command.clone()).dry_run(dry_run);

    // Detections are handed to this loop so the lock command never runs on
    // the hook thread.
    let (detections, detected) = crossbeam_channel::bounded::<DateTime<Utc>>(16);
    let mut detector = Detector::with_transparency_log(
        Collector::new(),
        chain,
        move || {
            if detections.try_send(Utc::now()).is_err() {
                tracing::warn!("Detection queue full; dropping detection");
            }
        },
        transparency_log.clone(),
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    // `paws pause` and `paws resume` flip the flag in the config file.
    let mut paused = config.paused;
    let mut last_config_check = Instant::now();

    if paused {
        println!("Detection is currently paused.");
        println!("Run `paws resume` to start watching.");
        println!();
    } else {
        detector.start().context("Error starting detection")?;
    }

    while running.load(Ordering::SeqCst) {
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            match Config::load() {
                Ok(cfg) if cfg.paused != paused => {
                    paused = cfg.paused;
                    println!();
                    if paused {
                        println!("Pausing detection...");
                        if let Err(e) = detector.stop() {
                            tracing::error!(error = %e, "Error pausing detection");
                        }
                        // Drop detections that raced the pause.
                        while detected.try_recv().is_ok() {}
                    } else {
                        println!("Resuming detection...");
                        detector.start().context("Error resuming detection")?;
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Could not reload configuration"),
            }
            last_config_check = Instant::now();
        }

        if paused {
            thread::sleep(Duration::from_millis(100));
            continue;
        }

        match detected.recv_timeout(Duration::from_millis(100)) {
            Ok(at) => {
                println!(
                    "[{}] Paw detected",
                    at.with_timezone(&Local).format("%H:%M:%S")
                );
                if let Err(e) = action.run() {
                    tracing::error!(error = %e, "Detection action failed");
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                tracing::error!("Detector disconnected unexpectedly");
                break;
            }
        }
    }

    println!();
    println!("Stopping detection...");
    if detector.is_watching() {
        if let Err(e) = detector.stop() {
            tracing::error!(error = %e, "Error stopping detection");
        }
    }

    if let Err(e) = transparency_log.save() {
        tracing::warn!(error = %e, "Could not save transparency log");
    }

    println!();
    println!("{}", transparency_log.summary());
    Ok(())
}

fn cmd_set_paused(mut config: Config, paused: bool) -> Result<()> {
    config.paused = paused;
    config.save().context("Error saving config")?;
    if paused {
        println!("Detection paused. Use 'paws resume' to continue.");
    } else {
        println!("Detection resumed.");
    }
    Ok(())
}

fn cmd_status(config: &Config) {
    println!("Paws Status");
    println!("===========");
    println!();

    println!(
        "Input Monitoring Permission: {}",
        if check_permission() {
            "Granted ✓"
        } else {
            "Not Granted ✗"
        }
    );
    println!();

    println!("Configuration:");
    println!("  Layout: {}", config.layout.label());
    for spec in &config.rules {
        println!("  Rule: {}", describe_rule(spec));
    }
    println!("  Action: {}", config.action.command.join(" "));
    println!("  Paused: {}", config.paused);
    println!();

    let stats_path = config.transparency_path();
    if !stats_path.exists() {
        println!("No previous session data found.");
        return;
    }

    let stats = TransparencyLog::with_persistence(stats_path).stats();
    println!("Cumulative Statistics:");
    println!("  Key events: {}", stats.key_events);
    println!("  Paws detected: {}", stats.detections);
    for kind in RuleKind::ALL {
        if let Some(count) = stats.rejections.get(&kind) {
            println!("  Rejected by {}: {count}", kind.as_str());
        }
    }
    println!("  Largest buffer: {} events", stats.max_buffer_len);
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    if config.action.command == default_lock_command() {
        if let Some(note) = default_lock_note() {
            println!("Lock command note: {note}");
        }
    }
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn cmd_neighbors(
    mut config: Config,
    key: &str,
    distance: Option<usize>,
    layout: Option<String>,
) -> Result<()> {
    if let Some(name) = layout {
        config.layout = parse_layout(&name)?;
    }
    let distance = distance
        .or_else(|| {
            config.rules.iter().find_map(|spec| match spec {
                RuleSpec::Adjacency { distance, .. } => Some(*distance),
                _ => None,
            })
        })
        .unwrap_or(3);

    let layout = config.build_layout()?;
    let index = AdjacencyIndex::new(&layout, distance)?;

    let key = parse_key(key);
    let Some(near) = index.neighbors(&key) else {
        bail!(
            "`{key}` is not on the {} layout",
            config.layout.label()
        );
    };

    let mut near: Vec<String> = near.iter().map(ToString::to_string).collect();
    near.sort();
    println!(
        "Keys near `{key}` ({} layout, distance {distance}):",
        config.layout.label()
    );
    for other in near {
        println!("  {other}");
    }
    Ok(())
}

fn cmd_replay(config: &Config, file: PathBuf) -> Result<()> {
    let chain = config.build_chain().context("Invalid rule configuration")?;
    let recording = ReplayCollector::from_file(&file)
        .with_context(|| format!("Failed to read recording {}", file.display()))?;

    // Events are fed directly so each detection can name the event that
    // completed it.
    let detector = Detector::new(recording, chain, || {});
    for event in detector.hook().events() {
        if detector.on_event(event.clone()) {
            println!("[t={:.3}s] Paw detected on `{}`", event.timestamp, event.key);
        }
    }

    println!();
    println!("{}", detector.transparency_log().summary());
    Ok(())
}

fn parse_layout(name: &str) -> Result<LayoutSource> {
    LayoutSource::from_preset_name(name)
        .ok_or_else(|| anyhow!("Unknown layout `{name}` (expected qwerty or caps_as_ctrl)"))
}

/// `#54` is a raw key code, anything else a key name.
fn parse_key(key: &str) -> KeyId {
    match key.strip_prefix('#').map(str::parse::<u32>) {
        Some(Ok(code)) => KeyId::code(code),
        _ => KeyId::name(key),
    }
}

fn describe_rule(spec: &RuleSpec) -> String {
    match spec {
        RuleSpec::TimeWindow { num_seconds } => format!("events within {num_seconds}s"),
        RuleSpec::UnreleasedCount { num_events } => format!("{num_events} keys held"),
        RuleSpec::Adjacency {
            distance,
            self_adjacency,
        } => format!("keys within a {distance}x{distance} square ({self_adjacency:?} self pairs)"),
        RuleSpec::LatestCount { num_events } => format!("newest {num_events} events"),
    }
}
