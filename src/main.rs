//! Keyboard-to-Gamepad Translator
//!
//! Main entry point and translation loop.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use virtual_controller::config::{ConfigFormat, ControllerConfig};
use virtual_controller::dispatch::pump;
use virtual_controller::gamepad::VirtualGamepad;
use virtual_controller::keymap::KeyMap;
use virtual_controller::names;
use virtual_controller::sink::{LogSink, OutputSink};
use virtual_controller::source::{EvdevSource, EventSource, StreamSource};

#[derive(Parser)]
#[command(name = "virtual-controller", version)]
#[command(about = "Translate keyboard input into a virtual gamepad")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input event device (default: raw events on stdin)
    input: Option<PathBuf>,

    /// Config file path (default: ~/.config/virtual-controller/keys.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Config syntax (default: by extension, .toml or line format)
    #[arg(long, value_enum, global = true)]
    format: Option<ConfigFormat>,

    /// Grab the input device so its keys reach no other application
    #[arg(long)]
    grab: bool,

    /// Log translated events instead of creating a virtual device
    #[arg(long)]
    dry_run: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config and print the resolved bindings
    Check {
        /// Print the config as TOML instead
        #[arg(long)]
        toml: bool,
    },
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).init();
}

/// Set up a Ctrl-C handler that clears the returned flag when triggered.
fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    if let Err(e) = ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    running
}

fn print_bindings(keymap: &KeyMap) {
    for (key, binding) in keymap.iter() {
        let opposite = binding
            .opposite
            .map(|o| format!("  (opposite {})", names::key_label(o)))
            .unwrap_or_default();
        println!(
            "{:<16} -> {:<6} {:<14} {:>6}{}",
            names::key_label(key),
            binding.kind.as_str(),
            binding.kind.code_name(binding.output_id),
            binding.pressed_value,
            opposite
        );
    }
}

fn open_source(cli: &Cli) -> Result<Box<dyn EventSource>> {
    match &cli.input {
        Some(path) => {
            let mut source = EvdevSource::open(path)?;
            if cli.grab {
                source.grab()?;
            }
            info!("Reading input from {}", path.display());
            Ok(Box::new(source))
        }
        None => {
            if cli.grab {
                warn!("--grab has no effect when reading from stdin");
            }
            info!("Reading input from stdin");
            Ok(Box::new(StreamSource::stdin()?))
        }
    }
}

fn open_sink(
    config: &ControllerConfig,
    keymap: &KeyMap,
    dry_run: bool,
) -> Result<Box<dyn OutputSink>> {
    if dry_run {
        info!("Dry run: translated events are logged only");
        return Ok(Box::new(LogSink));
    }

    let mut gamepad =
        VirtualGamepad::new(&config.device, keymap).context("Is /dev/uinput writable?")?;
    info!("Created virtual gamepad: {}", config.device.device_name);
    if let Some(path) = gamepad.device_path() {
        info!("Device path: {}", path.display());
    }
    Ok(Box::new(gamepad))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(ControllerConfig::default_path);
    info!("Reading bindings from {}", config_path.display());
    let config = ControllerConfig::load(&config_path, cli.format)?;
    let mut keymap = config
        .keymap()
        .with_context(|| format!("Invalid bindings in {}", config_path.display()))?;
    info!("Loaded {} bindings", keymap.len());

    if let Some(Commands::Check { toml }) = &cli.command {
        if *toml {
            print!("{}", config.to_toml()?);
        } else {
            print_bindings(&keymap);
        }
        return Ok(());
    }

    let running = setup_interrupt_handler();
    let mut source = open_source(&cli)?;
    let mut sink = open_sink(&config, &keymap, cli.dry_run)?;

    info!("Translating. Press Ctrl+C to exit.");
    pump(source.as_mut(), sink.as_mut(), &mut keymap, &running)?;

    info!("Shutting down");
    Ok(())
}
