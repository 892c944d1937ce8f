//! Command-line interface for the Looking Glass Bridge loader.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lgbridge_core::config::{env_vars, log_json_requested};
use lgbridge_core::{Bridge, BridgeConfig, InstallResolver, Platform, BRIDGE_VERSION};

/// lgbridge - Locate and probe Looking Glass Bridge installs.
#[derive(Parser, Debug)]
#[command(name = "lgbridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Show the detected platform and where Bridge is looked up.
    Platform,
    /// List Bridge installs from the settings manifest.
    Installs {
        /// Settings manifest to read instead of the platform default.
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print the install directory chosen for a Bridge version.
    Locate {
        /// Bridge version to look for.
        #[arg(long, default_value = BRIDGE_VERSION)]
        bridge_version: String,
        /// Settings manifest to read instead of the platform default.
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Ignore installs older than this version.
        #[arg(long)]
        min_version: Option<String>,
    },
    /// Load Bridge, report its version and displays, then unload it.
    Probe {
        /// Application name passed to Bridge.
        #[arg(long, default_value = "lgbridge")]
        app_name: String,
        /// Bridge version to look for.
        #[arg(long, default_value = BRIDGE_VERSION)]
        bridge_version: String,
        /// Load Bridge from this directory instead of the manifest.
        #[arg(long, conflicts_with = "bridge_version")]
        install_path: Option<PathBuf>,
        /// Settings manifest to read instead of the platform default.
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Platform => show_platform(),
        Command::Installs { settings, json } => list_installs(settings, json),
        Command::Locate {
            bridge_version,
            settings,
            min_version,
        } => locate(&bridge_version, settings, min_version),
        Command::Probe {
            app_name,
            bridge_version,
            install_path,
            settings,
            json,
        } => probe(&app_name, &bridge_version, install_path, settings, json),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "lgbridge=debug" } else { "lgbridge=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so command output stays machine readable.
    if log_json_requested() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Configuration from the environment with command-line overrides applied.
fn load_config(settings: Option<PathBuf>, min_version: Option<String>) -> BridgeConfig {
    let mut config = BridgeConfig::from_env();
    if let Some(path) = settings {
        config = config.with_settings_path(path);
    }
    if let Some(version) = min_version {
        config = config.with_minimum_version(version);
    }
    config
}

fn show_platform() -> Result<()> {
    let platform = Platform::current();
    let settings = BridgeConfig::from_env()
        .settings_path
        .or_else(|| platform.settings_path());

    println!("Platform:      {}", platform);
    println!("Library:       {}", platform.library_file_name());
    match settings {
        Some(path) => println!("Settings:      {}", path.display()),
        None => println!("Settings:      <unknown> (set {})", env_vars::SETTINGS_PATH),
    }
    Ok(())
}

fn list_installs(settings: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(settings, None);
    let resolver = InstallResolver::from_config(&config, Platform::current());
    let entries = resolver
        .entries()
        .context("Failed to read the Bridge settings manifest")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No Bridge installs found.");
        if let Some(path) = resolver.settings_path() {
            println!("Manifest: {}", path.display());
        }
        return Ok(());
    }

    println!("{:<12} PATH", "VERSION");
    for entry in &entries {
        println!("{:<12} {}", entry.version, entry.path);
    }
    Ok(())
}

fn locate(version: &str, settings: Option<PathBuf>, min_version: Option<String>) -> Result<()> {
    let config = load_config(settings, min_version);
    let resolver = InstallResolver::from_config(&config, Platform::current());

    match resolver
        .resolve(version)
        .context("Failed to read the Bridge settings manifest")?
    {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => {
            eprintln!("No Bridge install matches version {}", version);
            std::process::exit(1);
        }
    }
}

fn probe(
    app_name: &str,
    version: &str,
    install_path: Option<PathBuf>,
    settings: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let bridge = Bridge::with_config(load_config(settings, None));

    match &install_path {
        Some(dir) => bridge.initialize_with_path(app_name, dir),
        None => bridge.initialize(app_name, version),
    }
    .context("Failed to initialize Bridge")?;

    let library = bridge.library_path();
    let report = bridge
        .bridge_version()
        .and_then(|v| Ok((v, bridge.display_info_list()?)));
    let shutdown = bridge.uninitialize();
    let (bridge_version, displays) = report.context("Failed to query Bridge")?;
    shutdown.context("Failed to uninitialize Bridge")?;

    if json {
        let output = serde_json::json!({
            "library": library,
            "bridge_version": bridge_version.to_string(),
            "displays": displays,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Bridge {}", bridge_version);
    if let Some(path) = &library {
        println!("Library: {}", path.display());
    }
    if displays.is_empty() {
        println!("No displays connected.");
    }
    for display in &displays {
        println!(
            "  [{}] {} ({}) {}x{} viewcone {:.1}",
            display.display_id,
            display.name,
            display.serial,
            display.dimensions.width,
            display.dimensions.height,
            display.viewcone,
        );
    }
    Ok(())
}
