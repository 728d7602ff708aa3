// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Beacon - casts scheduled meeting notices to display devices.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use beacon_config::BeaconConfig;
use clap::{Parser, Subcommand};

/// Beacon - casts scheduled meeting notices to display devices.
#[derive(Parser, Debug)]
#[command(name = "beacon", version, about, long_about = None)]
struct Cli {
    /// Load this file instead of the default search path (env overrides still apply).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scheduler and HTTP gateway.
    Serve,
    /// Run one device discovery and print what was found.
    Devices,
    /// Validate the configuration and print the effective settings.
    CheckConfig,
}

fn load(cli: &Cli) -> BeaconConfig {
    let loaded = match &cli.config {
        Some(path) => beacon_config::load_and_validate_path(path),
        None => beacon_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            beacon_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load(&cli);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Devices) => serve::run_devices(config).await,
        Some(Commands::CheckConfig) => {
            print_config_summary(&config);
            Ok(())
        }
        None => {
            println!("beacon: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config_summary(config: &BeaconConfig) {
    println!("configuration OK");
    println!("  database:        {}", config.storage.database_path);
    println!("  data dir:        {}", config.media.data_dir);
    println!("  timezone:        {}", config.media.display_timezone);
    println!(
        "  tick / horizon:  {}s / {}s",
        config.scheduler.tick_interval_secs, config.scheduler.pregeneration_horizon_secs
    );
    println!("  static devices:  {}", config.cast.devices.len());
    println!(
        "  discovery cmd:   {}",
        config.cast.discovery_command.as_deref().unwrap_or("-")
    );
    println!("  cast command:    {}", config.cast.cast_command);
    println!(
        "  narration:       {}",
        if config.narration.enabled && config.narration.api_key.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    if config.gateway.enabled {
        println!(
            "  gateway:         {}:{}",
            config.gateway.host, config.gateway.port
        );
    }
    println!("  media base url:  {}", config.media_base_url());
}
