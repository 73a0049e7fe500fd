//! batring - a circular battery charge indicator for Wayland desktops
//!
//! This is the main entry point for the batring indicator application.

mod indicator;
mod render;
mod services;
pub mod styles;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gtk4::Application;
use gtk4::prelude::*;
use tracing::{debug, error, info, warn};

use batring_core::{Config, logging};

use crate::indicator::IndicatorWindow;
use crate::services::battery::BatteryService;
use crate::services::config_manager::ConfigManager;

/// batring - a circular battery charge indicator for Wayland desktops
#[derive(Parser, Debug)]
#[command(name = "batring", version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (uses XDG lookup if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print example configuration and exit
    #[arg(long)]
    print_example_config: bool,

    /// Validate configuration and exit (returns non-zero on errors)
    #[arg(long)]
    check_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    logging::init(args.verbose);

    // Load configuration using XDG lookup chain
    // If --config is specified, it must exist and be valid (no fallback)
    let load_result = match Config::find_and_load(args.config.as_deref()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref source) = load_result.source {
        info!("Loaded configuration from {:?}", source);
    } else if load_result.used_defaults {
        warn!("Using default configuration (no config file found)");
    }

    let config = load_result.config;

    // Validate configuration (strict - fail on invalid values)
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    debug!("Configuration validated successfully");

    // --check-config: just validate and exit
    if args.check_config {
        if let Some(ref source) = load_result.source {
            println!("Configuration valid: {}", source.display());
        } else {
            println!("Configuration valid (using defaults)");
        }
        return ExitCode::SUCCESS;
    }

    // --print-example-config: print the example config with comments
    if args.print_example_config {
        print!("{}", batring_core::config::DEFAULT_CONFIG_TOML);
        return ExitCode::SUCCESS;
    }

    info!("{}", config.summary());

    // Run the GTK application
    run_gtk_app(config, load_result.source)
}

/// Initialize and run the GTK4 application.
fn run_gtk_app(config: Config, config_source: Option<PathBuf>) -> ExitCode {
    if let Some(ref source) = config_source {
        info!("Running with configuration file: {}", source.display());
    } else {
        info!("Running with default configuration (no file found)");
    }

    // Initialize the config manager singleton (before GTK, so it's ready for hot-reload)
    ConfigManager::init_global(config, config_source);

    // Default to Wayland backend
    // SAFETY: This is called before GTK initialization, and we're setting a
    // well-known environment variable. No other threads are accessing env vars yet.
    if std::env::var("GDK_BACKEND").is_err() {
        unsafe {
            std::env::set_var("GDK_BACKEND", "wayland");
        }
    }

    let app = Application::builder()
        .application_id("io.github.batring")
        .flags(gtk4::gio::ApplicationFlags::NON_UNIQUE)
        .build();

    app.connect_activate(move |app| {
        info!("GTK application activated");

        // Load CSS styling (transparent indicator window)
        styles::load_css();

        // Build the indicator window. Its service subscriptions also force
        // the BatteryService singleton into existence, which starts the
        // UPower connection and the poll timer.
        let indicator = IndicatorWindow::new(app);

        // Attach to the application so the Rc stays alive for the
        // lifetime of the app.
        unsafe {
            app.set_data("batring-indicator", indicator);
        }

        // Start config file watcher for live reload
        ConfigManager::global().start_watching();
    });

    app.connect_startup(|_| {
        info!("GTK application starting up");
    });

    app.connect_shutdown(|_| {
        info!("GTK application shutting down");
        // Stop config watcher and the battery poll timer
        ConfigManager::global().stop_watching();
        BatteryService::global().shutdown();
    });

    // Run the application with empty args (we already parsed with clap)
    let empty_args: Vec<String> = vec![];
    let status = app.run_with_args(&empty_args);

    if status == gtk4::glib::ExitCode::SUCCESS {
        ExitCode::SUCCESS
    } else {
        error!("GTK application exited with error");
        ExitCode::FAILURE
    }
}
