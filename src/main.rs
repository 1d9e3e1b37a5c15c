//! splitwm
//!
//! A minimal X11 tiling window manager written in Rust. Every managed window
//! is framed and placed in an equal-width column; key bindings close windows,
//! quit, and launch a terminal or an application launcher.

mod config;
mod launcher;
mod logging;
mod shared;
mod wm;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use config::Config;
use wm::WindowManager;
use wm::display::X11Display;

const USAGE: &str = "usage: splitwm [--config <path>]";

/// Parse command line arguments, returning the explicit config path if any
fn parse_args() -> Result<Option<PathBuf>, String> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args.next().ok_or_else(|| format!("{} requires a path", arg))?;
                config_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    Ok(config_path)
}

fn run(config: &Config) -> Result<()> {
    launcher::reap_children_automatically()?;

    let display = X11Display::connect(None)?;
    let mut wm = WindowManager::new(display, config).context("Failed to initialize window manager")?;
    wm.setup()?;

    info!("Window manager initialized");
    wm.run()
}

fn main() -> ExitCode {
    let config_path = match parse_args() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("splitwm: {}\n{}", e, USAGE);
            return ExitCode::FAILURE;
        }
    };

    // The log sink depends on the config, so loading logs to stderr and
    // config errors are reported again once the file sink is up
    let loaded = tracing::dispatcher::with_default(&logging::bootstrap(), || {
        Config::load(config_path.as_deref())
    });
    let (config, config_error) = match loaded {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    logging::init(&config.log);
    info!("Starting splitwm");

    if let Some(e) = config_error {
        warn!("Using default configuration: {:#}", e);
    }

    match run(&config) {
        Ok(()) => {
            info!("Display connection closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
