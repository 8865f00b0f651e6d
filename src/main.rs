//! # waylogo
//!
//! Connects to a Wayland compositor and shows a static image in a toplevel
//! window until the compositor asks it to close.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use waylogo::config;
use waylogo::{LogoConfig, LogoError};

#[derive(Parser)]
#[command(name = "waylogo")]
#[command(about = "Show a static image in a Wayland window through shared memory")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/waylogo/waylogo.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Wayland socket name or absolute socket path
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Window title
    #[arg(long)]
    title: Option<String>,

    /// Pixel source file (one R:G:B:A record per line)
    #[arg(short, long)]
    pixels: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut LogoConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.display.endpoint = endpoint.clone();
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if let Some(title) = &self.title {
            config.window.title = title.clone();
        }
        if let Some(pixels) = &self.pixels {
            config.image.pixel_source = pixels.clone();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    info!(
        "Starting waylogo {} (built {}, commit {})",
        waylogo::VERSION,
        env!("BUILD_DATE"),
        option_env!("GIT_COMMIT").unwrap_or("unknown")
    );

    // Load configuration
    let mut config = match LogoConfig::load(&cli.config) {
        Ok(config) => {
            info!("Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) if config::is_missing_file(&e) => {
            info!("No configuration file at {}; using defaults", cli.config);
            LogoConfig::default()
        }
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            info!("Using default configuration");
            LogoConfig::default()
        }
    };

    // Override config with CLI flags
    cli.apply(&mut config);
    if let Err(e) = config.validate() {
        let err = LogoError::Config(format!("{:#}", e));
        error!("{}", err);
        eprintln!("waylogo: {}", err);
        return ExitCode::from(err.exit_code());
    }

    match waylogo::run(&config) {
        Ok(()) => {
            info!("Goodbye");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("waylogo: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
