use clap::Parser;
use env_logger::{Builder, WriteStyle};
use hwtemp::config::{parse_level, AppConfig};
use hwtemp::session::OutputMode;
use hwtemp::RunOptions;
use log::error;
use std::path::PathBuf;

/// Print the hottest CPU and GPU temperature as `CPU:<c>,GPU:<g>`.
///
/// Without `--once`, reads commands from stdin: `update` prints one line,
/// `exit` or end of input stops.
#[derive(Parser, Debug)]
#[command(name = "hwtemp", version, about)]
struct Cli {
    /// Sample once, print and exit
    #[arg(long)]
    once: bool,

    /// Print every device and sensor instead of the compact line
    #[arg(long)]
    debug: bool,

    /// Configuration file (INI)
    #[arg(short, long, default_value = "config.ini")]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Write the effective configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    save_config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first (without logging)
    let config = if cli.config.exists() {
        AppConfig::from_file(&cli.config).unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {:#}", e);
            // Fall back to default configuration
            AppConfig::default()
        })
    } else {
        AppConfig::default()
    };

    let level = cli
        .log_level
        .as_deref()
        .and_then(parse_level)
        .unwrap_or_else(|| config.get_log_level());

    // Logs go to stderr; stdout is reserved for sample lines.
    Builder::new()
        .filter_level(level)
        .write_style(WriteStyle::Auto)
        .format_timestamp_secs()
        .init();

    if let Some(path) = &cli.save_config {
        return config.save(path);
    }

    let options = RunOptions {
        once: cli.once,
        mode: if cli.debug {
            OutputMode::Debug
        } else {
            OutputMode::Compact
        },
    };

    if let Err(e) = hwtemp::run(&config, options) {
        error!("Application error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
