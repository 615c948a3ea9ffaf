pub mod classify;
pub mod collectors;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod sampler;
pub mod session;

mod utils;

use crate::collectors::components::ComponentsProvider;
use crate::collectors::hwmon::HwmonProvider;
use crate::collectors::SensorProvider;
use crate::config::{AppConfig, Backend};
use crate::sampler::Sampler;
use crate::session::OutputMode;
use anyhow::Context;
use log::{error, info};
use std::io;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Sample once and return instead of answering commands on stdin.
    pub once: bool,
    pub mode: OutputMode,
}

/// Open the provider selected in the configuration with CPU, GPU and, if
/// enabled, motherboard devices.
pub fn open_provider(config: &AppConfig) -> anyhow::Result<Box<dyn SensorProvider>> {
    let provider: Box<dyn SensorProvider> = match config.sensors.backend {
        Backend::Hwmon => Box::new(
            HwmonProvider::open(&config.hwmon_options())
                .context("Failed to open hwmon sensors")?,
        ),
        Backend::Sysinfo => Box::new(
            ComponentsProvider::open(config.driver_table(), config.categories())
                .context("Failed to open sysinfo components")?,
        ),
    };
    Ok(provider)
}

pub fn run(config: &AppConfig, options: RunOptions) -> anyhow::Result<()> {
    info!("Starting hwtemp ({:?} backend)", config.sensors.backend);

    let provider = open_provider(config).context("Sensor provider initialisation failed")?;
    let mut sampler = Sampler::new(provider);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if options.once {
        if let Err(e) = session::emit(&mut sampler, &mut out, options.mode) {
            error!("Sampling failed: {e:#}");
        }
    } else {
        let stdin = io::stdin();
        let served = session::serve(&mut sampler, stdin.lock(), &mut out, options.mode);
        info!("Served {} update(s)", served);
    }

    info!("Shutting down");
    Ok(())
}
