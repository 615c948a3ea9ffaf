use anyhow::{Context, Result};
use config::{Config, File};
use indexmap::IndexMap;
use log::{debug, info, LevelFilter};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::collectors::hwmon::HwmonOptions;
use crate::collectors::{Categories, DriverTable};
use crate::models::DeviceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Hwmon,
    Sysinfo,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hwmon" => Ok(Backend::Hwmon),
            "sysinfo" => Ok(Backend::Sysinfo),
            other => Err(format!("unknown backend `{}`", other)),
        }
    }
}

fn default_backend() -> Backend {
    if cfg!(target_os = "linux") {
        Backend::Hwmon
    } else {
        Backend::Sysinfo
    }
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn deserialize_backend<'de, D>(deserializer: D) -> std::result::Result<Backend, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Backend::from_str(&value).map_err(serde::de::Error::custom)
}

fn deserialize_device_kinds<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, DeviceKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, String>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(driver, kind)| {
            DeviceKind::from_str(&kind)
                .map(|kind| (driver, kind))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SensorsConfig {
    #[serde(default = "default_backend", deserialize_with = "deserialize_backend")]
    pub backend: Backend,
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    #[serde(default = "default_true")]
    pub motherboard: bool,
    #[serde(default = "default_true")]
    pub nvidia_smi: bool,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sysfs_root: default_sysfs_root(),
            motherboard: true,
            nvidia_smi: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sensors: SensorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Driver-name prefix to device kind, checked before the built-in table.
    #[serde(default, deserialize_with = "deserialize_device_kinds")]
    pub devices: IndexMap<String, DeviceKind>,
}

impl AppConfig {
    pub fn get_log_level(&self) -> LevelFilter {
        parse_level(&self.logging.level).unwrap_or(LevelFilter::Info)
    }

    /// CPU and GPU are always requested; the motherboard is optional.
    pub fn categories(&self) -> Categories {
        Categories {
            cpu: true,
            gpu: true,
            motherboard: self.sensors.motherboard,
        }
    }

    pub fn driver_table(&self) -> DriverTable {
        DriverTable::with_overrides(self.devices.clone())
    }

    pub fn hwmon_options(&self) -> HwmonOptions {
        HwmonOptions {
            sysfs_root: self.sensors.sysfs_root.clone(),
            categories: self.categories(),
            drivers: self.driver_table(),
            nvidia_smi: self.sensors.nvidia_smi,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(File::from(config_path).format(config::FileFormat::Ini))
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize config")?;

        Ok(app_config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_path = path.as_ref();

        let mut config_str = String::new();

        config_str.push_str(&format!(
            "[sensors]\nbackend = {}\nsysfs_root = {}\nmotherboard = {}\nnvidia_smi = {}\n\n",
            match self.sensors.backend {
                Backend::Hwmon => "hwmon",
                Backend::Sysinfo => "sysinfo",
            },
            self.sensors.sysfs_root.display(),
            self.sensors.motherboard,
            self.sensors.nvidia_smi
        ));

        config_str.push_str(&format!("[logging]\nlevel = {}\n", self.logging.level));

        if !self.devices.is_empty() {
            config_str.push_str("\n[devices]\n");
            for (driver, kind) in &self.devices {
                config_str.push_str(&format!("{} = {}\n", driver, kind));
            }
        }

        fs::write(config_path, config_str)
            .context(format!("Failed to save config to {}", config_path.display()))?;

        info!("Configuration saved to {}", config_path.display());
        Ok(())
    }
}

pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" => Some(LevelFilter::Off),
        _ => None,
    }
}
