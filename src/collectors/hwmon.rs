use log::{debug, info, warn};
use std::fs::read_dir;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::collectors::nvidia::NvidiaSmi;
use crate::collectors::{Categories, DriverTable, SensorProvider};
use crate::error::{Result, SensorError};
use crate::models::{Device, DeviceKind};
use crate::utils::hwmon::{get_file_line, read_sensor_value, sensors_from_hwmon};

const DEFAULT_BOARD_NAME: &str = "Motherboard";

#[derive(Debug, Clone)]
pub struct HwmonOptions {
    pub sysfs_root: PathBuf,
    pub categories: Categories,
    pub drivers: DriverTable,
    pub nvidia_smi: bool,
}

impl Default for HwmonOptions {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys"),
            categories: Categories::default(),
            drivers: DriverTable::default(),
            nvidia_smi: true,
        }
    }
}

/// Linux `/sys/class/hwmon` provider, optionally merged with `nvidia-smi`.
///
/// Every `hwmonN` folder is one device named after its driver. Super I/O and
/// embedded-controller chips are listed as sub-devices of a single
/// motherboard device named from DMI.
pub struct HwmonProvider {
    devices: Vec<Device>,
    hwmon_len: usize,
    nvidia: Option<NvidiaSmi>,
}

impl HwmonProvider {
    pub fn open(options: &HwmonOptions) -> Result<Self> {
        let start = Instant::now();
        let hwmon_root = options.sysfs_root.join("class/hwmon");
        let mut folders: Vec<PathBuf> = read_dir(&hwmon_root)
            .map_err(|e| {
                SensorError::unavailable(format!("cannot read {}: {}", hwmon_root.display(), e))
            })?
            .flatten()
            .map(|entry| entry.path())
            .collect();
        folders.sort_by_key(|path| hwmon_index(path));

        let mut devices = Vec::new();
        let mut chips = Vec::new();
        for folder in folders {
            let Some(device) = device_from_folder(&folder, &options.drivers) else {
                continue;
            };
            if !options.categories.allows(device.kind) {
                debug!("Skipping {} ({}): category disabled", device.name, device.kind);
                continue;
            }
            if device.kind == DeviceKind::Motherboard {
                chips.push(device);
            } else {
                devices.push(device);
            }
        }

        if !chips.is_empty() {
            let board_name = get_file_line(&options.sysfs_root.join("class/dmi/id/board_name"), 32)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_BOARD_NAME.to_string());
            let mut board = Device::new(board_name, DeviceKind::Motherboard);
            board.children = chips;
            devices.push(board);
        }

        let hwmon_len = devices.len();
        let nvidia = if options.nvidia_smi && options.categories.gpu {
            NvidiaSmi::detect()
        } else {
            None
        };
        if let Some(nvidia) = &nvidia {
            devices.extend(nvidia.devices().iter().cloned());
        }

        if devices.is_empty() {
            warn!("No hardware monitors found under {}", hwmon_root.display());
        }
        info!(
            "Opened hwmon provider with {} device(s) in {} ms",
            devices.len(),
            start.elapsed().as_millis()
        );

        Ok(Self {
            devices,
            hwmon_len,
            nvidia,
        })
    }
}

impl SensorProvider for HwmonProvider {
    fn refresh(&mut self) -> Result<()> {
        let start = Instant::now();
        let mut failure = None;
        for device in &mut self.devices[..self.hwmon_len] {
            device.walk_mut(&mut |device: &mut Device| {
                for sensor in &mut device.sensors {
                    if failure.is_some() {
                        return;
                    }
                    let Some(path) = &sensor.path else {
                        continue;
                    };
                    match read_sensor_value(path, sensor.kind) {
                        Ok(value) => sensor.value = value,
                        Err(e) => failure = Some(e),
                    }
                }
            });
        }
        if let Some(e) = failure {
            return Err(e);
        }

        if let Some(nvidia) = &mut self.nvidia {
            nvidia.refresh();
            self.devices.truncate(self.hwmon_len);
            self.devices.extend(nvidia.devices().iter().cloned());
        }
        debug!("hwmon refresh took: {} ms", start.elapsed().as_millis());
        Ok(())
    }

    fn devices(&self) -> &[Device] {
        &self.devices
    }

    fn close(&mut self) {
        debug!("Closing hwmon provider");
        self.devices.clear();
        self.hwmon_len = 0;
        self.nvidia = None;
    }
}

fn device_from_folder(folder: &Path, drivers: &DriverTable) -> Option<Device> {
    let name = get_file_line(&folder.join("name"), 16)
        .filter(|name| !name.is_empty())
        .or_else(|| folder.file_name().map(|n| n.to_string_lossy().into_owned()))?;

    let sensors = match sensors_from_hwmon(folder) {
        Ok(sensors) => sensors,
        Err(e) => {
            warn!("Skipping hwmon {}: {}", folder.display(), e);
            return None;
        }
    };

    let mut device = Device::new(name.as_str(), drivers.kind_of(&name));
    device.sensors = sensors;
    Some(device)
}

/// `hwmon10` sorts after `hwmon9`.
fn hwmon_index(path: &Path) -> (u32, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let index = name
        .strip_prefix("hwmon")
        .and_then(|n| n.parse::<u32>().ok())
        .unwrap_or(u32::MAX);
    (index, name)
}
