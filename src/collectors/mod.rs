use indexmap::IndexMap;

use crate::error::Result;
use crate::models::{Device, DeviceKind};

pub mod components;
pub mod hwmon;
pub mod nvidia;

/// A source of hardware devices and their sensors.
///
/// The device list is discovered when the provider is opened. `refresh`
/// updates the readings in place; `close` releases whatever the provider
/// holds and is called exactly once by the owning sampler.
pub trait SensorProvider {
    fn refresh(&mut self) -> Result<()>;

    fn devices(&self) -> &[Device];

    fn close(&mut self) {}
}

impl<P: SensorProvider + ?Sized> SensorProvider for Box<P> {
    fn refresh(&mut self) -> Result<()> {
        (**self).refresh()
    }

    fn devices(&self) -> &[Device] {
        (**self).devices()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Device categories a provider is asked to expose. Devices of kind
/// `Other` are always listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categories {
    pub cpu: bool,
    pub gpu: bool,
    pub motherboard: bool,
}

impl Categories {
    pub fn allows(&self, kind: DeviceKind) -> bool {
        match kind {
            DeviceKind::Cpu => self.cpu,
            DeviceKind::Motherboard => self.motherboard,
            DeviceKind::Other => true,
            k if k.is_gpu() => self.gpu,
            _ => true,
        }
    }
}

impl Default for Categories {
    fn default() -> Self {
        Self {
            cpu: true,
            gpu: true,
            motherboard: true,
        }
    }
}

/// Driver-name prefixes as reported by hwmon (`/sys/class/hwmon/*/name`).
const KNOWN_DRIVERS: &[(&str, DeviceKind)] = &[
    ("k10temp", DeviceKind::Cpu),
    ("coretemp", DeviceKind::Cpu),
    ("zenpower", DeviceKind::Cpu),
    ("k8temp", DeviceKind::Cpu),
    ("via_cputemp", DeviceKind::Cpu),
    ("cpu_thermal", DeviceKind::Cpu),
    ("amdgpu", DeviceKind::GpuAmd),
    ("radeon", DeviceKind::GpuAmd),
    ("nouveau", DeviceKind::GpuNvidia),
    ("nvidia", DeviceKind::GpuNvidia),
    ("i915", DeviceKind::GpuIntel),
    ("xe", DeviceKind::GpuIntel),
    ("nct6", DeviceKind::Motherboard),
    ("nct7", DeviceKind::Motherboard),
    ("it8", DeviceKind::Motherboard),
    ("w83", DeviceKind::Motherboard),
    ("f718", DeviceKind::Motherboard),
    ("asus", DeviceKind::Motherboard),
    ("gigabyte_wmi", DeviceKind::Motherboard),
    ("dell_smm", DeviceKind::Motherboard),
    ("thinkpad", DeviceKind::Motherboard),
];

/// Maps a driver name to a device kind. Configured overrides are checked
/// before the built-in table; both match on prefix, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct DriverTable {
    overrides: IndexMap<String, DeviceKind>,
}

impl DriverTable {
    pub fn with_overrides(overrides: IndexMap<String, DeviceKind>) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|(driver, kind)| (driver.to_lowercase(), kind))
            .collect();
        Self { overrides }
    }

    pub fn kind_of(&self, driver: &str) -> DeviceKind {
        let driver = driver.trim().to_lowercase();
        self.overrides
            .iter()
            .map(|(prefix, kind)| (prefix.as_str(), *kind))
            .chain(KNOWN_DRIVERS.iter().copied())
            .find(|(prefix, _)| driver.starts_with(prefix))
            .map(|(_, kind)| kind)
            .unwrap_or(DeviceKind::Other)
    }
}
