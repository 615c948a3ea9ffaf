use std::fmt;
use std::str::FromStr;

use crate::models::sensor::Sensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
    GpuNvidia,
    GpuAmd,
    GpuIntel,
    Motherboard,
    Other,
}

impl DeviceKind {
    pub fn is_gpu(&self) -> bool {
        matches!(
            self,
            DeviceKind::GpuNvidia | DeviceKind::GpuAmd | DeviceKind::GpuIntel
        )
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Cpu => "Cpu",
            DeviceKind::GpuNvidia => "GpuNvidia",
            DeviceKind::GpuAmd => "GpuAmd",
            DeviceKind::GpuIntel => "GpuIntel",
            DeviceKind::Motherboard => "Motherboard",
            DeviceKind::Other => "Other",
        };
        f.write_str(name)
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "cpu" => Ok(DeviceKind::Cpu),
            "gpu_nvidia" | "gpunvidia" | "nvidia" => Ok(DeviceKind::GpuNvidia),
            "gpu_amd" | "gpuamd" | "amd" => Ok(DeviceKind::GpuAmd),
            "gpu_intel" | "gpuintel" | "intel" => Ok(DeviceKind::GpuIntel),
            "motherboard" | "mainboard" => Ok(DeviceKind::Motherboard),
            "other" => Ok(DeviceKind::Other),
            other => Err(format!("unknown device kind `{}`", other)),
        }
    }
}

/// A hardware component exposed by a sensor provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub name: String,
    pub kind: DeviceKind,
    pub sensors: Vec<Sensor>,
    pub children: Vec<Device>,
}

impl Device {
    pub fn new(name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sensors: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_sensor(mut self, sensor: Sensor) -> Self {
        self.sensors.push(sensor);
        self
    }

    pub fn with_child(mut self, child: Device) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first visit of this device and all of its sub-devices.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Device),
    {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn walk_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&mut Device),
    {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }
}
