use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SensorKind {
    Temperature,
    Fan,
    Voltage,
}

impl SensorKind {
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "°C",
            SensorKind::Fan => "RPM",
            SensorKind::Voltage => "V",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorKind::Temperature => "Temperature",
            SensorKind::Fan => "Fan",
            SensorKind::Voltage => "Voltage",
        };
        f.write_str(name)
    }
}

/// A single named measurement point on a device.
///
/// `value` is `None` until the provider has a reading, or when the
/// underlying source does not support one.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub name: String,
    pub kind: SensorKind,
    pub value: Option<f32>,
    /// Where the provider re-reads the value from on refresh, if file backed.
    pub path: Option<PathBuf>,
}

impl Sensor {
    pub fn new(name: impl Into<String>, kind: SensorKind, value: Option<f32>) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            path: None,
        }
    }

    pub fn temperature(name: impl Into<String>, value: Option<f32>) -> Self {
        Self::new(name, SensorKind::Temperature, value)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// The reading, if this is a temperature sensor that has one.
    pub fn temperature_value(&self) -> Option<f32> {
        match self.kind {
            SensorKind::Temperature => self.value,
            _ => None,
        }
    }
}
