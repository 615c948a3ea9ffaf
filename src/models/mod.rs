pub mod device;
pub mod sample;
pub mod sensor;

pub use device::{Device, DeviceKind};
pub use sample::Sample;
pub use sensor::{Sensor, SensorKind};
