use log::debug;
use std::time::Instant;

use crate::classify::{classify, is_fallback_cpu, Category};
use crate::collectors::SensorProvider;
use crate::error::Result;
use crate::models::{Device, Sample};

/// Running maxima for one sampling pass.
#[derive(Debug, Default, Clone, Copy)]
struct Maxima {
    cpu: Option<f32>,
    gpu_core: Option<f32>,
    gpu_hotspot: Option<f32>,
    gpu_generic: Option<f32>,
}

impl Maxima {
    fn record(&mut self, category: Category, value: f32) {
        let slot = match category {
            Category::Cpu => &mut self.cpu,
            Category::GpuCore => &mut self.gpu_core,
            Category::GpuHotspot => &mut self.gpu_hotspot,
            Category::GpuGeneric => &mut self.gpu_generic,
        };
        keep_max(slot, value);
    }

    fn gpu(&self) -> Option<f32> {
        self.gpu_core.or(self.gpu_hotspot).or(self.gpu_generic)
    }
}

fn keep_max(slot: &mut Option<f32>, value: f32) {
    if slot.map_or(true, |current| value > current) {
        *slot = Some(value);
    }
}

/// Resolve the CPU/GPU pair from an already refreshed device list.
///
/// Every device and sub-device is scanned depth-first. If no rule yields a
/// CPU value, the direct sensors of top-level devices are scanned again with
/// the looser fallback rules.
pub fn resolve(devices: &[Device]) -> Sample {
    let mut maxima = Maxima::default();
    for device in devices {
        device.walk(&mut |device: &Device| {
            for sensor in &device.sensors {
                let Some(value) = sensor.temperature_value() else {
                    continue;
                };
                if let Some(category) = classify(device.kind, &sensor.name) {
                    maxima.record(category, value);
                }
            }
        });
    }

    if maxima.cpu.is_none() {
        for device in devices {
            for sensor in &device.sensors {
                let Some(value) = sensor.temperature_value() else {
                    continue;
                };
                if is_fallback_cpu(&device.name, &sensor.name) {
                    keep_max(&mut maxima.cpu, value);
                }
            }
        }
        if let Some(cpu) = maxima.cpu {
            debug!("CPU temperature {:.1} from fallback sensors", cpu);
        }
    }

    Sample {
        cpu: maxima.cpu,
        gpu: maxima.gpu(),
    }
}

/// Owns the sensor provider for its whole lifetime and closes it exactly
/// once, when the sampler is dropped.
pub struct Sampler<P: SensorProvider> {
    provider: P,
}

impl<P: SensorProvider> Sampler<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Refresh the provider and classify its sensors. A refresh error aborts
    /// this pass only; the provider stays usable for the next call.
    pub fn sample(&mut self) -> Result<Sample> {
        let start = Instant::now();
        self.provider.refresh()?;
        let sample = resolve(self.provider.devices());
        debug!("sample took: {} ms ({:?})", start.elapsed().as_millis(), sample);
        Ok(sample)
    }

    pub fn devices(&self) -> &[Device] {
        self.provider.devices()
    }
}

impl<P: SensorProvider> Drop for Sampler<P> {
    fn drop(&mut self) {
        self.provider.close();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::SensorError;
    use crate::models::{DeviceKind, Sensor, SensorKind};
    use std::cell::Cell;
    use std::rc::Rc;

    /// In-memory provider that counts refreshes and closes.
    pub(crate) struct FakeProvider {
        pub devices: Vec<Device>,
        pub refreshes: Rc<Cell<u32>>,
        pub closes: Rc<Cell<u32>>,
        pub fail_on_refresh: Option<u32>,
    }

    impl FakeProvider {
        pub fn new(devices: Vec<Device>) -> Self {
            Self {
                devices,
                refreshes: Rc::new(Cell::new(0)),
                closes: Rc::new(Cell::new(0)),
                fail_on_refresh: None,
            }
        }
    }

    impl SensorProvider for FakeProvider {
        fn refresh(&mut self) -> Result<()> {
            let count = self.refreshes.get() + 1;
            self.refreshes.set(count);
            if self.fail_on_refresh == Some(count) {
                return Err(SensorError::unavailable("sensor bus went away"));
            }
            Ok(())
        }

        fn devices(&self) -> &[Device] {
            &self.devices
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    fn temp(name: &str, value: f32) -> Sensor {
        Sensor::temperature(name, Some(value))
    }

    #[test]
    fn test_no_temperature_sensors() {
        let devices = vec![
            Device::new("k10temp", DeviceKind::Cpu)
                .with_sensor(Sensor::new("Core Fan", SensorKind::Fan, Some(1200.0))),
            Device::new("amdgpu", DeviceKind::GpuAmd)
                .with_sensor(Sensor::new("GPU Core", SensorKind::Voltage, Some(1.1))),
        ];
        assert_eq!(resolve(&devices), Sample { cpu: None, gpu: None });
        assert_eq!(resolve(&[]), Sample::default());
    }

    #[test]
    fn test_cpu_takes_maximum() {
        let devices = vec![Device::new("Intel Core i7", DeviceKind::Cpu)
            .with_sensor(temp("Core #0", 40.0))
            .with_sensor(temp("Package", 55.0))
            .with_sensor(temp("Core #1", 42.0))];
        assert_eq!(resolve(&devices).cpu, Some(55.0));
    }

    #[test]
    fn test_gpu_core_tier_wins_over_hotspot() {
        let devices = vec![Device::new("NVIDIA GeForce RTX 3080", DeviceKind::GpuNvidia)
            .with_sensor(temp("GPU Core", 60.0))
            .with_sensor(temp("GPU Hotspot", 75.0))];
        assert_eq!(resolve(&devices).gpu, Some(60.0));
    }

    #[test]
    fn test_gpu_tiers_fall_through() {
        let devices = vec![Device::new("amdgpu", DeviceKind::GpuAmd)
            .with_sensor(temp("edge", 50.0))
            .with_sensor(temp("junction", 68.0))
            .with_sensor(temp("GPU Memory", 80.0))];
        assert_eq!(resolve(&devices).gpu, Some(68.0));

        let devices = vec![Device::new("i915", DeviceKind::GpuIntel)
            .with_sensor(temp("GPU Memory", 52.0))
            .with_sensor(temp("GPU", 57.0))];
        assert_eq!(resolve(&devices).gpu, Some(57.0));
    }

    #[test]
    fn test_gpu_max_across_devices_per_tier() {
        let devices = vec![
            Device::new("gpu0", DeviceKind::GpuNvidia).with_sensor(temp("GPU Core", 61.0)),
            Device::new("gpu1", DeviceKind::GpuAmd).with_sensor(temp("GPU Core", 66.0)),
        ];
        assert_eq!(resolve(&devices).gpu, Some(66.0));
    }

    #[test]
    fn test_motherboard_cpu_fan_is_not_cpu() {
        let devices = vec![Device::new("B650", DeviceKind::Motherboard)
            .with_sensor(temp("CPU Fan", 45.0))
            .with_sensor(temp("CPU Pump", 35.0))];
        assert_eq!(resolve(&devices).cpu, None);
    }

    #[test]
    fn test_motherboard_cpu_keeps_running_maximum() {
        let devices = vec![Device::new("B650", DeviceKind::Motherboard)
            .with_child(
                Device::new("nct6798", DeviceKind::Motherboard)
                    .with_sensor(temp("CPUTIN", 38.0))
                    .with_sensor(temp("CPU Socket", 44.0)),
            )];
        assert_eq!(resolve(&devices).cpu, Some(44.0));
    }

    #[test]
    fn test_absent_values_are_skipped() {
        let devices = vec![
            Device::new("k10temp", DeviceKind::Cpu).with_sensor(Sensor::temperature("Tctl", None)),
            Device::new("amdgpu", DeviceKind::GpuAmd)
                .with_sensor(Sensor::temperature("junction", None))
                .with_sensor(temp("GPU Memory", 70.0)),
        ];
        assert_eq!(
            resolve(&devices),
            Sample {
                cpu: None,
                gpu: Some(70.0)
            }
        );
    }

    #[test]
    fn test_fallback_temp_prefix() {
        let devices = vec![Device::new("acpitz", DeviceKind::Other).with_sensor(temp("Temp1", 33.0))];
        assert_eq!(resolve(&devices).cpu, Some(33.0));
    }

    #[test]
    fn test_fallback_only_without_primary_match() {
        let devices = vec![
            Device::new("acpitz", DeviceKind::Other).with_sensor(temp("temp1", 90.0)),
            Device::new("coretemp", DeviceKind::Cpu).with_sensor(temp("Package id 0", 48.0)),
        ];
        assert_eq!(resolve(&devices).cpu, Some(48.0));
    }

    #[test]
    fn test_fallback_ignores_sub_devices() {
        let devices = vec![Device::new("board", DeviceKind::Other)
            .with_child(Device::new("acpitz", DeviceKind::Other).with_sensor(temp("temp1", 31.0)))];
        assert_eq!(resolve(&devices).cpu, None);
    }

    #[test]
    fn test_fallback_takes_maximum() {
        let devices = vec![
            Device::new("cpu_sensor", DeviceKind::Other).with_sensor(temp("Temperature", 41.0)),
            Device::new("soc", DeviceKind::Other)
                .with_sensor(temp("Thermal Zone", 47.0))
                .with_sensor(temp("GPU Thermal", 80.0)),
        ];
        assert_eq!(resolve(&devices).cpu, Some(47.0));
    }

    #[test]
    fn test_sample_is_idempotent() {
        let provider = FakeProvider::new(vec![
            Device::new("k10temp", DeviceKind::Cpu).with_sensor(temp("Tctl", 50.0)),
            Device::new("amdgpu", DeviceKind::GpuAmd).with_sensor(temp("junction", 65.0)),
        ]);
        let refreshes = provider.refreshes.clone();
        let mut sampler = Sampler::new(provider);

        let first = sampler.sample().unwrap();
        let second = sampler.sample().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Sample { cpu: Some(50.0), gpu: Some(65.0) });
        assert_eq!(refreshes.get(), 2);
    }

    #[test]
    fn test_failed_refresh_does_not_poison_sampler() {
        let mut provider = FakeProvider::new(vec![
            Device::new("k10temp", DeviceKind::Cpu).with_sensor(temp("Tctl", 50.0)),
        ]);
        provider.fail_on_refresh = Some(1);
        let mut sampler = Sampler::new(provider);

        assert!(sampler.sample().is_err());
        assert_eq!(sampler.sample().unwrap().cpu, Some(50.0));
    }

    #[test]
    fn test_drop_closes_provider_once() {
        let provider = FakeProvider::new(Vec::new());
        let closes = provider.closes.clone();
        let sampler = Sampler::new(provider);
        assert_eq!(closes.get(), 0);
        drop(sampler);
        assert_eq!(closes.get(), 1);
    }
}
