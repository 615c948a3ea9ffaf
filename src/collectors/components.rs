use indexmap::IndexMap;
use log::{debug, info};
use std::time::Instant;
use sysinfo::Components;

use crate::collectors::{Categories, DriverTable, SensorProvider};
use crate::error::{Result, SensorError};
use crate::models::{Device, Sensor};

/// Portable provider over `sysinfo`'s component list.
///
/// sysinfo reports one flat component per temperature sensor with a label of
/// the form `<driver> <sensor>`, e.g. `k10temp Tctl` or `amdgpu edge`.
/// Components are regrouped into one device per driver.
pub struct ComponentsProvider {
    components: Components,
    drivers: DriverTable,
    categories: Categories,
    devices: Vec<Device>,
}

impl ComponentsProvider {
    pub fn open(drivers: DriverTable, categories: Categories) -> Result<Self> {
        let start = Instant::now();
        let components = Components::new_with_refreshed_list();
        if components.list().is_empty() {
            return Err(SensorError::unavailable("sysinfo reports no components"));
        }

        let mut provider = Self {
            components,
            drivers,
            categories,
            devices: Vec::new(),
        };
        provider.rebuild();
        info!(
            "Opened sysinfo provider with {} device(s) in {} ms",
            provider.devices.len(),
            start.elapsed().as_millis()
        );
        Ok(provider)
    }

    fn rebuild(&mut self) {
        let readings = self
            .components
            .list()
            .iter()
            .map(|component| (component.label(), component.temperature()));
        self.devices = group_by_driver(readings, &self.drivers, &self.categories);
    }
}

impl SensorProvider for ComponentsProvider {
    fn refresh(&mut self) -> Result<()> {
        let start = Instant::now();
        self.components.refresh(false);
        self.rebuild();
        debug!("sysinfo refresh took: {} ms", start.elapsed().as_millis());
        Ok(())
    }

    fn devices(&self) -> &[Device] {
        &self.devices
    }

    fn close(&mut self) {
        debug!("Closing sysinfo provider");
        self.devices.clear();
    }
}

/// Split each `<driver> <sensor>` label and collect sensors under one device
/// per driver, in first-seen order. A label without a sensor part is both the
/// device and the sensor name.
pub fn group_by_driver<'a, I>(
    readings: I,
    drivers: &DriverTable,
    categories: &Categories,
) -> Vec<Device>
where
    I: IntoIterator<Item = (&'a str, Option<f32>)>,
{
    let mut grouped: IndexMap<String, Device> = IndexMap::new();
    for (label, value) in readings {
        let label = label.trim();
        let (driver, sensor_name) = match label.split_once(' ') {
            Some((driver, rest)) if !rest.trim().is_empty() => (driver, rest.trim()),
            _ => (label, label),
        };

        let kind = drivers.kind_of(driver);
        if !categories.allows(kind) {
            continue;
        }
        grouped
            .entry(driver.to_string())
            .or_insert_with(|| Device::new(driver, kind))
            .sensors
            .push(Sensor::temperature(sensor_name, value));
    }
    grouped.into_values().collect()
}
