use log::{debug, warn};
use std::time::Instant;
use subprocess::{Exec, Redirection};

use crate::error::{Result, SensorError};
use crate::models::{Device, DeviceKind, Sensor};

const NVIDIA_SMI: &str = "nvidia-smi";
const FORMAT_ARG: &str = "--format=csv,noheader,nounits";

/// The field list passed to `--query-gpu`. Some drivers reject
/// `temperature.memory` outright, so the core-only query is kept as a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Query {
    CoreAndMemory,
    CoreOnly,
}

impl Query {
    fn args(self) -> [&'static str; 2] {
        let fields = match self {
            Query::CoreAndMemory => "--query-gpu=name,temperature.gpu,temperature.memory",
            Query::CoreOnly => "--query-gpu=name,temperature.gpu",
        };
        [fields, FORMAT_ARG]
    }
}

/// GPUs driven by the proprietary NVIDIA driver, which exposes no hwmon
/// interface. Readings come from `nvidia-smi`.
#[derive(Debug, Clone)]
pub struct NvidiaSmi {
    query: Query,
    devices: Vec<Device>,
}

impl NvidiaSmi {
    /// Look for `nvidia-smi`. Returns `None` when the tool is missing or
    /// reports no GPUs.
    pub fn detect() -> Option<Self> {
        match first_working_query(run_query) {
            Ok((query, devices)) if !devices.is_empty() => {
                debug!("nvidia-smi reports {} GPU(s) ({:?} query)", devices.len(), query);
                Some(Self { query, devices })
            }
            Ok(_) => {
                debug!("nvidia-smi reports no GPUs");
                None
            }
            Err(e) => {
                debug!("nvidia-smi not usable: {}", e);
                None
            }
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Re-run the query. On failure the previous devices stay listed with
    /// their readings cleared, so a stale value is never reported.
    pub fn refresh(&mut self) {
        match run_query(self.query) {
            Ok(devices) => self.devices = devices,
            Err(e) => {
                warn!("nvidia-smi refresh failed: {}", e);
                for device in &mut self.devices {
                    for sensor in &mut device.sensors {
                        sensor.value = None;
                    }
                }
            }
        }
    }
}

/// Run the full query, falling back to the core-only one when the driver
/// refuses it.
fn first_working_query<F>(mut run: F) -> Result<(Query, Vec<Device>)>
where
    F: FnMut(Query) -> Result<Vec<Device>>,
{
    match run(Query::CoreAndMemory) {
        Ok(devices) => Ok((Query::CoreAndMemory, devices)),
        Err(e) => {
            debug!("nvidia-smi memory temperature query failed, retrying core only: {}", e);
            run(Query::CoreOnly).map(|devices| (Query::CoreOnly, devices))
        }
    }
}

fn run_query(query: Query) -> Result<Vec<Device>> {
    let start = Instant::now();
    let capture = Exec::cmd(NVIDIA_SMI)
        .args(&query.args())
        .stdout(Redirection::Pipe)
        .stderr(Redirection::Merge)
        .capture()
        .map_err(|e| SensorError::command(NVIDIA_SMI, e.to_string()))?;
    debug!("nvidia-smi command execution took: {} ms", start.elapsed().as_millis());

    let output = capture.stdout_str();
    if !capture.exit_status.success() {
        return Err(SensorError::command(NVIDIA_SMI, output.trim().to_string()));
    }
    Ok(parse_query_output(&output))
}

/// Parse `name, temperature.gpu[, temperature.memory]` rows. Columns that
/// the board does not support come back as `N/A` or `[Not Supported]`.
pub fn parse_query_output(output: &str) -> Vec<Device> {
    output
        .lines()
        .filter_map(|line| {
            let values: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
            if !(2..=3).contains(&values.len()) || values[0].is_empty() {
                return None;
            }

            let mut device = Device::new(values[0], DeviceKind::GpuNvidia)
                .with_sensor(Sensor::temperature("GPU Core", parse_reading(values[1])));
            if let Some(memory) = values.get(2) {
                let reading = parse_reading(memory);
                device = device.with_sensor(Sensor::temperature("GPU Memory", reading));
            }
            Some(device)
        })
        .collect()
}

fn parse_reading(value: &str) -> Option<f32> {
    value.parse::<f32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_output() {
        let output = "NVIDIA GeForce RTX 3080, 64, 72\nNVIDIA RTX A2000, 51, [Not Supported]\n";
        let devices = parse_query_output(output);

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "NVIDIA GeForce RTX 3080");
        assert_eq!(devices[0].kind, DeviceKind::GpuNvidia);
        assert_eq!(devices[0].sensors[0].name, "GPU Core");
        assert_eq!(devices[0].sensors[0].value, Some(64.0));
        assert_eq!(devices[0].sensors[1].value, Some(72.0));
        assert_eq!(devices[1].sensors[0].value, Some(51.0));
        assert_eq!(devices[1].sensors[1].value, None);
    }

    #[test]
    fn test_parse_core_only_output() {
        let devices = parse_query_output("Quadro P400, 48\n");

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Quadro P400");
        assert_eq!(devices[0].sensors.len(), 1);
        assert_eq!(devices[0].sensors[0].name, "GPU Core");
        assert_eq!(devices[0].sensors[0].value, Some(48.0));
    }

    #[test]
    fn test_rejected_memory_field_falls_back_to_core_only() {
        let mut attempts = Vec::new();
        let (query, devices) = first_working_query(|query| {
            attempts.push(query);
            match query {
                Query::CoreAndMemory => Err(SensorError::command(
                    NVIDIA_SMI,
                    "Field \"temperature.memory\" is not a valid field to query.",
                )),
                Query::CoreOnly => Ok(parse_query_output("Quadro P400, 48\n")),
            }
        })
        .unwrap();

        assert_eq!(attempts, vec![Query::CoreAndMemory, Query::CoreOnly]);
        assert_eq!(query, Query::CoreOnly);
        assert_eq!(devices[0].sensors[0].value, Some(48.0));
        assert_eq!(query.args()[0], "--query-gpu=name,temperature.gpu");
    }

    #[test]
    fn test_full_query_is_used_when_accepted() {
        let mut attempts = 0;
        let (query, devices) = first_working_query(|_| {
            attempts += 1;
            Ok(parse_query_output("NVIDIA GeForce RTX 3080, 64, 72\n"))
        })
        .unwrap();

        assert_eq!(attempts, 1);
        assert_eq!(query, Query::CoreAndMemory);
        assert_eq!(devices[0].sensors.len(), 2);
    }

    #[test]
    fn test_missing_tool_fails_both_queries() {
        let result = first_working_query(|_| {
            Err(SensorError::command(NVIDIA_SMI, "No such file or directory"))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_skips_malformed_rows() {
        let output = "No devices were found\n, 40, 41\nTesla T4, N/A, N/A\n";
        let devices = parse_query_output(output);

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Tesla T4");
        assert!(devices[0].sensors.iter().all(|s| s.value.is_none()));
    }
}
