use std::fs::{read_dir, File};
use std::io::{self, Read};
use std::path::Path;

use regex::Regex;

use crate::error::{Result, SensorError};
use crate::models::{Sensor, SensorKind};

/// Read out the sensors of one `hwmon` folder.
///
/// ## What is read:
///
/// - `tempN_input`: temperature in milli-celsius.
/// - `fanN_input`: fan speed in RPM.
/// - `inN_input`: voltage in milli-volts.
/// - Optional: `<prefix>N_label`. Without it the sensor is named `<prefix>N`,
///   which is what the kernel itself reports for unlabeled channels.
///
/// A channel whose `_input` cannot be read right now is still listed, with an
/// absent value. The result is ordered by sensor kind, then channel number.
///
/// ## Doc to Linux kernel API.
///
/// Kernel hwmon API: https://www.kernel.org/doc/html/latest/hwmon/hwmon-kernel-api.html
/// Sysfs naming: https://www.kernel.org/doc/html/latest/hwmon/sysfs-interface.html
pub fn sensors_from_hwmon(folder: &Path) -> Result<Vec<Sensor>> {
    let input_file = Regex::new(r"^(temp|fan|in)(\d+)_input$")
        .map_err(|e| SensorError::unavailable(e.to_string()))?;
    let dir = read_dir(folder).map_err(|e| SensorError::io(folder, e))?;

    let mut channels = Vec::new();
    for entry in dir.flatten() {
        if entry.file_type().is_ok_and(|file_type| file_type.is_dir()) {
            continue;
        }

        let path = entry.path();
        let filename = path.file_name().and_then(|x| x.to_str()).unwrap_or("");
        let Some((prefix, id)) = input_file
            .captures(filename)
            .and_then(|c| Some((c[1].to_string(), c[2].parse::<u32>().ok()?)))
        else {
            continue;
        };
        let kind = match prefix.as_str() {
            "temp" => SensorKind::Temperature,
            "fan" => SensorKind::Fan,
            _ => SensorKind::Voltage,
        };

        let label = get_file_line(&folder.join(format!("{prefix}{id}_label")), 32)
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| format!("{prefix}{id}"));
        let value = read_sensor_value(&path, kind)?;
        channels.push((kind, id, Sensor::new(label, kind, value).with_path(path)));
    }

    channels.sort_by_key(|(kind, id, _)| (*kind, *id));
    Ok(channels.into_iter().map(|(_, _, sensor)| sensor).collect())
}

/// Re-read a sensor's `_input` file and convert it to display units.
///
/// Drivers commonly answer `ENODATA`/`EIO` for channels that have nothing to
/// report, and a file may vanish with a hot-unplugged device: those become an
/// absent reading. A permission failure is returned as an error.
pub fn read_sensor_value(file: &Path, kind: SensorKind) -> Result<Option<f32>> {
    match read_number_from_file::<i64>(file) {
        Ok(raw) => Ok(raw.map(|n| convert_raw(n, kind))),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(SensorError::io(file, e)),
        Err(_) => Ok(None),
    }
}

// Read arbitrary string data.
pub fn get_file_line(file: &Path, capacity: usize) -> Option<String> {
    let mut reader = String::with_capacity(capacity);
    let mut f = File::open(file).ok()?;
    f.read_to_string(&mut reader).ok()?;
    reader.truncate(reader.trim_end().len());
    Some(reader)
}

/// Designed at first for reading an `i32` or `u32` aka `c_long`
/// from a `/sys/class/hwmon` sysfs file. `Ok(None)` means the file was read
/// but did not hold a number.
fn read_number_from_file<N>(file: &Path) -> io::Result<Option<N>>
where
    N: std::str::FromStr,
{
    let mut reader = [0u8; 32];
    let mut f = File::open(file)?;
    let n = f.read(&mut reader)?;
    // parse and trim would complain about `\0`.
    let number = &reader[..n];
    let Ok(number) = std::str::from_utf8(number) else {
        return Ok(None);
    };
    Ok(number.trim_matches(|c: char| c.is_whitespace() || c == '\0').parse().ok())
}

/// Temperatures come in milli-celsius, voltages in milli-volts, fans in RPM.
#[inline]
fn convert_raw(raw: i64, kind: SensorKind) -> f32 {
    match kind {
        SensorKind::Temperature | SensorKind::Voltage => (raw as f32) / 1000f32,
        SensorKind::Fan => raw as f32,
    }
}
