use std::io::{self, Write};

use crate::models::sample::format_tenths;
use crate::models::{Device, Sample};

/// Write the compact protocol line and flush, since the reader is usually a
/// parent process on the other end of a pipe.
pub fn write_line<W: Write>(out: &mut W, sample: &Sample) -> io::Result<()> {
    writeln!(out, "{}", sample)?;
    out.flush()
}

/// Full device/sensor dump followed by the resolved values.
pub fn write_debug<W: Write>(
    out: &mut W,
    devices: &[Device],
    sample: &Sample,
    taken_at: &str,
) -> io::Result<()> {
    writeln!(out, "=== Sensor dump at {} ===", taken_at)?;
    for device in devices {
        write_device(out, device, 0)?;
    }
    writeln!(out, "CPU Temperature: {}", sample.cpu_display())?;
    writeln!(out, "GPU Temperature: {}", sample.gpu_display())?;
    out.flush()
}

fn write_device<W: Write>(out: &mut W, device: &Device, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    writeln!(out, "{}{} [{}]", indent, device.name, device.kind)?;
    for sensor in &device.sensors {
        let value = match sensor.value {
            Some(value) => format!("{} {}", format_tenths(value), sensor.kind.unit()),
            None => "n/a".to_string(),
        };
        writeln!(out, "{}  - {} ({}): {}", indent, sensor.name, sensor.kind, value)?;
    }
    for child in &device.children {
        write_device(out, child, depth + 1)?;
    }
    Ok(())
}
