use std::fmt;

/// Printed in place of a temperature that could not be determined.
pub const UNKNOWN_TEMPERATURE: f32 = -1.0;

/// The CPU/GPU temperature pair produced by one sampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub cpu: Option<f32>,
    pub gpu: Option<f32>,
}

impl Sample {
    pub fn cpu_display(&self) -> String {
        format_tenths(self.cpu.unwrap_or(UNKNOWN_TEMPERATURE))
    }

    pub fn gpu_display(&self) -> String {
        format_tenths(self.gpu.unwrap_or(UNKNOWN_TEMPERATURE))
    }
}

/// One fractional digit, ties rounded away from zero (`48.25` -> `48.3`).
/// `{:.1}` alone would round ties to even.
pub fn format_tenths(value: f32) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

/// Formats as the protocol line `CPU:<cpu>,GPU:<gpu>`.
impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU:{},GPU:{}", self.cpu_display(), self.gpu_display())
    }
}
