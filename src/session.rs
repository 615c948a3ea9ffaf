use anyhow::Context;
use log::{debug, error, info};
use std::io::{BufRead, Write};

use crate::collectors::SensorProvider;
use crate::report;
use crate::sampler::Sampler;

/// A line received from the parent process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Update,
    Exit,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.eq_ignore_ascii_case("update") {
            Command::Update
        } else if line.eq_ignore_ascii_case("exit") {
            Command::Exit
        } else {
            Command::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Compact,
    Debug,
}

/// Take one sample and print it. Nothing is written if sampling fails.
pub fn emit<P, W>(sampler: &mut Sampler<P>, out: &mut W, mode: OutputMode) -> anyhow::Result<()>
where
    P: SensorProvider,
    W: Write,
{
    let sample = sampler.sample().context("Failed to sample sensors")?;
    let written = match mode {
        OutputMode::Compact => report::write_line(out, &sample),
        OutputMode::Debug => {
            let taken_at = chrono::Local::now().format("%H:%M:%S").to_string();
            report::write_debug(out, sampler.devices(), &sample, &taken_at)
        }
    };
    written.context("Failed to write sample")
}

/// Answer `update` commands until `exit`, end of input, or the first error.
///
/// Errors end the loop the same way a closed pipe does: the parent gets no
/// further lines and the process can shut down normally. Returns the number
/// of samples written.
pub fn serve<P, R, W>(
    sampler: &mut Sampler<P>,
    mut input: R,
    out: &mut W,
    mode: OutputMode,
) -> usize
where
    P: SensorProvider,
    R: BufRead,
    W: Write,
{
    let mut served = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!("Failed to read command: {}", e);
                break;
            }
        }
        // Undecodable bytes only make the line unknown.
        let line = String::from_utf8_lossy(&buf);

        match Command::parse(&line) {
            Command::Exit => {
                info!("Exit requested");
                return served;
            }
            Command::Update => {
                if let Err(e) = emit(sampler, out, mode) {
                    error!("Stopping: {e:#}");
                    return served;
                }
                served += 1;
            }
            Command::Unknown => debug!("Ignoring command {:?}", line),
        }
    }
    info!("Input closed");
    served
}
