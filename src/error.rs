use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by sensor providers.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Sensor provider unavailable: {0}")]
    Unavailable(String),

    #[error("Command `{command}` failed: {message}")]
    Command { command: String, message: String },
}

pub type Result<T> = std::result::Result<T, SensorError>;

impl SensorError {
    pub fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        SensorError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        SensorError::Unavailable(msg.into())
    }

    pub fn command<C: Into<String>, M: Into<String>>(command: C, message: M) -> Self {
        SensorError::Command {
            command: command.into(),
            message: message.into(),
        }
    }
}
