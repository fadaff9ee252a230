use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::printer::ControllerState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error
{
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serial::Error),

    #[error("failed to open any serial device (tried {0:?})")]
    NoDevice(Vec<String>),

    #[error("no acknowledgment for '{command}' within {waited:?}")]
    Timeout { command: String, waited: Duration },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("printer worker thread panicked")]
    WorkerPanicked,

    #[error("cannot {operation} while {state:?}")]
    InvalidState { operation: &'static str, state: ControllerState },
}

impl Error
{
    pub fn config(descr: &str) -> Error
    {
        Error::Config(String::from(descr))
    }
}
