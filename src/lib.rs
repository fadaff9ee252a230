#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod budget;
pub mod command;
pub mod config_parser;
pub mod coords;
pub mod error;
pub mod events;
pub mod gcode;
pub mod logging;
pub mod printer;
pub mod printer_config;
pub mod serial_link;
pub mod simulator;
pub mod transport;

pub use error::{Error, Result};
pub use printer::{ControllerState, Printer, PrinterHandle};

#[cfg(test)]
mod tests;
