use std::time::Duration;

use serde::Deserialize;

use crate::coords::{Bounds, Position};
use crate::error::{Error, Result};

fn default_extrude_multiplier() -> f64 { 5.0 }
fn default_enqueue_timeout_ms() -> u64 { 1000 }
fn default_poll_interval_ms() -> u64 { 100 }
fn default_heat_poll_interval_ms() -> u64 { 1000 }

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrinterSettings
{
    pub port: String,
    #[serde(default)]
    pub fallback_ports: Vec<String>,
    pub baud_rate: usize,

    pub x_max: f64, // mm
    pub y_max: f64,
    pub z_max: f64,

    pub move_increment: f64, // mm
    pub extrude_amount: f64, // budget units per extruding move
    pub extrude_temp: f64, // C
    pub feed_rate: f64, // mm/min
    pub queue_capacity: usize,

    /// Extruder length per budget unit. Not derived from the hardware,
    /// calibrate against the extruder steps per mm.
    #[serde(default = "default_extrude_multiplier")]
    pub extrude_multiplier: f64,
    /// Where to park the head after heating
    #[serde(default)]
    pub start_position: Option<[f64; 3]>,
    /// None waits forever for an acknowledgment
    #[serde(default)]
    pub response_timeout_ms: Option<u64>,
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_heat_poll_interval_ms")]
    pub heat_poll_interval_ms: u64,
    #[serde(default)]
    pub initial_budget: f64
}

impl PrinterSettings
{
    pub fn bounds(&self) -> Bounds
    {
        Bounds::new(self.x_max, self.y_max, self.z_max)
    }

    /// Primary port first, then the fallbacks
    pub fn candidate_ports(&self) -> Vec<String>
    {
        let mut ports = vec![self.port.clone()];
        ports.extend(self.fallback_ports.iter().cloned());
        ports
    }

    pub fn start_position(&self) -> Option<Position>
    {
        self.start_position.map(|[x, y, z]| Position::new(x, y, z))
    }

    pub fn response_timeout(&self) -> Option<Duration>
    {
        self.response_timeout_ms.map(Duration::from_millis)
    }

    pub fn enqueue_timeout(&self) -> Duration
    {
        Duration::from_millis(self.enqueue_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration
    {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn heat_poll_interval(&self) -> Duration
    {
        Duration::from_millis(self.heat_poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()>
    {
        for (name, v) in [("xMax", self.x_max), ("yMax", self.y_max), ("zMax", self.z_max),
                          ("moveIncrement", self.move_increment),
                          ("extrudeAmount", self.extrude_amount),
                          ("feedRate", self.feed_rate)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::Config(format!("{} must be a positive number", name)));
            }
        }
        if !(self.extrude_multiplier.is_finite() && self.extrude_multiplier >= 0.0) {
            return Err(Error::config("extrudeMultiplier must not be negative"));
        }
        if !self.extrude_temp.is_finite() {
            return Err(Error::config("extrudeTemp must be a number"));
        }
        if self.queue_capacity == 0 {
            return Err(Error::config("queueCapacity must be at least 1"));
        }
        if self.port.is_empty() {
            return Err(Error::config("port must not be empty"));
        }
        if let Some(p) = self.start_position() {
            if !self.bounds().contains(&p) {
                return Err(Error::Config(format!("startPosition {} outside workspace", p)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimulationConfig
{
    #[serde(default)]
    pub enabled: bool,
    pub min_delay: f64, // s
    pub max_delay: f64,
    pub min_heat_step: f64, // C per poll
    pub max_heat_step: f64,
    #[serde(default)]
    pub ambient_temp: f64
}

impl Default for SimulationConfig
{
    fn default() -> SimulationConfig
    {
        SimulationConfig { enabled: false,
                           min_delay: 0.1, max_delay: 0.5,
                           min_heat_step: 10.0, max_heat_step: 25.0,
                           ambient_temp: 0.0 }
    }
}

impl SimulationConfig
{
    pub fn validate(&self) -> Result<()>
    {
        if !(self.min_delay >= 0.0 && self.min_delay <= self.max_delay && self.max_delay.is_finite()) {
            return Err(Error::config("simulation delays must satisfy 0 <= minDelay <= maxDelay"));
        }
        if !(self.min_heat_step > 0.0 && self.min_heat_step <= self.max_heat_step
             && self.max_heat_step.is_finite()) {
            return Err(Error::config("simulation heat steps must satisfy 0 < minHeatStep <= maxHeatStep"));
        }
        Ok(())
    }
}

fn default_gift_ratio() -> f64 { 1.0 }

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventConfig
{
    #[serde(default = "default_gift_ratio")]
    pub gift_to_filament_ratio: f64
}

impl Default for EventConfig
{
    fn default() -> EventConfig
    {
        EventConfig { gift_to_filament_ratio: default_gift_ratio() }
    }
}

fn default_log_level() -> String { String::from("info") }

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoggingConfig
{
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
    /// `%(field)s` style line format, env_logger's default when absent
    #[serde(default)]
    pub format: Option<String>
}

impl Default for LoggingConfig
{
    fn default() -> LoggingConfig
    {
        LoggingConfig { level: default_log_level(), file: None, format: None }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config
{
    pub printer: PrinterSettings,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub events: EventConfig,
    #[serde(default)]
    pub logging: LoggingConfig
}

impl Config
{
    pub fn validate(&self) -> Result<()>
    {
        self.printer.validate()?;
        self.simulation.validate()?;
        let ratio = self.events.gift_to_filament_ratio;
        if !(ratio.is_finite() && ratio >= 0.0) {
            return Err(Error::config("giftToFilamentRatio must not be negative"));
        }
        Ok(())
    }
}
