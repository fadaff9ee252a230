//! Stand-in for a printer that is not connected.
//!
//! Every line is acknowledged after a random delay. The hotend is modelled
//! as a temperature that moves a random step toward the last target each
//! time it is polled, so a heating loop driven against it always finishes.

use std::thread;
use std::time::Duration;

use log::{debug, info};
use rand::Rng;

use crate::error::Result;
use crate::gcode::{self, ACK};
use crate::printer_config::SimulationConfig;
use crate::transport::{Response, Transport};

pub struct SimulatedTransport
{
    min_delay: f64, // s
    max_delay: f64,
    min_heat_step: f64,
    max_heat_step: f64,
    hotend_temp: f64,
    target_temp: f64,
    transactions: u64
}

fn uniform(low: f64, high: f64) -> f64
{
    if high > low {
        rand::thread_rng().gen_range(low..=high)
    } else {
        low
    }
}

impl SimulatedTransport
{
    pub fn new(config: &SimulationConfig) -> SimulatedTransport
    {
        SimulatedTransport { min_delay: config.min_delay,
                             max_delay: config.max_delay,
                             min_heat_step: config.min_heat_step,
                             max_heat_step: config.max_heat_step,
                             hotend_temp: config.ambient_temp,
                             target_temp: config.ambient_temp,
                             transactions: 0 }
    }

    pub fn hotend_temp(&self) -> f64
    {
        self.hotend_temp
    }

    pub fn transactions(&self) -> u64
    {
        self.transactions
    }

    fn latency(&self)
    {
        let delay = uniform(self.min_delay, self.max_delay);
        if delay > 0.0 {
            thread::sleep(Duration::from_secs_f64(delay));
        }
    }

    // One polling round of the hotend model
    fn step_temperature(&mut self)
    {
        let step = uniform(self.min_heat_step, self.max_heat_step);
        if self.hotend_temp < self.target_temp {
            self.hotend_temp += step;
        } else if self.hotend_temp > self.target_temp {
            self.hotend_temp = f64::max(self.target_temp, self.hotend_temp - step);
        }
    }
}

impl Transport for SimulatedTransport
{
    fn send_and_await(&mut self, line: &str) -> Result<Response>
    {
        let line = line.trim();
        info!("Simulated printer received command: {}", line);
        self.latency();
        self.transactions += 1;
        if let Some(target) = gcode::parse_set_temperature(line) {
            self.target_temp = target;
        }
        Ok(Response::ack(ACK))
    }

    fn query_temperature(&mut self) -> Result<Option<f64>>
    {
        self.latency();
        self.transactions += 1;
        self.step_temperature();
        debug!("Simulated hotend at {:.1}C, target {:.1}C", self.hotend_temp, self.target_temp);
        Ok(Some(self.hotend_temp))
    }
}
