use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::gcode;
use crate::printer::Printer;
use crate::printer_config::PrinterSettings;
use crate::transport::{Response, Transport};

mod printer_test;

/// In-memory device that acknowledges everything and remembers what it
/// was sent.
#[derive(Clone, Default)]
pub struct RecordingTransport
{
    pub sent: Arc<Mutex<Vec<String>>>,
    /// Temperature reports handed out in order, repeating the last one
    pub reports: Arc<Mutex<VecDeque<String>>>,
    /// Lines starting with this prefix fail with a timeout
    pub fail_prefix: Arc<Mutex<Option<String>>>,
    pub delay: Duration
}

impl RecordingTransport
{
    pub fn new() -> RecordingTransport
    {
        RecordingTransport::default()
    }

    pub fn with_reports(reports: &[&str]) -> RecordingTransport
    {
        let t = RecordingTransport::new();
        t.reports.lock().extend(reports.iter().map(|r| r.to_string()));
        t
    }

    pub fn lines(&self) -> Vec<String>
    {
        self.sent.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize
    {
        self.sent.lock().iter().filter(|l| l.starts_with(prefix)).count()
    }

    pub fn fail_on(&self, prefix: Option<&str>)
    {
        *self.fail_prefix.lock() = prefix.map(String::from);
    }
}

impl Transport for RecordingTransport
{
    fn send_and_await(&mut self, line: &str) -> Result<Response>
    {
        let line = line.trim_end().to_string();
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.sent.lock().push(line.clone());
        if let Some(prefix) = self.fail_prefix.lock().as_ref() {
            if line.starts_with(prefix.as_str()) {
                return Err(Error::Timeout { command: line, waited: Duration::from_millis(1) });
            }
        }
        if line == "M105" {
            let mut reports = self.reports.lock();
            let report = if reports.len() > 1 {
                reports.pop_front()
            } else {
                reports.front().cloned()
            };
            return Ok(Response::ack(&report.unwrap_or_else(|| String::from(gcode::ACK))));
        }
        Ok(Response::ack(gcode::ACK))
    }
}

pub fn settings() -> PrinterSettings
{
    PrinterSettings { port: String::from("/dev/null"),
                      fallback_ports: Vec::new(),
                      baud_rate: 115200,
                      x_max: 200.0, y_max: 200.0, z_max: 200.0,
                      move_increment: 10.0,
                      extrude_amount: 2.0,
                      extrude_temp: 210.0,
                      feed_rate: 1500.0,
                      queue_capacity: 10,
                      extrude_multiplier: 5.0,
                      start_position: None,
                      response_timeout_ms: None,
                      enqueue_timeout_ms: 50,
                      poll_interval_ms: 10,
                      heat_poll_interval_ms: 0,
                      initial_budget: 0.0 }
}

pub fn recording_printer(settings: PrinterSettings) -> (Printer, RecordingTransport)
{
    let transport = RecordingTransport::new();
    let printer = Printer::new(settings, Box::new(transport.clone()));
    (printer, transport)
}
