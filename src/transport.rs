use crate::error::Result;
use crate::gcode::{self, Gcode};

/// Lines read back for one transaction
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response
{
    /// The line starting with "ok"
    pub ack: String,
    /// Everything the device printed before the acknowledgment
    pub diagnostics: Vec<String>
}

impl Response
{
    pub fn ack(line: &str) -> Response
    {
        Response { ack: String::from(line), diagnostics: Vec::new() }
    }

    /// Temperature reading from the acknowledgment, or failing that from
    /// the first diagnostic line carrying one
    pub fn temperature(&self) -> Option<f64>
    {
        gcode::parse_temperature(&self.ack)
            .or_else(|| self.diagnostics.iter().find_map(|l| gcode::parse_temperature(l)))
    }
}

/// Request/response channel to the device. Exactly one transaction is in
/// flight at a time.
pub trait Transport: Send
{
    /// Write one line and block until the device acknowledges it.
    fn send_and_await(&mut self, line: &str) -> Result<Response>;

    /// Ask for a temperature report. `Ok(None)` means the report carried
    /// no reading and the caller should poll again.
    fn query_temperature(&mut self) -> Result<Option<f64>>
    {
        let resp = self.send_and_await(&Gcode::ReportTemperature.to_line())?;
        Ok(resp.temperature())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T>
{
    fn send_and_await(&mut self, line: &str) -> Result<Response>
    {
        (**self).send_and_await(line)
    }

    fn query_temperature(&mut self) -> Result<Option<f64>>
    {
        (**self).query_temperature()
    }
}
