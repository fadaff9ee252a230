use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serial::core::SerialDevice;
use serial::core::SerialPortSettings;

use crate::error::{Error, Result};
use crate::gcode;
use crate::transport::{Response, Transport};

/// Read timeout of the port itself. Response deadlines are checked this often.
const READ_POLL: Duration = Duration::from_millis(100);

/// Upper limit on reads when discarding stale input
const MAX_DRAIN_READS: usize = 4096;

// Ok(None) when the deadline passed before a full line arrived
fn read_reply(inp: &mut dyn Read, deadline: Option<Instant>) -> Result<Option<String>>
{
    let mut reply = Vec::<u8>::new();
    let mut buf = [0u8; 1];
    loop {
        match inp.read(&mut buf) {
            Ok(1) => {
                match buf[0] {
                    b'\n' => {
                        let line = String::from_utf8(reply).map_err(|e| {
                            Error::Protocol(format!("undecodable response: {}", e))
                        })?;
                        return Ok(Some(line.trim().to_string()));
                    },
                    b'\r' => {},
                    b => reply.push(b)
                }
            },
            Ok(_) => return Err(Error::Protocol(String::from("device closed the connection"))),
            Err(ref e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                }
            },
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {},
            Err(e) => return Err(Error::Io(e))
        };
    }
}

/// Transport over a serial line, or anything else that reads and writes
/// bytes.
pub struct SerialTransport<P>
{
    port: P,
    response_timeout: Option<Duration>,
    // Set after a timeout; a late acknowledgment may still be buffered
    stale: bool
}

impl SerialTransport<serial::SystemPort>
{
    /// Open the first device in `port_names` that can be configured.
    pub fn open(port_names: &[String], baud_rate: usize,
                response_timeout: Option<Duration>) -> Result<Self>
    {
        for name in port_names {
            match open_port(name, baud_rate) {
                Ok(port) => {
                    info!("Connected to {} at {} baud", name, baud_rate);
                    let mut link = SerialTransport::new(port, response_timeout);
                    link.clear_buffers()?;
                    return Ok(link);
                },
                Err(e) => warn!("Failed to connect to {}: {}", name, e)
            }
        }
        Err(Error::NoDevice(port_names.to_vec()))
    }
}

fn open_port(name: &str, baud_rate: usize) -> Result<serial::SystemPort>
{
    let mut port = serial::open(name)?;
    let mut settings = port.read_settings()?;
    settings.set_baud_rate(serial::BaudRate::from_speed(baud_rate))?;
    port.write_settings(&settings)?;
    port.set_timeout(READ_POLL)?;
    Ok(port)
}

impl<P: Read + Write> SerialTransport<P>
{
    pub fn new(port: P, response_timeout: Option<Duration>) -> SerialTransport<P>
    {
        SerialTransport { port, response_timeout, stale: false }
    }

    /// Discard pending input and push out pending output
    pub fn clear_buffers(&mut self) -> Result<()>
    {
        self.port.flush()?;
        let mut buf = [0u8; 64];
        let mut discarded = 0;
        for _ in 0..MAX_DRAIN_READS {
            match self.port.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => discarded += n,
                Err(ref e) if e.kind() == ErrorKind::TimedOut
                    || e.kind() == ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) => return Err(Error::Io(e))
            }
        }
        if discarded > 0 {
            debug!("Discarded {} bytes of stale input", discarded);
        }
        self.stale = false;
        Ok(())
    }

    pub fn into_inner(self) -> P
    {
        self.port
    }
}

impl<P: Read + Write + Send> Transport for SerialTransport<P>
{
    fn send_and_await(&mut self, line: &str) -> Result<Response>
    {
        if self.stale {
            self.clear_buffers()?;
        }
        let command = line.trim_end();
        info!("Sending command: {}", command);
        self.port.write_all(command.as_bytes())?;
        self.port.write_all(b"\n")?;
        self.port.flush()?;

        let deadline = self.response_timeout.map(|t| Instant::now() + t);
        let mut diagnostics = Vec::new();
        loop {
            match read_reply(&mut self.port, deadline)? {
                Some(reply) => {
                    if gcode::is_ack(&reply) {
                        debug!("Printer response: {}", reply);
                        return Ok(Response { ack: reply, diagnostics });
                    }
                    if !reply.is_empty() {
                        info!("Printer response: {}", reply);
                        diagnostics.push(reply);
                    }
                },
                None => {
                    self.stale = true;
                    let waited = self.response_timeout.unwrap_or_default();
                    return Err(Error::Timeout { command: command.to_string(), waited });
                }
            }
        }
    }
}

