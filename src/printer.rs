//! The printer controller.
//!
//! A `Printer` owns the transport, the head position and the read end of
//! the command queue; it is meant to be moved onto a worker thread that
//! calls [`Printer::run`]. Producers talk to it only through a
//! [`PrinterHandle`], which can enqueue commands, credit the extrusion
//! budget and request a stop from any thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::budget::Budget;
use crate::command::{self, Direction};
use crate::coords::{Axis, Bounds, Position};
use crate::error::{Error, Result};
use crate::gcode::{Gcode, MoveWords};
use crate::printer_config::PrinterSettings;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState
{
    Uninitialized,
    Homing,
    Heating,
    Idle,
    Executing,
    Stopping,
    Stopped
}

#[derive(Debug)]
struct Shared
{
    state: Mutex<ControllerState>,
    stop: AtomicBool
}

impl Shared
{
    // Returns the state before the call. Once stopping, only Stopped may
    // follow.
    fn enter(&self, next: ControllerState) -> ControllerState
    {
        let mut state = self.state.lock();
        let prev = *state;
        match prev {
            ControllerState::Stopped => {},
            ControllerState::Stopping if next != ControllerState::Stopped => {},
            _ => *state = next
        }
        prev
    }

    fn state(&self) -> ControllerState
    {
        *self.state.lock()
    }

    fn stop_requested(&self) -> bool
    {
        self.stop.load(Ordering::SeqCst)
    }

    fn request_stop(&self)
    {
        self.stop.store(true, Ordering::SeqCst);
        let mut state = self.state.lock();
        if *state != ControllerState::Stopped {
            *state = ControllerState::Stopping;
        }
    }
}

/// Producer side of a printer. Cheap to clone and safe to use from any
/// thread.
#[derive(Debug, Clone)]
pub struct PrinterHandle
{
    queue: Sender<String>,
    budget: Budget,
    shared: Arc<Shared>,
    enqueue_timeout: Duration
}

impl PrinterHandle
{
    /// Queue a command token. Blocks at most the enqueue timeout while the
    /// queue is full, then rejects the token. Tokens outside the command
    /// vocabulary and tokens arriving after a stop are rejected as well.
    pub fn enqueue(&self, token: &str) -> bool
    {
        if self.shared.stop_requested() {
            debug!("Printer stopping, ignored '{}'", token);
            return false;
        }
        if !command::is_command(token) {
            warn!("Rejected unknown command '{}'", token);
            return false;
        }
        match self.queue.send_timeout(token.to_string(), self.enqueue_timeout) {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(token)) => {
                warn!("Command queue full, dropped '{}'", token);
                false
            },
            Err(SendTimeoutError::Disconnected(_)) => false
        }
    }

    /// Returns the new budget
    pub fn credit_budget(&self, amount: f64) -> f64
    {
        self.budget.credit(amount)
    }

    pub fn budget(&self) -> f64
    {
        self.budget.get()
    }

    pub fn state(&self) -> ControllerState
    {
        self.shared.state()
    }

    /// Commands waiting in the queue
    pub fn pending(&self) -> usize
    {
        self.queue.len()
    }

    /// Ask the command loop to finish. Takes effect at its next polling
    /// point.
    pub fn stop(&self)
    {
        info!("Stop requested");
        self.shared.request_stop();
    }
}

pub struct Printer
{
    settings: PrinterSettings,
    bounds: Bounds,
    transport: Box<dyn Transport>,
    position: Position,
    budget: Budget,
    queue: Receiver<String>,
    handle: PrinterHandle
}

impl Printer
{
    pub fn new(settings: PrinterSettings, transport: Box<dyn Transport>) -> Printer
    {
        let (tx, rx) = crossbeam_channel::bounded(settings.queue_capacity);
        let budget = Budget::new(settings.initial_budget);
        let shared = Arc::new(Shared { state: Mutex::new(ControllerState::Uninitialized),
                                       stop: AtomicBool::new(false) });
        let handle = PrinterHandle { queue: tx,
                                     budget: budget.clone(),
                                     shared,
                                     enqueue_timeout: settings.enqueue_timeout() };
        Printer { bounds: settings.bounds(),
                  settings,
                  transport,
                  position: Position::ORIGIN,
                  budget,
                  queue: rx,
                  handle }
    }

    pub fn handle(&self) -> PrinterHandle
    {
        self.handle.clone()
    }

    pub fn position(&self) -> Position
    {
        self.position
    }

    pub fn budget(&self) -> f64
    {
        self.budget.get()
    }

    pub fn state(&self) -> ControllerState
    {
        self.handle.shared.state()
    }

    /// Home, heat to the extrusion temperature and park at the start
    /// position. Blocks until the hotend is hot.
    pub fn setup(&mut self) -> Result<()>
    {
        let state = self.state();
        if state != ControllerState::Uninitialized {
            return Err(Error::InvalidState { operation: "set up", state });
        }
        let res = self.prepare();
        match res {
            Ok(()) => {
                self.handle.shared.enter(ControllerState::Idle);
                info!("Printer ready at {}", self.position);
            },
            // Stopping and Stopped are kept by enter()
            Err(ref e) => {
                warn!("Setup failed: {}", e);
                self.handle.shared.enter(ControllerState::Uninitialized);
            }
        }
        res
    }

    fn prepare(&mut self) -> Result<()>
    {
        self.handle.shared.enter(ControllerState::Homing);
        self.home_axes()?;
        self.handle.shared.enter(ControllerState::Heating);
        self.wait_for_temperature(self.settings.extrude_temp)?;
        if let Some(p) = self.settings.start_position() {
            info!("Moving to start position {}", p);
            self.move_to(Some(p.x), Some(p.y), Some(p.z), false)?;
        }
        Ok(())
    }

    pub fn home(&mut self) -> Result<()>
    {
        let prev = self.handle.shared.enter(ControllerState::Homing);
        let res = self.home_axes();
        self.handle.shared.enter(prev);
        res
    }

    fn home_axes(&mut self) -> Result<()>
    {
        info!("Homing printer...");
        self.transport.send_and_await(&Gcode::Home.to_line())?;
        // Extruder relative, all other movements absolute
        self.transport.send_and_await(&Gcode::RelativeExtrusion.to_line())?;
        self.position = Position::ORIGIN;
        Ok(())
    }

    /// Set the hotend target and block until a reading reaches it.
    /// Returns the number of temperature polls.
    pub fn heat_hotend(&mut self, target: f64) -> Result<u32>
    {
        let prev = self.handle.shared.enter(ControllerState::Heating);
        let res = self.wait_for_temperature(target);
        self.handle.shared.enter(prev);
        res
    }

    fn wait_for_temperature(&mut self, target: f64) -> Result<u32>
    {
        info!("Heating hotend to {}C...", target);
        self.transport.send_and_await(&Gcode::SetHotendTemp(target).to_line())?;
        let mut polls = 0u32;
        loop {
            polls += 1;
            match self.transport.query_temperature()? {
                Some(temp) => {
                    info!("Current hotend temperature: {:.1}C", temp);
                    if temp >= target {
                        info!("Hotend reached target temperature.");
                        return Ok(polls);
                    }
                },
                None => debug!("No temperature in report, polling again")
            }
            thread::sleep(self.settings.heat_poll_interval());
        }
    }

    /// Move to the given coordinates, clamped to the workspace. Axes given
    /// as None stay put. Returns false when nothing had to move, in which
    /// case nothing is sent.
    pub fn move_to(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>,
                   extrude: bool) -> Result<bool>
    {
        let current = self.position;
        let requested = Position::new(x.unwrap_or(current.x),
                                      y.unwrap_or(current.y),
                                      z.unwrap_or(current.z));
        let target = self.bounds.clamp_position(&requested);

        let changes = self.position.changes(&target);
        let axes: Vec<(Axis, f64)> = Axis::ALL.iter()
            .filter_map(|&a| changes[a.index()].map(|v| (a, v)))
            .collect();
        if axes.is_empty() {
            debug!("Already at {}, nothing to send", self.position);
            return Ok(false);
        }

        let extrude_len = if extrude {
            Some(self.settings.extrude_amount * self.settings.extrude_multiplier)
        } else {
            None
        };
        let cmd = Gcode::movement(MoveWords { axes,
                                              extrude: extrude_len,
                                              feed_rate: self.settings.feed_rate });
        if extrude {
            let left = self.budget.debit(self.settings.extrude_amount);
            debug!("Budget after extrusion: {}", left);
        }
        self.transport.send_and_await(&cmd.to_line())?;
        self.position = target;
        Ok(true)
    }

    /// Step one increment in the direction named by `token`. Unknown
    /// tokens are ignored.
    pub fn process_command(&mut self, token: &str, extrude: bool) -> Result<bool>
    {
        let dir: Direction = match token.parse() {
            Ok(d) => d,
            Err(e) => {
                debug!("Ignored {}", e);
                return Ok(false);
            }
        };
        let (axis, offset) = dir.offset(self.settings.move_increment);
        let target = Some(self.position.get(axis) + offset);
        match axis {
            Axis::X => self.move_to(target, None, None, extrude),
            Axis::Y => self.move_to(None, target, None, extrude),
            Axis::Z => self.move_to(None, None, target, extrude)
        }
    }

    fn execute(&mut self, token: &str)
    {
        let extrude = self.budget.covers(self.settings.extrude_amount);
        if extrude {
            info!("Budget {} covers extrusion, extruding on '{}'", self.budget.get(), token);
        } else {
            debug!("Moving '{}' without extrusion", token);
        }
        self.handle.shared.enter(ControllerState::Executing);
        if let Err(e) = self.process_command(token, extrude) {
            error!("Command '{}' failed at {} with budget {}: {}",
                   token, self.position, self.budget.get(), e);
        }
        self.handle.shared.enter(ControllerState::Idle);
    }

    /// Consume the command queue until a stop is requested. Intended as
    /// the body of the worker thread.
    pub fn run(&mut self)
    {
        if self.state() == ControllerState::Uninitialized {
            warn!("Command loop started before setup, position may be wrong");
            self.handle.shared.enter(ControllerState::Idle);
        }
        info!("Command loop started");
        let poll = self.settings.poll_interval();
        while !self.handle.shared.stop_requested() {
            match self.queue.recv_timeout(poll) {
                Ok(token) => self.execute(&token),
                Err(RecvTimeoutError::Timeout) => {},
                Err(RecvTimeoutError::Disconnected) => break
            }
        }
        self.handle.shared.enter(ControllerState::Stopped);
        info!("Command loop stopped with {} commands left in queue", self.queue.len());
    }

    /// Turn the hotend off once the command loop is done.
    pub fn shutdown(&mut self) -> Result<()>
    {
        info!("Cooling down hotend");
        self.heat_hotend(0.0)?;
        Ok(())
    }
}
