use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{recording_printer, settings, RecordingTransport};
use crate::coords::Position;
use crate::error::{Error, Result};
use crate::printer::{ControllerState, Printer, PrinterHandle};
use crate::transport::{Response, Transport};

fn printer_at(x: f64, y: f64, z: f64) -> (Printer, RecordingTransport)
{
    let (mut printer, transport) = recording_printer(settings());
    printer.move_to(Some(x), Some(y), Some(z), false).unwrap();
    transport.sent.lock().clear();
    (printer, transport)
}

#[test]
fn left_steps_and_clamps()
{
    let (mut printer, transport) = printer_at(50.0, 50.0, 50.0);
    assert!(printer.process_command("left", false).unwrap());
    assert_eq!(printer.position(), Position::new(40.0, 50.0, 50.0));
    assert_eq!(transport.lines(), vec!["G0 X40 F1500"]);

    let (mut printer, transport) = printer_at(5.0, 50.0, 50.0);
    printer.process_command("left", false).unwrap();
    assert_eq!(printer.position(), Position::new(0.0, 50.0, 50.0));
    assert_eq!(transport.lines(), vec!["G0 X0 F1500"]);
}

#[test]
fn directions()
{
    let (mut printer, _) = printer_at(50.0, 50.0, 50.0);
    let steps = [("back", Position::new(50.0, 60.0, 50.0)),
                 ("forward", Position::new(50.0, 50.0, 50.0)),
                 ("right", Position::new(60.0, 50.0, 50.0)),
                 ("up", Position::new(60.0, 50.0, 60.0)),
                 ("down", Position::new(60.0, 50.0, 50.0)),
                 ("left", Position::new(50.0, 50.0, 50.0))];
    for (token, expected) in steps.iter() {
        printer.process_command(token, false).unwrap();
        assert_eq!(printer.position(), *expected, "after {}", token);
    }
}

#[test]
fn unknown_token_is_ignored()
{
    let (mut printer, transport) = printer_at(50.0, 50.0, 50.0);
    assert!(!printer.process_command("sideways", true).unwrap());
    assert!(!printer.process_command("LEFT", false).unwrap());
    assert!(transport.lines().is_empty());
    assert_eq!(printer.position(), Position::new(50.0, 50.0, 50.0));
}

#[test]
fn move_at_limit_sends_nothing()
{
    let (mut printer, transport) = printer_at(0.0, 200.0, 0.0);
    printer.handle().credit_budget(10.0);
    assert!(!printer.process_command("left", true).unwrap());
    assert!(!printer.process_command("back", false).unwrap());
    assert!(!printer.move_to(Some(-20.0), Some(300.0), None, true).unwrap());
    assert!(transport.lines().is_empty());
    assert_eq!(printer.budget(), 10.0);
}

#[test]
fn only_changed_axes_are_sent()
{
    let (mut printer, transport) = printer_at(50.0, 50.0, 50.0);
    // Y already there, X still moves
    assert!(printer.move_to(Some(70.0), Some(50.0), None, false).unwrap());
    assert_eq!(transport.lines(), vec!["G0 X70 F1500"]);
    assert_eq!(printer.position(), Position::new(70.0, 50.0, 50.0));
}

#[test]
fn move_never_leaves_workspace()
{
    let (mut printer, _) = recording_printer(settings());
    let targets = [(-5.0, 10.0, 300.0), (1000.0, -1000.0, 5.0), (199.5, 200.5, -0.5)];
    for &(x, y, z) in targets.iter() {
        printer.move_to(Some(x), Some(y), Some(z), false).unwrap();
        let p = printer.position();
        assert!(p.x >= 0.0 && p.x <= 200.0);
        assert!(p.y >= 0.0 && p.y <= 200.0);
        assert!(p.z >= 0.0 && p.z <= 200.0);
    }
    assert_eq!(printer.position(), Position::new(199.5, 200.0, 0.0));
}

#[test]
fn extruding_move_debits_budget()
{
    let (mut printer, transport) = printer_at(50.0, 50.0, 50.0);
    printer.handle().credit_budget(5.0);
    printer.process_command("back", true).unwrap();
    assert_eq!(printer.budget(), 3.0);
    assert_eq!(transport.lines(), vec!["G1 Y60 E10 F1500"]);

    printer.process_command("back", false).unwrap();
    assert_eq!(printer.budget(), 3.0);

    let mut s = settings();
    s.extrude_multiplier = 2.5;
    s.extrude_amount = 1.0;
    let (mut printer, transport) = recording_printer(s);
    printer.process_command("up", true).unwrap();
    assert_relative_eq!(printer.budget(), -1.0);
    assert_eq!(transport.lines(), vec!["G1 Z10 E2.5 F1500"]);
}

#[test]
fn failed_transaction_keeps_position()
{
    let (mut printer, transport) = printer_at(50.0, 50.0, 50.0);
    transport.fail_on(Some("G0"));
    match printer.process_command("right", false) {
        Err(Error::Timeout { .. }) => {},
        r => panic!("expected timeout, got {:?}", r)
    }
    assert_eq!(printer.position(), Position::new(50.0, 50.0, 50.0));
}

#[test]
fn home_resets_position()
{
    let (mut printer, transport) = printer_at(120.0, 30.0, 80.0);
    printer.home().unwrap();
    assert_eq!(printer.position(), Position::ORIGIN);
    printer.move_to(Some(10.0), None, Some(5.0), false).unwrap();
    printer.home().unwrap();
    assert_eq!(printer.position(), Position::ORIGIN);
    assert_eq!(transport.count("G28"), 2);
    assert_eq!(transport.count("M83"), 2);
    assert_eq!(printer.state(), ControllerState::Uninitialized);
}

#[test]
fn heating_waits_for_target()
{
    let transport = RecordingTransport::with_reports(&["ok",
                                                       "ok T:25.0 /210.0",
                                                       "ok T:180.4 /210.0",
                                                       "ok T:209.9 /210.0",
                                                       "ok T:210.2 /210.0"]);
    let mut printer = Printer::new(settings(), Box::new(transport.clone()));
    assert_eq!(printer.heat_hotend(210.0).unwrap(), 5);
    assert_eq!(transport.count("M104 S210"), 1);
    assert_eq!(transport.count("M105"), 5);
    assert_eq!(transport.lines()[0], "M104 S210");
}

#[test]
fn setup_homes_heats_and_parks()
{
    let mut s = settings();
    s.start_position = Some([100.0, 100.0, 50.0]);
    let transport = RecordingTransport::with_reports(&["ok T:215.0 /210.0"]);
    let mut printer = Printer::new(s, Box::new(transport.clone()));
    printer.setup().unwrap();
    assert_eq!(printer.state(), ControllerState::Idle);
    assert_eq!(printer.position(), Position::new(100.0, 100.0, 50.0));
    assert_eq!(transport.lines(),
               vec!["G28", "M83", "M104 S210", "M105", "G0 X100 Y100 Z50 F1500"]);

    match printer.setup() {
        Err(Error::InvalidState { state: ControllerState::Idle, .. }) => {},
        r => panic!("unexpected {:?}", r)
    }
}

#[test]
fn cooling_after_stop_stays_stopped()
{
    let transport = RecordingTransport::with_reports(&["ok T:22.0 /0.0"]);
    let mut printer = Printer::new(settings(), Box::new(transport.clone()));
    printer.handle().stop();
    printer.run();
    assert_eq!(printer.state(), ControllerState::Stopped);
    printer.shutdown().unwrap();
    assert_eq!(printer.state(), ControllerState::Stopped);
    assert_eq!(transport.count("M104 S0"), 1);
}

#[test]
fn failed_setup_can_be_retried()
{
    let transport = RecordingTransport::with_reports(&["ok T:215.0 /210.0"]);
    let mut printer = Printer::new(settings(), Box::new(transport.clone()));
    transport.fail_on(Some("G28"));
    match printer.setup() {
        Err(Error::Timeout { .. }) => {},
        r => panic!("expected timeout, got {:?}", r)
    }
    assert_eq!(printer.state(), ControllerState::Uninitialized);

    transport.fail_on(None);
    printer.setup().unwrap();
    assert_eq!(printer.state(), ControllerState::Idle);
    assert_eq!(transport.count("G28"), 2);
}

#[test]
fn failed_heating_leaves_setup_pending()
{
    let transport = RecordingTransport::with_reports(&["ok T:215.0 /210.0"]);
    let mut printer = Printer::new(settings(), Box::new(transport.clone()));
    transport.fail_on(Some("M105"));
    assert!(printer.setup().is_err());
    assert_eq!(printer.state(), ControllerState::Uninitialized);
}

// Requests a stop through the handle as soon as homing is sent, then
// fails the transaction
struct StopWhileHoming
{
    handle: Arc<Mutex<Option<PrinterHandle>>>
}

impl Transport for StopWhileHoming
{
    fn send_and_await(&mut self, line: &str) -> Result<Response>
    {
        if let Some(handle) = self.handle.lock().as_ref() {
            handle.stop();
        }
        Err(Error::Timeout { command: line.trim_end().to_string(), waited: Duration::from_millis(1) })
    }
}

#[test]
fn failed_setup_after_stop_stays_stopping()
{
    let slot = Arc::new(Mutex::new(None));
    let mut printer = Printer::new(settings(), Box::new(StopWhileHoming { handle: slot.clone() }));
    *slot.lock() = Some(printer.handle());
    assert!(printer.setup().is_err());
    assert_eq!(printer.state(), ControllerState::Stopping);
}
