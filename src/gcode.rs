//! The subset of G-code spoken to the printer firmware.

use std::fmt;

use crate::coords::Axis;

/// Prefix of the line that terminates every response
pub const ACK: &str = "ok";

/// Marker preceding the hotend temperature in a report
pub const TEMPERATURE_MARKER: &str = "T:";

#[derive(Debug, Clone, PartialEq)]
pub struct MoveWords
{
    /// Only the axes that actually move, in X, Y, Z order
    pub axes: Vec<(Axis, f64)>,
    /// Extruder length, relative
    pub extrude: Option<f64>,
    pub feed_rate: f64
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gcode
{
    RapidMove(MoveWords),  // G0
    LinearMove(MoveWords), // G1
    Home,                  // G28
    RelativeExtrusion,     // M83
    SetHotendTemp(f64),    // M104
    ReportTemperature      // M105
}

impl Gcode
{
    /// Move without extrusion becomes G0, with extrusion G1
    pub fn movement(words: MoveWords) -> Gcode
    {
        if words.extrude.is_some() {
            Gcode::LinearMove(words)
        } else {
            Gcode::RapidMove(words)
        }
    }

    /// Wire form, including the line terminator
    pub fn to_line(&self) -> String
    {
        format!("{}\n", self)
    }
}

fn write_move(f: &mut fmt::Formatter, op: &str, words: &MoveWords) -> fmt::Result
{
    write!(f, "{}", op)?;
    for (axis, v) in &words.axes {
        write!(f, " {}{}", axis.letter(), v)?;
    }
    if let Some(e) = words.extrude {
        write!(f, " E{}", e)?;
    }
    write!(f, " F{}", words.feed_rate)
}

impl fmt::Display for Gcode
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self {
            Gcode::RapidMove(w) => write_move(f, "G0", w),
            Gcode::LinearMove(w) => write_move(f, "G1", w),
            Gcode::Home => write!(f, "G28"),
            Gcode::RelativeExtrusion => write!(f, "M83"),
            Gcode::SetHotendTemp(t) => write!(f, "M104 S{}", t),
            Gcode::ReportTemperature => write!(f, "M105")
        }
    }
}

pub fn is_ack(line: &str) -> bool
{
    line.starts_with(ACK)
}

/// Extract the hotend temperature from a report such as
/// `ok T:201.3 /210.0 B:60.0 /60.0`.
pub fn parse_temperature(text: &str) -> Option<f64>
{
    let start = text.find(TEMPERATURE_MARKER)? + TEMPERATURE_MARKER.len();
    text[start..].split_whitespace().next()?.parse::<f64>().ok()
}

/// Target of a set temperature line, `M104 S<t>`
pub fn parse_set_temperature(line: &str) -> Option<f64>
{
    let mut words = line.split_whitespace();
    if words.next()? != "M104" {
        return None;
    }
    words.find_map(|w| w.strip_prefix('S')).and_then(|s| s.parse().ok())
}

#[test]
fn move_line_format()
{
    let g = Gcode::movement(MoveWords { axes: vec![(Axis::X, 40.0), (Axis::Z, 12.5)],
                                        extrude: None, feed_rate: 1500.0 });
    assert_eq!(g.to_line(), "G0 X40 Z12.5 F1500\n");
    let g = Gcode::movement(MoveWords { axes: vec![(Axis::Y, 60.0)],
                                        extrude: Some(10.0), feed_rate: 1500.0 });
    assert_eq!(g.to_string(), "G1 Y60 E10 F1500");
}

#[test]
fn temperature_report()
{
    assert_eq!(parse_temperature("ok T:201.3 /210.0 B:60.0 /60.0"), Some(201.3));
    assert_eq!(parse_temperature("T:25"), Some(25.0));
    assert_eq!(parse_temperature("ok"), None);
    assert_eq!(parse_temperature("ok T: /210"), None);
    assert_eq!(parse_temperature("ok T:abc"), None);
    assert_eq!(parse_set_temperature("M104 S210"), Some(210.0));
    assert_eq!(parse_set_temperature("M105"), None);
}
