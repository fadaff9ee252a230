use std::fmt;
use std::str::FromStr;

use crate::coords::Axis;

/// Directional commands accepted from producers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction
{
    Back,
    Forward,
    Left,
    Right,
    Up,
    Down
}

impl Direction
{
    pub const ALL: [Direction; 6] = [Direction::Back, Direction::Forward,
                                     Direction::Left, Direction::Right,
                                     Direction::Up, Direction::Down];

    pub fn token(self) -> &'static str
    {
        match self {
            Direction::Back => "back",
            Direction::Forward => "forward",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down"
        }
    }

    /// Axis and signed offset for a step of `increment`
    pub fn offset(self, increment: f64) -> (Axis, f64)
    {
        match self {
            Direction::Back => (Axis::Y, increment),
            Direction::Forward => (Axis::Y, -increment),
            Direction::Left => (Axis::X, -increment),
            Direction::Right => (Axis::X, increment),
            Direction::Up => (Axis::Z, increment),
            Direction::Down => (Axis::Z, -increment)
        }
    }
}

impl fmt::Display for Direction
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToken(pub String);

impl fmt::Display for UnknownToken
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "unknown command '{}'", self.0)
    }
}

impl std::error::Error for UnknownToken {}

impl FromStr for Direction
{
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Direction, UnknownToken>
    {
        Direction::ALL.iter()
            .find(|d| d.token() == s)
            .copied()
            .ok_or_else(|| UnknownToken(s.to_string()))
    }
}

pub fn is_command(token: &str) -> bool
{
    token.parse::<Direction>().is_ok()
}
