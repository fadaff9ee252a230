use std::fmt;

/// One of the three machine axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis
{
    X,
    Y,
    Z
}

impl Axis
{
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize
    {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2
        }
    }

    /// G-code word letter for this axis
    pub fn letter(self) -> char
    {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z'
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position
{
    pub x: f64,
    pub y: f64,
    pub z: f64
}

impl fmt::Display for Position
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Position
{
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Position
    {
        Position { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f64
    {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z
        }
    }

    pub fn set(&mut self, axis: Axis, v: f64)
    {
        match axis {
            Axis::X => self.x = v,
            Axis::Y => self.y = v,
            Axis::Z => self.z = v
        }
    }

    /// Copy of this position with one axis replaced
    pub fn with(mut self, axis: Axis, v: f64) -> Position
    {
        self.set(axis, v);
        self
    }

    /// Per axis change from this position to `target`, None where the
    /// axis does not move
    pub fn changes(&self, target: &Position) -> [Option<f64>; 3]
    {
        let mut res = [None; 3];
        for axis in Axis::ALL {
            let (changed, value) = delta(self.get(axis), target.get(axis));
            if changed {
                res[axis.index()] = Some(value);
            }
        }
        res
    }
}

/// Returns (changed, value) for moving a single axis from `current` to
/// `target`.
pub fn delta(current: f64, target: f64) -> (bool, f64)
{
    (current != target, target)
}

/// Workspace limits. The lower limit of every axis is 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds
{
    pub max: [f64; 3]
}

impl Default for Bounds
{
    fn default() -> Bounds
    {
        Bounds { max: [200.0; 3] }
    }
}

impl Bounds
{
    pub fn new(x_max: f64, y_max: f64, z_max: f64) -> Bounds
    {
        Bounds { max: [x_max, y_max, z_max] }
    }

    pub fn axis_max(&self, axis: Axis) -> f64
    {
        self.max[axis.index()]
    }

    pub fn clamp(&self, axis: Axis, requested: f64) -> f64
    {
        f64::max(0.0, f64::min(self.axis_max(axis), requested))
    }

    pub fn clamp_position(&self, p: &Position) -> Position
    {
        Position { x: self.clamp(Axis::X, p.x),
                   y: self.clamp(Axis::Y, p.y),
                   z: self.clamp(Axis::Z, p.z) }
    }

    pub fn contains(&self, p: &Position) -> bool
    {
        Axis::ALL.iter().all(|&a| {
            let v = p.get(a);
            v >= 0.0 && v <= self.axis_max(a)
        })
    }
}
