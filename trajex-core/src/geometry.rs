//! Non-visual shapes used for touch areas, target areas and region checks.
//!
//! Screen coordinates have their origin at the screen centre with `y`
//! growing upwards. Angles are in degrees, counter-clockwise from the
//! positive x axis, unless a type says otherwise. Points lying exactly on a
//! shape's boundary are inside it.

use serde::{Deserialize, Serialize};

/// 2D position in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Direction of the vector `self -> other`, counter-clockwise from +x, in (-180, 180].
    pub fn angle_to(&self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x).to_degrees()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Rotates `self` around `pivot` by `degrees` counter-clockwise.
    pub fn rotated_around(&self, pivot: Point, degrees: f64) -> Point {
        if degrees == 0.0 {
            return *self;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Point::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// Wraps an angle in degrees into (-180, 180].
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a > 180.0 { a - 360.0 } else { a }
}

/// Membership predicate over screen positions.
pub trait Region: std::fmt::Debug {
    fn contains(&self, p: Point) -> bool;
    fn center(&self) -> Point;
}

/// The four sides of an axis-aligned (in its own frame) rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// Counter-clockwise rotation around the centre, in degrees.
    #[serde(default)]
    pub rotation: f64,
}

impl Rectangle {
    pub fn new(center: Point, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Position relative to the centre, in the rectangle's unrotated frame.
    fn local(&self, p: Point) -> Point {
        let p = p.rotated_around(self.center, -self.rotation);
        Point::new(p.x - self.center.x, p.y - self.center.y)
    }

    /// The edge whose outward strip contains `p`.
    ///
    /// Returns `None` for points inside the rectangle and for points in the
    /// diagonal corner zones, which lie beyond two edges at once.
    pub fn edge_beyond(&self, p: Point) -> Option<Edge> {
        let l = self.local(p);
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let within_x = l.x.abs() <= hw;
        let within_y = l.y.abs() <= hh;
        match (within_x, within_y) {
            (true, false) if l.y > hh => Some(Edge::Up),
            (true, false) => Some(Edge::Down),
            (false, true) if l.x > hw => Some(Edge::Right),
            (false, true) => Some(Edge::Left),
            _ => None,
        }
    }

    pub fn left(&self) -> f64 {
        self.center.x - self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.center.x + self.width / 2.0
    }

    pub fn top(&self) -> f64 {
        self.center.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.center.y - self.height / 2.0
    }
}

impl Region for Rectangle {
    fn contains(&self, p: Point) -> bool {
        let l = self.local(p);
        l.x.abs() <= self.width / 2.0 && l.y.abs() <= self.height / 2.0
    }

    fn center(&self) -> Point {
        self.center
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Region for Circle {
    fn contains(&self, p: Point) -> bool {
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    fn center(&self) -> Point {
        self.center
    }
}

/// A ring slice: points within `[inner_radius, radius]` of the centre whose
/// direction lies on the counter-clockwise arc from `from_angle` to `to_angle`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub center: Point,
    pub radius: f64,
    pub from_angle: f64,
    pub to_angle: f64,
    #[serde(default)]
    pub inner_radius: f64,
}

impl Sector {
    pub fn new(center: Point, radius: f64, from_angle: f64, to_angle: f64) -> Self {
        Self {
            center,
            radius,
            from_angle,
            to_angle,
            inner_radius: 0.0,
        }
    }

    fn span(&self) -> f64 {
        let raw = self.to_angle - self.from_angle;
        if raw.abs() >= 360.0 {
            360.0
        } else {
            raw.rem_euclid(360.0)
        }
    }
}

impl Region for Sector {
    fn contains(&self, p: Point) -> bool {
        let d = self.center.distance_to(p);
        if d > self.radius || d < self.inner_radius {
            return false;
        }
        if d == 0.0 {
            return true;
        }
        let span = self.span();
        if span >= 360.0 {
            return true;
        }
        let rel = (self.center.angle_to(p) - self.from_angle).rem_euclid(360.0);
        rel <= span
    }

    fn center(&self) -> Point {
        self.center
    }
}

/// Config-friendly closed set of the shapes above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Shape {
    Rectangle(Rectangle),
    Circle(Circle),
    Sector(Sector),
}

impl Shape {
    pub fn center_mut(&mut self) -> &mut Point {
        match self {
            Shape::Rectangle(r) => &mut r.center,
            Shape::Circle(c) => &mut c.center,
            Shape::Sector(s) => &mut s.center,
        }
    }
}

impl Region for Shape {
    fn contains(&self, p: Point) -> bool {
        match self {
            Shape::Rectangle(r) => r.contains(p),
            Shape::Circle(c) => c.contains(p),
            Shape::Sector(s) => s.contains(p),
        }
    }

    fn center(&self) -> Point {
        match self {
            Shape::Rectangle(r) => r.center,
            Shape::Circle(c) => c.center,
            Shape::Sector(s) => s.center,
        }
    }
}
