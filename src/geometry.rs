use serde::{Deserialize, Serialize};

/// 2-D point in normalized image space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `other`
    pub fn to(&self, other: Point) -> Point {
        Point {
            x: other.x - self.x,
            y: other.y - self.y,
        }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Interior angle in degrees at vertex `b`, formed by rays `b->a` and `b->c`.
///
/// Always lands in `[0, 180]`. Coincident points give a finite but meaningless
/// value, which the thresholds downstream tolerate.
pub fn angle_at(a: Point, b: Point, c: Point) -> f64 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();

    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// |cos| of the angle between two vectors, clamped to `[0, 1]`.
///
/// Zero-length vectors are treated as unit length so the result stays finite.
pub fn abs_cos_between(v1: Point, v2: Point) -> f64 {
    let mag1 = non_zero(v1.length());
    let mag2 = non_zero(v2.length());
    let cos = (v1.x * v2.x + v1.y * v2.y) / (mag1 * mag2);

    cos.clamp(-1.0, 1.0).abs()
}

/// Absolute orientation of a vector against the +x axis, in `[0, 180]` degrees
pub fn orientation_deg(v: Point) -> f64 {
    v.y.atan2(v.x).to_degrees().abs()
}

/// True when the orientation is within `max_deg` of horizontal in either direction
pub fn is_near_horizontal(v: Point, max_deg: f64) -> bool {
    let orient = orientation_deg(v);
    orient <= max_deg || orient >= 180.0 - max_deg
}

fn non_zero(mag: f64) -> f64 {
    if mag == 0.0 {
        1.0
    } else {
        mag
    }
}
