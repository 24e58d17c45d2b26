//! Geographic shapes used to confine results.

use serde_json::{json, Value};

/// A geographic sub-query that renders itself as a JSON object.
pub trait Shape {
    /// JSON representation of this shape.
    fn to_json(&self) -> Value;
}

/// A circle around a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    center_lat: f64,
    center_long: f64,
    meters: u32,
}

impl Circle {
    /// Create a circle of radius `meters` centered on (`center_lat`, `center_long`).
    #[must_use]
    pub const fn new(center_lat: f64, center_long: f64, meters: u32) -> Self {
        Self {
            center_lat,
            center_long,
            meters,
        }
    }

    /// Latitude of the center.
    #[must_use]
    pub const fn center_lat(&self) -> f64 {
        self.center_lat
    }

    /// Longitude of the center.
    #[must_use]
    pub const fn center_long(&self) -> f64 {
        self.center_long
    }

    /// Radius in meters.
    #[must_use]
    pub const fn meters(&self) -> u32 {
        self.meters
    }
}

impl Shape for Circle {
    fn to_json(&self) -> Value {
        json!({
            "$circle": {
                "$center": [self.center_lat, self.center_long],
                "$meters": self.meters,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_json() {
        let circle = Circle::new(34.06018, -118.41835, 5000);
        assert_eq!(
            circle.to_json(),
            json!({"$circle": {"$center": [34.06018, -118.41835], "$meters": 5000}})
        );
    }

    #[test]
    fn circle_accessors() {
        let circle = Circle::new(1.5, -2.5, 10);
        assert!((circle.center_lat() - 1.5).abs() < f64::EPSILON);
        assert!((circle.center_long() + 2.5).abs() < f64::EPSILON);
        assert_eq!(circle.meters(), 10);
    }
}
