//! Mathematical structs and functions.

use cgmath::Point2;
pub use bezier::CubicBezier1d;

mod bezier;

/// A 2D point
pub type Point2d = Point2<f64>;
