//! Rectangles used while locating hands.

use num_traits::Float;

/// An axis-aligned rectangle with floating-point coordinates.
///
/// The coordinate system is up to the user; palm detections use normalized network-input
/// coordinates, regions of interest use image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    x_center: f32,
    y_center: f32,
    width: f32,
    height: f32,
}

impl Rect {
    pub fn from_center(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self {
            x_center,
            y_center,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn x_center(&self) -> f32 {
        self.x_center
    }

    pub fn y_center(&self) -> f32 {
        self.y_center
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn x_min(&self) -> f32 {
        self.x_center - self.width / 2.0
    }

    pub fn y_min(&self) -> f32 {
        self.y_center - self.height / 2.0
    }

    pub fn x_max(&self) -> f32 {
        self.x_center + self.width / 2.0
    }

    pub fn y_max(&self) -> f32 {
        self.y_center + self.height / 2.0
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let w = self.x_max().min(other.x_max()) - self.x_min().max(other.x_min());
        let h = self.y_max().min(other.y_max()) - self.y_min().max(other.y_min());
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// Computes the intersection-over-union of two rectangles.
    ///
    /// Returns 0.0 when both rectangles are empty.
    pub fn iou(&self, other: &Rect) -> f32 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// A square region of interest in image pixels, rotated clockwise around its center.
///
/// This is the area cropped out of the input image and fed to the landmark network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    x_center: f32,
    y_center: f32,
    size: f32,
    rotation: f32,
}

impl RotatedRect {
    pub fn new(x_center: f32, y_center: f32, size: f32, rotation: f32) -> Self {
        Self {
            x_center,
            y_center,
            size,
            rotation,
        }
    }

    pub fn x_center(&self) -> f32 {
        self.x_center
    }

    pub fn y_center(&self) -> f32 {
        self.y_center
    }

    /// Side length in pixels.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Rotation in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Maps a point in rect-local coordinates to image pixels.
    ///
    /// `(u, v)` ranges over `[0, 1]`; `(0.5, 0.5)` is the center of the rect.
    pub fn to_image(&self, u: f32, v: f32) -> (f32, f32) {
        let (sin, cos) = self.rotation.sin_cos();
        let a = (u - 0.5) * self.size;
        let b = (v - 0.5) * self.size;
        (
            self.x_center + a * cos - b * sin,
            self.y_center + a * sin + b * cos,
        )
    }
}

/// Wraps an angle in radians into `[-pi, pi)`.
pub fn normalize_radians<T: Float>(angle: T) -> T {
    let two_pi = T::from(std::f64::consts::TAU).unwrap_or_else(T::zero);
    let pi = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    angle - two_pi * ((angle + pi) / two_pi).floor()
}
