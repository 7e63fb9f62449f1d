use serde::{Deserialize, Serialize};

/// Region of Interest in frame pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// Create a new ROI from coordinates
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Validate ROI dimensions
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Get the end coordinates
    pub fn x2(&self) -> u32 {
        self.x + self.width
    }

    pub fn y2(&self) -> u32 {
        self.y + self.height
    }

    /// Calculate area
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Region of Interest as fractions of the frame size.
///
/// The game UI is laid out relative to a 1366x768 reference resolution, so
/// regions are stored as fractions and resolved against the live frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RoiPct {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl RoiPct {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Resolve to pixel coordinates for a frame of the given size.
    ///
    /// Rectangles that would run past the frame edge are shrunk to fit,
    /// never rejected: `x + w <= frame_w` and `y + h <= frame_h` always
    /// hold on the result.
    pub fn to_pixels(&self, frame_w: u32, frame_h: u32) -> Roi {
        let x = ((self.x * frame_w as f64).floor() as u32).min(frame_w);
        let y = ((self.y * frame_h as f64).floor() as u32).min(frame_h);
        let mut w = (self.w * frame_w as f64).floor() as u32;
        let mut h = (self.h * frame_h as f64).floor() as u32;

        if x + w > frame_w {
            w = frame_w - x;
        }
        if y + h > frame_h {
            h = frame_h - y;
        }

        Roi::new(x, y, w, h)
    }
}

/// The three capture regions the analyzer searches each pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RegionLayout {
    pub dice: RoiPct,
    pub attribute: RoiPct,
    pub site: RoiPct,
}

impl Default for RegionLayout {
    fn default() -> Self {
        // Measured against the 1366x768 reference layout
        Self {
            dice: RoiPct::new(380.0 / 1366.0, 300.0 / 768.0, 600.0 / 1366.0, 200.0 / 768.0),
            attribute: RoiPct::new(300.0 / 1366.0, 480.0 / 768.0, 730.0 / 1366.0, 180.0 / 768.0),
            site: RoiPct::new(566.0 / 1366.0, 595.0 / 768.0, 280.0 / 1366.0, 65.0 / 768.0),
        }
    }
}
