#![forbid(unsafe_code)]

//! Neon palette for particles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a colour from channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation toward `other` (`t` clamped to `[0, 1]`).
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let v = f32::from(a) + (f32::from(b) - f32::from(a)) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Electric cyan.
pub const CYAN: Rgb = Rgb::new(0x00, 0xff, 0xff);
/// Hot magenta.
pub const MAGENTA: Rgb = Rgb::new(0xff, 0x00, 0xff);
/// Terminal green.
pub const MATRIX_GREEN: Rgb = Rgb::new(0x00, 0xff, 0x41);
/// Deep electric blue.
pub const ELECTRIC_BLUE: Rgb = Rgb::new(0x00, 0x88, 0xff);

/// Colours particles are drawn from.
pub const NEON: [Rgb; 4] = [CYAN, MAGENTA, MATRIX_GREEN, ELECTRIC_BLUE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_display() {
        assert_eq!(CYAN.to_string(), "#00ffff");
        assert_eq!(MATRIX_GREEN.to_string(), "#00ff41");
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(CYAN.lerp(MAGENTA, 0.0), CYAN);
        assert_eq!(CYAN.lerp(MAGENTA, 1.0), MAGENTA);
        assert_eq!(CYAN.lerp(MAGENTA, 7.0), MAGENTA);
        assert_eq!(Rgb::new(0, 0, 0).lerp(Rgb::new(200, 100, 50), 0.5), Rgb::new(100, 50, 25));
    }
}
