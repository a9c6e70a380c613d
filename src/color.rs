use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Channel spread under which a fill counts as achromatic line art.
pub const OUTLINE_TOLERANCE: f32 = 0.01;

/// Linear RGB colour with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// `0xRRGGBB`.
    pub fn from_hex(hex: u32) -> Self {
        Self::from_rgb8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_hex(self) -> u32 {
        let [r, g, b] = self.to_rgb8();
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Largest difference between any two channels.
    pub fn channel_spread(self) -> f32 {
        let rg = (self.r - self.g).abs();
        let rb = (self.r - self.b).abs();
        let gb = (self.g - self.b).abs();
        rg.max(rb).max(gb)
    }

    /// Bit pattern usable as a hash key; `-0.0` and `0.0` collapse.
    pub(crate) fn key(self) -> [u32; 3] {
        let bits = |c: f32| (c + 0.0).to_bits();
        [bits(self.r), bits(self.g), bits(self.b)]
    }
}

impl From<Vec3> for Color {
    fn from(value: Vec3) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<svgtypes::Color> for Color {
    fn from(value: svgtypes::Color) -> Self {
        Self::from_rgb8(value.red, value.green, value.blue)
    }
}

/// Whether `color` is grey enough to be treated as line art rather than a
/// coloured fill region.
pub fn is_outline_color(color: Color) -> bool {
    color.channel_spread() < OUTLINE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_threshold_is_exclusive() {
        assert!(!is_outline_color(Color::new(0.01, 0.0, 0.0)));
        assert!(is_outline_color(Color::new(0.0099, 0.0, 0.0)));
        assert!(!is_outline_color(Color::new(0.5, 0.5, 0.52)));
        assert!(is_outline_color(Color::BLACK));
        assert!(is_outline_color(Color::from_hex(0x7f7f7f)));
    }

    #[test]
    fn hex_round_trips_through_channels() {
        let red = Color::from_hex(0xD51B30);
        assert_eq!(red.to_rgb8(), [0xD5, 0x1B, 0x30]);
        assert_eq!(red.to_hex(), 0xD51B30);
        assert!(!is_outline_color(red));
    }
}
