use std::fmt;
use std::str::FromStr;

use crate::ColorMapError;

/// Straight-alpha RGBA color with 8-bit channels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// All channels zero. Returned for values that cannot be mapped.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Builds an opaque color from `[0, 1]` float channels.
    ///
    /// Channels are clamped and rounded to the nearest 8-bit level.
    pub fn from_rgb_f(r: f64, g: f64, b: f64) -> Self {
        Self::opaque(unit_to_u8(r), unit_to_u8(g), unit_to_u8(b))
    }

    #[inline]
    pub const fn is_opaque(self) -> bool {
        self.a == 255
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

fn unit_to_u8(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl From<Rgba> for image::Rgba<u8> {
    fn from(color: Rgba) -> Self {
        image::Rgba(color.to_array())
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Parses `#RRGGBB` or `#RRGGBBAA`; the leading `#` is optional.
impl FromStr for Rgba {
    type Err = ColorMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ColorMapError::InvalidColor(s.to_owned());
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !matches!(hex.len(), 6 | 8) || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |index: usize| {
            u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16).map_err(|_| invalid())
        };

        let alpha = if hex.len() == 8 { channel(3)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(1)?, channel(2)?, alpha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_image_pixels() {
        let pixel: image::Rgba<u8> = Rgba::new(0x12, 0x34, 0x56, 0x78).into();
        assert_eq!(pixel.0, [0x12, 0x34, 0x56, 0x78]);
        assert!(Rgba::WHITE.is_opaque());
        assert!(!Rgba::TRANSPARENT.is_opaque());
    }

    #[test]
    fn float_channels_round_to_nearest_level() {
        assert_eq!(Rgba::from_rgb_f(0.0, 0.5, 1.0), Rgba::opaque(0, 128, 255));
        assert_eq!(Rgba::from_rgb_f(0.865, 0.901960784314, -1.0), Rgba::opaque(221, 230, 0));
    }

    #[test]
    fn parse_hex() {
        assert_eq!("#ff8000".parse::<Rgba>().unwrap(), Rgba::opaque(255, 128, 0));
        assert_eq!("00000080".parse::<Rgba>().unwrap(), Rgba::new(0, 0, 0, 128));
        assert!("#fff".parse::<Rgba>().is_err());
        assert!("#gg0000".parse::<Rgba>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let color = Rgba::new(1, 2, 3, 4);
        assert_eq!(color.to_string(), "#01020304");
        assert_eq!(color.to_string().parse::<Rgba>().unwrap(), color);
    }
}
