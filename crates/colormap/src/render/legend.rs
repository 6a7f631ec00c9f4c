use image::RgbaImage;

use crate::palette::map::ColorMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Minimum on the left.
    #[default]
    Horizontal,
    /// Minimum at the bottom.
    Vertical,
}

/// Gradient strip sweeping the whole `[0, 1]` range of `map`.
pub fn legend(map: &ColorMap, width: u32, height: u32, orientation: Orientation) -> RgbaImage {
    let position = |offset: u32, extent: u32| {
        if extent <= 1 { 0.0 } else { f64::from(offset) / f64::from(extent - 1) }
    };

    RgbaImage::from_fn(width, height, |x, y| {
        let t = match orientation {
            Orientation::Horizontal => position(x, width),
            Orientation::Vertical => 1.0 - position(y, height),
        };
        map.at(t).into()
    })
}
