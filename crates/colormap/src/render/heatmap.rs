use image::RgbaImage;

use super::field::ScalarField;
use crate::palette::color::Rgba;
use crate::ColorMapError;

/// Resolves the value interval used for normalization.
///
/// An explicit range wins. Otherwise the finite data range is used, widened to
/// `[v, v + 1]` for constant data and `[0, 1]` when nothing is finite.
pub fn resolve_range(field: &ScalarField, explicit: Option<(f64, f64)>) -> (f64, f64) {
    if let Some(range) = explicit {
        return range;
    }

    match field.value_range() {
        Some((min, max)) if max - min > f64::EPSILON => (min, max),
        Some((min, _)) => (min, min + 1.0),
        None => (0.0, 1.0),
    }
}

/// Palette slot for `value`, or `None` for non-finite samples.
pub fn palette_index(value: f64, min: f64, max: f64, palette_len: usize) -> Option<usize> {
    if !value.is_finite() || palette_len == 0 {
        return None;
    }

    let width = max - min;
    if width.is_nan() || width <= 0.0 {
        return Some(0);
    }

    let last = (palette_len - 1) as f64;
    let slot = ((value - min) / width * last).round().clamp(0.0, last);
    Some(slot as usize)
}

/// Paints every cell of `field` as a `scale x scale` block of palette colors.
pub fn paint_field(
    field: &ScalarField,
    range: (f64, f64),
    palette: &[Rgba],
    nodata: Rgba,
    scale: u32,
) -> Result<RgbaImage, ColorMapError> {
    let scale = scale.max(1);
    let too_large = || ColorMapError::ImageTooLarge {
        width: field.width(),
        height: field.height(),
        scale,
    };
    let width = u32::try_from(field.width())
        .ok()
        .and_then(|width| width.checked_mul(scale))
        .ok_or_else(too_large)?;
    let height = u32::try_from(field.height())
        .ok()
        .and_then(|height| height.checked_mul(scale))
        .ok_or_else(too_large)?;

    let (min, max) = range;
    let mut image = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let cell_x = (x / scale) as usize;
        let cell_y = (y / scale) as usize;
        let color = field
            .get(cell_x, cell_y)
            .and_then(|value| palette_index(value, min, max, palette.len()))
            .map_or(nodata, |index| palette[index]);
        *pixel = color.into();
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::map::ColorMap;

    #[test]
    fn explicit_range_wins() {
        let field = ScalarField::ramp(4).unwrap();
        assert_eq!(resolve_range(&field, Some((-1.0, 9.0))), (-1.0, 9.0));
        assert_eq!(resolve_range(&field, None), (1.0, 4.0));
    }

    #[test]
    fn constant_field_widens_range() {
        let field = ScalarField::new(2, 1, vec![42.0, 42.0]).unwrap();
        assert_eq!(resolve_range(&field, None), (42.0, 43.0));
    }

    #[test]
    fn all_nan_field_uses_unit_range() {
        let field = ScalarField::new(2, 1, vec![f64::NAN, f64::NAN]).unwrap();
        assert_eq!(resolve_range(&field, None), (0.0, 1.0));
    }

    #[test]
    fn palette_index_clamps_and_rounds() {
        assert_eq!(palette_index(0.0, 0.0, 1.0, 256), Some(0));
        assert_eq!(palette_index(1.0, 0.0, 1.0, 256), Some(255));
        assert_eq!(palette_index(0.5, 0.0, 1.0, 256), Some(128));
        assert_eq!(palette_index(-3.0, 0.0, 1.0, 256), Some(0));
        assert_eq!(palette_index(3.0, 0.0, 1.0, 256), Some(255));
        assert_eq!(palette_index(f64::NAN, 0.0, 1.0, 256), None);
        assert_eq!(palette_index(f64::INFINITY, 0.0, 1.0, 256), None);
    }

    #[test]
    fn paints_grayscale_cells() {
        let field = ScalarField::new(3, 1, vec![0.0, f64::NAN, 1.0]).unwrap();
        let palette = ColorMap::default().lookup_table(0.0, 1.0, 256);
        let image = paint_field(&field, (0.0, 1.0), &palette, Rgba::TRANSPARENT, 2).unwrap();

        assert_eq!(image.dimensions(), (6, 2));
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(2, 0).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(5, 1).0, [255, 255, 255, 255]);
    }
}
