//! Mapping scalar values onto colors for heatmaps and other pseudo-color views.
//!
//! A [`ColorMap`] holds color stops over the normalized interval `[0, 1]` and
//! maps a value of any `[min, max]` interval onto a color, either as a step
//! function ([`Mode::Fixed`]) or by interpolating the adjacent stops
//! ([`Mode::Scaled`]). [`HeatmapRenderer`] turns whole scalar grids into images
//! through a precomputed lookup table.

mod palette;
mod render;

use std::path::Path;

use image::RgbaImage;

pub use palette::{
    color::Rgba,
    map::{ColorMap, Mode, DEFAULT_TABLE_SIZE},
    preset::{from_control_points, ControlPoint, Preset},
    stops::{parse_stop, ColorStopTable, MERGE_EPSILON},
};
pub use render::{
    field::ScalarField,
    heatmap::{palette_index, resolve_range},
    legend::{legend, Orientation},
};

#[derive(Debug, thiserror::Error)]
pub enum ColorMapError {
    #[error("at least two control points are required, got {0}")]
    TooFewControlPoints(usize),
    #[error("first control point must sit at 0.0, found {0}")]
    FirstPositionNotZero(f64),
    #[error("last control point must sit at 1.0, found {0}")]
    LastPositionNotOne(f64),
    #[error("control point {index} is not after its predecessor")]
    PositionsNotIncreasing { index: usize },
    #[error("control point {index} is within {} of its predecessor", MERGE_EPSILON)]
    PositionsTooClose { index: usize },
    #[error("control point {index} has a channel outside [0, 1]")]
    ChannelOutOfRange { index: usize },
    #[error("invalid color {0:?}, expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),
    #[error("invalid color stop {0:?}, expected POSITION:COLOR with POSITION in [0, 1]")]
    InvalidStop(String),
    #[error("unknown preset {0:?}")]
    UnknownPreset(String),
    #[error("invalid grid at line {line}: {reason}")]
    InvalidGrid { line: usize, reason: String },
    #[error("scalar field has no values")]
    EmptyField,
    #[error("{width}x{height} cells at scale {scale} exceed the maximum image size")]
    ImageTooLarge { width: usize, height: usize, scale: u32 },
    #[error("failed to read scalar field: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub preset: Preset,
    pub mode: Mode,
    /// Extra stops layered on top of the preset, as normalized positions.
    pub stops: Vec<(f64, Rgba)>,
    /// Value interval mapped onto the color map. Derived from the data when unset.
    pub range: Option<(f64, f64)>,
    /// Number of lookup table entries.
    pub palette_size: usize,
    /// Color for NaN and infinite samples.
    pub nodata: Rgba,
    /// Side length in pixels of a single cell.
    pub scale: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            preset: Preset::Jet,
            mode: Mode::Scaled,
            stops: Vec::new(),
            range: None,
            palette_size: DEFAULT_TABLE_SIZE,
            nodata: Rgba::TRANSPARENT,
            scale: 1,
        }
    }
}

impl RenderOptions {
    pub fn color_map(&self) -> ColorMap {
        let mut map = self.preset.color_map();
        map.set_mode(self.mode);
        for &(position, color) in &self.stops {
            map.add_color_stop(position, color);
        }
        map
    }
}

#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub image: RgbaImage,
    /// Value interval the palette was built for.
    pub range: (f64, f64),
    pub palette: Vec<Rgba>,
}

impl RenderOutput {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ColorMapError> {
        self.image.save(path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct HeatmapRenderer;

impl HeatmapRenderer {
    pub fn render_path<P: AsRef<Path>>(
        &self,
        path: P,
        options: &RenderOptions,
    ) -> Result<RenderOutput, ColorMapError> {
        let field = ScalarField::from_path(path)?;
        self.render_field(&field, options)
    }

    pub fn render_field(
        &self,
        field: &ScalarField,
        options: &RenderOptions,
    ) -> Result<RenderOutput, ColorMapError> {
        let range = resolve_range(field, options.range);
        let (min, max) = range;
        if min.is_nan() || max.is_nan() || min >= max {
            log::warn!("value range [{min}, {max}] is empty, every cell maps to no color");
        }

        let map = options.color_map();
        let palette = map.lookup_table(min, max, options.palette_size.max(2));
        let image =
            render::heatmap::paint_field(field, range, &palette, options.nodata, options.scale)?;
        log::debug!(
            "rendered {}x{} field over [{min}, {max}] into {}x{} image",
            field.width(),
            field.height(),
            image.width(),
            image.height()
        );

        Ok(RenderOutput { image, range, palette })
    }
}
