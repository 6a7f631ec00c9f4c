use super::color::Rgba;
use super::stops::ColorStopTable;

/// Palette size used by [`ColorMap::color_table`].
pub const DEFAULT_TABLE_SIZE: usize = 256;

/// How positions between two stops are colored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Color of the next lower stop.
    Fixed,
    /// Linear interpolation between the two adjacent stops.
    #[default]
    Scaled,
}

/// Maps values of a `[min, max]` interval onto colors.
///
/// The interval is normalized to `[0, 1]` and resolved against color stops.
/// The stops at `0.0` and `1.0` are always present.
#[derive(Clone, Debug)]
pub struct ColorMap {
    stops: ColorStopTable,
    mode: Mode,
}

impl ColorMap {
    pub fn new(color_at_min: Rgba, color_at_max: Rgba) -> Self {
        let mut map = Self { stops: ColorStopTable::new(), mode: Mode::Scaled };
        map.set_color_interval(color_at_min, color_at_max);
        map
    }

    /// Drops every stop and starts over from two boundary colors.
    pub fn set_color_interval(&mut self, color_at_min: Rgba, color_at_max: Rgba) {
        self.stops = ColorStopTable::new();
        self.stops.insert(0.0, color_at_min);
        self.stops.insert(1.0, color_at_max);
    }

    /// Adds a stop at a normalized position.
    ///
    /// A stop at 17.0 for the interval `[10.0, 20.0]` is passed as `0.7`.
    /// Positions outside `[0, 1]` are ignored.
    pub fn add_color_stop(&mut self, position: f64, color: Rgba) {
        if !self.stops.insert(position, color) {
            log::trace!("ignoring color stop {color} at out-of-range position {position}");
        }
    }

    pub fn with_color_stop(mut self, position: f64, color: Rgba) -> Self {
        self.add_color_stop(position, color);
        self
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Stop positions in increasing order.
    pub fn color_stops(&self) -> Vec<f64> {
        self.stops.stops()
    }

    pub fn stop_table(&self) -> &ColorStopTable {
        &self.stops
    }

    /// Color at the minimum of the interval.
    pub fn color1(&self) -> Rgba {
        self.stops.lookup(self.mode, 0.0)
    }

    /// Color at the maximum of the interval.
    pub fn color2(&self) -> Rgba {
        self.stops.lookup(self.mode, 1.0)
    }

    /// Color at an already normalized position, clamped to `[0, 1]`.
    pub fn at(&self, position: f64) -> Rgba {
        self.stops.lookup(self.mode, position)
    }

    /// Maps `value` from `[min, max]` to a color.
    ///
    /// Returns `None` when `value` is NaN or the interval has no positive width.
    /// Values outside the interval clamp to the boundary colors.
    pub fn map(&self, min: f64, max: f64, value: f64) -> Option<Rgba> {
        if value.is_nan() {
            return None;
        }

        let width = max - min;
        if width.is_nan() || width <= 0.0 {
            return None;
        }

        let ratio = if width.is_finite() {
            (value - min) / width
        } else {
            // Both bounds finite but too far apart to subtract.
            (value * 0.5 - min * 0.5) / (max * 0.5 - min * 0.5)
        };
        Some(self.stops.lookup(self.mode, ratio))
    }

    /// Like [`map`](Self::map), with unmappable input as [`Rgba::TRANSPARENT`].
    pub fn rgba(&self, min: f64, max: f64, value: f64) -> Rgba {
        self.map(min, max, value).unwrap_or(Rgba::TRANSPARENT)
    }

    /// Samples [`DEFAULT_TABLE_SIZE`] evenly spaced values of `[min, max]`.
    pub fn color_table(&self, min: f64, max: f64) -> Vec<Rgba> {
        self.lookup_table(min, max, DEFAULT_TABLE_SIZE)
    }

    /// Samples `size` evenly spaced values of `[min, max]`, both ends included.
    ///
    /// An inverted interval yields `size` transparent entries, as does any
    /// interval [`map`](Self::map) rejects.
    pub fn lookup_table(&self, min: f64, max: f64, size: usize) -> Vec<Rgba> {
        let mut table = vec![Rgba::TRANSPARENT; size];
        if min.is_nan() || max.is_nan() || min > max {
            return table;
        }

        let last = match size {
            0 => return table,
            1 => {
                table[0] = self.rgba(min, max, min);
                return table;
            },
            _ => size - 1,
        };

        for (index, slot) in table.iter_mut().enumerate() {
            let t = index as f64 / last as f64;
            *slot = self.rgba(min, max, min * (1.0 - t) + max * t);
        }
        table
    }
}

impl Default for ColorMap {
    /// Black to white.
    fn default() -> Self {
        Self::new(Rgba::BLACK, Rgba::WHITE)
    }
}
