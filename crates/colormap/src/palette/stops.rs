use super::color::Rgba;
use super::map::Mode;
use crate::ColorMapError;

/// Positions closer than this share a single stop.
pub const MERGE_EPSILON: f64 = 1e-3;

#[derive(Clone, Copy, Debug, Default)]
struct Stop {
    position: f64,
    color: Rgba,

    // Coefficients for the segment starting at this stop. Bases carry the
    // +0.5 rounding bias so lookups only need to truncate.
    r0: f64,
    g0: f64,
    b0: f64,
    a0: f64,
    r_step: f64,
    g_step: f64,
    b_step: f64,
    a_step: f64,
    position_step: f64,
}

impl Stop {
    fn new(position: f64, color: Rgba) -> Self {
        Self {
            position,
            color,
            r0: f64::from(color.r) + 0.5,
            g0: f64::from(color.g) + 0.5,
            b0: f64::from(color.b) + 0.5,
            a0: f64::from(color.a) + 0.5,
            ..Self::default()
        }
    }

    fn update_steps(&mut self, next: &Stop) {
        self.r_step = f64::from(next.color.r) - f64::from(self.color.r);
        self.g_step = f64::from(next.color.g) - f64::from(self.color.g);
        self.b_step = f64::from(next.color.b) - f64::from(self.color.b);
        self.a_step = f64::from(next.color.a) - f64::from(self.color.a);
        self.position_step = next.position - self.position;
    }

    fn set_color(&mut self, color: Rgba) {
        *self = Self::new(self.position, color);
    }
}

/// Ordered color stops over the normalized interval `[0, 1]`.
///
/// Insertion is `O(n)` and expected at setup time only; lookup is a binary
/// search over the sorted stops followed by a single multiply-add per channel.
#[derive(Clone, Debug, Default)]
pub struct ColorStopTable {
    stops: Vec<Stop>,
    do_alpha: bool,
}

impl ColorStopTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Whether any stop has ever carried a non-opaque color.
    pub fn has_alpha(&self) -> bool {
        self.do_alpha
    }

    /// Inserts a stop, or recolors the existing stop within [`MERGE_EPSILON`].
    ///
    /// Returns `false` and leaves the table untouched when `position` lies
    /// outside `[0, 1]`.
    pub fn insert(&mut self, position: f64, color: Rgba) -> bool {
        if !(0.0..=1.0).contains(&position) {
            return false;
        }

        let upper = self.find_upper(position);
        let index = match self.merge_slot(upper, position) {
            Some(index) => {
                self.stops[index].set_color(color);
                index
            },
            None => {
                self.stops.insert(upper, Stop::new(position, color));
                upper
            },
        };

        if !color.is_opaque() {
            self.do_alpha = true;
        }

        if index > 0 {
            let current = self.stops[index];
            self.stops[index - 1].update_steps(&current);
        }
        if index + 1 < self.stops.len() {
            let next = self.stops[index + 1];
            self.stops[index].update_steps(&next);
        }

        true
    }

    /// Color at a normalized position.
    ///
    /// Positions at or beyond the ends clamp to the boundary stops. An empty
    /// table yields [`Rgba::TRANSPARENT`].
    pub fn lookup(&self, mode: Mode, position: f64) -> Rgba {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Rgba::TRANSPARENT;
        };

        if position <= 0.0 {
            return first.color;
        }
        if position >= 1.0 {
            return last.color;
        }

        let upper = self.find_upper(position);
        if upper == 0 {
            return first.color;
        }
        if upper == self.stops.len() {
            return last.color;
        }

        let start = &self.stops[upper - 1];
        match mode {
            Mode::Fixed => start.color,
            Mode::Scaled => self.interpolate(start, position),
        }
    }

    /// Stop positions in increasing order.
    pub fn stops(&self) -> Vec<f64> {
        self.stops.iter().map(|stop| stop.position).collect()
    }

    /// Stop positions paired with their colors, in increasing order.
    pub fn entries(&self) -> impl Iterator<Item = (f64, Rgba)> + '_ {
        self.stops.iter().map(|stop| (stop.position, stop.color))
    }

    fn interpolate(&self, start: &Stop, position: f64) -> Rgba {
        let ratio = (position - start.position) / start.position_step;

        // Float to integer casts truncate, which rounds half up after the
        // pre-added bias for the non-negative values produced here.
        let r = (start.r0 + ratio * start.r_step) as u8;
        let g = (start.g0 + ratio * start.g_step) as u8;
        let b = (start.b0 + ratio * start.b_step) as u8;

        let a = if !self.do_alpha {
            255
        } else if start.a_step != 0.0 {
            (start.a0 + ratio * start.a_step) as u8
        } else {
            start.color.a
        };

        Rgba::new(r, g, b, a)
    }

    /// Index of the first stop strictly after `position`.
    fn find_upper(&self, position: f64) -> usize {
        self.stops.partition_point(|stop| stop.position <= position)
    }

    /// Existing stop that `position` collapses into, preferring the closer
    /// neighbor when both sides are in range.
    fn merge_slot(&self, upper: usize, position: f64) -> Option<usize> {
        let distance = |index: usize| (self.stops[index].position - position).abs();

        let below = upper.checked_sub(1).filter(|&index| distance(index) < MERGE_EPSILON);
        let above = Some(upper)
            .filter(|&index| index < self.stops.len() && distance(index) < MERGE_EPSILON);

        match (below, above) {
            (Some(below), Some(above)) => {
                Some(if distance(above) < distance(below) { above } else { below })
            },
            (below, above) => below.or(above),
        }
    }
}

/// Parses a `POSITION:COLOR` stop such as `0.25:#ff8000`.
pub fn parse_stop(spec: &str) -> Result<(f64, Rgba), ColorMapError> {
    let invalid = || ColorMapError::InvalidStop(spec.to_owned());
    let (position, color) = spec.split_once(':').ok_or_else(invalid)?;
    let position: f64 = position.trim().parse().map_err(|_| invalid())?;
    if !(0.0..=1.0).contains(&position) {
        return Err(invalid());
    }
    Ok((position, color.parse()?))
}
