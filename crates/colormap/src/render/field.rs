use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ColorMapError;

fn cell_count(width: usize, height: usize) -> Result<usize, ColorMapError> {
    width.checked_mul(height).ok_or_else(|| ColorMapError::InvalidGrid {
        line: 0,
        reason: format!("{width}x{height} grid has too many cells"),
    })
}

/// Row-major grid of scalar samples.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl ScalarField {
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Result<Self, ColorMapError> {
        if width == 0 || height == 0 || values.is_empty() {
            return Err(ColorMapError::EmptyField);
        }
        if cell_count(width, height)? != values.len() {
            return Err(ColorMapError::InvalidGrid {
                line: 0,
                reason: format!("{width}x{height} grid cannot hold {} values", values.len()),
            });
        }
        Ok(Self { width, height, values })
    }

    /// A single row counting up from `1` to `count`.
    pub fn ramp(count: usize) -> Result<Self, ColorMapError> {
        let values = (1..=count).map(|value| value as f64).collect();
        Self::new(count, 1, values)
    }

    /// Uniform noise in `[0, 1)`, reproducible for a given seed.
    pub fn random(width: usize, height: usize, seed: u64) -> Result<Self, ColorMapError> {
        let cells = cell_count(width, height)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let values = (0..cells).map(|_| rng.gen::<f64>()).collect();
        Self::new(width, height, values)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ColorMapError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses one row per line, values separated by whitespace or commas.
    ///
    /// Blank lines and lines starting with `#` are skipped. `nan` marks a
    /// missing sample.
    pub fn parse(text: &str) -> Result<Self, ColorMapError> {
        let mut width = None;
        let mut height = 0;
        let mut values = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let start = values.len();
            for token in line.split(|ch: char| ch == ',' || ch.is_whitespace()) {
                if token.is_empty() {
                    continue;
                }
                let value = token.parse::<f64>().map_err(|_| ColorMapError::InvalidGrid {
                    line: line_number,
                    reason: format!("{token:?} is not a number"),
                })?;
                values.push(value);
            }

            let row_width = values.len() - start;
            match width {
                None => width = Some(row_width),
                Some(expected) if expected != row_width => {
                    return Err(ColorMapError::InvalidGrid {
                        line: line_number,
                        reason: format!("expected {expected} values, found {row_width}"),
                    });
                },
                Some(_) => {},
            }
            height += 1;
        }

        Self::new(width.unwrap_or(0), height, values)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width {
            return None;
        }
        self.values.get(y * self.width + x).copied()
    }

    /// Minimum and maximum over the finite samples.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values.iter().copied().filter(|value| value.is_finite()).fold(None, |range, value| {
            match range {
                None => Some((value, value)),
                Some((min, max)) => Some((min.min(value), max.max(value))),
            }
        })
    }
}
