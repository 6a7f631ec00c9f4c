use std::fmt;
use std::str::FromStr;

use super::color::Rgba;
use super::map::ColorMap;
use super::stops::MERGE_EPSILON;
use crate::ColorMapError;

/// A normalized position with float RGB channels, all in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    pub position: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ControlPoint {
    pub const fn new(position: f64, r: f64, g: f64, b: f64) -> Self {
        Self { position, r, g, b }
    }

    pub fn color(&self) -> Rgba {
        Rgba::from_rgb_f(self.r, self.g, self.b)
    }
}

impl From<(f64, f64, f64, f64)> for ControlPoint {
    fn from((position, r, g, b): (f64, f64, f64, f64)) -> Self {
        Self::new(position, r, g, b)
    }
}

/// Builds a color map from control points sorted by position.
///
/// The first point must sit at exactly `0.0`, the last at exactly `1.0`, and
/// positions must strictly increase in between. Neighbors closer than
/// [`MERGE_EPSILON`] are rejected, as the stop table would collapse them.
pub fn from_control_points(points: &[ControlPoint]) -> Result<ColorMap, ColorMapError> {
    validate(points)?;
    Ok(build(points))
}

/// Expects points that passed [`validate`].
fn build(points: &[ControlPoint]) -> ColorMap {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return ColorMap::default();
    };

    let mut map = ColorMap::new(first.color(), last.color());
    for point in points.iter().skip(1).take(points.len().saturating_sub(2)) {
        map.add_color_stop(point.position, point.color());
    }
    map
}

fn validate(points: &[ControlPoint]) -> Result<(), ColorMapError> {
    if points.len() < 2 {
        return Err(ColorMapError::TooFewControlPoints(points.len()));
    }

    let first = points[0].position;
    if first != 0.0 {
        return Err(ColorMapError::FirstPositionNotZero(first));
    }

    let last = points[points.len() - 1].position;
    if last != 1.0 {
        return Err(ColorMapError::LastPositionNotOne(last));
    }

    for (index, pair) in points.windows(2).enumerate() {
        if pair[1].position.is_nan() || pair[0].position >= pair[1].position {
            return Err(ColorMapError::PositionsNotIncreasing { index: index + 1 });
        }
    }

    for (index, pair) in points.windows(2).enumerate() {
        if pair[1].position - pair[0].position < MERGE_EPSILON {
            return Err(ColorMapError::PositionsTooClose { index: index + 1 });
        }
    }

    for (index, point) in points.iter().enumerate() {
        if [point.r, point.g, point.b].iter().any(|channel| !(0.0..=1.0).contains(channel)) {
            return Err(ColorMapError::ChannelOutOfRange { index });
        }
    }

    Ok(())
}

/// Built-in gradients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Black -> red -> yellow -> white
    BlackBodyRadiation,
    /// Diverging blue -> light gray -> red
    CoolToWarm,
    /// Dark blue -> blue -> cyan -> yellow -> red -> dark red
    Jet,
    /// Black -> white
    Grayscale,
    /// White -> black
    XRay,
}

const BLACK_BODY_RADIATION: &[ControlPoint] = &[
    ControlPoint::new(0.0, 0.0, 0.0, 0.0),
    ControlPoint::new(0.4, 0.901960784314, 0.0, 0.0),
    ControlPoint::new(0.8, 0.901960784314, 0.901960784314, 0.0),
    ControlPoint::new(1.0, 1.0, 1.0, 1.0),
];

const COOL_TO_WARM: &[ControlPoint] = &[
    ControlPoint::new(0.0, 0.231372549020, 0.298039215686, 0.752941176471),
    ControlPoint::new(0.5, 0.865, 0.865, 0.865),
    ControlPoint::new(1.0, 0.705882352941, 0.015686274510, 0.149019607843),
];

// 128 / 255 for the dark variants.
const DARK: f64 = 0.501960784314;

const JET: &[ControlPoint] = &[
    ControlPoint::new(0.0, 0.0, 0.0, DARK),
    ControlPoint::new(0.2, 0.0, 0.0, 1.0),
    ControlPoint::new(0.4, 0.0, 1.0, 1.0),
    ControlPoint::new(0.6, 1.0, 1.0, 0.0),
    ControlPoint::new(0.8, 1.0, 0.0, 0.0),
    ControlPoint::new(1.0, DARK, 0.0, 0.0),
];

const GRAYSCALE: &[ControlPoint] =
    &[ControlPoint::new(0.0, 0.0, 0.0, 0.0), ControlPoint::new(1.0, 1.0, 1.0, 1.0)];

const X_RAY: &[ControlPoint] =
    &[ControlPoint::new(0.0, 1.0, 1.0, 1.0), ControlPoint::new(1.0, 0.0, 0.0, 0.0)];

impl Preset {
    pub const ALL: &[Preset] =
        &[Self::BlackBodyRadiation, Self::CoolToWarm, Self::Jet, Self::Grayscale, Self::XRay];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BlackBodyRadiation => "black-body-radiation",
            Self::CoolToWarm => "cool-to-warm",
            Self::Jet => "jet",
            Self::Grayscale => "grayscale",
            Self::XRay => "x-ray",
        }
    }

    pub fn control_points(&self) -> &'static [ControlPoint] {
        match self {
            Self::BlackBodyRadiation => BLACK_BODY_RADIATION,
            Self::CoolToWarm => COOL_TO_WARM,
            Self::Jet => JET,
            Self::Grayscale => GRAYSCALE,
            Self::XRay => X_RAY,
        }
    }

    pub fn color_map(&self) -> ColorMap {
        build(self.control_points())
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive; `-`, `_` and spaces are ignored.
impl FromStr for Preset {
    type Err = ColorMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.name().replace('-', "") == key)
            .ok_or_else(|| ColorMapError::UnknownPreset(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::map::Mode;

    fn points(raw: &[(f64, f64, f64, f64)]) -> Vec<ControlPoint> {
        raw.iter().copied().map(ControlPoint::from).collect()
    }

    #[test]
    fn all_presets_are_valid() {
        for preset in Preset::ALL {
            assert!(from_control_points(preset.control_points()).is_ok(), "{preset}");
        }
    }

    #[test]
    fn rejects_too_few_points() {
        let err = from_control_points(&points(&[(0.0, 0.0, 0.0, 0.0)])).unwrap_err();
        assert!(matches!(err, ColorMapError::TooFewControlPoints(1)));
        assert!(matches!(
            from_control_points(&[]).unwrap_err(),
            ColorMapError::TooFewControlPoints(0)
        ));
    }

    #[test]
    fn rejects_first_position_not_zero() {
        let err = from_control_points(&points(&[(0.2, 0.0, 0.0, 0.0), (1.0, 1.0, 1.0, 1.0)]))
            .unwrap_err();
        assert!(matches!(err, ColorMapError::FirstPositionNotZero(p) if p == 0.2));
    }

    #[test]
    fn rejects_last_position_not_one() {
        let err = from_control_points(&points(&[(0.0, 0.0, 0.0, 0.0), (0.9, 1.0, 1.0, 1.0)]))
            .unwrap_err();
        assert!(matches!(err, ColorMapError::LastPositionNotOne(_)));
    }

    #[test]
    fn rejects_unsorted_points() {
        let err = from_control_points(&points(&[
            (0.0, 0.0, 0.0, 0.0),
            (0.6, 1.0, 0.0, 0.0),
            (0.3, 0.0, 1.0, 0.0),
            (1.0, 1.0, 1.0, 1.0),
        ]))
        .unwrap_err();
        assert!(matches!(err, ColorMapError::PositionsNotIncreasing { index: 2 }));
    }

    #[test]
    fn rejects_duplicate_positions() {
        let err = from_control_points(&points(&[
            (0.0, 0.0, 0.0, 0.0),
            (0.5, 1.0, 0.0, 0.0),
            (0.5, 0.0, 1.0, 0.0),
            (1.0, 1.0, 1.0, 1.0),
        ]))
        .unwrap_err();
        assert!(matches!(err, ColorMapError::PositionsNotIncreasing { index: 2 }));
    }

    #[test]
    fn rejects_points_closer_than_merge_distance() {
        let err = from_control_points(&points(&[
            (0.0, 0.0, 0.0, 0.0),
            (0.0005, 1.0, 0.0, 0.0),
            (1.0, 1.0, 1.0, 1.0),
        ]))
        .unwrap_err();
        assert!(matches!(err, ColorMapError::PositionsTooClose { index: 1 }));

        let err = from_control_points(&points(&[
            (0.0, 0.0, 0.0, 0.0),
            (0.5, 1.0, 0.0, 0.0),
            (0.9995, 0.0, 1.0, 0.0),
            (1.0, 1.0, 1.0, 1.0),
        ]))
        .unwrap_err();
        assert!(matches!(err, ColorMapError::PositionsTooClose { index: 3 }));
    }

    #[test]
    fn points_one_merge_distance_apart_keep_every_stop() {
        let map = from_control_points(&points(&[
            (0.0, 0.0, 0.0, 0.0),
            (0.25, 1.0, 0.0, 0.0),
            (0.251, 0.0, 1.0, 0.0),
            (1.0, 1.0, 1.0, 1.0),
        ]))
        .unwrap();
        assert_eq!(map.color_stops().len(), 4);
        assert_eq!(map.color1(), Rgba::BLACK);
    }

    #[test]
    fn preset_maps_match_validated_construction() {
        for preset in Preset::ALL {
            let validated = from_control_points(preset.control_points()).unwrap();
            let map = preset.color_map();
            assert_eq!(map.color_stops(), validated.color_stops(), "{preset}");
            assert_eq!(map.color_table(0.0, 1.0), validated.color_table(0.0, 1.0), "{preset}");
        }
    }

    #[test]
    fn rejects_channels_outside_unit_range() {
        let err = from_control_points(&points(&[(0.0, 0.0, 0.0, 0.0), (1.0, 1.5, 1.0, 1.0)]))
            .unwrap_err();
        assert!(matches!(err, ColorMapError::ChannelOutOfRange { index: 1 }));
    }

    #[test]
    fn interior_points_become_stops() {
        let map = from_control_points(&points(&[
            (0.0, 0.0, 0.0, 0.0),
            (0.25, 1.0, 0.0, 0.0),
            (0.75, 0.0, 1.0, 0.0),
            (1.0, 1.0, 1.0, 1.0),
        ]))
        .unwrap();
        assert_eq!(map.color_stops(), vec![0.0, 0.25, 0.75, 1.0]);
        assert_eq!(map.mode(), Mode::Scaled);
        assert_eq!(map.at(0.25), Rgba::opaque(255, 0, 0));
    }

    #[test]
    fn jet_landmarks() {
        let jet = Preset::Jet.color_map();
        assert_eq!(jet.at(0.0), Rgba::opaque(0, 0, 128));
        assert_eq!(jet.at(0.4), Rgba::opaque(0, 255, 255));
        assert_eq!(jet.at(1.0), Rgba::opaque(128, 0, 0));
        assert_eq!(jet.color_stops().len(), 6);
    }

    #[test]
    fn black_body_boundaries() {
        let map = Preset::BlackBodyRadiation.color_map();
        assert_eq!(map.color1(), Rgba::BLACK);
        assert_eq!(map.color2(), Rgba::WHITE);
        assert_eq!(map.at(0.4), Rgba::opaque(230, 0, 0));
    }

    #[test]
    fn x_ray_is_inverted_grayscale() {
        let gray = Preset::Grayscale.color_map();
        let x_ray = Preset::XRay.color_map();
        assert_eq!(gray.color1(), x_ray.color2());
        assert_eq!(gray.color2(), x_ray.color1());
    }

    #[test]
    fn parse_preset_names() {
        assert_eq!("jet".parse::<Preset>().unwrap(), Preset::Jet);
        assert_eq!("Cool_To_Warm".parse::<Preset>().unwrap(), Preset::CoolToWarm);
        assert_eq!("xray".parse::<Preset>().unwrap(), Preset::XRay);
        assert_eq!("Black Body Radiation".parse::<Preset>().unwrap(), Preset::BlackBodyRadiation);
        assert!("viridis".parse::<Preset>().is_err());
    }
}
