//! Typed transform parameters and their coercion from caption text.
//!
//! Every coercion failure is an [`Error::InvalidParameter`]; nothing falls
//! back to a default silently.

use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

pub const DEFAULT_BLUR_LEVEL: u32 = 16;
pub const DEFAULT_NOISE_LEVEL: f64 = 0.05;

const BLUR_LEVEL_HINT: &str = "Blur level must be a positive, whole number.";
const NOISE_LEVEL_HINT: &str = "Noise level must be a number and may be fractional.";
const DEGREES_HINT: &str = "Degrees must be a positive, whole number and only 90, 180 or 270.";
const DEGREES_SET_HINT: &str = "Degrees may only be 90, 180 or 270.";
const SIDES_MISMATCH_HINT: &str = "The sides you've chosen to concatenate don't match the direction chosen. Please refer to the 'help'.";
const SIDES_UNKNOWN_HINT: &str = "The sides you've chosen to concatenate aren't of the allowed options. Please refer to the 'help'.";

// ── Blur ────────────────────────────────────────────────────────────────────

/// Side length of the box-filter window. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlurLevel(u32);

impl BlurLevel {
    /// Negative levels are taken by absolute value; zero is rejected.
    pub fn new(level: i64) -> Result<Self> {
        u32::try_from(level.unsigned_abs())
            .ok()
            .filter(|&l| l > 0)
            .map(Self)
            .ok_or_else(|| Error::invalid_parameter(BLUR_LEVEL_HINT))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for BlurLevel {
    fn default() -> Self {
        Self(DEFAULT_BLUR_LEVEL)
    }
}

impl FromStr for BlurLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let level = s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::invalid_parameter(BLUR_LEVEL_HINT))?;
        Self::new(level)
    }
}

// ── Salt and pepper ─────────────────────────────────────────────────────────

/// Fraction of the pixel count to overwrite. Writes land with replacement,
/// so levels above 1 are allowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseLevel(f64);

impl NoiseLevel {
    pub fn new(level: f64) -> Result<Self> {
        let level = level.abs();
        if !level.is_finite() {
            return Err(Error::invalid_parameter(NOISE_LEVEL_HINT));
        }
        Ok(Self(level))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for NoiseLevel {
    fn default() -> Self {
        Self(DEFAULT_NOISE_LEVEL)
    }
}

impl FromStr for NoiseLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let level = s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::invalid_parameter(NOISE_LEVEL_HINT))?;
        Self::new(level)
    }
}

// ── Rotation ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RotationDirection {
    #[default]
    Clockwise,
    AntiClockwise,
}

impl RotationDirection {
    /// Caption keywords, longest first so "anti-clockwise" never matches as
    /// "clockwise".
    pub const KEYWORDS: [(&'static str, Self); 2] = [
        ("anti-clockwise", Self::AntiClockwise),
        ("clockwise", Self::Clockwise),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clockwise => "clockwise",
            Self::AntiClockwise => "anti-clockwise",
        }
    }
}

impl fmt::Display for RotationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == s)
            .map(|&(_, d)| d)
            .ok_or_else(|| {
                Error::invalid_parameter(format!(
                    "Rotation direction must be clockwise or anti-clockwise, got {s:?}."
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RotationAngle {
    #[default]
    Deg90,
    Deg180,
    Deg270,
}

impl RotationAngle {
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    pub fn quarter_turns(self) -> u32 {
        self.degrees() / 90
    }
}

impl TryFrom<i64> for RotationAngle {
    type Error = Error;

    /// Negative angles are taken by absolute value.
    fn try_from(degrees: i64) -> Result<Self> {
        match degrees.unsigned_abs() {
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            _ => Err(Error::invalid_parameter(DEGREES_SET_HINT)),
        }
    }
}

impl FromStr for RotationAngle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let degrees = s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::invalid_parameter(DEGREES_HINT))?;
        Self::try_from(degrees)
    }
}

impl fmt::Display for RotationAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

// ── Concat ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConcatDirection {
    #[default]
    Horizontal,
    Vertical,
}

impl ConcatDirection {
    pub const KEYWORDS: [(&'static str, Self); 2] = [
        ("horizontal", Self::Horizontal),
        ("vertical", Self::Vertical),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

impl fmt::Display for ConcatDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which edge meets which. `RightToLeft` and `TopToBottom` keep the receiving
/// image first in reading order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConcatSides {
    #[default]
    RightToLeft,
    LeftToRight,
    TopToBottom,
    BottomToTop,
}

impl ConcatSides {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RightToLeft => "right-to-left",
            Self::LeftToRight => "left-to-right",
            Self::TopToBottom => "top-to-bottom",
            Self::BottomToTop => "bottom-to-top",
        }
    }

    fn is_vertical_only(self) -> bool {
        matches!(self, Self::TopToBottom | Self::BottomToTop)
    }
}

impl fmt::Display for ConcatSides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConcatSides {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "right-to-left" => Ok(Self::RightToLeft),
            "left-to-right" => Ok(Self::LeftToRight),
            "top-to-bottom" => Ok(Self::TopToBottom),
            "bottom-to-top" => Ok(Self::BottomToTop),
            _ => Err(Error::invalid_parameter(SIDES_UNKNOWN_HINT)),
        }
    }
}

/// A cross-validated direction/sides pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatLayout {
    direction: ConcatDirection,
    sides: ConcatSides,
}

impl ConcatLayout {
    /// Normalize then validate:
    /// `vertical` + `right-to-left` becomes `top-to-bottom`, and a
    /// vertical-only side forces `vertical`. Anything left outside
    /// {horizontal: right-to-left | left-to-right, vertical: top-to-bottom |
    /// bottom-to-top} is rejected.
    pub fn resolve(direction: ConcatDirection, sides: ConcatSides) -> Result<Self> {
        let (direction, sides) = match (direction, sides) {
            (ConcatDirection::Vertical, ConcatSides::RightToLeft) => {
                (ConcatDirection::Vertical, ConcatSides::TopToBottom)
            },
            (ConcatDirection::Horizontal, s) if s.is_vertical_only() => {
                (ConcatDirection::Vertical, s)
            },
            other => other,
        };
        let valid = match direction {
            ConcatDirection::Horizontal => !sides.is_vertical_only(),
            ConcatDirection::Vertical => sides.is_vertical_only(),
        };
        if !valid {
            return Err(Error::invalid_parameter(SIDES_MISMATCH_HINT));
        }
        Ok(Self { direction, sides })
    }

    /// Resolve from a raw sides token as typed in a caption.
    pub fn parse(direction: ConcatDirection, sides: &str) -> Result<Self> {
        Self::resolve(direction, sides.parse()?)
    }

    pub fn direction(self) -> ConcatDirection {
        self.direction
    }

    pub fn sides(self) -> ConcatSides {
        self.sides
    }

    pub fn is_vertical(self) -> bool {
        self.direction == ConcatDirection::Vertical
    }

    /// Whether the receiving image comes first in the joined rows.
    pub fn self_first(self) -> bool {
        matches!(self.sides, ConcatSides::RightToLeft | ConcatSides::TopToBottom)
    }
}

impl Default for ConcatLayout {
    fn default() -> Self {
        Self {
            direction: ConcatDirection::Horizontal,
            sides: ConcatSides::RightToLeft,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("10", 10)]
    #[case(" 3 ", 3)]
    #[case("-5", 5)]
    fn blur_level_coerces(#[case] input: &str, #[case] expected: u32) {
        assert_eq!(input.parse::<BlurLevel>().unwrap().get(), expected);
    }

    #[rstest]
    #[case("ten")]
    #[case("2.5")]
    #[case("0")]
    #[case("")]
    fn blur_level_rejects(#[case] input: &str) {
        let err = input.parse::<BlurLevel>().unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn defaults_match_caption_grammar() {
        assert_eq!(BlurLevel::default().get(), 16);
        assert_eq!(NoiseLevel::default().get(), 0.05);
        assert_eq!(RotationDirection::default(), RotationDirection::Clockwise);
        assert_eq!(RotationAngle::default(), RotationAngle::Deg90);
        assert_eq!(ConcatLayout::default().sides(), ConcatSides::RightToLeft);
    }

    #[rstest]
    #[case("0.1", 0.1)]
    #[case("-0.5", 0.5)]
    #[case("1", 1.0)]
    #[case("0", 0.0)]
    #[case("2", 2.0)]
    fn noise_level_coerces(#[case] input: &str, #[case] expected: f64) {
        assert_eq!(input.parse::<NoiseLevel>().unwrap().get(), expected);
    }

    #[rstest]
    #[case("lots")]
    #[case("nan")]
    #[case("inf")]
    fn noise_level_rejects(#[case] input: &str) {
        assert!(matches!(
            input.parse::<NoiseLevel>(),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[rstest]
    #[case("90", RotationAngle::Deg90)]
    #[case("-180", RotationAngle::Deg180)]
    #[case("270", RotationAngle::Deg270)]
    fn rotation_angle_coerces(#[case] input: &str, #[case] expected: RotationAngle) {
        assert_eq!(input.parse::<RotationAngle>().unwrap(), expected);
    }

    #[rstest]
    #[case("45")]
    #[case("360")]
    #[case("0")]
    #[case("ninety")]
    fn rotation_angle_rejects(#[case] input: &str) {
        assert!(matches!(
            input.parse::<RotationAngle>(),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[rstest]
    #[case(ConcatDirection::Horizontal, ConcatSides::RightToLeft, ConcatDirection::Horizontal, ConcatSides::RightToLeft)]
    #[case(ConcatDirection::Horizontal, ConcatSides::LeftToRight, ConcatDirection::Horizontal, ConcatSides::LeftToRight)]
    #[case(ConcatDirection::Vertical, ConcatSides::RightToLeft, ConcatDirection::Vertical, ConcatSides::TopToBottom)]
    #[case(ConcatDirection::Horizontal, ConcatSides::TopToBottom, ConcatDirection::Vertical, ConcatSides::TopToBottom)]
    #[case(ConcatDirection::Horizontal, ConcatSides::BottomToTop, ConcatDirection::Vertical, ConcatSides::BottomToTop)]
    fn concat_layout_normalizes(
        #[case] direction: ConcatDirection,
        #[case] sides: ConcatSides,
        #[case] expected_direction: ConcatDirection,
        #[case] expected_sides: ConcatSides,
    ) {
        let layout = ConcatLayout::resolve(direction, sides).unwrap();
        assert_eq!(layout.direction(), expected_direction);
        assert_eq!(layout.sides(), expected_sides);
    }

    #[test]
    fn vertical_left_to_right_is_rejected() {
        let err =
            ConcatLayout::resolve(ConcatDirection::Vertical, ConcatSides::LeftToRight).unwrap_err();
        assert!(err.to_string().contains("don't match"));
    }

    #[test]
    fn unknown_sides_token_is_rejected() {
        let err = ConcatLayout::parse(ConcatDirection::Horizontal, "diagonal").unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
        assert!(err.to_string().contains("allowed options"));
    }
}
