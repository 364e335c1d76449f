//! Caption parsing.
//!
//! Captions are matched by substring against a fixed action vocabulary, then
//! the action keyword is stripped and the remainder is scanned for the
//! action's sub-keywords. Whatever is left after removing a sub-keyword is
//! the free parameter (a level, a degree, or a sides token).

use pixbot_media::{
    BlurLevel, ConcatDirection, ConcatLayout, ConcatSides, Image, NoiseLevel, RotationAngle,
    RotationDirection,
};

use crate::error::{Error, Result};

/// Action keywords, in the order they are tested against a caption.
pub const ACTIONS: [(&str, Action); 6] = [
    ("concat", Action::Concat),
    ("blur", Action::Blur),
    ("contour", Action::Contour),
    ("rotate", Action::Rotate),
    ("salt and pepper", Action::SaltAndPepper),
    ("segment", Action::Segment),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Blur,
    Contour,
    Rotate,
    SaltAndPepper,
    Concat,
    Segment,
}

impl Action {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Blur => "blur",
            Self::Contour => "contour",
            Self::Rotate => "rotate",
            Self::SaltAndPepper => "salt and pepper",
            Self::Concat => "concat",
            Self::Segment => "segment",
        }
    }

    /// Number of images the action consumes.
    pub fn arity(self) -> usize {
        match self {
            Self::Concat => 2,
            _ => 1,
        }
    }
}

/// Concat parameters as typed in a caption.
///
/// The sides token stays raw until the concat runs, so an unknown token is
/// reported against the group rather than dropping the caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatSpec {
    pub direction: ConcatDirection,
    pub sides: Option<String>,
}

impl ConcatSpec {
    pub fn layout(&self) -> Result<ConcatLayout> {
        let layout = match self.sides.as_deref() {
            Some(sides) => ConcatLayout::parse(self.direction, sides)?,
            None => ConcatLayout::resolve(self.direction, ConcatSides::default())?,
        };
        Ok(layout)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Blur(BlurLevel),
    Contour,
    Rotate {
        direction: RotationDirection,
        angle: RotationAngle,
    },
    SaltAndPepper(NoiseLevel),
    Concat(ConcatSpec),
    Segment,
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Self::Blur(_) => Action::Blur,
            Self::Contour => Action::Contour,
            Self::Rotate { .. } => Action::Rotate,
            Self::SaltAndPepper(_) => Action::SaltAndPepper,
            Self::Concat(_) => Action::Concat,
            Self::Segment => Action::Segment,
        }
    }

    /// Apply a single-image command in place.
    pub fn apply(&self, image: &mut Image) -> Result<()> {
        match self {
            Self::Blur(level) => image.blur(*level),
            Self::Contour => image.contour(),
            Self::Rotate { direction, angle } => image.rotate(*direction, *angle),
            Self::SaltAndPepper(level) => {
                image.salt_and_pepper(*level);
            },
            Self::Concat(_) => return Err(Error::MissingPeerImage),
            Self::Segment => image.segment(),
        }
        Ok(())
    }
}

/// Parse a caption into a command.
///
/// `grouped` tells whether the message is part of a multi-image submission.
/// An empty caption yields `Ok(None)`.
pub fn parse_caption(caption: &str, grouped: bool) -> Result<Option<Command>> {
    let caption = caption.trim().to_lowercase();
    if caption.is_empty() {
        return Ok(None);
    }

    let Some(action) = ACTIONS
        .iter()
        .find(|(keyword, _)| caption.contains(keyword))
        .map(|(_, action)| *action)
    else {
        return Err(Error::InvalidAction { caption });
    };

    let rest = caption.replace(action.keyword(), "");
    let rest = rest.trim();

    let command = match action {
        Action::Concat => {
            if !grouped {
                return Err(Error::MissingPeerImage);
            }
            Command::Concat(parse_concat(rest))
        },
        Action::Blur => Command::Blur(if rest.is_empty() {
            BlurLevel::default()
        } else {
            rest.parse()?
        }),
        Action::Contour => Command::Contour,
        Action::Rotate => parse_rotate(rest)?,
        Action::SaltAndPepper => Command::SaltAndPepper(if rest.is_empty() {
            NoiseLevel::default()
        } else {
            rest.parse()?
        }),
        Action::Segment => Command::Segment,
    };
    Ok(Some(command))
}

/// Split `rest` on the first keyword found, returning the match and whatever
/// is left once every occurrence of it is removed.
fn take_keyword<T: Copy>(rest: &str, keywords: &[(&str, T)]) -> (Option<T>, String) {
    match keywords.iter().find(|(keyword, _)| rest.contains(keyword)) {
        Some((keyword, value)) => (Some(*value), rest.replace(keyword, "").trim().to_string()),
        None => (None, rest.to_string()),
    }
}

fn parse_rotate(rest: &str) -> Result<Command> {
    let (direction, degree) = take_keyword(rest, &RotationDirection::KEYWORDS);
    let angle = if degree.is_empty() {
        RotationAngle::default()
    } else {
        match degree.parse::<i64>() {
            Ok(value) => {
                RotationAngle::try_from(value).map_err(|_| Error::InvalidDegree { degree: value })?
            },
            Err(_) => degree.parse::<RotationAngle>()?,
        }
    };
    Ok(Command::Rotate {
        direction: direction.unwrap_or_default(),
        angle,
    })
}

fn parse_concat(rest: &str) -> ConcatSpec {
    let (direction, sides) = take_keyword(rest, &ConcatDirection::KEYWORDS);
    ConcatSpec {
        direction: direction.unwrap_or_default(),
        sides: (!sides.is_empty()).then_some(sides),
    }
}
