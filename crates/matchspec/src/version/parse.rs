use std::{
    error::Error,
    fmt::{Display, Formatter},
    num::ParseIntError,
    str::FromStr,
};

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{alpha1, char, digit1},
    combinator::{cut, map, opt, value},
    error::{ErrorKind, ParseError},
    sequence::{preceded, terminated},
    IResult,
};
use smallvec::smallvec;
use thiserror::Error;

use super::{Component, Segment, Version};

/// An error that occurred during parsing of a string to a version.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseVersionError {
    /// The original string that was the input of the parser
    pub version: String,

    /// The type of parse error that occurred
    pub kind: ParseVersionErrorKind,
}

impl Display for ParseVersionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "malformed version string '{}': {}",
            &self.version, &self.kind
        )
    }
}

impl Error for ParseVersionError {}

impl ParseVersionError {
    /// Create a new parse error
    pub fn new(text: impl Into<String>, kind: ParseVersionErrorKind) -> Self {
        Self {
            version: text.into(),
            kind,
        }
    }
}

/// The type of parse error that occurred when parsing a version string.
#[derive(Debug, Eq, PartialEq, Clone, Error)]
pub enum ParseVersionErrorKind {
    /// The string was empty
    #[error("empty string")]
    Empty,
    /// The epoch was not an integer value
    #[error("epoch is not a number")]
    EpochMustBeInteger(ParseIntError),
    /// The string contained a numeral that cannot be represented
    #[error("invalid number")]
    InvalidNumeral(ParseIntError),
    /// The string contained an empty version component
    #[error("expected a version component e.g. `2` or `rc`")]
    EmptyVersionComponent,
    /// Expected a version component
    #[error("expected a version component e.g. `2` or `rc`")]
    ExpectedComponent,
    /// Expected the end of the string
    #[error("encountered more characters but expected none")]
    ExpectedEof,
    /// Nom error
    #[error("{0:?}")]
    Nom(ErrorKind),
}

impl<'i> ParseError<&'i str> for ParseVersionErrorKind {
    fn from_error_kind(_: &'i str, kind: ErrorKind) -> Self {
        ParseVersionErrorKind::Nom(kind)
    }

    fn append(_: &'i str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Parses the epoch part of a version. This is a number followed by `'!'` at
/// the start of the version string.
fn epoch_parser(input: &str) -> IResult<&str, u64, ParseVersionErrorKind> {
    let (rest, digits) = terminated(digit1, char('!'))(input)?;
    let epoch = digits
        .parse()
        .map_err(ParseVersionErrorKind::EpochMustBeInteger)
        .map_err(nom::Err::Failure)?;
    Ok((rest, epoch))
}

/// Parses a numeral from the input, fails if the parsed digits cannot be
/// represented by an `u64`.
fn numeral_parser(input: &str) -> IResult<&str, u64, ParseVersionErrorKind> {
    let (rest, digits) = digit1(input)?;
    match u64::from_str(digits) {
        Ok(numeral) => Ok((rest, numeral)),
        Err(e) => Err(nom::Err::Failure(ParseVersionErrorKind::InvalidNumeral(e))),
    }
}

/// Parses a single version [`Component`].
fn component_parser(input: &str) -> IResult<&str, Component, ParseVersionErrorKind> {
    alt((
        // Parse a numeral
        map(numeral_parser, Component::Numeral),
        // Parse special case components
        value(Component::Post, tag_no_case("post")),
        value(Component::Dev, tag_no_case("dev")),
        // Parse an identifier
        map(alpha1, |alpha: &str| {
            Component::Iden(alpha.to_ascii_lowercase().into_boxed_str())
        }),
    ))(input)
}

/// Parses a version segment: a run of components. Segments always start with
/// a number; if the textual segment starts with a letter the 0 fillvalue is
/// inserted in front of it.
fn segment_parser(input: &str) -> IResult<&str, Segment, ParseVersionErrorKind> {
    let (mut rest, first) = match component_parser(input) {
        Ok(result) => result,
        Err(nom::Err::Error(ParseVersionErrorKind::Nom(_))) => {
            return Err(nom::Err::Error(ParseVersionErrorKind::ExpectedComponent))
        }
        Err(e) => return Err(e),
    };

    let mut segment: Segment = smallvec![];
    if !first.is_numeric() {
        segment.push(Component::default());
    }
    segment.push(first);

    loop {
        let (remaining, component) = opt(component_parser)(rest)?;
        match component {
            Some(component) => segment.push(component),
            None => break Ok((remaining, segment)),
        }
        rest = remaining;
    }
}

/// Parses one or more segments separated by `.`, `-` or `_`. A trailing
/// underscore or dash (the openssl convention) is folded into the last
/// segment as an identifier component.
fn segments_parser(input: &str) -> IResult<&str, Vec<Segment>, ParseVersionErrorKind> {
    let (mut rest, first) = segment_parser(input)?;
    let mut segments = vec![first];

    loop {
        let Some(separator) = rest.chars().next().filter(|c| matches!(c, '.' | '-' | '_'))
        else {
            break;
        };
        match segment_parser(&rest[1..]) {
            Ok((remaining, segment)) => {
                segments.push(segment);
                rest = remaining;
            }
            Err(nom::Err::Error(_)) => {
                if separator != '.' {
                    // `1.1_` sorts before `1.1a1`, the marker is an identifier
                    segments
                        .last_mut()
                        .expect("there is always at least one segment")
                        .push(Component::Iden("_".into()));
                    rest = &rest[1..];
                }
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok((rest, segments))
}

/// Parses a version from the start of the input, leaving anything that does
/// not belong to the version (e.g. a trailing `.*` glob) in the remainder.
pub(crate) fn version_parser(input: &str) -> IResult<&str, Version, ParseVersionErrorKind> {
    let (rest, epoch) = opt(epoch_parser)(input)?;
    let (rest, segments) = segments_parser(rest)?;
    let (rest, local) = opt(preceded(char('+'), cut(segments_parser)))(rest)?;

    let consumed = &input[..input.len() - rest.len()];
    Ok((
        rest,
        Version {
            norm: consumed.trim().to_ascii_lowercase().into_boxed_str(),
            epoch,
            segments,
            local: local.unwrap_or_default(),
        },
    ))
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseVersionError::new(s, ParseVersionErrorKind::Empty));
        }
        match version_parser(trimmed) {
            Ok(("", version)) => Ok(version),
            Ok((rest, _)) if rest.starts_with(['.', '-', '_', '+']) => Err(
                ParseVersionError::new(trimmed, ParseVersionErrorKind::EmptyVersionComponent),
            ),
            Ok((_, _)) => Err(ParseVersionError::new(
                trimmed,
                ParseVersionErrorKind::ExpectedEof,
            )),
            Err(nom::Err::Error(kind) | nom::Err::Failure(kind)) => {
                Err(ParseVersionError::new(trimmed, kind))
            }
            Err(nom::Err::Incomplete(_)) => {
                unreachable!("not streaming, so no other error possible")
            }
        }
    }
}
