use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char,
    combinator::{opt, value},
    error::{ErrorKind, ParseError},
    sequence::tuple,
    IResult,
};
use thiserror::Error;

use crate::version::parse::version_parser;
use crate::version_spec::{Constraint, VersionOperator};
use crate::{ParseVersionError, ParseVersionErrorKind};

#[derive(Debug, Clone, Error, Eq, PartialEq)]
enum ParseVersionOperatorError<'i> {
    #[error("invalid operator '{0}'")]
    InvalidOperator(&'i str),
    #[error("expected version operator")]
    ExpectedOperator,
}

/// Parses a version operator, returns an error if the operator is not
/// recognized or not found.
fn operator_parser(input: &str) -> IResult<&str, VersionOperator, ParseVersionOperatorError<'_>> {
    // Take anything that looks like an operator.
    let (rest, operator_str) = take_while1(|c| "=!<>~".contains(c))(input).map_err(
        |_: nom::Err<nom::error::Error<&str>>| {
            nom::Err::Error(ParseVersionOperatorError::ExpectedOperator)
        },
    )?;

    let op = match operator_str {
        "==" => VersionOperator::Equals,
        "!=" => VersionOperator::NotEquals,
        "<=" => VersionOperator::LessEquals,
        ">=" => VersionOperator::GreaterEquals,
        "<" => VersionOperator::Less,
        ">" => VersionOperator::Greater,
        "=" => VersionOperator::StartsWith,
        "~=" => VersionOperator::Compatible,
        _ => {
            return Err(nom::Err::Failure(
                ParseVersionOperatorError::InvalidOperator(operator_str),
            ))
        }
    };

    Ok((rest, op))
}

/// An error that occurred while parsing a single version constraint.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseConstraintError {
    /// Regex-like constraints are recognized but not supported
    #[error("regex constraints are not supported")]
    RegexConstraintsNotSupported,
    /// A regex-like constraint without a terminating `$`
    #[error("unterminated unsupported regular expression")]
    UnterminatedRegex,
    /// The operator in front of the version is not recognized
    #[error("invalid operator '{0}'")]
    InvalidOperator(String),
    /// The version itself could not be parsed
    #[error(transparent)]
    InvalidVersion(#[from] ParseVersionError),
    /// Expected the end of the string
    #[error("encountered more characters but expected none")]
    ExpectedEof,
    /// Nom error
    #[error("{0:?}")]
    Nom(ErrorKind),
}

impl<'i> ParseError<&'i str> for ParseConstraintError {
    fn from_error_kind(_: &'i str, kind: ErrorKind) -> Self {
        ParseConstraintError::Nom(kind)
    }

    fn append(_: &'i str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Parses a regex constraint. Returns an error if no terminating `$` is
/// found.
fn regex_constraint_parser(input: &str) -> IResult<&str, Constraint, ParseConstraintError> {
    let (_rest, (_, _, terminator)) =
        tuple((char('^'), take_while(|c| c != '$'), opt(char('$'))))(input)?;
    match terminator {
        Some(_) => Err(nom::Err::Failure(
            ParseConstraintError::RegexConstraintsNotSupported,
        )),
        None => Err(nom::Err::Failure(ParseConstraintError::UnterminatedRegex)),
    }
}

/// Parses the any constraint. This matches `*` and `*.*`.
fn any_constraint_parser(input: &str) -> IResult<&str, Constraint, ParseConstraintError> {
    value(Constraint::Any, tuple((tag("*"), opt(tag(".*")))))(input)
}

/// Parses a constraint with an optional operator in front of it.
fn logical_constraint_parser(input: &str) -> IResult<&str, Constraint, ParseConstraintError> {
    // Parse the optional preceding operator
    let (input, op) = match operator_parser(input) {
        Err(
            nom::Err::Failure(ParseVersionOperatorError::InvalidOperator(op))
            | nom::Err::Error(ParseVersionOperatorError::InvalidOperator(op)),
        ) => {
            return Err(nom::Err::Failure(ParseConstraintError::InvalidOperator(
                op.to_owned(),
            )))
        }
        Err(nom::Err::Error(_)) => (input, None),
        Ok((rest, op)) => (rest, Some(op)),
        Err(nom::Err::Incomplete(_)) => unreachable!("not streaming"),
        Err(nom::Err::Failure(_)) => {
            unreachable!("parser only emits InvalidOperator as a failure")
        }
    };

    // Take everything that looks like a version and use that to parse the
    // version. Any error means no characters were detected that belong to the
    // version.
    let (rest, version_str) = take_while1::<_, _, (&str, ErrorKind)>(|c: char| {
        c.is_alphanumeric() || "!-_.*+".contains(c)
    })(input)
    .map_err(|_| {
        nom::Err::Error(ParseConstraintError::InvalidVersion(ParseVersionError::new(
            input,
            ParseVersionErrorKind::Empty,
        )))
    })?;

    // Parse the string as a version
    let (version_rest, version) = version_parser(input).map_err(|e| {
        e.map(|kind| {
            ParseConstraintError::InvalidVersion(ParseVersionError::new(version_str, kind))
        })
    })?;

    // Convert the operator and the wildcard to something understandable
    let op = match (version_rest, op) {
        // The version was successfully parsed
        ("", Some(op)) => op,
        ("", None) => VersionOperator::Equals,

        // The version ends in a wildcard pattern
        ("*" | ".*", Some(VersionOperator::StartsWith)) => VersionOperator::StartsWith,
        ("*" | ".*", Some(VersionOperator::GreaterEquals | VersionOperator::Greater)) => {
            VersionOperator::GreaterEquals
        }
        ("*" | ".*", Some(VersionOperator::NotEquals)) => VersionOperator::NotStartsWith,
        (glob @ ("*" | ".*"), Some(op)) => {
            tracing::warn!("Using {glob} with relational operator is superfluous and deprecated and will be removed in a future version of conda.");
            op
        }
        ("*" | ".*", None) => VersionOperator::StartsWith,

        // The version string kinda looks like a regular expression.
        (version_remainder, _)
            if version_str.contains('*') || version_remainder.ends_with('$') =>
        {
            return Err(nom::Err::Error(
                ParseConstraintError::RegexConstraintsNotSupported,
            ));
        }

        // Otherwise its just a generic error.
        _ => {
            return Err(nom::Err::Error(ParseConstraintError::InvalidVersion(
                ParseVersionError::new(version_str, ParseVersionErrorKind::ExpectedEof),
            )))
        }
    };

    Ok((rest, Constraint::Comparison(op, version)))
}

/// Parses a version constraint.
pub(crate) fn constraint_parser(input: &str) -> IResult<&str, Constraint, ParseConstraintError> {
    alt((
        regex_constraint_parser,
        any_constraint_parser,
        logical_constraint_parser,
    ))(input)
}
