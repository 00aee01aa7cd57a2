//! Parsing of the build number spec.

use std::str::FromStr;

use nom::{bytes::complete::take_while1, character::complete::digit1, Finish, IResult};
use thiserror::Error;

use super::{BuildNumber, BuildNumberSpec, OrdOperator};

impl FromStr for BuildNumberSpec {
    type Err = ParseBuildNumberSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parser(s).finish()? {
            ("", spec) => Ok(spec),
            (_, _) => Err(ParseBuildNumberSpecError::ExpectedEof),
        }
    }
}

impl BuildNumberSpec {
    /// Parses a build number spec: an optional operator preceding a whole
    /// number.
    pub fn parser(input: &str) -> IResult<&str, BuildNumberSpec, ParseBuildNumberSpecError> {
        // Parse the optional preceding operator
        let (input, op) = match OrdOperator::parser(input) {
            Err(
                nom::Err::Failure(ParseOrdOperatorError::InvalidOperator(op))
                | nom::Err::Error(ParseOrdOperatorError::InvalidOperator(op)),
            ) => {
                return Err(nom::Err::Failure(
                    ParseBuildNumberSpecError::InvalidOperator(
                        ParseOrdOperatorError::InvalidOperator(op),
                    ),
                ))
            }
            Err(nom::Err::Error(_)) => (input, None),
            Ok((rest, op)) => (rest, Some(op)),
            Err(nom::Err::Incomplete(_)) => unreachable!("not streaming"),
            Err(nom::Err::Failure(_)) => {
                unreachable!("parser only emits InvalidOperator as a failure")
            }
        };

        let (rest, build_number) = digit1(input)
            .map(|(rest, digits): (&str, &str)| {
                (
                    rest,
                    digits
                        .parse::<BuildNumber>()
                        .expect("nom found at least 1 digit(s)"),
                )
            })
            .map_err(|_err: nom::Err<nom::error::Error<&str>>| {
                nom::Err::Error(ParseBuildNumberSpecError::InvalidBuildNumber(
                    input.to_owned(),
                ))
            })?;

        Ok((
            rest,
            BuildNumberSpec::new(op.unwrap_or(OrdOperator::Eq), build_number),
        ))
    }
}

/// Possible errors when parsing the [`OrdOperator`] which precedes the digits
/// in a build number spec.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseOrdOperatorError {
    /// Operator symbols were captured, but not interpretable as an
    /// [`OrdOperator`]
    #[error("invalid operator '{0}'")]
    InvalidOperator(String),

    /// No symbol sequence found for [`OrdOperator`]s, callers should expect
    /// explicit operators
    #[error("expected comparison operator")]
    ExpectedOperator,

    /// There was data after an operator was read, callers should handle this
    /// if they expect input to end with the operator
    #[error("expected EOF")]
    ExpectedEof,
}

/// Composition of possible errors when parsing the spec for build numbers.
#[allow(missing_docs)]
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseBuildNumberSpecError {
    #[error("'{0}' is not a valid build number")]
    InvalidBuildNumber(String),
    #[error("invalid build number constraint: {0}")]
    InvalidOperator(#[source] ParseOrdOperatorError),
    #[error("expected EOF")]
    ExpectedEof,
}

impl FromStr for OrdOperator {
    type Err = ParseOrdOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parser(s).finish()? {
            ("", op) => Ok(op),
            (_, _) => Err(ParseOrdOperatorError::ExpectedEof),
        }
    }
}

impl OrdOperator {
    /// Parses an operator representing [`PartialOrd`] compares, returns an
    /// error if the operator is not recognized or not found.
    fn parser(input: &str) -> IResult<&str, OrdOperator, ParseOrdOperatorError> {
        // Take anything that looks like an operator.
        let (rest, operator_str) = take_while1(|c| "=!<>".contains(c))(input).map_err(
            |_err: nom::Err<nom::error::Error<&str>>| {
                nom::Err::Error(ParseOrdOperatorError::ExpectedOperator)
            },
        )?;

        let op = match operator_str {
            "==" => OrdOperator::Eq,
            "!=" => OrdOperator::Ne,
            "<=" => OrdOperator::Le,
            ">=" => OrdOperator::Ge,
            "<" => OrdOperator::Lt,
            ">" => OrdOperator::Gt,
            _ => {
                return Err(nom::Err::Failure(ParseOrdOperatorError::InvalidOperator(
                    operator_str.to_string(),
                )))
            }
        };

        Ok((rest, op))
    }
}
