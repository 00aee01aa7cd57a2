use std::convert::TryFrom;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{digit1, multispace0},
    combinator::{all_consuming, map, opt, recognize},
    error::{context, convert_error, ContextError, ParseError, VerboseError},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::version_spec::LogicalOperator;

/// A representation of a hierarchy of version constraints e.g.
/// `1.3.4,>=5.0.1|(1.2.4,>=3.0.1)`.
#[derive(Debug, Eq, PartialEq)]
pub(super) enum VersionTree<'a> {
    Term(&'a str),
    Group(LogicalOperator, Vec<VersionTree<'a>>),
}

/// An error that occurred while splitting a version spec into its constraint
/// terms.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseVersionTreeError {
    /// The implementation could not make sense of the input
    #[error("{0}")]
    ParseError(String),
}

/// A parser that recognizes the characters of a version operator.
fn recognize_operator<'a, E: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    take_while1(|c| "=!<>~".contains(c))(input)
}

/// A parser that recognizes a version (epoch, segments and local part) but
/// does not actually parse it.
pub(crate) fn recognize_version<'a, E: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    /// Recognizes a run of version components (`1.2.3`, `1.2g.beta15`)
    fn recognize_components<'a, E: ParseError<&'a str>>(
        input: &'a str,
    ) -> IResult<&'a str, &'a str, E> {
        let component = take_while1(|c: char| c.is_alphanumeric());
        recognize(tuple((
            take_while1(|c: char| c.is_alphanumeric()),
            many0(preceded(
                opt(take_while1(|c: char| matches!(c, '.' | '-' | '_'))),
                component,
            )),
            // trailing underscore/dash (openssl-style versions)
            opt(take_while1(|c: char| matches!(c, '-' | '_'))),
        )))(input)
    }

    recognize(tuple((
        // Optional version epoch
        opt(terminated(digit1, tag("!"))),
        // Version components
        recognize_components,
        // Local version
        opt(preceded(tag("+"), recognize_components)),
    )))(input)
}

/// Recognize a version followed by a `.*` or `*`, or just a `*`.
pub(crate) fn recognize_version_with_star<'a, E: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    alt((
        // A version with an optional * or .*
        recognize(tuple((
            recognize_version,
            take_while(|c: char| c == '.' || c == '*'),
        ))),
        // Just a *
        tag("*"),
    ))(input)
}

/// A parser that recognizes a constraint but does not actually parse it.
pub(crate) fn recognize_constraint<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    alt((
        // Any (* or *.*)
        recognize(tuple((tag("*"), opt(tag(".*"))))),
        // A regex-looking constraint. These are not supported but they are
        // recognized here so the constraint parser can reject them with a
        // proper error.
        recognize(tuple((
            tag("^"),
            take_while(|c: char| !matches!(c, '$' | ',' | '|' | ')')),
            opt(tag("$")),
        ))),
        // Version with optional operator followed by an optional glob.
        recognize(preceded(
            opt(delimited(multispace0, recognize_operator, multispace0)),
            context("version", recognize_version_with_star),
        )),
    ))(input)
}

impl<'a> TryFrom<&'a str> for VersionTree<'a> {
    type Error = ParseVersionTreeError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        /// Parse a single term or a group surrounded by parenthesis.
        fn parse_term<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
            input: &'a str,
        ) -> IResult<&'a str, VersionTree<'a>, E> {
            alt((
                delimited(
                    terminated(tag("("), multispace0),
                    parse_or_group,
                    preceded(multispace0, tag(")")),
                ),
                map(recognize_constraint, VersionTree::Term),
            ))(input)
        }

        /// Given multiple version tree components, flatten the structure as
        /// much as possible.
        fn flatten_group(operator: LogicalOperator, args: Vec<VersionTree<'_>>) -> VersionTree<'_> {
            if args.len() == 1 {
                args.into_iter().next().unwrap()
            } else {
                let mut result = Vec::new();
                for term in args {
                    match term {
                        VersionTree::Group(op, mut others) if op == operator => {
                            result.append(&mut others);
                        }
                        term => result.push(term),
                    }
                }

                VersionTree::Group(operator, result)
            }
        }

        /// Parses a group of version constraints separated by commas.
        fn parse_and_group<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
            input: &'a str,
        ) -> IResult<&'a str, VersionTree<'a>, E> {
            let (rest, group) =
                separated_list1(delimited(multispace0, tag(","), multispace0), parse_term)(input)?;
            Ok((rest, flatten_group(LogicalOperator::And, group)))
        }

        /// Parses a group of version constraints separated by pipes.
        fn parse_or_group<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
            input: &'a str,
        ) -> IResult<&'a str, VersionTree<'a>, E> {
            let (rest, group) = separated_list1(
                delimited(multispace0, tag("|"), multispace0),
                parse_and_group,
            )(input)?;
            Ok((rest, flatten_group(LogicalOperator::Or, group)))
        }

        match all_consuming(parse_or_group::<VerboseError<&'a str>>)(input) {
            Ok((_, tree)) => Ok(tree),
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
                Err(ParseVersionTreeError::ParseError(convert_error(input, e)))
            }
            Err(nom::Err::Incomplete(_)) => {
                unreachable!("with all_consuming the only error can be Error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::{recognize_constraint, recognize_version, LogicalOperator, VersionTree};

    #[test]
    fn test_treeify() {
        use LogicalOperator::{And, Or};
        use VersionTree::{Group, Term};

        assert_eq!(VersionTree::try_from("1.2.3").unwrap(), Term("1.2.3"));

        assert_eq!(
            VersionTree::try_from("1.2.3,(4.5.6),<=7.8.9").unwrap(),
            Group(And, vec![Term("1.2.3"), Term("4.5.6"), Term("<=7.8.9")])
        );
        assert_eq!(
            VersionTree::try_from("((1.2.3)|(4.5.6))|<=7.8.9").unwrap(),
            Group(Or, vec![Term("1.2.3"), Term("4.5.6"), Term("<=7.8.9")])
        );

        assert_eq!(
            VersionTree::try_from("1.2.3,4.5.6|<=7.8.9").unwrap(),
            Group(
                Or,
                vec![
                    Group(And, vec![Term("1.2.3"), Term("4.5.6")]),
                    Term("<=7.8.9")
                ]
            )
        );

        assert_eq!(VersionTree::try_from("((((1.5))))").unwrap(), Term("1.5"));

        assert_eq!(
            VersionTree::try_from("((1.5|((1.6|1.7), 1.8), 1.9 |2.0))|2.1").unwrap(),
            Group(
                Or,
                vec![
                    Term("1.5"),
                    Group(
                        And,
                        vec![
                            Group(Or, vec![Term("1.6"), Term("1.7")]),
                            Term("1.8"),
                            Term("1.9")
                        ]
                    ),
                    Term("2.0"),
                    Term("2.1")
                ]
            )
        );
    }

    #[test]
    fn test_recognize_version() {
        type Err<'a> = nom::error::Error<&'a str>;

        assert_eq!(recognize_version::<Err<'_>>("3.8.9"), Ok(("", "3.8.9")));
        assert_eq!(recognize_version::<Err<'_>>("3"), Ok(("", "3")));
        assert_eq!(
            recognize_version::<Err<'_>>("1!3.8.9+3.4-alpha.2"),
            Ok(("", "1!3.8.9+3.4-alpha.2"))
        );
        assert_eq!(recognize_version::<Err<'_>>("3."), Ok((".", "3")));
        assert_eq!(recognize_version::<Err<'_>>("3.*"), Ok((".*", "3")));
        assert_eq!(recognize_version::<Err<'_>>("1.1_"), Ok(("", "1.1_")));

        let versions = [
            "1.0a1",
            "1.0a2.dev456",
            "1.0b2.post345.dev456",
            "1.0rc2",
            "1.0.post456",
            "1.2.rev33+123456",
            "1.2+123abc456",
            "1!1.0a12.dev456",
            "1!1.2+1234.abc",
        ];
        for version_str in versions {
            assert_eq!(
                recognize_version::<Err<'_>>(version_str),
                Ok(("", version_str))
            );
        }
    }

    #[test]
    fn test_recognize_constraint() {
        type Err<'a> = nom::error::Error<&'a str>;

        assert_eq!(recognize_constraint::<Err<'_>>("*"), Ok(("", "*")));
        assert_eq!(recognize_constraint::<Err<'_>>("3.8"), Ok(("", "3.8")));
        assert_eq!(recognize_constraint::<Err<'_>>("3.8*"), Ok(("", "3.8*")));
        assert_eq!(recognize_constraint::<Err<'_>>("3.8.*"), Ok(("", "3.8.*")));
        assert_eq!(
            recognize_constraint::<Err<'_>>(">=3.8.*"),
            Ok(("", ">=3.8.*"))
        );
        assert_eq!(
            recognize_constraint::<Err<'_>>(">=3.8.*<3.9"),
            Ok(("<3.9", ">=3.8.*"))
        );
        assert_eq!(
            recognize_constraint::<Err<'_>>(">=3.8.*,<3.9"),
            Ok((",<3.9", ">=3.8.*"))
        );
    }

    #[test]
    fn issue_missing_operator_separator() {
        assert!(VersionTree::try_from(">=3.8<3.9").is_err());
    }
}
