use std::{borrow::Cow, path::Path, str::FromStr};

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_until, take_while1},
    character::complete::{char, multispace0, one_of},
    combinator::{opt, recognize},
    error::{ContextError, ParseError, VerboseError},
    multi::{separated_list0, separated_list1},
    sequence::{delimited, preceded, separated_pair, terminated},
    Finish, IResult,
};
use smallvec::SmallVec;
use thiserror::Error;
use url::Url;

use super::matcher::{StringMatcher, StringMatcherParseError};
use super::{MatchSpec, NamelessMatchSpec};
use crate::channel::has_url_scheme;
use crate::digest::{parse_digest_from_hex, Md5, Sha256};
use crate::version_spec::version_tree::{recognize_constraint, recognize_version};
use crate::version_spec::{is_start_of_version_constraint, ParseVersionSpecError};
use crate::{
    BuildNumberSpec, ChannelSpec, InvalidPackageNameError, PackageName, ParseBuildNumberSpecError,
    ParseChannelError, VersionSpec,
};

/// An error that occurred while parsing a match spec. Carries the original
/// input, the byte offset of the offending fragment and the kind of failure.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("failed to parse match spec '{input}' at position {offset}: {kind}")]
pub struct ParseMatchSpecError {
    /// The input that failed to parse
    pub input: String,

    /// The byte offset of the fragment that caused the failure
    pub offset: usize,

    /// The kind of failure
    pub kind: ParseMatchSpecErrorKind,
}

/// The kind of parse error that occurred when parsing a match spec.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseMatchSpecErrorKind {
    /// The path of the package is not a conda archive
    #[error("invalid package path or url")]
    InvalidPackagePathOrUrl,

    /// The url of the package could not be parsed
    #[error("invalid package url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The file name of a package url does not follow the
    /// `<name>-<version>-<build>` convention
    #[error("'{0}' is not a conda package archive name")]
    InvalidArchiveName(String),

    /// Invalid bracket section in the match spec
    #[error("invalid bracket syntax in '{0}'")]
    InvalidBracket(String),

    /// An unknown key inside the brackets
    #[error("unknown bracket key '{0}'")]
    UnknownBracketKey(String),

    /// More than one bracket section in the match spec
    #[error("multiple bracket sections not allowed")]
    MultipleBracketSections,

    /// The name-aware grammar requires a leading package name
    #[error("missing package name")]
    MissingPackageName,

    /// The nameless grammar encountered what looks like a package name
    #[error("unexpected package name '{0}'")]
    UnexpectedPackageName(String),

    /// A url constraint is exclusive with every other constraint
    #[error("a url constraint cannot be combined with '{0}'")]
    UrlWithOtherConstraints(&'static str),

    /// Invalid number of colons in the channel prefix
    #[error("invalid number of colons")]
    InvalidNumberOfColons,

    /// The version and build part of the spec could not be split
    #[error("unable to parse version and build from '{0}'")]
    InvalidVersionAndBuild(String),

    /// Invalid version spec
    #[error(transparent)]
    InvalidVersionSpec(#[from] ParseVersionSpecError),

    /// Invalid build string matcher
    #[error(transparent)]
    InvalidStringMatcher(#[from] StringMatcherParseError),

    /// Invalid build number spec
    #[error(transparent)]
    InvalidBuildNumberSpec(#[from] ParseBuildNumberSpecError),

    /// Unable to parse a hash digest from hex
    #[error("'{value}' is not a valid {key} digest")]
    InvalidHashDigest {
        /// The bracket key of the digest (`md5` or `sha256`)
        key: &'static str,
        /// The offending value
        value: String,
    },

    /// Invalid channel in the match spec
    #[error(transparent)]
    InvalidChannel(#[from] ParseChannelError),

    /// The package name was invalid
    #[error(transparent)]
    InvalidPackageName(#[from] InvalidPackageNameError),
}

/// Returns the byte offset of `fragment` within `input` if it borrows from
/// it, otherwise the offset of the first occurrence of the fragment text.
fn offset_of(input: &str, fragment: &str) -> usize {
    let input_start = input.as_ptr() as usize;
    let fragment_start = fragment.as_ptr() as usize;
    if fragment_start >= input_start && fragment_start + fragment.len() <= input_start + input.len()
    {
        fragment_start - input_start
    } else {
        input.find(fragment).unwrap_or(0)
    }
}

/// Builds a [`ParseMatchSpecError`] for the given offending fragment.
fn spec_error(
    input: &str,
    fragment: &str,
    kind: impl Into<ParseMatchSpecErrorKind>,
) -> ParseMatchSpecError {
    ParseMatchSpecError {
        input: input.to_owned(),
        offset: offset_of(input, fragment),
        kind: kind.into(),
    }
}

impl FromStr for MatchSpec {
    type Err = ParseMatchSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Strips a comment from a match spec. A comment is preceded by a '#'
/// followed by the comment itself.
fn strip_comment(input: &str) -> &str {
    input.split_once('#').map_or(input, |(spec, _comment)| spec)
}

/// Returns true if the specified string represents a path to a conda package
/// archive.
fn is_archive_path(input: &str) -> bool {
    input.ends_with(".conda") || input.ends_with(".tar.bz2")
}

/// Extracts the package name from the file name of a package archive url.
/// Conda archives are named `<name>-<version>-<build><ext>`.
fn package_name_from_archive_url(url: &Url) -> Option<PackageName> {
    let file_name = url.path_segments().and_then(Iterator::last)?;
    let stem = file_name
        .strip_suffix(".conda")
        .or_else(|| file_name.strip_suffix(".tar.bz2"))?;
    let (rest, _build) = stem.rsplit_once('-')?;
    let (name, _version) = rest.rsplit_once('-')?;
    PackageName::try_from(name).ok()
}

/// An optimized data structure to store key value pairs in between a bracket
/// string `[key1=value1, key2=value2]`. The optimization stores two such
/// values on the stack and otherwise allocates a vector on the heap. Two is
/// chosen because that seems to be more than enough for most use cases.
type BracketVec<'a> = SmallVec<[(&'a str, &'a str); 2]>;

/// A parse combinator to filter whitespace in front of and after another
/// parser.
fn whitespace_enclosed<'a, F, O, E: ParseError<&'a str>>(
    mut inner: F,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
{
    move |input: &'a str| {
        let (input, _) = multispace0(input)?;
        let (input, o2) = inner(input)?;
        multispace0(input).map(|(i, _)| (i, o2))
    }
}

/// Parses the contents of a bracket list `[version="1,2,3", build=3]`.
fn parse_bracket_list(input: &str) -> Result<BracketVec<'_>, ParseMatchSpecErrorKind> {
    /// Parses a key in a bracket string
    fn parse_key(input: &str) -> IResult<&str, &str> {
        whitespace_enclosed(take_while1(|c: char| {
            c.is_alphanumeric() || c == '_' || c == '-'
        }))(input)
    }

    /// Parses a value in a bracket string.
    fn parse_value(input: &str) -> IResult<&str, &str> {
        whitespace_enclosed(alt((
            delimited(char('"'), take_until("\""), char('"')),
            delimited(char('\''), take_until("'"), char('\'')),
            take_till1(|c| c == ',' || c == ']' || c == '\'' || c == '"'),
        )))(input)
    }

    /// Parses a `key=value` pair
    fn parse_key_value(input: &str) -> IResult<&str, (&str, &str)> {
        separated_pair(parse_key, char('='), parse_value)(input)
    }

    /// Parses a list of `key=value` pairs separated by commas
    fn parse_key_value_list(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
        separated_list0(whitespace_enclosed(char(',')), parse_key_value)(input)
    }

    /// Parses an entire bracket string
    fn parse_bracket_list(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
        delimited(char('['), parse_key_value_list, char(']'))(input)
    }

    match parse_bracket_list(input).finish() {
        Ok((_remaining, values)) => Ok(values.into()),
        Err(nom::error::Error { .. }) => Err(ParseMatchSpecErrorKind::InvalidBracket(
            input.to_owned(),
        )),
    }
}

/// Strips the bracket part of the match spec, returning the rest of the
/// match spec and the contents of the brackets as a [`BracketVec`].
fn strip_brackets(input: &str) -> Result<(Cow<'_, str>, BracketVec<'_>), ParseMatchSpecErrorKind> {
    if let Some(matches) = lazy_regex::regex!(r#".*(?:(\[.*\]))"#).captures(input) {
        let bracket_str = matches.get(1).unwrap().as_str();
        let bracket_contents = parse_bracket_list(bracket_str)?;

        let input = if let Some(input) = input.strip_suffix(bracket_str) {
            Cow::Borrowed(input)
        } else {
            Cow::Owned(input.replace(bracket_str, ""))
        };

        Ok((input, bracket_contents))
    } else {
        Ok((input.into(), SmallVec::new()))
    }
}

/// Applies the constraints from a [`BracketVec`] to a
/// [`NamelessMatchSpec`].
fn apply_bracket_constraints(
    original: &str,
    brackets: BracketVec<'_>,
    spec: &mut NamelessMatchSpec,
) -> Result<(), ParseMatchSpecError> {
    for (key, value) in brackets {
        match key {
            "version" => {
                spec.version = Some(
                    VersionSpec::from_str(value)
                        .map_err(|e| spec_error(original, value, e))?,
                );
            }
            "build" => {
                spec.build = Some(
                    StringMatcher::from_str(value)
                        .map_err(|e| spec_error(original, value, e))?,
                );
            }
            "build_number" => {
                spec.build_number = Some(
                    BuildNumberSpec::from_str(value)
                        .map_err(|e| spec_error(original, value, e))?,
                );
            }
            "channel" => {
                spec.channel = Some(
                    ChannelSpec::from_str(value).map_err(|e| spec_error(original, value, e))?,
                );
            }
            "subdir" => {
                spec.subdir = Some(
                    StringMatcher::from_str(value)
                        .map_err(|e| spec_error(original, value, e))?,
                );
            }
            "md5" => {
                spec.md5 = Some(parse_digest_from_hex::<Md5>(value).ok_or_else(|| {
                    spec_error(
                        original,
                        value,
                        ParseMatchSpecErrorKind::InvalidHashDigest {
                            key: "md5",
                            value: value.to_owned(),
                        },
                    )
                })?);
            }
            "sha256" => {
                spec.sha256 = Some(parse_digest_from_hex::<Sha256>(value).ok_or_else(|| {
                    spec_error(
                        original,
                        value,
                        ParseMatchSpecErrorKind::InvalidHashDigest {
                            key: "sha256",
                            value: value.to_owned(),
                        },
                    )
                })?);
            }
            "fn" => spec.file_name = Some(value.to_owned()),
            "url" => {
                spec.url = Some(
                    Url::parse(value)
                        .map_err(|e| spec_error(original, value, ParseMatchSpecErrorKind::from(e)))?,
                );
            }
            "license" => spec.license = Some(value.to_owned()),
            _ => {
                return Err(spec_error(
                    original,
                    key,
                    ParseMatchSpecErrorKind::UnknownBracketKey(key.to_owned()),
                ))
            }
        }
    }

    Ok(())
}

/// Enforces that a spec with a url constraint has no other constraint set.
fn ensure_url_exclusive(
    original: &str,
    spec: &NamelessMatchSpec,
) -> Result<(), ParseMatchSpecError> {
    if spec.url.is_none() {
        return Ok(());
    }

    let conflicting = [
        ("version", spec.version.is_some()),
        ("build", spec.build.is_some()),
        ("build_number", spec.build_number.is_some()),
        ("fn", spec.file_name.is_some()),
        ("channel", spec.channel.is_some()),
        ("subdir", spec.subdir.is_some()),
        ("md5", spec.md5.is_some()),
        ("sha256", spec.sha256.is_some()),
        ("license", spec.license.is_some()),
    ]
    .into_iter()
    .find_map(|(key, set)| set.then_some(key));

    match conflicting {
        Some(key) => Err(spec_error(
            original,
            original,
            ParseMatchSpecErrorKind::UrlWithOtherConstraints(key),
        )),
        None => Ok(()),
    }
}

/// Strips the package name from the front of the input.
fn strip_package_name(input: &str) -> Result<(PackageName, &str), ParseMatchSpecErrorKind> {
    match take_while1::<_, _, nom::error::Error<&str>>(|c: char| {
        !c.is_whitespace() && !is_start_of_version_constraint(c)
    })(input)
    .finish()
    {
        Ok((rest, name)) => Ok((PackageName::from_str(name.trim())?, rest.trim())),
        Err(nom::error::Error { .. }) => Err(ParseMatchSpecErrorKind::MissingPackageName),
    }
}

/// Splits a string into version and build constraints.
fn split_version_and_build(
    input: &str,
) -> Result<(&str, Option<&str>), ParseMatchSpecErrorKind> {
    fn parse_version_constraint_or_group<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
        input: &'a str,
    ) -> IResult<&'a str, &'a str, E> {
        alt((
            delimited(tag("("), parse_version_group, tag(")")),
            recognize_constraint,
        ))(input)
    }

    fn parse_version_group<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
        input: &'a str,
    ) -> IResult<&'a str, &'a str, E> {
        recognize(separated_list1(
            whitespace_enclosed(one_of(",|")),
            parse_version_constraint_or_group,
        ))(input)
    }

    /// Special case handling of `=*`, `=1.2.3`, or `=1.2.3.*`
    fn parse_special_equality<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
        input: &'a str,
    ) -> IResult<&'a str, &'a str, E> {
        // Matches ".*" or "*" but not "."
        let version_glob = terminated(opt(tag(".")), tag("*"));

        // Matches a version followed by an optional version glob
        let version_followed_by_glob = terminated(recognize_version, opt(version_glob));

        // Just matches the glob operator ("*")
        let just_star = tag("*");

        recognize(preceded(
            tag("="),
            alt((version_followed_by_glob, just_star)),
        ))(input)
    }

    fn parse_version_and_build_separator<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
        input: &'a str,
    ) -> IResult<&'a str, &'a str, E> {
        terminated(
            alt((parse_special_equality, parse_version_group)),
            opt(one_of(" =")),
        )(input)
    }

    match parse_version_and_build_separator::<VerboseError<&str>>(input).finish() {
        Ok((rest, version)) => {
            let build_string = rest.trim();
            Ok((
                version.trim(),
                if build_string.is_empty() {
                    None
                } else {
                    Some(build_string)
                },
            ))
        }
        Err(VerboseError { .. }) => Err(ParseMatchSpecErrorKind::InvalidVersionAndBuild(
            input.to_owned(),
        )),
    }
}

/// In the nameless grammar a leading bare token followed by a version
/// constraint means the caller included a package name, e.g. `foo >=1.2`.
fn reject_unexpected_name(original: &str, input: &str) -> Result<(), ParseMatchSpecError> {
    let token_end = input
        .find(|c: char| c.is_whitespace() || is_start_of_version_constraint(c))
        .unwrap_or(input.len());
    let (token, rest) = input.split_at(token_end);
    if token.is_empty() {
        return Ok(());
    }

    // the token must look like a name, not a version or a glob
    if !token
        .bytes()
        .all(|b| matches!(b, b'a'..=b'z'|b'A'..=b'Z'|b'0'..=b'9'|b'-'|b'_'|b'.'))
    {
        return Ok(());
    }

    if rest.trim_start().starts_with(['>', '<', '!', '~']) {
        return Err(spec_error(
            original,
            token,
            ParseMatchSpecErrorKind::UnexpectedPackageName(token.to_owned()),
        ));
    }

    Ok(())
}

impl FromStr for NamelessMatchSpec {
    type Err = ParseMatchSpecError;

    fn from_str(original: &str) -> Result<Self, Self::Err> {
        let input = strip_comment(original).trim();

        // A bare url (or archive path) is a spec of its own
        if has_url_scheme(input) || is_archive_path(input) {
            return Ok(NamelessMatchSpec {
                url: Some(parse_url_or_path(original, input)?),
                ..NamelessMatchSpec::default()
            });
        }

        // Strip off the bracket portion
        let (input, brackets) =
            strip_brackets(input).map_err(|kind| spec_error(original, original, kind))?;
        let mut spec = NamelessMatchSpec::default();
        apply_bracket_constraints(original, brackets, &mut spec)?;

        // Get the version and optional build string
        let input = input.trim();
        if !input.is_empty() {
            if input.contains('[') {
                return Err(spec_error(
                    original,
                    input,
                    ParseMatchSpecErrorKind::MultipleBracketSections,
                ));
            }

            reject_unexpected_name(original, input)?;

            let (version_str, build_str) =
                split_version_and_build(input).map_err(|kind| spec_error(original, input, kind))?;

            let version_str = if version_str.find(char::is_whitespace).is_some() {
                Cow::Owned(version_str.replace(char::is_whitespace, ""))
            } else {
                Cow::Borrowed(version_str)
            };

            // Parse the version spec
            spec.version = Some(
                VersionSpec::from_str(version_str.as_ref())
                    .map_err(|e| spec_error(original, input, e))?,
            );

            if let Some(build) = build_str {
                spec.build = Some(parse_build_matcher(original, input, build)?);
            }
        }

        ensure_url_exclusive(original, &spec)?;
        Ok(spec)
    }
}

/// Parses the build string part of a spec. Build strings never contain
/// whitespace, a remainder with spaces means the spec itself is malformed.
fn parse_build_matcher(
    original: &str,
    version_and_build: &str,
    build: &str,
) -> Result<StringMatcher, ParseMatchSpecError> {
    if build.find(char::is_whitespace).is_some() {
        return Err(spec_error(
            original,
            build,
            ParseMatchSpecErrorKind::InvalidVersionAndBuild(version_and_build.to_owned()),
        ));
    }
    StringMatcher::from_str(build).map_err(|e| spec_error(original, build, e))
}

/// Parses the input as a url, converting a local archive path into a
/// `file://` url.
fn parse_url_or_path(original: &str, input: &str) -> Result<Url, ParseMatchSpecError> {
    if has_url_scheme(input) {
        Url::parse(input).map_err(|e| spec_error(original, input, ParseMatchSpecErrorKind::from(e)))
    } else {
        Url::from_file_path(Path::new(input))
            .map_err(|()| spec_error(original, input, ParseMatchSpecErrorKind::InvalidPackagePathOrUrl))
    }
}

/// Parses a conda match spec.
fn parse(original: &str) -> Result<MatchSpec, ParseMatchSpecError> {
    // Step 1. Strip the comment
    let input = strip_comment(original).trim();
    if input.is_empty() {
        return Err(spec_error(
            original,
            input,
            ParseMatchSpecErrorKind::MissingPackageName,
        ));
    }

    // Step 2. Is the spec a url to a package archive? The package name is
    // then derived from the archive file name.
    if has_url_scheme(input) || is_archive_path(input) {
        let url = parse_url_or_path(original, input)?;
        let name = package_name_from_archive_url(&url).ok_or_else(|| {
            spec_error(
                original,
                input,
                ParseMatchSpecErrorKind::InvalidArchiveName(input.to_owned()),
            )
        })?;
        return Ok(MatchSpec::new(
            name,
            NamelessMatchSpec {
                url: Some(url),
                ..NamelessMatchSpec::default()
            },
        ));
    }

    // Step 3. Strip off the bracket portion
    let (input, brackets) =
        strip_brackets(input).map_err(|kind| spec_error(original, original, kind))?;
    let mut spec = NamelessMatchSpec::default();
    apply_bracket_constraints(original, brackets, &mut spec)?;

    // Step 4. Strip off the '::' separated channel and namespace
    let mut input_split = input.split(':').fuse();
    let (input, namespace, channel_str) = match (
        input_split.next(),
        input_split.next(),
        input_split.next(),
        input_split.next(),
    ) {
        (Some(input), None, _, _) => (input, None, None),
        (Some(namespace), Some(input), None, _) => (input, Some(namespace), None),
        (Some(channel_str), Some(namespace), Some(input), None) => {
            (input, Some(namespace), Some(channel_str))
        }
        _ => {
            return Err(spec_error(
                original,
                original,
                ParseMatchSpecErrorKind::InvalidNumberOfColons,
            ))
        }
    };

    spec.namespace = namespace
        .map(str::trim)
        .filter(|namespace| !namespace.is_empty())
        .map(ToOwned::to_owned)
        .or(spec.namespace.take());

    if let Some(channel_str) = channel_str {
        if let Some((channel, subdir)) = channel_str.rsplit_once('/') {
            spec.channel = Some(
                ChannelSpec::from_str(channel).map_err(|e| spec_error(original, channel, e))?,
            );
            spec.subdir = Some(
                StringMatcher::from_str(subdir).map_err(|e| spec_error(original, subdir, e))?,
            );
        } else {
            spec.channel = Some(
                ChannelSpec::from_str(channel_str)
                    .map_err(|e| spec_error(original, channel_str, e))?,
            );
        }
    }

    // Step 5. Strip off the package name from the input
    let (name, input) =
        strip_package_name(input).map_err(|kind| spec_error(original, input, kind))?;

    // Step 6. The remainder is the version and optional build string
    let input = input.trim();
    if !input.is_empty() {
        if input.contains('[') {
            return Err(spec_error(
                original,
                input,
                ParseMatchSpecErrorKind::MultipleBracketSections,
            ));
        }

        let (version_str, build_str) =
            split_version_and_build(input).map_err(|kind| spec_error(original, input, kind))?;

        let version_str = if version_str.find(char::is_whitespace).is_some() {
            Cow::Owned(version_str.replace(char::is_whitespace, ""))
        } else {
            Cow::Borrowed(version_str)
        };

        // Special case handling for version strings that start with `=`.
        let version_str = if let (Some(version_str), true) =
            (version_str.strip_prefix("=="), build_str.is_none())
        {
            // If the version starts with `==` and there is no build string we
            // strip the `==` part.
            Cow::Borrowed(version_str)
        } else if let Some(version_str_part) = version_str.strip_prefix('=') {
            let not_a_group = !version_str_part.contains(['=', ',', '|']);
            if not_a_group {
                // If the version starts with `=` and is not part of a group
                // (e.g. 1|2) it is a prefix match unless a glob or build
                // string is already present.
                if build_str.is_none() && !version_str_part.ends_with('*') {
                    Cow::Owned(format!("{version_str_part}*"))
                } else {
                    Cow::Borrowed(version_str_part)
                }
            } else {
                // The version string is part of a group, return it unstripped
                version_str
            }
        } else {
            version_str
        };

        // Parse the version spec
        spec.version = Some(
            VersionSpec::from_str(version_str.as_ref())
                .map_err(|e| spec_error(original, input, e))?,
        );

        if let Some(build) = build_str {
            spec.build = Some(parse_build_matcher(original, input, build)?);
        }
    }

    ensure_url_exclusive(original, &spec)?;
    Ok(MatchSpec::new(name, spec))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use assert_matches::assert_matches;
    use smallvec::smallvec;

    use super::{
        parse_bracket_list, split_version_and_build, strip_brackets, BracketVec, MatchSpec,
        ParseMatchSpecError, ParseMatchSpecErrorKind,
    };
    use crate::digest::{parse_digest_from_hex, Md5, Sha256};
    use crate::{BuildNumberSpec, ChannelSpec, NamelessMatchSpec, VersionSpec};

    fn kind(result: Result<MatchSpec, ParseMatchSpecError>) -> ParseMatchSpecErrorKind {
        result.expect_err("expected parsing to fail").kind
    }

    #[test]
    fn test_strip_brackets() {
        let result = strip_brackets(r#"bla [version="1.2.3"]"#).unwrap();
        assert_eq!(result.0, "bla ");
        let expected: BracketVec<'_> = smallvec![("version", "1.2.3")];
        assert_eq!(result.1, expected);

        let result = strip_brackets(r#"bla [version='1.2.3']"#).unwrap();
        assert_eq!(result.0, "bla ");
        let expected: BracketVec<'_> = smallvec![("version", "1.2.3")];
        assert_eq!(result.1, expected);

        let result = strip_brackets(r#"conda-forge::bla[version=1]"#).unwrap();
        assert_eq!(result.0, "conda-forge::bla");
        let expected: BracketVec<'_> = smallvec![("version", "1")];
        assert_eq!(result.1, expected);

        let result = strip_brackets(r#"bla [version="1.2.3", build_number=1]"#).unwrap();
        assert_eq!(result.0, "bla ");
        let expected: BracketVec<'_> = smallvec![("version", "1.2.3"), ("build_number", "1")];
        assert_eq!(result.1, expected);

        assert_matches!(
            strip_brackets(r#"bla [version="1.2.3", build_number=]"#),
            Err(ParseMatchSpecErrorKind::InvalidBracket(_))
        );
        assert_matches!(
            strip_brackets(r#"bla [version="1.2.3, build_number=1]"#),
            Err(ParseMatchSpecErrorKind::InvalidBracket(_))
        );
    }

    #[test]
    fn test_parse_bracket_list() {
        assert_eq!(
            parse_bracket_list("[version=1.0.1]").unwrap().as_ref(),
            &[("version", "1.0.1")]
        );
        assert_eq!(
            parse_bracket_list("[version='1.0.1']").unwrap().as_ref(),
            &[("version", "1.0.1")]
        );
        assert_eq!(
            parse_bracket_list("[version=\"1.0.1\"]").unwrap().as_ref(),
            &[("version", "1.0.1")]
        );
        assert_eq!(
            parse_bracket_list("[version=1.0.1, build=3]")
                .unwrap()
                .as_ref(),
            &[("version", "1.0.1"), ("build", "3")]
        );
        assert_eq!(
            parse_bracket_list("[build=\"py2*\"]").unwrap().as_ref(),
            &[("build", "py2*")]
        );
        assert_eq!(
            parse_bracket_list("[version=\"1.3,2.0\"]")
                .unwrap()
                .as_ref(),
            &[("version", "1.3,2.0")]
        );
    }

    #[test]
    fn test_split_version_and_build() {
        assert_matches!(
            split_version_and_build("==1.0=py27_0"),
            Ok(("==1.0", Some("py27_0")))
        );
        assert_matches!(split_version_and_build("=*=cuda"), Ok(("=*", Some("cuda"))));
        assert_matches!(
            split_version_and_build("=1.2.3 0"),
            Ok(("=1.2.3", Some("0")))
        );
        assert_matches!(split_version_and_build("1.2.3=0"), Ok(("1.2.3", Some("0"))));
        assert_matches!(
            split_version_and_build(">=1.0 , < 2.0 py34_0"),
            Ok((">=1.0 , < 2.0", Some("py34_0")))
        );
        assert_matches!(
            split_version_and_build(">=1.0 , < 2.0 =py34_0"),
            Ok((">=1.0 , < 2.0", Some("=py34_0")))
        );
        assert_matches!(split_version_and_build("=1.2.3 "), Ok(("=1.2.3", None)));
        assert_matches!(
            split_version_and_build(">1.8,<2|==1.7"),
            Ok((">1.8,<2|==1.7", None))
        );
        assert_matches!(
            split_version_and_build("* openblas_0"),
            Ok(("*", Some("openblas_0")))
        );
        assert_matches!(split_version_and_build("* *"), Ok(("*", Some("*"))));
        assert_matches!(
            split_version_and_build(">=1!164.3095,<1!165"),
            Ok((">=1!164.3095,<1!165", None))
        );
    }

    #[test]
    fn test_nameless_match_spec() {
        let spec = NamelessMatchSpec::from_str("3.8.* *_cpython").unwrap();
        assert_eq!(spec.version, Some(VersionSpec::from_str("3.8.*").unwrap()));
        assert_eq!(spec.build, Some("*_cpython".parse().unwrap()));

        let spec = NamelessMatchSpec::from_str("1.0 py27_0[fn=\"bla\"]").unwrap();
        assert_eq!(spec.version, Some(VersionSpec::from_str("==1.0").unwrap()));
        assert_eq!(spec.build, Some("py27_0".parse().unwrap()));
        assert_eq!(spec.file_name, Some("bla".to_owned()));

        // the nameless grammar has no `=`-prefix normalization, `=1.0` is a
        // plain prefix match
        let spec = NamelessMatchSpec::from_str("=1.0 py27_0").unwrap();
        assert_eq!(spec.version, Some(VersionSpec::from_str("1.0.*").unwrap()));
        assert_eq!(spec.build, Some("py27_0".parse().unwrap()));

        let spec = NamelessMatchSpec::from_str("").unwrap();
        assert_eq!(spec, NamelessMatchSpec::default());
    }

    #[test]
    fn test_nameless_rejects_names() {
        let err = NamelessMatchSpec::from_str("numpy >=1.2").expect_err("names are not allowed");
        assert_eq!(
            err.kind,
            ParseMatchSpecErrorKind::UnexpectedPackageName("numpy".to_owned())
        );
        assert_eq!(err.offset, 0);

        let err = NamelessMatchSpec::from_str("numpy>=1.2").expect_err("names are not allowed");
        assert_eq!(
            err.kind,
            ParseMatchSpecErrorKind::UnexpectedPackageName("numpy".to_owned())
        );
    }

    #[test]
    fn test_match_spec_basics() {
        let spec = MatchSpec::from_str("numpy 1.7").unwrap();
        assert_eq!(spec.name.as_normalized(), "numpy");
        assert_eq!(spec.version, Some(VersionSpec::from_str("1.7").unwrap()));

        let spec = MatchSpec::from_str("numpy=1.7=py27_0").unwrap();
        assert_eq!(spec.version, Some(VersionSpec::from_str("1.7").unwrap()));
        assert_eq!(spec.build, Some("py27_0".parse().unwrap()));

        let spec = MatchSpec::from_str("numpy==1.7").unwrap();
        assert_eq!(spec.version, Some(VersionSpec::from_str("==1.7").unwrap()));

        let spec = MatchSpec::from_str("numpy=1.7").unwrap();
        assert_eq!(spec.version, Some(VersionSpec::from_str("1.7.*").unwrap()));

        let spec = MatchSpec::from_str("x264 >=1!164.3095,<1!165").unwrap();
        assert_eq!(spec.name.as_normalized(), "x264");
        assert_eq!(
            spec.version,
            Some(VersionSpec::from_str(">=1!164.3095,<1!165").unwrap())
        );

        let spec = MatchSpec::from_str("blas *.* mkl").unwrap();
        assert_eq!(spec.version, Some(VersionSpec::from_str("*").unwrap()));
        assert_eq!(spec.build, Some("mkl".parse().unwrap()));
    }

    #[test]
    fn test_match_spec_channel() {
        let spec = MatchSpec::from_str("conda-forge::foo[version=\"1.0.*\"]").unwrap();
        assert_eq!(spec.name.as_normalized(), "foo");
        assert_eq!(spec.version, Some(VersionSpec::from_str("1.0.*").unwrap()));
        assert_eq!(
            spec.channel,
            Some(ChannelSpec::Name("conda-forge".to_owned()))
        );

        let spec = MatchSpec::from_str("conda-forge/linux-64::foo 1.0.*").unwrap();
        assert_eq!(
            spec.channel,
            Some(ChannelSpec::Name("conda-forge".to_owned()))
        );
        assert_eq!(spec.subdir, Some("linux-64".parse().unwrap()));

        let spec = MatchSpec::from_str("ns:foo").unwrap();
        assert_eq!(spec.namespace, Some("ns".to_owned()));
        assert_eq!(spec.name.as_normalized(), "foo");

        let spec = MatchSpec::from_str("conda-forge:ns:foo").unwrap();
        assert_eq!(spec.namespace, Some("ns".to_owned()));
        assert_eq!(
            spec.channel,
            Some(ChannelSpec::Name("conda-forge".to_owned()))
        );

        assert_eq!(
            kind(MatchSpec::from_str("a:b:c:d:e")),
            ParseMatchSpecErrorKind::InvalidNumberOfColons
        );
    }

    #[test]
    fn test_match_spec_brackets() {
        let spec =
            MatchSpec::from_str(r#"conda-forge::foo[version=1.0.*, build_number=">6"]"#).unwrap();
        assert_eq!(spec.name.as_normalized(), "foo");
        assert_eq!(spec.version, Some(VersionSpec::from_str("1.0.*").unwrap()));
        assert_eq!(
            spec.build_number,
            Some(BuildNumberSpec::from_str(">6").unwrap())
        );

        let spec = MatchSpec::from_str("foo[subdir=\"linux-*\"]").unwrap();
        assert_eq!(spec.subdir, Some("linux-*".parse().unwrap()));
    }

    #[test]
    fn test_hash_spec() {
        assert_matches!(
            kind(MatchSpec::from_str("conda-forge::foo[md5=1234567890]")),
            ParseMatchSpecErrorKind::InvalidHashDigest { key: "md5", .. }
        );
        assert_matches!(
            kind(MatchSpec::from_str("conda-forge::foo[sha256=1234567890]")),
            ParseMatchSpecErrorKind::InvalidHashDigest { key: "sha256", .. }
        );

        let spec = MatchSpec::from_str("conda-forge::foo[sha256=315f5bdb76d078c43b8ac0064e4a0164612b1fce77c869345bfc94c75894edd3]").unwrap();
        assert_eq!(
            spec.sha256,
            Some(
                parse_digest_from_hex::<Sha256>(
                    "315f5bdb76d078c43b8ac0064e4a0164612b1fce77c869345bfc94c75894edd3"
                )
                .unwrap()
            )
        );

        let spec =
            MatchSpec::from_str("conda-forge::foo[md5=8b1a9953c4611296a827abf8c47804d7]").unwrap();
        assert_eq!(
            spec.md5,
            Some(parse_digest_from_hex::<Md5>("8b1a9953c4611296a827abf8c47804d7").unwrap())
        );
    }

    #[test]
    fn test_unknown_key_is_rejected_with_position() {
        let err = MatchSpec::from_str("numpy[bogus=1]").expect_err("bogus is not a valid key");
        assert_eq!(
            err.kind,
            ParseMatchSpecErrorKind::UnknownBracketKey("bogus".to_owned())
        );
        assert_eq!(err.offset, 6);
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_url_is_exclusive_with_other_constraints() {
        assert_matches!(
            kind(MatchSpec::from_str(
                "numpy[url=\"https://example.com/numpy-1.2.0-py38_0.conda\", version=\"1.2\"]"
            )),
            ParseMatchSpecErrorKind::UrlWithOtherConstraints("version")
        );
        assert_matches!(
            kind(MatchSpec::from_str(
                "numpy[md5=8b1a9953c4611296a827abf8c47804d7, url=\"https://example.com/numpy-1.2.0-py38_0.conda\"]"
            )),
            ParseMatchSpecErrorKind::UrlWithOtherConstraints("md5")
        );

        // a url on its own is fine
        let spec = MatchSpec::from_str(
            "numpy[url=\"https://example.com/numpy-1.2.0-py38_0.conda\"]",
        )
        .unwrap();
        assert!(spec.url.is_some());
    }

    #[test]
    fn test_url_specs() {
        let spec = MatchSpec::from_str(
            "https://conda.anaconda.org/conda-forge/linux-64/libzlib-1.2.13-h166bdaf_4.tar.bz2",
        )
        .unwrap();
        assert_eq!(spec.name.as_normalized(), "libzlib");
        assert!(spec.url.is_some());
        assert!(spec.version.is_none());

        let spec = NamelessMatchSpec::from_str(
            "https://conda.anaconda.org/conda-forge/linux-64/libzlib-1.2.13-h166bdaf_4.conda",
        )
        .unwrap();
        assert!(spec.url.is_some());

        assert_matches!(
            kind(MatchSpec::from_str("https://example.com/not-an-archive.zip")),
            ParseMatchSpecErrorKind::InvalidArchiveName(_)
        );
    }

    #[test]
    fn test_missing_package_name() {
        assert_matches!(
            kind(MatchSpec::from_str("")),
            ParseMatchSpecErrorKind::MissingPackageName
        );
        assert_matches!(
            kind(MatchSpec::from_str(">=1.2")),
            ParseMatchSpecErrorKind::MissingPackageName
        );
    }

    #[test]
    fn test_multiple_bracket_sections() {
        assert_matches!(
            kind(MatchSpec::from_str("numpy[build=3][version=1.2]")),
            ParseMatchSpecErrorKind::MultipleBracketSections
        );
    }

    #[test]
    fn test_comments_are_stripped() {
        let spec = MatchSpec::from_str("numpy >=1.2 # the fast array library").unwrap();
        assert_eq!(spec.name.as_normalized(), "numpy");
        assert_eq!(spec.version, Some(VersionSpec::from_str(">=1.2").unwrap()));
    }

    #[test]
    fn test_invalid_version_and_build() {
        assert_matches!(
            kind(MatchSpec::from_str("numpy 1.2.3 py38_0 extra")),
            ParseMatchSpecErrorKind::InvalidVersionAndBuild(_)
        );
    }
}
