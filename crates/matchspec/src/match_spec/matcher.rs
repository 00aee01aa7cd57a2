use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use thiserror::Error;

/// Matches a string either exactly or by glob.
///
/// A value that contains a `*` or `?` is interpreted as a glob: `*` matches
/// any sequence of characters (including none) and `?` matches any single
/// character. For example `py38*` matches any string starting with `py38`
/// and `py3?_0` matches `py38_0` as well as `py39_0`. Any other value
/// matches only itself.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum StringMatcher {
    /// Match the string exactly
    Exact(String),

    /// Match the string by glob
    Glob(glob::Pattern),
}

impl StringMatcher {
    /// Match a string against this [`StringMatcher`].
    pub fn matches(&self, other: &str) -> bool {
        match self {
            StringMatcher::Exact(s) => s == other,
            StringMatcher::Glob(glob) => glob.matches(other),
        }
    }
}

/// Error when parsing a [`StringMatcher`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum StringMatcherParseError {
    /// Could not parse the string as a glob
    #[error("invalid glob: {glob}")]
    InvalidGlob {
        /// The invalid glob
        glob: String,
    },
}

impl FromStr for StringMatcher {
    type Err = StringMatcherParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(['*', '?']) {
            Ok(StringMatcher::Glob(glob::Pattern::new(s).map_err(
                |_err| StringMatcherParseError::InvalidGlob {
                    glob: s.to_string(),
                },
            )?))
        } else {
            Ok(StringMatcher::Exact(s.to_string()))
        }
    }
}

impl Display for StringMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StringMatcher::Exact(s) => write!(f, "{s}"),
            StringMatcher::Glob(s) => write!(f, "{}", s.as_str()),
        }
    }
}
