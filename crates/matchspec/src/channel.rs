use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use url::Url;

/// A reference to a channel in a match spec, either by name (e.g.
/// `conda-forge`) or by base url.
///
/// Resolving a channel name to an actual url requires configuration (the
/// channel alias, authentication, mirrors) that lives outside this crate.
/// The matching performed here is therefore purely textual, see
/// [`ChannelSpec::matches`].
#[derive(Debug, Clone, Eq, PartialEq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum ChannelSpec {
    /// A named channel
    Name(String),

    /// A base url
    Url(Url),
}

/// An error that occurred while parsing a [`ChannelSpec`].
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseChannelError {
    /// The channel was empty
    #[error("empty channel")]
    Empty,

    /// The channel looked like a url but could not be parsed as one
    #[error("invalid channel url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Returns true if the string starts with a url scheme (e.g. `https://`).
pub(crate) fn has_url_scheme(input: &str) -> bool {
    lazy_regex::regex_is_match!(r"^[a-zA-Z][a-zA-Z0-9+.-]*://", input)
}

impl FromStr for ChannelSpec {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err(ParseChannelError::Empty)
        } else if has_url_scheme(s) {
            // normalize away a trailing slash so display and parse agree
            Ok(ChannelSpec::Url(Url::parse(s.trim_end_matches('/'))?))
        } else {
            Ok(ChannelSpec::Name(s.trim_end_matches('/').to_owned()))
        }
    }
}

impl Display for ChannelSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelSpec::Name(name) => f.write_str(name),
            ChannelSpec::Url(url) => f.write_str(url.as_str().trim_end_matches('/')),
        }
    }
}

impl ChannelSpec {
    /// Returns true if the given channel string of a package record belongs
    /// to this channel.
    ///
    /// A named spec matches a record channel that is the name itself,
    /// `name/subdir`, or a url whose first path segment is the name. A url
    /// spec matches its own base url and anything below it, so a spec
    /// without a subdir component matches every subdir of the channel.
    pub fn matches(&self, channel: &str) -> bool {
        let channel = channel.trim_end_matches('/');
        match self {
            ChannelSpec::Name(name) => {
                if channel == name {
                    return true;
                }
                if let Some((_, path)) = channel.split_once("://") {
                    // first segment after the host
                    path.split('/').nth(1) == Some(name)
                } else {
                    channel.split('/').next() == Some(name.as_str())
                }
            }
            ChannelSpec::Url(url) => {
                let base = url.as_str().trim_end_matches('/');
                channel == base
                    || channel
                        .strip_prefix(base)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::ChannelSpec;

    #[test]
    fn parse_channel_spec() {
        assert_eq!(
            ChannelSpec::from_str("conda-forge").unwrap(),
            ChannelSpec::Name("conda-forge".to_owned())
        );
        assert_eq!(
            ChannelSpec::from_str("https://conda.anaconda.org/conda-forge/").unwrap(),
            ChannelSpec::Url("https://conda.anaconda.org/conda-forge".parse().unwrap())
        );
        assert!(ChannelSpec::from_str("").is_err());
    }

    #[test]
    fn name_matches_names_and_urls() {
        let spec = ChannelSpec::from_str("conda-forge").unwrap();
        assert!(spec.matches("conda-forge"));
        assert!(spec.matches("conda-forge/"));
        assert!(spec.matches("conda-forge/linux-64"));
        assert!(spec.matches("https://conda.anaconda.org/conda-forge"));
        assert!(spec.matches("https://conda.anaconda.org/conda-forge/linux-64"));
        assert!(!spec.matches("bioconda"));
        assert!(!spec.matches("https://conda.anaconda.org/bioconda/linux-64"));
    }

    #[test]
    fn url_matches_prefixes() {
        let spec = ChannelSpec::from_str("https://conda.anaconda.org/conda-forge").unwrap();
        assert!(spec.matches("https://conda.anaconda.org/conda-forge"));
        assert!(spec.matches("https://conda.anaconda.org/conda-forge/"));
        assert!(spec.matches("https://conda.anaconda.org/conda-forge/linux-64"));
        assert!(!spec.matches("https://conda.anaconda.org/conda-forge-extra"));
        assert!(!spec.matches("https://conda.anaconda.org/bioconda"));
    }

    #[test]
    fn display_roundtrips() {
        for input in ["conda-forge", "https://conda.anaconda.org/conda-forge"] {
            let spec = ChannelSpec::from_str(input).unwrap();
            assert_eq!(spec.to_string(), input);
            assert_eq!(ChannelSpec::from_str(&spec.to_string()).unwrap(), spec);
        }
    }
}
