//! A [`MatchSpec`] is, fundamentally, a query language for conda packages.
//! Any of the fields that comprise a [`crate::PackageRecord`] can be used to
//! compose a [`MatchSpec`]. A [`NamelessMatchSpec`] is the same constraint
//! set without the package name, for use where the name is already known from
//! context (e.g. as the key of a mapping).

pub(crate) mod matcher;
pub(crate) mod parse;

use std::{
    fmt,
    fmt::{Display, Formatter},
    ops::Deref,
};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use url::Url;

use crate::{
    BuildNumberSpec, ChannelSpec, InvalidPackageNameError, Md5Hash, PackageName, PackageRecord,
    Sha256Hash, Version, VersionSpec,
};
use matcher::StringMatcher;

/// The constraint part of a match spec: each field is either unconstrained
/// (`None`) or holds a predicate over the corresponding [`PackageRecord`]
/// field. An unconstrained field matches any value, including the absence of
/// a value on the record.
///
/// When the `url` field is set all other fields must be unset; the parser
/// rejects a spec that combines a url with any other constraint.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct NamelessMatchSpec {
    /// The version spec of the package (e.g. `1.2.3`, `>=1.2.3`,
    /// `1.2.*`)
    pub version: Option<VersionSpec>,

    /// The build string of the package (e.g. `py37_0`, `py37h6de7cb9_0`)
    pub build: Option<StringMatcher>,

    /// The build number of the package
    pub build_number: Option<BuildNumberSpec>,

    /// Match the specific filename of the package
    pub file_name: Option<String>,

    /// The channel of the package
    pub channel: Option<ChannelSpec>,

    /// The subdir of the channel
    pub subdir: Option<StringMatcher>,

    /// The namespace of the package (currently not used)
    pub namespace: Option<String>,

    /// The md5 hash of the package
    pub md5: Option<Md5Hash>,

    /// The sha256 hash of the package
    pub sha256: Option<Sha256Hash>,

    /// The url of the package. When set, all other constraints are bypassed:
    /// the spec matches only a record with exactly this source url.
    pub url: Option<Url>,

    /// The license of the package
    pub license: Option<String>,
}

/// A [`NamelessMatchSpec`] with the name of the package it constrains.
///
/// The name is required; the remaining constraint set lives in
/// [`MatchSpec::spec`] and is shared with [`NamelessMatchSpec`] so the
/// matching algorithm exists only once. The spec fields are reachable
/// directly through [`Deref`].
#[derive(Debug, Clone, Eq, PartialEq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct MatchSpec {
    /// The name of the package
    pub name: PackageName,

    /// The constraints on the package
    pub spec: NamelessMatchSpec,
}

impl Deref for MatchSpec {
    type Target = NamelessMatchSpec;

    fn deref(&self) -> &Self::Target {
        &self.spec
    }
}

impl MatchSpec {
    /// Constructs a new `MatchSpec` from a package name and a constraint
    /// set.
    pub fn new(name: PackageName, spec: NamelessMatchSpec) -> Self {
        Self { name, spec }
    }

    /// Constructs a new `MatchSpec` from a package name string and a
    /// constraint set. Fails if the name is empty or contains characters
    /// that are not allowed in a package name.
    pub fn from_nameless(
        name: &str,
        spec: NamelessMatchSpec,
    ) -> Result<Self, InvalidPackageNameError> {
        Ok(Self {
            name: name.parse()?,
            spec,
        })
    }

    /// Decomposes this instance into the name and the nameless constraint
    /// set.
    pub fn into_nameless(self) -> (PackageName, NamelessMatchSpec) {
        (self.name, self.spec)
    }

    /// Match a [`MatchSpec`] against a [`PackageRecord`].
    pub fn matches(&self, record: &PackageRecord) -> bool {
        // A url constraint bypasses every other field, including the name.
        if self.spec.url.is_none() && self.name != record.name {
            return false;
        }
        self.spec.matches(record)
    }
}

impl NamelessMatchSpec {
    /// Constructs a `NamelessMatchSpec` from a [`MatchSpec`] by dropping its
    /// name.
    pub fn from_match_spec(spec: &MatchSpec) -> Self {
        spec.spec.clone()
    }

    /// Match a [`NamelessMatchSpec`] against a [`PackageRecord`].
    pub fn matches(&self, record: &PackageRecord) -> bool {
        if let Some(url) = &self.url {
            return record.url.as_ref() == Some(url);
        }

        if let Some(spec) = &self.version {
            if !spec.matches(&record.version) {
                return false;
            }
        }

        if let Some(build) = &self.build {
            if !build.matches(&record.build) {
                return false;
            }
        }

        if let Some(build_number) = &self.build_number {
            if !build_number.matches(&record.build_number) {
                return false;
            }
        }

        if let Some(subdir) = &self.subdir {
            if !subdir.matches(&record.subdir) {
                return false;
            }
        }

        if let Some(channel) = &self.channel {
            match &record.channel {
                Some(record_channel) => {
                    if !channel.matches(record_channel) {
                        return false;
                    }
                }
                // cannot confirm the channel of the record
                None => return false,
            }
        }

        if let Some(md5) = &self.md5 {
            if record.md5.as_ref() != Some(md5) {
                return false;
            }
        }

        if let Some(sha256) = &self.sha256 {
            if record.sha256.as_ref() != Some(sha256) {
                return false;
            }
        }

        if let Some(file_name) = &self.file_name {
            if record.file_name.as_deref() != Some(file_name.as_str()) {
                return false;
            }
        }

        if let Some(license) = &self.license {
            if record.license.as_deref() != Some(license.as_str()) {
                return false;
            }
        }

        true
    }
}

impl From<MatchSpec> for NamelessMatchSpec {
    fn from(spec: MatchSpec) -> Self {
        spec.spec
    }
}

/// Matching of a spec against some other object.
pub trait Matches<T: ?Sized> {
    /// Returns true if this spec matches `other`.
    fn matches(&self, other: &T) -> bool;
}

impl Matches<PackageRecord> for MatchSpec {
    fn matches(&self, other: &PackageRecord) -> bool {
        MatchSpec::matches(self, other)
    }
}

impl Matches<PackageRecord> for NamelessMatchSpec {
    fn matches(&self, other: &PackageRecord) -> bool {
        NamelessMatchSpec::matches(self, other)
    }
}

impl Matches<Version> for VersionSpec {
    fn matches(&self, other: &Version) -> bool {
        VersionSpec::matches(self, other)
    }
}

impl Matches<u64> for BuildNumberSpec {
    fn matches(&self, other: &u64) -> bool {
        BuildNumberSpec::matches(self, other)
    }
}

impl Matches<str> for StringMatcher {
    fn matches(&self, other: &str) -> bool {
        StringMatcher::matches(self, other)
    }
}

impl NamelessMatchSpec {
    /// Writes the bracket section of the canonical textual form. The flags
    /// control which fields go into the brackets instead of another position
    /// in the rendered spec.
    fn fmt_bracket_fields(
        &self,
        f: &mut Formatter<'_>,
        include_build: bool,
        include_channel: bool,
        include_subdir: bool,
    ) -> fmt::Result {
        let mut fields: Vec<(&str, String)> = Vec::new();
        if include_build {
            if let Some(build) = &self.build {
                fields.push(("build", build.to_string()));
            }
        }
        if let Some(build_number) = &self.build_number {
            fields.push(("build_number", build_number.to_string()));
        }
        if include_channel {
            if let Some(channel) = &self.channel {
                fields.push(("channel", channel.to_string()));
            }
        }
        if include_subdir {
            if let Some(subdir) = &self.subdir {
                fields.push(("subdir", subdir.to_string()));
            }
        }
        if let Some(file_name) = &self.file_name {
            fields.push(("fn", file_name.clone()));
        }
        if let Some(url) = &self.url {
            fields.push(("url", url.to_string()));
        }
        if let Some(md5) = &self.md5 {
            fields.push(("md5", format!("{md5:x}")));
        }
        if let Some(sha256) = &self.sha256 {
            fields.push(("sha256", format!("{sha256:x}")));
        }
        if let Some(license) = &self.license {
            fields.push(("license", license.clone()));
        }

        if fields.is_empty() {
            return Ok(());
        }

        write!(f, "[")?;
        for (i, (key, value)) in fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}=\"{value}\"")?;
        }
        write!(f, "]")
    }
}

impl Display for NamelessMatchSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // A url spec has no other constraints, render it bare.
        if let Some(url) = &self.url {
            return write!(f, "{url}");
        }

        if let Some(version) = &self.version {
            write!(f, "{version}")?;
            if let Some(build) = &self.build {
                write!(f, " {build}")?;
            }
        }

        self.fmt_bracket_fields(f, self.version.is_none(), true, true)
    }
}

impl Display for MatchSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // channel (with optional subdir) and namespace render as a prefix
        if let Some(channel) = &self.spec.channel {
            write!(f, "{channel}")?;
            if let Some(subdir) = &self.spec.subdir {
                write!(f, "/{subdir}")?;
            }
            match &self.spec.namespace {
                Some(namespace) => write!(f, ":{namespace}:")?,
                None => write!(f, "::")?,
            }
        } else if let Some(namespace) = &self.spec.namespace {
            write!(f, "{namespace}:")?;
        }

        write!(f, "{}", self.name.as_source())?;

        if self.spec.url.is_some() {
            return self
                .spec
                .fmt_bracket_fields(f, false, false, self.spec.channel.is_none());
        }

        if let Some(version) = &self.spec.version {
            write!(f, " {version}")?;
            if let Some(build) = &self.spec.build {
                write!(f, " {build}")?;
            }
        }

        self.spec.fmt_bracket_fields(
            f,
            self.spec.version.is_none(),
            false,
            self.spec.channel.is_none(),
        )
    }
}
