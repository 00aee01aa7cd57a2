use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none};
use url::Url;

use crate::digest::{serde::SerializableHash, Md5, Sha256};
use crate::{Md5Hash, PackageName, Sha256Hash, Version};

/// A record describing one concrete built package artifact, with the field
/// conventions of conda `repodata.json`.
///
/// Records are the read-only input of the matching engine: a
/// [`crate::MatchSpec`] borrows a record for the duration of one `matches`
/// call and never mutates or retains it.
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PackageRecord {
    /// The build string of the package
    pub build: String,

    /// The build number of the package
    #[serde(default)]
    pub build_number: u64,

    /// The channel the package came from, as a name or url
    pub channel: Option<String>,

    /// The filename of the package archive
    pub file_name: Option<String>,

    /// The specific license of the package
    pub license: Option<String>,

    /// Optionally a MD5 hash of the package archive
    #[serde_as(as = "Option<SerializableHash<Md5>>")]
    pub md5: Option<Md5Hash>,

    /// The name of the package
    pub name: PackageName,

    /// Optionally a SHA256 hash of the package archive
    #[serde_as(as = "Option<SerializableHash<Sha256>>")]
    pub sha256: Option<Sha256Hash>,

    /// Optionally the size of the package archive in bytes
    pub size: Option<u64>,

    /// The subdirectory (platform) of the channel this package is built for
    #[serde(default)]
    pub subdir: String,

    /// The date this entry was created.
    #[serde_as(as = "Option<serde_with::TimestampMilliSeconds<i64, serde_with::formats::Flexible>>")]
    pub timestamp: Option<DateTime<Utc>>,

    /// The source url of the package artifact
    pub url: Option<Url>,

    /// The version of the package
    pub version: Version,
}

impl PackageRecord {
    /// Creates a new record from the bare minimum of fields. Everything else
    /// is unset; the `subdir` defaults to `noarch`.
    pub fn new(name: PackageName, version: Version, build: impl Into<String>) -> Self {
        Self {
            build: build.into(),
            build_number: 0,
            channel: None,
            file_name: None,
            license: None,
            md5: None,
            name,
            sha256: None,
            size: None,
            subdir: "noarch".to_owned(),
            timestamp: None,
            url: None,
            version,
        }
    }
}

impl Display for PackageRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}={}={}",
            self.name.as_normalized(),
            self.version,
            self.build
        )
    }
}
