#![deny(missing_docs)]
//! `matchspec` implements the conda match-spec constraint language: the
//! grammar, parsing, in-memory representation and rendering of match specs,
//! and the matching of specs against package records.
//!
//! The two central types are [`MatchSpec`] (a constraint set with a package
//! name) and [`NamelessMatchSpec`] (the same constraint set without the
//! name, for use where the name is known from context). Both parse from
//! their textual form via [`std::str::FromStr`] and evaluate against a
//! [`PackageRecord`] through [`Matches`]:
//!
//! ```
//! use std::str::FromStr;
//! use matchspec::{MatchSpec, Matches, PackageRecord, Version};
//!
//! let spec = MatchSpec::from_str("numpy>=1.2,<2.0").unwrap();
//! let record = PackageRecord::new(
//!     "numpy".parse().unwrap(),
//!     Version::from_str("1.5.0").unwrap(),
//!     "py38h879f04f_0",
//! );
//! assert!(spec.matches(&record));
//! ```
//!
//! All types are immutable once constructed, so specs can be shared freely
//! between threads and matched against any number of records.

mod build_spec;
mod channel;
pub mod digest;
mod match_spec;
mod package_name;
mod package_record;
mod version;
pub mod version_spec;

pub use build_spec::{
    BuildNumber, BuildNumberSpec, OrdOperator, ParseBuildNumberSpecError, ParseOrdOperatorError,
};
pub use channel::{ChannelSpec, ParseChannelError};
pub use digest::{Md5Hash, Sha256Hash};
pub use match_spec::{
    matcher::{StringMatcher, StringMatcherParseError},
    parse::{ParseMatchSpecError, ParseMatchSpecErrorKind},
    MatchSpec, Matches, NamelessMatchSpec,
};
pub use package_name::{InvalidPackageNameError, PackageName};
pub use package_record::PackageRecord;
pub use version::{ParseVersionError, ParseVersionErrorKind, Version};
pub use version_spec::{
    LogicalOperator, ParseVersionSpecError, VersionOperator, VersionSpec,
};
