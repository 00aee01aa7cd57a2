use std::{
    cmp::Ordering,
    fmt,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

use itertools::{EitherOrBoth, Itertools};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use smallvec::SmallVec;

pub use parse::{ParseVersionError, ParseVersionErrorKind};

pub(crate) mod parse;

/// A single segment of a version. Segments are separated by dots, dashes or
/// underscores and consist of one or more [`Component`]s, e.g. the segment
/// `beta15` consists of the components `0`, `beta` and `15` (a `0` fillvalue
/// is inserted because segments always start with a number).
type Segment = SmallVec<[Component; 2]>;

/// This type implements an order relation between version strings. Version
/// strings can contain the usual alphanumeric characters (A-Za-z0-9),
/// separated into segments by dots, dashes and underscores. An optional epoch
/// number - an integer followed by `!` - can precede the actual version
/// string (this is useful to indicate a change in the versioning scheme
/// itself). An optional local version - separated by `+` - can follow it; the
/// local version is only considered when the main parts compare equal.
/// Version comparison is case-insensitive.
///
/// Before comparison, version strings are parsed as follows:
///
/// * They are first split into epoch, version number, and local version
///   number at `!` and `+` respectively. If there is no `!`, the epoch is set
///   to 0. If there is no `+`, the local version is empty.
/// * The version part is then split into segments at `.`, `-` and `_`.
/// * Each segment is split again into runs of numerals and non-numerals.
/// * Runs containing only numerals are converted to integers, everything else
///   is converted to lower case, with special treatment for `dev` and `post`.
/// * When a segment starts with a letter, the fillvalue 0 is inserted to keep
///   numbers and strings in phase, resulting in `1.1.a1 == 1.1.0a1`.
///
/// The resulting lists of segments are compared lexicographically, where the
/// following rules are applied to each pair of corresponding components:
///
/// * integers are compared numerically,
/// * strings are compared lexicographically, case-insensitive,
/// * strings are smaller than integers, except
/// * `dev` versions are smaller than all corresponding versions of other
///   types,
/// * `post` versions are greater than all corresponding versions of other
///   types,
/// * if a component has no correspondent, the missing correspondent is
///   treated as integer 0 to ensure `1.1 == 1.1.0`.
///
/// Some packages (most notably openssl) interpret letters as version counters
/// rather than pre-release identifiers. Appending an underscore to a plain
/// version number sorts it before its lettered successors:
/// `1.0.1_ < 1.0.1a`.
#[derive(Clone, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct Version {
    /// A normed copy of the original version string, trimmed and converted to
    /// lower case.
    norm: Box<str>,

    /// The epoch of the version, or `None` if the version did not specify
    /// one.
    epoch: Option<u64>,

    /// The segments of the main version part.
    segments: Vec<Segment>,

    /// The segments of the local version part (behind the optional `+`).
    local: Vec<Segment>,
}

impl Version {
    /// Returns true if this version has an explicit epoch.
    pub fn has_epoch(&self) -> bool {
        self.epoch.is_some()
    }

    /// Returns true if this version has a local version part.
    pub fn has_local(&self) -> bool {
        !self.local.is_empty()
    }

    /// Returns the epoch part of the version. If the version did not specify
    /// an epoch `0` is returned.
    pub fn epoch(&self) -> u64 {
        self.epoch.unwrap_or(0)
    }

    /// Returns the individual segments of the main version part.
    fn segments(
        &self,
    ) -> impl DoubleEndedIterator<Item = &'_ [Component]> + ExactSizeIterator + '_ {
        self.segments.iter().map(|segment| segment.as_slice())
    }

    /// Returns the individual segments of the local version part.
    fn local_segments(
        &self,
    ) -> impl DoubleEndedIterator<Item = &'_ [Component]> + ExactSizeIterator + '_ {
        self.local.iter().map(|segment| segment.as_slice())
    }

    /// Returns true if this version starts with the other version. This is
    /// the predicate behind `=1.2` and `1.2.*` style version constraints.
    pub fn starts_with(&self, other: &Self) -> bool {
        self.epoch() == other.epoch()
            && segments_starts_with(self.segments(), other.segments())
            && segments_starts_with(self.local_segments(), other.local_segments())
    }

    /// Returns true if this version is compatible with the given version per
    /// the `~=` operator: at least `other`, and starting with all but the
    /// last segment of `other`.
    pub fn compatible_with(&self, other: &Self) -> bool {
        self >= other
            && self.epoch() == other.epoch()
            && segments_starts_with(self.segments(), other.segments().rev().skip(1).rev())
            && segments_starts_with(self.local_segments(), other.local_segments())
    }

    /// Returns the canonical string representation of the version: all
    /// segments rebuilt from their components and joined by dots.
    pub fn canonical(&self) -> String {
        fn format_components(components: &[Component]) -> impl Display + '_ {
            // Skip the fillvalue if it was implicitly inserted
            let components = if components.len() > 1
                && components[0] == Component::default()
                && components[1].as_number().is_none()
            {
                &components[1..]
            } else {
                components
            };
            components.iter().format("")
        }

        fn format_segments<'i, I: Iterator<Item = &'i [Component]> + 'i>(
            segments: I,
        ) -> impl Display + 'i {
            segments.format_with(".", |components, f| f(&format_components(components)))
        }

        let mut canonical = String::new();
        if let Some(epoch) = self.epoch {
            canonical.push_str(&format!("{epoch}!"));
        }
        canonical.push_str(&format!("{}", format_segments(self.segments())));
        if self.has_local() {
            canonical.push_str(&format!("+{}", format_segments(self.local_segments())));
        }
        canonical
    }
}

/// Returns true if the specified segments are considered to start with the
/// other segments.
fn segments_starts_with<'a, A, B>(a: A, b: B) -> bool
where
    A: Iterator<Item = &'a [Component]>,
    B: Iterator<Item = &'a [Component]>,
{
    for ranges in a.zip_longest(b) {
        let (left, right) = match ranges {
            EitherOrBoth::Both(left, right) => (left, right),
            EitherOrBoth::Left(_) => return true,
            EitherOrBoth::Right(_) => return false,
        };
        for components in left.iter().zip_longest(right.iter()) {
            match components {
                EitherOrBoth::Both(a, b) if a != b => return false,
                EitherOrBoth::Both(_, _) => {}
                EitherOrBoth::Left(_) => return true,
                EitherOrBoth::Right(_) => return false,
            }
        }
    }
    true
}

/// Compares two sets of segments lexicographically, padding missing
/// components with the 0 fillvalue so that `1.1 == 1.1.0`.
fn cmp_segments<'i, I: Iterator<Item = &'i [Component]>>(a: I, b: I) -> Ordering {
    let default = Component::default();
    for ranges in a.zip_longest(b) {
        let (a_range, b_range) = ranges.or_default();
        for components in a_range.iter().zip_longest(b_range.iter()) {
            let (a_component, b_component) = match components {
                EitherOrBoth::Left(l) => (l, &default),
                EitherOrBoth::Right(r) => (&default, r),
                EitherOrBoth::Both(l, r) => (l, r),
            };
            match a_component.cmp(b_component) {
                Ordering::Equal => {}
                ordering => return ordering,
            }
        }
    }
    Ordering::Equal
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch()
            .cmp(&other.epoch())
            .then_with(|| cmp_segments(self.segments(), other.segments()))
            .then_with(|| cmp_segments(self.local_segments(), other.local_segments()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fn hash_segments<'i, I: Iterator<Item = &'i [Component]>, H: Hasher>(
            state: &mut H,
            segments: I,
        ) {
            let default = Component::default();
            for segment in segments {
                // Trailing fillvalues do not participate in equality, so they
                // must not participate in the hash either.
                segment
                    .iter()
                    .rev()
                    .skip_while(|c| **c == default)
                    .for_each(|c| c.hash(state));
            }
        }

        self.epoch().hash(state);
        // Trailing all-zero segments are equal to their absence ("1.1" ==
        // "1.1.0"), skip them entirely.
        let default = Component::default();
        let trailing_defaults = self
            .segments()
            .rev()
            .take_while(|segment| segment.iter().all(|c| *c == default))
            .count();
        let significant = self.segments().len() - trailing_defaults;
        hash_segments(state, self.segments().take(significant));
        hash_segments(state, self.local_segments());
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.norm)
    }
}

impl Debug for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fn format_segments<'i, I: Iterator<Item = &'i [Component]>>(segments: I) -> String {
            format!(
                "[{}]",
                segments.format_with(", ", |components, f| f(&format_args!(
                    "[{}]",
                    components.iter().format(", ")
                )))
            )
        }

        f.debug_struct("Version")
            .field("norm", &self.norm)
            .field("epoch", &self.epoch())
            .field("segments", &format_segments(self.segments()))
            .field("local", &format_segments(self.local_segments()))
            .finish()
    }
}

/// Either a numeral, a string identifier, or one of the special `dev`/`post`
/// tags of a version segment.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum Component {
    /// A numeric component, compared numerically.
    Numeral(u64),

    /// Post is always ordered greater than anything else.
    Post,

    /// Dev is always ordered less than anything else.
    Dev,

    /// A generic lowercase string identifier. Identifiers are compared
    /// lexicographically and are always ordered less than numbers.
    Iden(Box<str>),
}

impl Component {
    fn as_number(&self) -> Option<u64> {
        match self {
            Component::Numeral(value) => Some(*value),
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Component::Numeral(_))
    }
}

impl Default for Component {
    fn default() -> Self {
        Component::Numeral(0)
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Numbers are always ordered higher than strings
            (Component::Numeral(_), Component::Iden(_)) => Ordering::Greater,
            (Component::Iden(_), Component::Numeral(_)) => Ordering::Less,

            // Compare numbers and identifiers normally amongst themselves
            (Component::Numeral(a), Component::Numeral(b)) => a.cmp(b),
            (Component::Iden(a), Component::Iden(b)) => a.cmp(b),
            (Component::Post, Component::Post) => Ordering::Equal,
            (Component::Dev, Component::Dev) => Ordering::Equal,

            // Post is always compared greater than anything else
            (Component::Post, _) => Ordering::Greater,
            (_, Component::Post) => Ordering::Less,

            // Dev is always compared less than anything else
            (Component::Dev, _) => Ordering::Less,
            (_, Component::Dev) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Component::Numeral(n) => write!(f, "{n}"),
            Component::Iden(s) => write!(f, "{s}"),
            Component::Post => write!(f, "post"),
            Component::Dev => write!(f, "dev"),
        }
    }
}
