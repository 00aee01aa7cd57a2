//! This module contains code to work with the build number constraint of a
//! match spec, e.g. the `>=2` in `foo[build_number=">=2"]`.

mod parse;

use std::fmt::{self, Display, Formatter};

use serde_with::{DeserializeFromStr, SerializeDisplay};

pub use parse::{ParseBuildNumberSpecError, ParseOrdOperatorError};

/// The build number of a package.
pub type BuildNumber = u64;

/// An operator defining the (in)equality comparisons available to ordered
/// types.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OrdOperator {
    /// Equal to
    Eq,
    /// Not equal to
    Ne,
    /// Greater than
    Gt,
    /// Greater than or equal to
    Ge,
    /// Less than
    Lt,
    /// Less than or equal to
    Le,
}

impl Display for OrdOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "=="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
        }
    }
}

/// A constraint over the build number of a package: an [`OrdOperator`] and
/// the number to compare against. A bare number parses as an exact match.
#[derive(Debug, Clone, Eq, PartialEq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct BuildNumberSpec {
    op: OrdOperator,
    rhs: BuildNumber,
}

impl BuildNumberSpec {
    /// Constructs a new spec from an operator and the number to compare
    /// against.
    pub fn new(op: OrdOperator, rhs: BuildNumber) -> Self {
        Self { op, rhs }
    }

    /// Returns whether the given build number satisfies this spec.
    pub fn matches(&self, build_number: &BuildNumber) -> bool {
        match self.op {
            OrdOperator::Eq => build_number.eq(&self.rhs),
            OrdOperator::Ne => build_number.ne(&self.rhs),
            OrdOperator::Gt => build_number.gt(&self.rhs),
            OrdOperator::Ge => build_number.ge(&self.rhs),
            OrdOperator::Lt => build_number.lt(&self.rhs),
            OrdOperator::Le => build_number.le(&self.rhs),
        }
    }
}

impl Display for BuildNumberSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.rhs)
    }
}
