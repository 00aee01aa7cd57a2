//! Hash digest plumbing built on the
//! [RustCrypto/hashes](https://github.com/RustCrypto/hashes) crates.
//!
//! Match specs can pin a package to an exact MD5 or SHA256 digest. This
//! module provides the digest output types used for those pins, a helper to
//! parse a digest from its hex representation, and serde adapters that
//! read/write digests as lowercase hex strings in human readable formats.

use digest::{Digest, Output};

pub use md5::Md5;
pub use sha2::Sha256;

/// A type alias for the output of an MD5 hash.
pub type Md5Hash = md5::digest::Output<Md5>;

/// A type alias for the output of a SHA256 hash.
pub type Sha256Hash = sha2::digest::Output<Sha256>;

/// Parses a hash hex string to a digest. Returns `None` if the string is not
/// valid hex or has the wrong length for the digest type.
pub fn parse_digest_from_hex<D: Digest>(str: &str) -> Option<Output<D>> {
    let mut hash = <Output<D>>::default();
    match hex::decode_to_slice(str, &mut hash) {
        Ok(_) => Some(hash),
        Err(_) => None,
    }
}

/// Serde support for digests.
///
/// Use [`serde::SerializableHash`] with `serde_as` to serialize the
/// [`Output`] of a [`Digest`] as a hex string in human readable formats and
/// as raw bytes otherwise.
pub mod serde {
    use std::{borrow::Cow, fmt::LowerHex};

    use digest::{Digest, Output};
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
    use serde_with::{DeserializeAs, SerializeAs};

    /// Deserialize the [`Output`] of a [`Digest`] from a hex string or raw
    /// bytes depending on the human-readability of the format.
    pub fn deserialize<'de, D, Dig: Digest>(deserializer: D) -> Result<Output<Dig>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let str = Cow::<'de, str>::deserialize(deserializer)?;
            super::parse_digest_from_hex::<Dig>(str.as_ref())
                .ok_or_else(|| Error::custom("failed to parse digest"))
        } else {
            Output::<Dig>::deserialize(deserializer)
        }
    }

    /// Serializes the [`Output`] of a [`Digest`] as a hex string or raw bytes
    /// depending on the human-readability of the format.
    pub fn serialize<'a, S: Serializer, Dig: Digest>(
        digest: &'a Output<Dig>,
        s: S,
    ) -> Result<S::Ok, S::Error>
    where
        &'a Output<Dig>: LowerHex,
    {
        if s.is_human_readable() {
            format!("{digest:x}").serialize(s)
        } else {
            digest.serialize(s)
        }
    }

    /// Wrapper type to be used with `serde_as` for hash fields.
    pub struct SerializableHash<T: Digest>(pub Output<T>);

    impl<T: Digest> SerializeAs<Output<T>> for SerializableHash<T>
    where
        for<'a> &'a Output<T>: LowerHex,
    {
        fn serialize_as<S>(source: &Output<T>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serialize::<S, T>(source, serializer)
        }
    }

    impl<'de, T: Digest + Default> DeserializeAs<'de, Output<T>> for SerializableHash<T> {
        fn deserialize_as<D>(deserializer: D) -> Result<Output<T>, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserialize::<D, T>(deserializer)
        }
    }
}
