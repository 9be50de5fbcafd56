mod hashers;

pub use hashers::{Blake2b224, Blake2b256, Hasher, HasherBase};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::array::TryFromSliceError;
use std::fmt::{Debug, Display, Formatter};
use std::str::{self, FromStr};

/// Size of script, policy and key hashes.
pub const HASH28_SIZE: usize = 28;
/// Size of transaction ids and script data hashes.
pub const HASH32_SIZE: usize = 32;

macro_rules! define_hash {
    ($(#[$meta:meta])* $name:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default)]
        pub struct $name([u8; $size]);

        impl $name {
            pub const SIZE: usize = $size;

            #[inline(always)]
            pub const fn from_bytes(bytes: [u8; $size]) -> Self {
                $name(bytes)
            }

            #[inline(always)]
            pub const fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }

            pub fn try_from_slice(bytes: &[u8]) -> Result<Self, TryFromSliceError> {
                Ok($name(bytes.try_into()?))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $size]> for $name {
            fn from(bytes: [u8; $size]) -> Self {
                $name(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = TryFromSliceError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                $name::try_from_slice(bytes)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                let mut hex = [0u8; $size * 2];
                hex::encode_to_slice(self.0, &mut hex).expect("The output is exactly twice the size of the input");
                f.write_str(str::from_utf8(&hex).expect("hex is always valid UTF-8"))
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(hash_str: &str) -> Result<Self, Self::Err> {
                let mut bytes = [0u8; $size];
                hex::decode_to_slice(hash_str, &mut bytes)?;
                Ok($name(bytes))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as Deserialize>::deserialize(deserializer)?;
                $name::from_str(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_hash!(
    /// A 28-byte blake2b-224 digest: script hashes, policy ids and key hashes.
    Hash28,
    HASH28_SIZE
);

define_hash!(
    /// A 32-byte blake2b-256 digest: transaction ids and script data hashes.
    Hash32,
    HASH32_SIZE
);

pub type ScriptHash = Hash28;
pub type PolicyId = Hash28;
pub type KeyHash = Hash28;
pub type TransactionHash = Hash32;
