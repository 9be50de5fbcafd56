use crate::{HASH28_SIZE, HASH32_SIZE, Hash28, Hash32};
use blake2b_simd::{Params, State};

pub trait HasherBase {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self;
}

pub trait Hasher: HasherBase + Clone + Default {
    type Output;

    fn finalize(self) -> Self::Output;

    fn reset(&mut self);

    #[inline(always)]
    fn hash<A: AsRef<[u8]>>(data: A) -> Self::Output {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.finalize()
    }
}

macro_rules! blake2b_hasher {
    ($(#[$meta:meta])* $name:ident, $output:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(State);

        impl $name {
            #[inline(always)]
            pub fn new() -> Self {
                Self(Params::new().hash_length($size).to_state())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl HasherBase for $name {
            #[inline(always)]
            fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
                self.0.update(data.as_ref());
                self
            }
        }

        impl Hasher for $name {
            type Output = $output;

            #[inline(always)]
            fn finalize(self) -> $output {
                let mut out = [0u8; $size];
                out.copy_from_slice(self.0.finalize().as_bytes());
                $output::from_bytes(out)
            }

            fn reset(&mut self) {
                *self = Self::new();
            }
        }
    };
}

blake2b_hasher!(
    /// blake2b-224, used for script and key hashes.
    Blake2b224,
    Hash28,
    HASH28_SIZE
);

blake2b_hasher!(
    /// blake2b-256, used for transaction ids and the script data hash.
    Blake2b256,
    Hash32,
    HASH32_SIZE
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_known_digests() {
        assert_eq!(Blake2b224::hash(b""), Hash28::from_str("836cc68931c2e4e3e838602eca1902591d216837bafddfe6f0c8cb07").unwrap());
        assert_eq!(
            Blake2b256::hash(b""),
            Hash32::from_str("0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8").unwrap()
        );
        assert_eq!(
            Blake2b256::hash(b"abc"),
            Hash32::from_str("bddd813c634239723171ef3fee98579b94964e3bb1cb3e427262c8c068d52319").unwrap()
        );
    }

    #[test]
    fn test_incremental_update() {
        let mut hasher = Blake2b256::new();
        hasher.update(b"a").update(b"bc");
        assert_eq!(hasher.clone().finalize(), Blake2b256::hash(b"abc"));
        hasher.reset();
        assert_eq!(hasher.finalize(), Blake2b256::hash(b""));
    }
}
