use crate::data::PlutusData;
use crate::error::ParamError;
use crate::program::apply_params;
use progtoken_hashes::{Blake2b224, Hasher, HasherBase, ScriptHash};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlutusVersion {
    V1,
    V2,
    #[default]
    V3,
}

impl PlutusVersion {
    /// Prefix byte hashed in front of the compiled code.
    pub fn hash_tag(&self) -> u8 {
        match self {
            PlutusVersion::V1 => 1,
            PlutusVersion::V2 => 2,
            PlutusVersion::V3 => 3,
        }
    }

    /// Language id used as the cost model key.
    pub fn language_id(&self) -> u8 {
        self.hash_tag() - 1
    }
}

/// Compiled Plutus script: the CBOR byte string wrapping the flat program.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PlutusScript {
    version: PlutusVersion,
    code: Vec<u8>,
}

impl PlutusScript {
    pub fn new(version: PlutusVersion, code: Vec<u8>) -> Self {
        Self { version, code }
    }

    pub fn v3(code: Vec<u8>) -> Self {
        Self::new(PlutusVersion::V3, code)
    }

    pub fn version(&self) -> PlutusVersion {
        self.version
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn hash(&self) -> ScriptHash {
        let mut hasher = Blake2b224::new();
        hasher.update([self.version.hash_tag()]).update(&self.code);
        hasher.finalize()
    }

    /// Returns the script with `params` applied, in order.
    pub fn apply(&self, params: &[PlutusData]) -> Result<PlutusScript, ParamError> {
        Ok(Self::new(self.version, apply_params(&self.code, params)?))
    }
}

impl Debug for PlutusScript {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlutusScript").field("version", &self.version).field("hash", &self.hash()).finish()
    }
}
