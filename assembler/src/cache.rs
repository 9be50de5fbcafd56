use dashmap::DashMap;
use progtoken_core::trace;
use progtoken_hashes::ScriptHash;
use progtoken_plutus::{ParamError, PlutusData, PlutusScript};

/// A parameterized script with its hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedScript {
    pub script: PlutusScript,
    pub hash: ScriptHash,
}

impl From<PlutusScript> for DerivedScript {
    fn from(script: PlutusScript) -> Self {
        Self { hash: script.hash(), script }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    template: ScriptHash,
    params: Vec<u8>,
}

/// Memoizes script parameterization, keyed by template and parameters.
#[derive(Debug, Default)]
pub struct ScriptCache {
    scripts: DashMap<CacheKey, DerivedScript>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `template` with `params` applied, computed at most once per key.
    pub fn derive(&self, template: &PlutusScript, params: &[PlutusData]) -> Result<DerivedScript, ParamError> {
        let key = CacheKey { template: template.hash(), params: PlutusData::List(params.to_vec()).to_cbor() };
        if let Some(derived) = self.scripts.get(&key) {
            return Ok(derived.clone());
        }
        let derived = self.scripts.entry(key).or_try_insert_with(|| {
            let derived = DerivedScript::from(template.apply(params)?);
            trace!("Derived script {} from template {}", derived.hash, template.hash());
            Ok::<_, ParamError>(derived)
        })?;
        Ok(derived.clone())
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
