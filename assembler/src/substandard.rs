use crate::error::Error;
use crate::result::Result;
use progtoken_core::{debug, info};
use progtoken_hashes::ScriptHash;
use progtoken_plutus::{BlueprintRegistry, PlutusScript};
use std::collections::BTreeMap;
use std::path::Path;

pub const SUBSTANDARD_BLUEPRINT: &str = "plutus.json";

/// A compiled validator offered by a substandard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstandardValidator {
    pub title: String,
    pub script: PlutusScript,
    pub hash: ScriptHash,
}

impl SubstandardValidator {
    pub fn new(title: &str, script: PlutusScript) -> Self {
        Self { title: title.to_string(), hash: script.hash(), script }
    }
}

/// Substandards by name, each a set of validators by contract title.
#[derive(Clone, Debug, Default)]
pub struct SubstandardCatalog {
    substandards: BTreeMap<String, BTreeMap<String, SubstandardValidator>>,
}

impl SubstandardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, blueprint: &BlueprintRegistry) {
        let validators = blueprint.iter().map(|(title, script)| (title.to_string(), SubstandardValidator::new(title, script.clone()))).collect();
        self.substandards.insert(name.to_string(), validators);
    }

    /// Loads every `<name>/plutus.json` below `dir`; the directory name is the substandard name.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let read_error = |err: std::io::Error| Error::Startup(format!("unable to read substandards directory {}: {err}", dir.display()));
        let mut catalog = Self::new();
        for entry in std::fs::read_dir(dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            let blueprint_path = path.join(SUBSTANDARD_BLUEPRINT);
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else { continue };
            if !blueprint_path.is_file() {
                debug!("Skipping {}: no {}", path.display(), SUBSTANDARD_BLUEPRINT);
                continue;
            }
            let blueprint = BlueprintRegistry::load(&blueprint_path, &[])?;
            info!("Loaded substandard {} with {} validators", name, blueprint.len());
            catalog.insert(name, &blueprint);
        }
        Ok(catalog)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.substandards.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.substandards.contains_key(name)
    }

    pub fn get(&self, name: &str, contract: &str) -> Option<&SubstandardValidator> {
        self.substandards.get(name).and_then(|validators| validators.get(contract))
    }

    pub fn require(&self, name: &str, contract: &str) -> Result<&SubstandardValidator> {
        self.get(name, contract).ok_or_else(|| Error::BlueprintMissing(format!("substandard validator {name}/{contract}")))
    }

    /// The validator hashing to `hash`, with the name of its substandard.
    pub fn find_by_hash(&self, hash: &ScriptHash) -> Option<(&str, &SubstandardValidator)> {
        self.substandards
            .iter()
            .flat_map(|(name, validators)| validators.values().map(move |validator| (name.as_str(), validator)))
            .find(|(_, validator)| validator.hash == *hash)
    }
}
