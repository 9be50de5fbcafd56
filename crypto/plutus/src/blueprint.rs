use crate::error::BlueprintError;
use crate::script::{PlutusScript, PlutusVersion};
use progtoken_core::warn;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preamble {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "plutusVersion")]
    pub plutus_version: Option<PlutusVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlueprintValidator {
    pub title: String,
    #[serde(rename = "compiledCode")]
    pub compiled_code: String,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Blueprint file as produced by the validator compiler. Fields other than these are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub preamble: Preamble,
    pub validators: Vec<BlueprintValidator>,
}

/// Compiled validators of a blueprint, by title.
#[derive(Debug, Clone, Default)]
pub struct BlueprintRegistry {
    scripts: BTreeMap<String, PlutusScript>,
}

impl BlueprintRegistry {
    pub fn load<P: AsRef<Path>>(path: P, required: &[&str]) -> Result<Self, BlueprintError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| BlueprintError::Io { path: path.display().to_string(), source })?;
        Self::from_json(&json, required)
    }

    pub fn from_json(json: &str, required: &[&str]) -> Result<Self, BlueprintError> {
        let registry = Self::from_blueprint(serde_json::from_str(json)?)?;
        for title in required {
            registry.require(title)?;
        }
        Ok(registry)
    }

    pub fn from_blueprint(blueprint: Blueprint) -> Result<Self, BlueprintError> {
        let version = blueprint.preamble.plutus_version.unwrap_or_default();
        let mut scripts = BTreeMap::new();
        for validator in blueprint.validators {
            let code = hex::decode(&validator.compiled_code).map_err(|_| BlueprintError::InvalidCode(validator.title.clone()))?;
            let script = PlutusScript::new(version, code);
            if let Some(hash) = validator.hash.as_deref() {
                if hash != script.hash().to_string() {
                    warn!("Blueprint validator {} declares hash {} but its code hashes to {}", validator.title, hash, script.hash());
                }
            }
            scripts.insert(validator.title, script);
        }
        Ok(Self { scripts })
    }

    pub fn get(&self, title: &str) -> Option<&PlutusScript> {
        self.scripts.get(title)
    }

    pub fn require(&self, title: &str) -> Result<&PlutusScript, BlueprintError> {
        self.get(title).ok_or_else(|| BlueprintError::Missing(title.to_string()))
    }

    pub fn contains(&self, title: &str) -> bool {
        self.scripts.contains_key(title)
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlutusScript)> {
        self.scripts.iter().map(|(title, script)| (title.as_str(), script))
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::tests::{ISSUE_CODE, TRANSFER_CODE};
    use std::io::Write;

    fn blueprint_json() -> String {
        format!(
            r#"{{
                "preamble": {{ "title": "freeze/transfer", "plutusVersion": "v3", "compiler": {{ "name": "Aiken" }} }},
                "validators": [
                    {{ "title": "example.issue.withdraw", "compiledCode": "{ISSUE_CODE}", "hash": "a82718805c3541469346431c0cc023a76afce8d6d2c1c64d00bf1950" }},
                    {{ "title": "example.transfer.withdraw", "compiledCode": "{TRANSFER_CODE}", "redeemer": {{ "schema": {{}} }} }}
                ],
                "definitions": {{}}
            }}"#
        )
    }

    #[test]
    fn test_lookup() {
        let registry = BlueprintRegistry::from_json(&blueprint_json(), &["example.issue.withdraw"]).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("example.transfer.withdraw"));
        assert_eq!(registry.titles().collect::<Vec<_>>(), vec!["example.issue.withdraw", "example.transfer.withdraw"]);
        assert_eq!(
            registry.require("example.transfer.withdraw").unwrap().hash().to_string(),
            "93fd90884c772ced27987503f9d37c857372b99cf5cc716197ebb8bd"
        );
        assert!(matches!(registry.require("missing.title"), Err(BlueprintError::Missing(title)) if title == "missing.title"));
    }

    #[test]
    fn test_startup_failures() {
        assert!(matches!(
            BlueprintRegistry::from_json(&blueprint_json(), &["registry_mint.registry_mint.mint"]),
            Err(BlueprintError::Missing(_))
        ));
        assert!(matches!(BlueprintRegistry::from_json("{ \"validators\": 1 }", &[]), Err(BlueprintError::Json(_))));
        assert!(matches!(
            BlueprintRegistry::from_json(r#"{ "validators": [ { "title": "bad", "compiledCode": "zz" } ] }"#, &[]),
            Err(BlueprintError::InvalidCode(title)) if title == "bad"
        ));
        assert!(matches!(BlueprintRegistry::load("/nonexistent/plutus.json", &[]), Err(BlueprintError::Io { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(blueprint_json().as_bytes()).unwrap();
        let registry = BlueprintRegistry::load(file.path(), &[]).unwrap();
        assert_eq!(registry.iter().count(), 2);
        assert!(!registry.is_empty());
    }
}
