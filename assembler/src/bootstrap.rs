use crate::error::Error;
use crate::result::Result;
use progtoken_addresses::Network;
use progtoken_core::{info, warn};
use progtoken_hashes::{ScriptHash, TransactionHash};
use progtoken_ledger::UtxoRef;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptHashParams {
    pub script_hash: ScriptHash,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryMintParams {
    /// Seed input consumed when the registry was initialized
    pub tx_input: UtxoRef,
    pub issuance_script_hash: ScriptHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_hash: Option<ScriptHash>,
}

/// One deployment of the protocol, identified by the hash of its bootstrap transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapDescriptor {
    pub tx_hash: TransactionHash,
    pub protocol_params: ScriptHashParams,
    pub programmable_logic_base_params: ScriptHashParams,
    // deployed files carry the misspelled key
    #[serde(rename = "programmableLogicGlobalPrams", alias = "programmableLogicGlobalParams")]
    pub programmable_logic_global_params: ScriptHashParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuance_params: Option<ScriptHashParams>,
    pub directory_mint_params: DirectoryMintParams,
    pub directory_spend_params: ScriptHashParams,
    pub protocol_params_utxo: UtxoRef,
    pub issuance_utxo: UtxoRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programmable_base_ref_input: Option<UtxoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programmable_global_ref_input: Option<UtxoRef>,
}

/// Known protocol deployments and the one used when a request names none.
#[derive(Clone, Debug)]
pub struct BootstrapCatalog {
    descriptors: Vec<BootstrapDescriptor>,
    active: usize,
}

impl BootstrapCatalog {
    /// Default bootstrap file name for `network`.
    pub fn file_name(network: Network) -> String {
        format!("protocol-bootstraps-{network}.json")
    }

    pub fn new(descriptors: Vec<BootstrapDescriptor>, default_tx_hash: Option<&TransactionHash>) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(Error::Startup("no protocol bootstrap descriptors".to_string()));
        }
        for descriptor in descriptors.iter() {
            info!("Loaded protocol bootstrap {}", descriptor.tx_hash);
        }

        let active = match default_tx_hash {
            Some(tx_hash) => match descriptors.iter().position(|descriptor| descriptor.tx_hash == *tx_hash) {
                Some(index) => index,
                None => {
                    warn!("Default protocol version {} not found, using {}", tx_hash, descriptors[0].tx_hash);
                    0
                }
            },
            None => 0,
        };
        info!("Active protocol version: {}", descriptors[active].tx_hash);
        Ok(Self { descriptors, active })
    }

    pub fn from_json(json: &str, default_tx_hash: Option<&TransactionHash>) -> Result<Self> {
        let descriptors = serde_json::from_str(json).map_err(|err| Error::Startup(format!("malformed bootstrap file: {err}")))?;
        Self::new(descriptors, default_tx_hash)
    }

    pub fn load<P: AsRef<Path>>(path: P, default_tx_hash: Option<&TransactionHash>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| Error::Startup(format!("unable to read bootstrap file {}: {err}", path.display())))?;
        Self::from_json(&json, default_tx_hash)
    }

    pub fn active(&self) -> &BootstrapDescriptor {
        &self.descriptors[self.active]
    }

    pub fn get(&self, tx_hash: &TransactionHash) -> Option<&BootstrapDescriptor> {
        self.descriptors.iter().find(|descriptor| descriptor.tx_hash == *tx_hash)
    }

    pub fn all(&self) -> &[BootstrapDescriptor] {
        &self.descriptors
    }

    /// The descriptor of `version`, or the active one.
    pub fn resolve(&self, version: Option<&TransactionHash>) -> Result<&BootstrapDescriptor> {
        match version {
            Some(tx_hash) => self.get(tx_hash).ok_or_else(|| Error::UnknownVersion(tx_hash.to_string())),
            None => Ok(self.active()),
        }
    }
}
