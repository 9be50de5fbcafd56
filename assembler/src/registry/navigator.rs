use crate::error::Error;
use crate::registry::node::RegistryNode;
use crate::result::Result;
use progtoken_core::{trace, warn};
use progtoken_hashes::PolicyId;
use progtoken_ledger::{AssetName, Utxo};

/// A registry node with the UTxO holding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub utxo: Utxo,
    pub node: RegistryNode,
}

/// Where a key sits in the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Position {
    /// A node with this key exists.
    Registered(RegistryEntry),
    /// The key is free; inserting it splits this node's interval.
    Predecessor(RegistryEntry),
}

/// Lookups over a snapshot of registry node UTxOs.
#[derive(Clone, Debug, Default)]
pub struct RegistryNavigator {
    entries: Vec<RegistryEntry>,
}

impl RegistryNavigator {
    /// Parses the datums of `utxos`. A UTxO counts as a node only when it holds exactly one
    /// `directory_mint` token named after the node key; everything else is skipped.
    pub fn from_utxos(directory_mint: &PolicyId, utxos: impl IntoIterator<Item = Utxo>) -> Self {
        let entries = utxos
            .into_iter()
            .filter_map(|utxo| {
                let Some(node) = utxo.inline_datum.as_deref().and_then(RegistryNode::parse) else {
                    warn!(
                        "Skipping registry UTxO {} with malformed datum {}",
                        utxo.input,
                        utxo.inline_datum.as_deref().map(hex::encode).unwrap_or_default()
                    );
                    return None;
                };
                let nft = AssetName::new(node.key.clone()).ok().map(|name| utxo.value.quantity_of(directory_mint, &name));
                if nft != Some(1) {
                    warn!("Skipping registry UTxO {} without the directory token of node {}", utxo.input, hex::encode(&node.key));
                    return None;
                }
                Some(RegistryEntry { utxo, node })
            })
            .collect::<Vec<_>>();
        trace!("Registry snapshot holds {} nodes", entries.len());
        Self { entries }
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_key(&self, key: &[u8]) -> Option<&RegistryEntry> {
        self.entries.iter().find(|entry| entry.node.key == key)
    }

    /// The node registered under `key`, else the node whose `(key, next)` interval contains it.
    pub fn locate(&self, key: &[u8]) -> Result<Position> {
        if let Some(entry) = self.find_by_key(key) {
            return Ok(Position::Registered(entry.clone()));
        }
        self.entries
            .iter()
            .find(|entry| entry.node.covers(key))
            .map(|entry| Position::Predecessor(entry.clone()))
            .ok_or_else(|| Error::RegistryInconsistent(format!("no registry node covers {}", hex::encode(key))))
    }
}
