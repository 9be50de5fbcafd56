use crate::bootstrap::BootstrapDescriptor;
use crate::cache::{DerivedScript, ScriptCache};
use crate::error::Error;
use crate::result::Result;
use progtoken_core::debug;
use progtoken_hashes::ScriptHash;
use progtoken_plutus::{BlueprintRegistry, PlutusData};
use std::sync::Arc;

pub const REGISTRY_MINT: &str = "registry_mint.registry_mint.mint";
pub const REGISTRY_SPEND: &str = "registry_spend.registry_spend.spend";
pub const ISSUANCE_MINT: &str = "issuance_mint.issuance_mint.mint";
pub const PROGRAMMABLE_LOGIC_BASE: &str = "programmable_logic_base.programmable_logic_base.spend";
pub const PROGRAMMABLE_LOGIC_GLOBAL: &str = "programmable_logic_global.programmable_logic_global.withdraw";

/// Validators the protocol blueprint must provide.
pub const PROTOCOL_TITLES: [&str; 5] = [REGISTRY_MINT, REGISTRY_SPEND, ISSUANCE_MINT, PROGRAMMABLE_LOGIC_BASE, PROGRAMMABLE_LOGIC_GLOBAL];

/// Derives the protocol validators of a deployment from the blueprint templates.
#[derive(Clone, Debug)]
pub struct ProtocolScripts {
    blueprint: Arc<BlueprintRegistry>,
    cache: Arc<ScriptCache>,
}

impl ProtocolScripts {
    pub fn new(blueprint: Arc<BlueprintRegistry>, cache: Arc<ScriptCache>) -> Result<Self> {
        for title in PROTOCOL_TITLES {
            blueprint.require(title)?;
        }
        Ok(Self { blueprint, cache })
    }

    pub fn blueprint(&self) -> &Arc<BlueprintRegistry> {
        &self.blueprint
    }

    pub fn cache(&self) -> &Arc<ScriptCache> {
        &self.cache
    }

    fn derive(&self, title: &str, params: &[PlutusData]) -> Result<DerivedScript> {
        let template = self.blueprint.get(title).ok_or_else(|| Error::BlueprintMissing(title.to_string()))?;
        let derived = self.cache.derive(template, params)?;
        debug!("{} -> {}", title, derived.hash);
        Ok(derived)
    }

    /// Minting policy of the registry NFTs, seeded by the registry's initialization input.
    pub fn directory_mint(&self, descriptor: &BootstrapDescriptor) -> Result<DerivedScript> {
        let params = &descriptor.directory_mint_params;
        let seed = PlutusData::constr(
            0,
            vec![PlutusData::bytes(params.tx_input.transaction_id), PlutusData::int(params.tx_input.index)],
        );
        self.derive(REGISTRY_MINT, &[seed, PlutusData::bytes(params.issuance_script_hash)])
    }

    /// Spending validator locking the registry nodes.
    pub fn directory_spend(&self, descriptor: &BootstrapDescriptor) -> Result<DerivedScript> {
        self.derive(REGISTRY_SPEND, &[PlutusData::bytes(descriptor.protocol_params.script_hash)])
    }

    /// Minting policy of a programmable token issued under `substandard_issue`; its hash is the policy id.
    pub fn issuance_mint(&self, descriptor: &BootstrapDescriptor, substandard_issue: &ScriptHash) -> Result<DerivedScript> {
        let params = [
            PlutusData::constr(1, vec![PlutusData::bytes(descriptor.programmable_logic_base_params.script_hash)]),
            PlutusData::constr(1, vec![PlutusData::bytes(substandard_issue)]),
        ];
        self.derive(ISSUANCE_MINT, &params)
    }

    pub fn programmable_logic_global(&self, descriptor: &BootstrapDescriptor) -> Result<DerivedScript> {
        self.derive(PROGRAMMABLE_LOGIC_GLOBAL, &[PlutusData::bytes(descriptor.protocol_params.script_hash)])
    }

    pub fn programmable_logic_base(&self, global: &ScriptHash) -> Result<DerivedScript> {
        self.derive(PROGRAMMABLE_LOGIC_BASE, &[PlutusData::constr(1, vec![PlutusData::bytes(global)])])
    }
}
