#![allow(dead_code)]

use progtoken_addresses::{Address, Credential, NetworkId};
use progtoken_assembler::bootstrap::{DirectoryMintParams, ScriptHashParams};
use progtoken_assembler::protocol::{PROTOCOL_TITLES, ProtocolScripts};
use progtoken_assembler::registry::{RegistryCredential, RegistryNode, TAIL_KEY};
use progtoken_assembler::{
    Assembler, AssemblerSettings, BootstrapCatalog, BootstrapDescriptor, RegisterTokenRequest, ScriptCache, SubstandardCatalog,
};
use progtoken_hashes::{Hash28, ScriptHash, TransactionHash};
use progtoken_index_core::{DynIndexer, MemoryIndexer};
use progtoken_ledger::{AssetName, Utxo, UtxoRef, Value};
use progtoken_plutus::{Blueprint, BlueprintRegistry, BlueprintValidator, PlutusData, apply_params};
use std::sync::Arc;

pub const ISSUE_CODE: &str = "585701010029800aba2aba1aab9eaab9dab9a4888896600264646644b30013370e900218031baa00289919b87375a6012008906400980418039baa0028a504014600c600e002600c004600c00260066ea801a29344d9590011";
pub const TRANSFER_CODE: &str = "585701010029800aba2aba1aab9eaab9dab9a4888896600264646644b30013370e900218031baa00289919b87375a6012008904801980418039baa0028a504014600c600e002600c004600c00260066ea801a29344d9590011";

pub const ADA: u64 = 1_000_000;

/// `"token"`
pub const ASSET_NAME: &str = "746f6b656e";

pub fn bootstrap_tx_hash() -> TransactionHash {
    TransactionHash::from_bytes([0x10; 32])
}

pub fn wallet(payment: u8, stake: u8) -> Address {
    Address::base(
        NetworkId::Testnet,
        Credential::PubKey(Hash28::from_bytes([payment; 28])),
        Credential::PubKey(Hash28::from_bytes([stake; 28])),
    )
}

pub fn alice() -> Address {
    wallet(0xa1, 0xa2)
}

pub fn bob() -> Address {
    wallet(0xb1, 0xb2)
}

/// Protocol templates: distinct programs, one per title, each taking any number of parameters.
pub fn protocol_blueprint() -> BlueprintRegistry {
    let code = hex::decode(ISSUE_CODE).unwrap();
    let validators = PROTOCOL_TITLES
        .iter()
        .map(|title| BlueprintValidator {
            title: title.to_string(),
            compiled_code: hex::encode(apply_params(&code, &[PlutusData::bytes(title.as_bytes())]).unwrap()),
            hash: None,
        })
        .collect();
    BlueprintRegistry::from_blueprint(Blueprint { preamble: Default::default(), validators }).unwrap()
}

fn substandard_blueprint(issue: &[u8], transfer: &[u8]) -> BlueprintRegistry {
    let json = format!(
        r#"{{ "validators": [
            {{ "title": "issue", "compiledCode": "{}" }},
            {{ "title": "transfer", "compiledCode": "{}" }}
        ] }}"#,
        hex::encode(issue),
        hex::encode(transfer)
    );
    BlueprintRegistry::from_json(&json, &[]).unwrap()
}

/// Two substandards: `dummy` with the plain validators and `freeze` with a parameterized copy of them.
pub fn substandards() -> SubstandardCatalog {
    let (issue, transfer) = (hex::decode(ISSUE_CODE).unwrap(), hex::decode(TRANSFER_CODE).unwrap());
    let mut catalog = SubstandardCatalog::new();
    catalog.insert("dummy", &substandard_blueprint(&issue, &transfer));
    catalog.insert(
        "freeze",
        &substandard_blueprint(
            &apply_params(&issue, &[PlutusData::int(1)]).unwrap(),
            &apply_params(&transfer, &[PlutusData::int(1)]).unwrap(),
        ),
    );
    catalog
}

pub fn register_request(payer: &Address, substandard: &str) -> RegisterTokenRequest {
    RegisterTokenRequest {
        registrar_address: payer.to_string(),
        recipient_address: None,
        asset_name: ASSET_NAME.to_string(),
        quantity: "1000".to_string(),
        substandard_name: substandard.to_string(),
        substandard_issue_contract_name: "issue".to_string(),
        substandard_transfer_contract_name: "transfer".to_string(),
        version: None,
    }
}

pub fn head_node() -> RegistryNode {
    RegistryNode {
        key: Vec::new(),
        next: TAIL_KEY.to_vec(),
        transfer_logic_script: RegistryCredential::script(None),
        third_party_transfer_logic_script: RegistryCredential::script(None),
        global_state_policy_id: Vec::new(),
    }
}

pub struct Fixture {
    pub assembler: Assembler,
    pub indexer: Arc<MemoryIndexer>,
    pub scripts: ProtocolScripts,
    pub descriptor: BootstrapDescriptor,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_settings(AssemblerSettings::default(), |_| {})
    }

    /// A deployment with an empty registry, funded wallets for alice and bob, and `patch` applied to the descriptor.
    pub fn with_settings(settings: AssemblerSettings, patch: impl FnOnce(&mut BootstrapDescriptor)) -> Self {
        let blueprint = Arc::new(protocol_blueprint());
        let cache = Arc::new(ScriptCache::new());
        let scripts = ProtocolScripts::new(blueprint.clone(), cache.clone()).unwrap();

        let tx_hash = bootstrap_tx_hash();
        let mut descriptor = BootstrapDescriptor {
            tx_hash,
            protocol_params: ScriptHashParams { script_hash: ScriptHash::from_bytes([0x01; 28]) },
            programmable_logic_base_params: ScriptHashParams { script_hash: ScriptHash::default() },
            programmable_logic_global_params: ScriptHashParams { script_hash: ScriptHash::default() },
            issuance_params: None,
            directory_mint_params: DirectoryMintParams {
                tx_input: UtxoRef::new(TransactionHash::from_bytes([0x05; 32]), 1),
                issuance_script_hash: ScriptHash::from_bytes([0x04; 28]),
                script_hash: None,
            },
            directory_spend_params: ScriptHashParams { script_hash: ScriptHash::default() },
            protocol_params_utxo: UtxoRef::new(tx_hash, 0),
            issuance_utxo: UtxoRef::new(tx_hash, 2),
            programmable_base_ref_input: None,
            programmable_global_ref_input: None,
        };
        let global = scripts.programmable_logic_global(&descriptor).unwrap().hash;
        descriptor.programmable_logic_global_params.script_hash = global;
        descriptor.programmable_logic_base_params.script_hash = scripts.programmable_logic_base(&global).unwrap().hash;
        let directory_mint = scripts.directory_mint(&descriptor).unwrap().hash;
        let directory_spend = scripts.directory_spend(&descriptor).unwrap().hash;
        descriptor.directory_mint_params.script_hash = Some(directory_mint);
        descriptor.directory_spend_params.script_hash = directory_spend;

        let protocol_address = Address::enterprise(NetworkId::Testnet, Credential::Script(descriptor.protocol_params.script_hash));
        let directory_address = Address::enterprise(NetworkId::Testnet, Credential::Script(directory_spend));
        let head = Utxo::new(
            UtxoRef::new(tx_hash, 1),
            directory_address,
            Value::lovelace(2 * ADA).with_asset(directory_mint, AssetName::default(), 1),
        )
        .with_datum(&head_node().to_data());
        let funding = TransactionHash::from_bytes([0x20; 32]);
        let indexer = Arc::new(MemoryIndexer::from_utxos([
            Utxo::new(descriptor.protocol_params_utxo, protocol_address, Value::lovelace(5 * ADA)).with_datum(&PlutusData::unit()),
            Utxo::new(descriptor.issuance_utxo, protocol_address, Value::lovelace(5 * ADA)).with_datum(&PlutusData::unit()),
            head,
            Utxo::new(UtxoRef::new(funding, 0), alice(), Value::lovelace(100 * ADA)),
            Utxo::new(UtxoRef::new(funding, 1), alice(), Value::lovelace(20 * ADA)),
            Utxo::new(UtxoRef::new(funding, 2), bob(), Value::lovelace(50 * ADA)),
        ]));

        patch(&mut descriptor);
        let bootstraps = Arc::new(BootstrapCatalog::new(vec![descriptor.clone()], None).unwrap());
        let assembler = Assembler::new(
            settings,
            blueprint,
            bootstraps,
            Arc::new(substandards()),
            cache,
            indexer.clone() as DynIndexer,
        )
        .unwrap();
        Self { assembler, indexer, scripts, descriptor }
    }

    pub fn directory_address(&self) -> Address {
        Address::enterprise(NetworkId::Testnet, Credential::Script(self.descriptor.directory_spend_params.script_hash))
    }

    pub fn directory_mint(&self) -> ScriptHash {
        self.scripts.directory_mint(&self.descriptor).unwrap().hash
    }

    pub fn programmable(&self, owner: &Address) -> Address {
        Address::programmable(self.descriptor.programmable_logic_base_params.script_hash, owner).unwrap()
    }

    pub fn validator(&self, substandard: &str, title: &str) -> ScriptHash {
        self.assembler.substandards().get(substandard, title).unwrap().hash
    }

    /// Registers `substandard` for `payer` and applies the transaction to the indexer.
    pub async fn register(&self, payer: &Address, substandard: &str) -> Hash28 {
        let assembled = self.assembler.register(&register_request(payer, substandard)).await.unwrap();
        self.indexer.apply_transaction(&assembled.transaction);
        assembled.policy_id.unwrap()
    }
}
