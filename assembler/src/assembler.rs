use crate::bootstrap::{BootstrapCatalog, BootstrapDescriptor};
use crate::builder::TxBuilder;
use crate::cache::ScriptCache;
use crate::error::Error;
use crate::protocol::ProtocolScripts;
use crate::registry::{Position, RegistryNavigator, RegistryNode};
use crate::request::{Issuance, MintTokenRequest, RegisterTokenRequest, TransferRequest};
use crate::result::Result;
use crate::settings::AssemblerSettings;
use crate::substandard::SubstandardCatalog;
use crate::transform::{ensure_distinct_outputs, rotate_change_last};
use progtoken_addresses::{Address, Credential};
use progtoken_core::{debug, info, warn};
use progtoken_hashes::{KeyHash, PolicyId, ScriptHash, TransactionHash};
use progtoken_index_core::{DynIndexer, IndexResult};
use progtoken_ledger::{AssetName, RewardAccount, Transaction, Utxo, UtxoRef, Value};
use progtoken_plutus::{BlueprintRegistry, PlutusData};
use serde::Serialize;
use std::sync::Arc;

/// Redeemer of the substandard issue withdrawal.
pub const ISSUE_WITHDRAWAL_REDEEMER: i64 = 100;
/// Redeemer of the substandard transfer withdrawal.
pub const TRANSFER_WITHDRAWAL_REDEEMER: i64 = 200;

/// An unsigned transaction ready for signing.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    pub tx_id: TransactionHash,
    pub tx_hex: String,
    #[serde(skip)]
    pub transaction: Transaction,
}

impl AssembledTransaction {
    fn new(policy_id: Option<PolicyId>, transaction: Transaction) -> Self {
        Self { policy_id, tx_id: transaction.id(), tx_hex: transaction.to_hex(), transaction }
    }
}

/// A programmable token held by a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredToken {
    pub policy_id: PolicyId,
    pub asset_name: AssetName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_name_utf8: Option<String>,
    pub quantity: u64,
    pub utxo: UtxoRef,
}

struct Inner {
    settings: AssemblerSettings,
    bootstraps: Arc<BootstrapCatalog>,
    substandards: Arc<SubstandardCatalog>,
    scripts: ProtocolScripts,
    indexer: DynIndexer,
}

/// Builds register, mint and transfer transactions against the indexer's view of the chain.
#[derive(Clone)]
pub struct Assembler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("settings", &self.inner.settings)
            .field("active_version", &self.inner.bootstraps.active().tx_hash)
            .finish_non_exhaustive()
    }
}

impl Assembler {
    pub fn new(
        settings: AssemblerSettings,
        blueprint: Arc<BlueprintRegistry>,
        bootstraps: Arc<BootstrapCatalog>,
        substandards: Arc<SubstandardCatalog>,
        cache: Arc<ScriptCache>,
        indexer: DynIndexer,
    ) -> Result<Self> {
        let scripts = ProtocolScripts::new(blueprint, cache)?;
        Ok(Self { inner: Arc::new(Inner { settings, bootstraps, substandards, scripts, indexer }) })
    }

    pub fn settings(&self) -> &AssemblerSettings {
        &self.inner.settings
    }

    pub fn bootstraps(&self) -> &Arc<BootstrapCatalog> {
        &self.inner.bootstraps
    }

    pub fn substandards(&self) -> &Arc<SubstandardCatalog> {
        &self.inner.substandards
    }

    pub fn scripts(&self) -> &ProtocolScripts {
        &self.inner.scripts
    }

    /// Inserts the request's new policy into the registry and mints its first supply.
    pub async fn register(&self, request: &RegisterTokenRequest) -> Result<AssembledTransaction> {
        let network = self.inner.settings.network.id();
        let issuance = request.validate(self.inner.settings.network)?;

        let descriptor = self.inner.bootstraps.resolve(issuance.version.as_ref())?;
        let substandards = &self.inner.substandards;
        let issue = substandards.require(&issuance.substandard, &issuance.issue_contract)?;
        let transfer = substandards.require(&issuance.substandard, &request.substandard_transfer_contract_name)?;
        let third_party = substandards.get(&issuance.substandard, &issuance.substandard).map(|validator| validator.hash);
        if third_party.is_none() {
            debug!("Substandard {} has no third party validator", issuance.substandard);
        }

        let scripts = &self.inner.scripts;
        let directory_mint = scripts.directory_mint(descriptor)?;
        let directory_spend = scripts.directory_spend(descriptor)?;
        check_deployment(descriptor, "directory spend", &directory_spend.hash, Some(&descriptor.directory_spend_params.script_hash))?;
        check_deployment(descriptor, "directory mint", &directory_mint.hash, descriptor.directory_mint_params.script_hash.as_ref())?;
        let issuance_mint = scripts.issuance_mint(descriptor, &issue.hash)?;
        let policy = issuance_mint.hash;
        info!("Registering policy {} with protocol version {}", policy, descriptor.tx_hash);

        let protocol_params_utxo = self.require_utxo(&descriptor.protocol_params_utxo, "protocol params").await?;
        let issuance_utxo = self.require_utxo(&descriptor.issuance_utxo, "issuance").await?;
        let wallet = self.wallet_utxos(&issuance.payer).await?;
        let registry = self.registry(&directory_spend.hash, &directory_mint.hash).await?;

        let predecessor = match registry.locate(policy.as_bytes())? {
            Position::Registered(_) => return Err(Error::AlreadyRegistered(policy)),
            Position::Predecessor(entry) => entry,
        };
        debug!("Inserting {} after registry node {} at {}", policy, hex::encode(&predecessor.node.key), predecessor.utxo.input);

        let directory_address = Address::enterprise(network, Credential::Script(directory_spend.hash));
        let relinked = predecessor.node.with_next(policy.to_vec());
        let inserted = RegistryNode::new(&policy, predecessor.node.next.clone(), &transfer.hash, third_party.as_ref());
        let predecessor_nft = Value::default().with_asset(directory_mint.hash, AssetName::new(predecessor.node.key.clone())?, 1);
        let inserted_nft = Value::default().with_asset(directory_mint.hash, AssetName::from(policy), 1);
        let directory_mint_redeemer = PlutusData::constr(1, vec![PlutusData::bytes(policy), PlutusData::bytes(issue.hash)]);

        let builder = self
            .issuance_builder(descriptor, &issuance, &issue.hash, policy)?
            .collect_from(wallet)
            .collect_from_script(predecessor.utxo.clone(), PlutusData::unit())
            .mint_asset(directory_mint.hash, AssetName::from(policy), 1, directory_mint_redeemer)
            .pay_to(directory_address, predecessor_nft, Some(relinked.to_data()))
            .pay_to(directory_address, inserted_nft, Some(inserted.to_data()))
            .read_from(protocol_params_utxo.input)
            .read_from(issuance_utxo.input)
            .attach_script(directory_spend.script)
            .attach_script(directory_mint.script)
            .attach_script(issuance_mint.script)
            .attach_script(issue.script.clone());

        let mut transaction = builder.build()?;
        rotate_change_last(&mut transaction.body, &issuance.payer);
        let directory_outputs = ensure_distinct_outputs(&transaction.body, &directory_address)?;
        if directory_outputs != 2 {
            return Err(Error::AssemblyFailure(format!("expected 2 registry outputs, found {directory_outputs}")));
        }

        let assembled = AssembledTransaction::new(Some(policy), transaction);
        info!("Assembled registration {} of policy {}", assembled.tx_id, policy);
        Ok(assembled)
    }

    /// Mints more supply of a registered policy.
    pub async fn mint(&self, request: &MintTokenRequest) -> Result<AssembledTransaction> {
        let issuance = request.validate(self.inner.settings.network)?;

        let descriptor = self.inner.bootstraps.resolve(issuance.version.as_ref())?;
        let issue = self.inner.substandards.require(&issuance.substandard, &issuance.issue_contract)?;
        let issuance_mint = self.inner.scripts.issuance_mint(descriptor, &issue.hash)?;
        let policy = issuance_mint.hash;
        info!("Minting {} of policy {} with protocol version {}", issuance.quantity, policy, descriptor.tx_hash);

        let protocol_params_utxo = self.find_utxo(&descriptor.protocol_params_utxo).await?;
        let issuance_utxo = self.find_utxo(&descriptor.issuance_utxo).await?;
        let wallet = self.wallet_utxos(&issuance.payer).await?;

        let mut builder = self
            .issuance_builder(descriptor, &issuance, &issue.hash, policy)?
            .collect_from(wallet)
            .attach_script(issue.script.clone())
            .attach_script(issuance_mint.script);
        for utxo in protocol_params_utxo.iter().chain(issuance_utxo.iter()) {
            builder = builder.read_from(utxo.input);
        }

        let mut transaction = builder.build()?;
        rotate_change_last(&mut transaction.body, &issuance.payer);
        let assembled = AssembledTransaction::new(Some(policy), transaction);
        info!("Assembled mint {} of policy {}", assembled.tx_id, policy);
        Ok(assembled)
    }

    /// Moves programmable tokens from the sender's programmable address to the recipients'.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<AssembledTransaction> {
        let network = self.inner.settings.network;
        let stake_key = self.validate_transfer(request)?;
        let (policy, asset_name) = (request.policy_id, &request.asset_name);
        let amount = request
            .recipients
            .iter()
            .try_fold(0u64, |total, (_, quantity)| total.checked_add(*quantity))
            .ok_or_else(|| Error::BadRequest("transfer amount overflows".to_string()))?;

        let descriptor = self.inner.bootstraps.resolve(request.version.as_ref())?;
        let scripts = &self.inner.scripts;
        let global = scripts.programmable_logic_global(descriptor)?;
        let base = scripts.programmable_logic_base(&global.hash)?;
        let pinned_global = &descriptor.programmable_logic_global_params.script_hash;
        check_deployment(descriptor, "programmable logic global", &global.hash, Some(pinned_global))?;
        check_deployment(descriptor, "programmable logic base", &base.hash, Some(&descriptor.programmable_logic_base_params.script_hash))?;
        let directory_mint = scripts.directory_mint(descriptor)?;
        let directory_spend = scripts.directory_spend(descriptor)?;
        check_deployment(descriptor, "directory spend", &directory_spend.hash, Some(&descriptor.directory_spend_params.script_hash))?;
        info!("Transferring {} of {}.{} with protocol version {}", amount, policy, asset_name, descriptor.tx_hash);

        let protocol_params_utxo = self.require_utxo(&descriptor.protocol_params_utxo, "protocol params").await?;
        let wallet = self.wallet_utxos(&request.sender).await?;
        let holder = Address::programmable(base.hash, &request.sender)?;
        let holdings = self.query("programmable UTxOs", self.inner.indexer.list_unspent_by_owner_address(&holder)).await?;
        let registry = self.registry(&directory_spend.hash, &directory_mint.hash).await?;

        let directory = registry
            .find_by_key(policy.as_bytes())
            .ok_or_else(|| Error::BadRequest(format!("policy {policy} is not registered")))?;
        let transfer_logic = directory
            .node
            .transfer_logic_script
            .script_hash()
            .ok_or_else(|| Error::RegistryInconsistent(format!("registry node of {policy} has no transfer logic script")))?;
        let (substandard, transfer) = self
            .inner
            .substandards
            .find_by_hash(&transfer_logic)
            .ok_or_else(|| Error::BlueprintMissing(format!("substandard validator {transfer_logic}")))?;
        debug!("Transfer logic of {} is {}/{}", policy, substandard, transfer.title);

        let mut selected = Vec::new();
        let mut held = 0u64;
        for utxo in holdings.into_iter().filter(|utxo| utxo.value.quantity_of(&policy, asset_name) > 0) {
            held = held.saturating_add(utxo.value.quantity_of(&policy, asset_name));
            selected.push(utxo);
            if held >= amount {
                break;
            }
        }
        if held < amount {
            return Err(Error::AssemblyFailure(format!("{holder} holds {held} of {policy}.{asset_name}, {amount} requested")));
        }

        let token = |quantity: u64| Value::default().with_asset(policy, asset_name.clone(), quantity);
        let spent_assets = selected.iter().try_fold(Value::default(), |total, utxo| total.checked_add(&utxo.value.without_coin()))?;
        let remainder = spent_assets
            .checked_sub(&token(amount))
            .ok_or_else(|| Error::AssemblyFailure("selected holdings do not cover the transfer".to_string()))?;

        let mut builder = TxBuilder::new(&self.inner.settings.protocol_parameters)
            .collect_from(wallet)
            .read_from(protocol_params_utxo.input)
            .read_from(directory.utxo.input);
        let proof_index = builder
            .reference_input_index(&directory.utxo.input)
            .ok_or_else(|| Error::AssemblyFailure("registry node is not referenced".to_string()))?;
        for utxo in selected {
            builder = builder.collect_from_script(utxo, PlutusData::unit());
        }
        let global_redeemer =
            PlutusData::constr(0, vec![PlutusData::List(vec![PlutusData::constr(0, vec![PlutusData::int(proof_index)])])]);
        builder = builder
            .withdraw(RewardAccount::new(network.id(), Credential::Script(transfer.hash)), 0, PlutusData::int(TRANSFER_WITHDRAWAL_REDEEMER))
            .withdraw(RewardAccount::new(network.id(), Credential::Script(global.hash)), 0, global_redeemer);
        for (recipient, quantity) in request.recipients.iter() {
            builder = builder.pay_to(Address::programmable(base.hash, recipient)?, token(*quantity), Some(PlutusData::unit()));
        }
        if !remainder.is_coin_only() {
            builder = builder.pay_to(holder, remainder, Some(PlutusData::unit()));
        }
        let builder = builder
            .attach_script(transfer.script.clone())
            .attach_script(global.script)
            .attach_script(base.script)
            .require_signer(stake_key)
            .change_address(request.sender)
            .merge_outputs(false);

        let mut transaction = builder.build()?;
        rotate_change_last(&mut transaction.body, &request.sender);
        let assembled = AssembledTransaction::new(None, transaction);
        info!("Assembled transfer {} of {}", assembled.tx_id, policy);
        Ok(assembled)
    }

    /// Programmable tokens held by `wallet`, per UTxO of its programmable address.
    pub async fn discover_tokens(&self, wallet: &Address) -> Result<Vec<DiscoveredToken>> {
        let descriptor = self.inner.bootstraps.active();
        let holder = Address::programmable(descriptor.programmable_logic_base_params.script_hash, wallet)?;
        let utxos = self.query("programmable UTxOs", self.inner.indexer.list_unspent_by_owner_address(&holder)).await?;
        let tokens = utxos
            .iter()
            .flat_map(|utxo| {
                utxo.value.assets().map(|(policy, name, quantity)| DiscoveredToken {
                    policy_id: *policy,
                    asset_name: name.clone(),
                    asset_name_utf8: name.as_utf8().map(str::to_string),
                    quantity,
                    utxo: utxo.input,
                })
            })
            .collect::<Vec<_>>();
        debug!("Found {} programmable tokens at {}", tokens.len(), holder);
        Ok(tokens)
    }

    /// Shared part of register and mint: the issuance mint, the substandard issue withdrawal
    /// and the recipient's programmable output.
    fn issuance_builder(
        &self,
        descriptor: &BootstrapDescriptor,
        issuance: &Issuance,
        substandard_issue: &ScriptHash,
        policy: PolicyId,
    ) -> Result<TxBuilder> {
        let network = self.inner.settings.network.id();
        let recipient = Address::programmable(descriptor.programmable_logic_base_params.script_hash, &issuance.recipient)?;
        let tokens = Value::default().with_asset(policy, issuance.asset_name.clone(), issuance.quantity as u64);
        let redeemer = PlutusData::constr(0, vec![PlutusData::constr(1, vec![PlutusData::bytes(substandard_issue)])]);
        Ok(TxBuilder::new(&self.inner.settings.protocol_parameters)
            .mint_asset(policy, issuance.asset_name.clone(), issuance.quantity, redeemer)
            .withdraw(
                RewardAccount::new(network, Credential::Script(*substandard_issue)),
                0,
                PlutusData::int(ISSUE_WITHDRAWAL_REDEEMER),
            )
            .pay_to(recipient, tokens, Some(PlutusData::unit()))
            .change_address(issuance.payer)
            .merge_outputs(false))
    }

    fn validate_transfer(&self, request: &TransferRequest) -> Result<KeyHash> {
        let network = self.inner.settings.network;
        if !request.sender.is_on(network) {
            return Err(Error::BadRequest(format!("sender {} is not on {network}", request.sender)));
        }
        if request.recipients.is_empty() {
            return Err(Error::BadRequest("transfer has no recipients".to_string()));
        }
        for (recipient, quantity) in request.recipients.iter() {
            if !recipient.is_on(network) || recipient.delegation_credential().is_none() {
                return Err(Error::BadRequest(format!("recipient {recipient} cannot hold programmable tokens on {network}")));
            }
            if *quantity == 0 {
                return Err(Error::BadRequest(format!("zero quantity for {recipient}")));
            }
        }
        match request.sender.delegation_credential() {
            Some(Credential::PubKey(key_hash)) => Ok(key_hash),
            Some(Credential::Script(_)) => Err(Error::BadRequest(format!("sender {} delegates to a script", request.sender))),
            None => Err(Error::BadRequest(format!("sender {} has no delegation credential", request.sender))),
        }
    }

    async fn query<T>(&self, what: &str, request: impl Future<Output = IndexResult<T>>) -> Result<T> {
        let timeout = self.inner.settings.indexer_timeout;
        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::IndexerUnavailable(format!("{what} query timed out after {timeout:?}"))),
        }
    }

    async fn find_utxo(&self, utxo_ref: &UtxoRef) -> Result<Option<Utxo>> {
        self.query("UTxO", self.inner.indexer.find_by_id(utxo_ref)).await
    }

    async fn require_utxo(&self, utxo_ref: &UtxoRef, what: &str) -> Result<Utxo> {
        self.find_utxo(utxo_ref).await?.ok_or_else(|| Error::AssemblyFailure(format!("unable to resolve the {what} UTxO {utxo_ref}")))
    }

    async fn wallet_utxos(&self, address: &Address) -> Result<Vec<Utxo>> {
        let utxos = self.query("wallet UTxOs", self.inner.indexer.list_unspent_by_owner_address(address)).await?;
        if utxos.is_empty() {
            warn!("Wallet {} has no UTxOs", address);
            return Err(Error::WalletEmpty(address.to_string()));
        }
        Ok(utxos)
    }

    async fn registry(&self, directory_spend: &ScriptHash, directory_mint: &PolicyId) -> Result<RegistryNavigator> {
        let utxos = self.query("registry", self.inner.indexer.list_unspent_by_payment_credential_hash(directory_spend)).await?;
        Ok(RegistryNavigator::from_utxos(directory_mint, utxos))
    }
}

/// Fails when a derived protocol script differs from the one the version pins.
fn check_deployment(descriptor: &BootstrapDescriptor, what: &str, derived: &ScriptHash, pinned: Option<&ScriptHash>) -> Result<()> {
    match pinned {
        Some(pinned) if pinned != derived => Err(Error::AssemblyFailure(format!(
            "derived {what} {derived} does not match {pinned} of version {}",
            descriptor.tx_hash
        ))),
        _ => Ok(()),
    }
}
