//!
//! Balancing transaction builder: collects inputs, mints, withdrawals and outputs, then
//! indexes redeemers, selects collateral and iterates the fee until the change output settles.
//!

use itertools::Itertools;
use progtoken_addresses::{Address, Credential};
use progtoken_core::{debug, trace};
use progtoken_hashes::{KeyHash, PolicyId};
use progtoken_ledger::fee::VKEY_WITNESS_SIZE;
use progtoken_ledger::{
    AssetName, ExUnits, FeeCalculator, LedgerError, ProtocolParameters, Redeemer, RedeemerTag, RewardAccount, Transaction,
    TransactionBody, TransactionOutput, Utxo, UtxoRef, Value, WitnessSet, script_data_hash,
};
use progtoken_plutus::{PlutusData, PlutusScript, PlutusVersion};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Upper bound of fee refinement rounds.
pub const MAX_FEE_ITERATIONS: usize = 16;

/// Witness set key and array header added once signatures are attached.
const VKEY_WITNESSES_OVERHEAD: u64 = 4;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Change address is not set")]
    MissingChangeAddress,

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Change of {change} lovelace is below the minimum of {minimum}")]
    InsufficientChange { change: u64, minimum: u64 },

    #[error("No collateral candidate covers {0} lovelace")]
    NoCollateral(u64),

    #[error("Transaction size {size} exceeds the limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Execution units {0:?} exceed the transaction limit")]
    ExUnitsExceeded(ExUnits),

    #[error("Fee did not settle after {0} iterations")]
    FeeDiverged(usize),

    #[error("Redeemer target {0} is not part of the transaction")]
    MissingRedeemerTarget(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Clone, Debug)]
struct MintEntry {
    assets: Vec<(AssetName, i64)>,
    redeemer: PlutusData,
}

#[derive(Clone, Debug)]
struct WithdrawalEntry {
    account: RewardAccount,
    amount: u64,
    redeemer: PlutusData,
}

/// Composes an unsigned transaction.
///
/// All collected wallet UTxOs are spent; the fee is paid from them and the surplus goes to a
/// change output seeded in the first output slot.
#[derive(Clone, Debug)]
pub struct TxBuilder {
    params: ProtocolParameters,
    calc: FeeCalculator,
    wallet_inputs: Vec<Utxo>,
    script_inputs: Vec<(Utxo, PlutusData)>,
    mints: BTreeMap<PolicyId, MintEntry>,
    withdrawals: Vec<WithdrawalEntry>,
    outputs: Vec<TransactionOutput>,
    reference_inputs: BTreeSet<UtxoRef>,
    scripts: Vec<PlutusScript>,
    required_signers: BTreeSet<KeyHash>,
    change_address: Option<Address>,
    merge_outputs: bool,
}

impl TxBuilder {
    pub fn new(params: &ProtocolParameters) -> Self {
        Self {
            params: params.clone(),
            calc: FeeCalculator::new_with_protocol_params(params),
            wallet_inputs: Vec::new(),
            script_inputs: Vec::new(),
            mints: BTreeMap::new(),
            withdrawals: Vec::new(),
            outputs: Vec::new(),
            reference_inputs: BTreeSet::new(),
            scripts: Vec::new(),
            required_signers: BTreeSet::new(),
            change_address: None,
            merge_outputs: true,
        }
    }

    /// Spends key-locked UTxOs; they fund the fee and collateral.
    pub fn collect_from(mut self, utxos: impl IntoIterator<Item = Utxo>) -> Self {
        self.wallet_inputs.extend(utxos);
        self
    }

    /// Spends a script-locked UTxO with `redeemer`.
    pub fn collect_from_script(mut self, utxo: Utxo, redeemer: PlutusData) -> Self {
        self.script_inputs.push((utxo, redeemer));
        self
    }

    /// Mints (or burns, when negative) `quantity` of `name` under `policy`.
    /// The first redeemer given for a policy is kept.
    pub fn mint_asset(mut self, policy: PolicyId, name: AssetName, quantity: i64, redeemer: PlutusData) -> Self {
        self.mints.entry(policy).or_insert_with(|| MintEntry { assets: Vec::new(), redeemer }).assets.push((name, quantity));
        self
    }

    pub fn withdraw(mut self, account: RewardAccount, amount: u64, redeemer: PlutusData) -> Self {
        self.withdrawals.push(WithdrawalEntry { account, amount, redeemer });
        self
    }

    /// Adds an output; its lovelace is raised to the minimum when lower.
    pub fn pay_to(mut self, address: Address, value: Value, datum: Option<PlutusData>) -> Self {
        let output = TransactionOutput { address, value, datum };
        self.outputs.push(output);
        self
    }

    pub fn read_from(mut self, utxo_ref: UtxoRef) -> Self {
        self.reference_inputs.insert(utxo_ref);
        self
    }

    pub fn attach_script(mut self, script: PlutusScript) -> Self {
        if !self.scripts.contains(&script) {
            self.scripts.push(script);
        }
        self
    }

    pub fn require_signer(mut self, key_hash: KeyHash) -> Self {
        self.required_signers.insert(key_hash);
        self
    }

    pub fn change_address(mut self, address: Address) -> Self {
        self.change_address = Some(address);
        self
    }

    /// Whether outputs to the same address are combined into one.
    pub fn merge_outputs(mut self, merge: bool) -> Self {
        self.merge_outputs = merge;
        self
    }

    /// Position of `utxo_ref` among the sorted reference inputs.
    pub fn reference_input_index(&self, utxo_ref: &UtxoRef) -> Option<u32> {
        self.reference_inputs.iter().position(|input| input == utxo_ref).map(|index| index as u32)
    }

    pub fn build(self) -> Result<Transaction, BuildError> {
        let change_address = self.change_address.ok_or(BuildError::MissingChangeAddress)?;
        let coins_per_utxo_byte = self.params.coins_per_utxo_byte;

        let mut outputs = self.outputs.iter().cloned().map(|output| output.with_min_ada(coins_per_utxo_byte)).collect::<Vec<_>>();
        if self.merge_outputs {
            outputs = merge_outputs(outputs)?;
        }

        let mut body = TransactionBody {
            inputs: self.wallet_inputs.iter().chain(self.script_inputs.iter().map(|(utxo, _)| utxo)).map(|utxo| utxo.input).collect(),
            reference_inputs: self.reference_inputs.clone(),
            required_signers: self.required_signers.clone(),
            ..Default::default()
        };
        for (policy, entry) in self.mints.iter() {
            for (name, quantity) in entry.assets.iter() {
                body.mint.insert(*policy, name.clone(), *quantity);
            }
        }
        for withdrawal in self.withdrawals.iter() {
            body.withdrawals.insert(withdrawal.account, withdrawal.amount);
        }

        let redeemers = self.redeemers(&body)?;
        let ex_units = redeemers.iter().fold(ExUnits::default(), |total, redeemer| total.saturating_add(redeemer.ex_units));
        if !ex_units.fits(&self.params.max_tx_ex_units) {
            return Err(BuildError::ExUnitsExceeded(ex_units));
        }
        if !redeemers.is_empty() {
            body.script_data_hash = Some(script_data_hash(&redeemers, PlutusVersion::V3, &self.params.cost_model_v3));
        }
        let witness_set = WitnessSet { redeemers, plutus_v3_scripts: self.scripts.clone() };

        let available = self.available_value(&body)?;
        let spent = sum_values(outputs.iter().map(|output| &output.value))?.checked_add(&body.mint.burnt())?;
        let surplus = available.checked_sub(&spent).ok_or_else(|| BuildError::InsufficientFunds(shortfall(&available, &spent)))?;

        let signatures = self.signer_count();
        let witness_overhead = signatures * VKEY_WITNESS_SIZE + VKEY_WITNESSES_OVERHEAD;

        let mut fee = 0;
        for iteration in 0..MAX_FEE_ITERATIONS {
            let change = surplus
                .checked_sub(&Value::lovelace(fee))
                .ok_or_else(|| BuildError::InsufficientFunds(format!("{} lovelace left for a fee of {}", surplus.coin, fee)))?;
            body.fee = fee;
            body.outputs = std::iter::once(TransactionOutput::new(change_address, change)).chain(outputs.iter().cloned()).collect();
            if !witness_set.redeemers.is_empty() {
                self.apply_collateral(&mut body, change_address)?;
            }

            let transaction = Transaction { body: body.clone(), witness_set: witness_set.clone() };
            let size = transaction.to_cbor().len() as u64 + witness_overhead;
            let required = self.calc.fee(size, ex_units);
            trace!("Fee iteration {}: size {} fee {} required {}", iteration, size, fee, required);

            if required <= fee {
                if size > self.params.max_tx_size {
                    return Err(BuildError::TooLarge { size, limit: self.params.max_tx_size });
                }
                let change = &transaction.body.outputs[0];
                let minimum = change.min_ada(coins_per_utxo_byte);
                if change.value.coin < minimum {
                    return Err(BuildError::InsufficientChange { change: change.value.coin, minimum });
                }
                debug!("Built transaction {} with fee {} and size {}", transaction.id(), fee, size);
                return Ok(transaction);
            }
            fee = required;
        }
        Err(BuildError::FeeDiverged(MAX_FEE_ITERATIONS))
    }

    fn redeemers(&self, body: &TransactionBody) -> Result<Vec<Redeemer>, BuildError> {
        let ex_units = self.params.redeemer_ex_units;
        let mut redeemers = Vec::new();
        for (utxo, data) in self.script_inputs.iter() {
            let index = body.input_index(&utxo.input).ok_or_else(|| BuildError::MissingRedeemerTarget(utxo.input.to_string()))?;
            redeemers.push(Redeemer::new(RedeemerTag::Spend, index, data.clone(), ex_units));
        }
        for (policy, entry) in self.mints.iter() {
            let index = body.mint_index(policy).ok_or_else(|| BuildError::MissingRedeemerTarget(policy.to_string()))?;
            redeemers.push(Redeemer::new(RedeemerTag::Mint, index, entry.redeemer.clone(), ex_units));
        }
        for withdrawal in self.withdrawals.iter() {
            let index = body
                .withdrawal_index(&withdrawal.account)
                .ok_or_else(|| BuildError::MissingRedeemerTarget(withdrawal.account.to_address().to_string()))?;
            redeemers.push(Redeemer::new(RedeemerTag::Reward, index, withdrawal.redeemer.clone(), ex_units));
        }
        Ok(redeemers)
    }

    /// Inputs plus minted assets plus withdrawals.
    fn available_value(&self, body: &TransactionBody) -> Result<Value, BuildError> {
        let inputs = self.wallet_inputs.iter().chain(self.script_inputs.iter().map(|(utxo, _)| utxo)).map(|utxo| &utxo.value);
        let mut available = sum_values(inputs)?.checked_add(&body.mint.minted())?;
        let withdrawn = self.withdrawals.iter().try_fold(0u64, |total, withdrawal| total.checked_add(withdrawal.amount));
        available.coin = available.coin.checked_add(withdrawn.ok_or(LedgerError::Overflow)?).ok_or(LedgerError::Overflow)?;
        Ok(available)
    }

    /// Distinct key hashes expected to sign: wallet input owners and required signers.
    fn signer_count(&self) -> u64 {
        let owners = self.wallet_inputs.iter().filter_map(|utxo| match utxo.address.payment_credential() {
            Some(Credential::PubKey(hash)) => Some(hash),
            _ => None,
        });
        owners.chain(self.required_signers.iter().copied()).unique().count() as u64
    }

    /// Picks collateral for the current fee: coin-only wallet UTxOs first, largest first.
    fn apply_collateral(&self, body: &mut TransactionBody, change_address: Address) -> Result<(), BuildError> {
        let required = (body.fee as u128 * self.params.collateral_percentage as u128).div_ceil(100) as u64;
        let candidates = self
            .wallet_inputs
            .iter()
            .sorted_by_key(|utxo| (!utxo.value.is_coin_only(), std::cmp::Reverse(utxo.value.coin)))
            .take(self.params.max_collateral_inputs);

        let mut selected = BTreeSet::new();
        let mut total = Value::default();
        for utxo in candidates {
            selected.insert(utxo.input);
            total = total.checked_add(&utxo.value)?;
            if total.coin < required {
                continue;
            }
            let Some(remainder) = total.checked_sub(&Value::lovelace(required)) else { continue };
            let collateral_return = match remainder == Value::default() {
                true => None,
                false => {
                    let output = TransactionOutput::new(change_address, remainder);
                    if output.value.coin < output.min_ada(self.params.coins_per_utxo_byte) {
                        continue;
                    }
                    Some(output)
                }
            };
            body.collateral = selected;
            body.total_collateral = Some(required);
            body.collateral_return = collateral_return;
            return Ok(());
        }
        Err(BuildError::NoCollateral(required))
    }
}

fn sum_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Result<Value, LedgerError> {
    values.into_iter().try_fold(Value::default(), |total, value| total.checked_add(value))
}

fn shortfall(available: &Value, required: &Value) -> String {
    let mut missing = Vec::new();
    if available.coin < required.coin {
        missing.push(format!("{} lovelace", required.coin - available.coin));
    }
    for (policy, name, quantity) in required.assets() {
        let held = available.quantity_of(policy, name);
        if held < quantity {
            missing.push(format!("{} of {}{}", quantity - held, policy, name));
        }
    }
    format!("missing {}", missing.join(", "))
}

/// Combines outputs sharing an address; the first datum seen is kept.
fn merge_outputs(outputs: Vec<TransactionOutput>) -> Result<Vec<TransactionOutput>, LedgerError> {
    let mut merged: Vec<TransactionOutput> = Vec::with_capacity(outputs.len());
    for output in outputs {
        match merged.iter_mut().find(|existing| existing.address == output.address) {
            Some(existing) => {
                existing.value = existing.value.checked_add(&output.value)?;
                if existing.datum.is_none() {
                    existing.datum = output.datum;
                }
            }
            None => merged.push(output),
        }
    }
    Ok(merged)
}
