use crate::input::UtxoRef;
use crate::output::TransactionOutput;
use crate::params::ExUnits;
use crate::to_cbor;
use crate::value::Mint;
use minicbor::{Encode, Encoder, encode};
use progtoken_addresses::{Address, Credential, NetworkId};
use progtoken_hashes::{Blake2b256, Hash32, Hasher, KeyHash, PolicyId, TransactionHash};
use progtoken_plutus::{PlutusData, PlutusScript};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum RedeemerTag {
    Spend = 0,
    Mint = 1,
    Cert = 2,
    Reward = 3,
    Vote = 4,
    Propose = 5,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redeemer {
    pub tag: RedeemerTag,
    pub index: u32,
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

impl Redeemer {
    pub fn new(tag: RedeemerTag, index: u32, data: PlutusData, ex_units: ExUnits) -> Self {
        Self { tag, index, data, ex_units }
    }
}

/// Conway map form: `{ [tag, index] => [data, [mem, steps]] }`, in key order.
pub(crate) fn encode_redeemers<W: encode::Write>(redeemers: &[Redeemer], e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
    let mut sorted = redeemers.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|redeemer| (redeemer.tag, redeemer.index));
    e.map(sorted.len() as u64)?;
    for redeemer in sorted {
        e.array(2)?.u8(redeemer.tag as u8)?.u32(redeemer.index)?;
        e.array(2)?.encode(&redeemer.data)?;
        e.array(2)?.u64(redeemer.ex_units.mem)?.u64(redeemer.ex_units.steps)?;
    }
    Ok(())
}

/// Stake credential a withdrawal is drawn from.
///
/// Ordered as the ledger orders withdrawals: network, then script credentials before key
/// credentials, then hash. Reward redeemer indices follow this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RewardAccount {
    pub network: NetworkId,
    pub credential: Credential,
}

impl RewardAccount {
    pub fn new(network: NetworkId, credential: Credential) -> Self {
        Self { network, credential }
    }

    pub fn to_address(&self) -> Address {
        Address::reward(self.network, self.credential)
    }
}

impl Ord for RewardAccount {
    fn cmp(&self, other: &Self) -> Ordering {
        self.network
            .cmp(&other.network)
            .then_with(|| other.credential.is_script().cmp(&self.credential.is_script()))
            .then_with(|| self.credential.hash().cmp(other.credential.hash()))
    }
}

impl PartialOrd for RewardAccount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionBody {
    pub inputs: BTreeSet<UtxoRef>,
    pub outputs: Vec<TransactionOutput>,
    pub fee: u64,
    pub withdrawals: BTreeMap<RewardAccount, u64>,
    pub mint: Mint,
    pub script_data_hash: Option<Hash32>,
    pub collateral: BTreeSet<UtxoRef>,
    pub required_signers: BTreeSet<KeyHash>,
    pub collateral_return: Option<TransactionOutput>,
    pub total_collateral: Option<u64>,
    pub reference_inputs: BTreeSet<UtxoRef>,
}

fn position<'a, T: PartialEq + 'a>(mut items: impl Iterator<Item = &'a T>, item: &T) -> Option<u32> {
    items.position(|x| x == item).map(|index| index as u32)
}

impl TransactionBody {
    /// Spend redeemer index of an input.
    pub fn input_index(&self, input: &UtxoRef) -> Option<u32> {
        position(self.inputs.iter(), input)
    }

    pub fn reference_input_index(&self, input: &UtxoRef) -> Option<u32> {
        position(self.reference_inputs.iter(), input)
    }

    /// Mint redeemer index of a policy.
    pub fn mint_index(&self, policy: &PolicyId) -> Option<u32> {
        position(self.mint.policies(), policy)
    }

    /// Reward redeemer index of a withdrawal.
    pub fn withdrawal_index(&self, account: &RewardAccount) -> Option<u32> {
        position(self.withdrawals.keys(), account)
    }

    pub fn id(&self) -> TransactionHash {
        Blake2b256::hash(to_cbor(self))
    }
}

fn encode_set<W: encode::Write, T: Encode<()>>(e: &mut Encoder<W>, key: u8, items: &BTreeSet<T>) -> Result<(), encode::Error<W::Error>> {
    e.u8(key)?.array(items.len() as u64)?;
    for item in items {
        e.encode(item)?;
    }
    Ok(())
}

impl<C> Encode<C> for TransactionBody {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>, _ctx: &mut C) -> Result<(), encode::Error<W::Error>> {
        let entries = 3
            + !self.withdrawals.is_empty() as u64
            + !self.mint.is_empty() as u64
            + self.script_data_hash.is_some() as u64
            + !self.collateral.is_empty() as u64
            + !self.required_signers.is_empty() as u64
            + self.collateral_return.is_some() as u64
            + self.total_collateral.is_some() as u64
            + !self.reference_inputs.is_empty() as u64;
        e.map(entries)?;

        encode_set(e, 0, &self.inputs)?;
        e.u8(1)?.array(self.outputs.len() as u64)?;
        for output in &self.outputs {
            e.encode(output)?;
        }
        e.u8(2)?.u64(self.fee)?;
        if !self.withdrawals.is_empty() {
            e.u8(5)?.map(self.withdrawals.len() as u64)?;
            for (account, amount) in &self.withdrawals {
                e.bytes(&account.to_address().to_bytes())?.u64(*amount)?;
            }
        }
        if !self.mint.is_empty() {
            e.u8(9)?.encode(&self.mint)?;
        }
        if let Some(hash) = &self.script_data_hash {
            e.u8(11)?.bytes(hash.as_ref())?;
        }
        if !self.collateral.is_empty() {
            encode_set(e, 13, &self.collateral)?;
        }
        if !self.required_signers.is_empty() {
            e.u8(14)?.array(self.required_signers.len() as u64)?;
            for signer in &self.required_signers {
                e.bytes(signer.as_ref())?;
            }
        }
        if let Some(output) = &self.collateral_return {
            e.u8(16)?.encode(output)?;
        }
        if let Some(total) = self.total_collateral {
            e.u8(17)?.u64(total)?;
        }
        if !self.reference_inputs.is_empty() {
            encode_set(e, 18, &self.reference_inputs)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WitnessSet {
    pub redeemers: Vec<Redeemer>,
    pub plutus_v3_scripts: Vec<PlutusScript>,
}

impl<C> Encode<C> for WitnessSet {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>, _ctx: &mut C) -> Result<(), encode::Error<W::Error>> {
        e.map(!self.redeemers.is_empty() as u64 + !self.plutus_v3_scripts.is_empty() as u64)?;
        if !self.redeemers.is_empty() {
            e.u8(5)?;
            encode_redeemers(&self.redeemers, e)?;
        }
        if !self.plutus_v3_scripts.is_empty() {
            e.u8(7)?.array(self.plutus_v3_scripts.len() as u64)?;
            for script in &self.plutus_v3_scripts {
                e.bytes(script.code())?;
            }
        }
        Ok(())
    }
}

/// An unsigned Conway transaction: `[body, witness_set, true, null]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    pub body: TransactionBody,
    pub witness_set: WitnessSet,
}

impl Transaction {
    pub fn id(&self) -> TransactionHash {
        self.body.id()
    }

    pub fn to_cbor(&self) -> Vec<u8> {
        to_cbor(self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_cbor())
    }
}

impl<C> Encode<C> for Transaction {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>, ctx: &mut C) -> Result<(), encode::Error<W::Error>> {
        e.array(4)?;
        self.body.encode(e, ctx)?;
        self.witness_set.encode(e, ctx)?;
        e.bool(true)?.null()?;
        Ok(())
    }
}
