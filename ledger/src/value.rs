use crate::error::LedgerError;
use minicbor::{Encode, Encoder, encode};
use progtoken_hashes::PolicyId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

pub const MAX_ASSET_NAME_LEN: usize = 32;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub fn new(bytes: Vec<u8>) -> Result<Self, LedgerError> {
        if bytes.len() > MAX_ASSET_NAME_LEN {
            return Err(LedgerError::AssetNameTooLong(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, LedgerError> {
        Self::new(hex::decode(hex_str)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The name as text when it is printable UTF-8.
    pub fn as_utf8(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok().filter(|s| !s.chars().any(char::is_control))
    }
}

impl From<progtoken_hashes::Hash28> for AssetName {
    fn from(hash: progtoken_hashes::Hash28) -> Self {
        Self(hash.to_vec())
    }
}

impl Display for AssetName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl Debug for AssetName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "AssetName({self})")
    }
}

impl Serialize for AssetName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        AssetName::from_hex(&String::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

pub type Assets<T> = BTreeMap<PolicyId, BTreeMap<AssetName, T>>;

fn encode_assets<T: Copy, W: encode::Write>(
    assets: &Assets<T>,
    e: &mut Encoder<W>,
    mut quantity: impl FnMut(&mut Encoder<W>, T) -> Result<(), encode::Error<W::Error>>,
) -> Result<(), encode::Error<W::Error>> {
    e.map(assets.len() as u64)?;
    for (policy, names) in assets {
        e.bytes(policy.as_ref())?.map(names.len() as u64)?;
        for (name, amount) in names {
            e.bytes(name.as_bytes())?;
            quantity(e, *amount)?;
        }
    }
    Ok(())
}

/// Lovelace plus native assets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Value {
    pub coin: u64,
    assets: Assets<u64>,
}

impl Value {
    pub fn lovelace(coin: u64) -> Self {
        Self { coin, assets: Assets::new() }
    }

    pub fn with_asset(mut self, policy: PolicyId, name: AssetName, quantity: u64) -> Self {
        self.insert_asset(policy, name, quantity);
        self
    }

    /// Adds `quantity` of an asset, saturating on overflow.
    pub fn insert_asset(&mut self, policy: PolicyId, name: AssetName, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let entry = self.assets.entry(policy).or_default().entry(name).or_default();
        *entry = entry.saturating_add(quantity);
    }

    pub fn quantity_of(&self, policy: &PolicyId, name: &AssetName) -> u64 {
        self.assets.get(policy).and_then(|names| names.get(name)).copied().unwrap_or_default()
    }

    pub fn is_coin_only(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn assets(&self) -> impl Iterator<Item = (&PolicyId, &AssetName, u64)> {
        self.assets.iter().flat_map(|(policy, names)| names.iter().map(move |(name, quantity)| (policy, name, *quantity)))
    }

    pub fn asset_count(&self) -> usize {
        self.assets.values().map(BTreeMap::len).sum()
    }

    pub fn checked_add(&self, other: &Value) -> Result<Value, LedgerError> {
        let mut sum = self.clone();
        sum.coin = sum.coin.checked_add(other.coin).ok_or(LedgerError::Overflow)?;
        for (policy, name, quantity) in other.assets() {
            let entry = sum.assets.entry(*policy).or_default().entry(name.clone()).or_default();
            *entry = entry.checked_add(quantity).ok_or(LedgerError::Overflow)?;
        }
        Ok(sum)
    }

    /// `self - other`, or `None` when any quantity would go negative.
    pub fn checked_sub(&self, other: &Value) -> Option<Value> {
        let mut difference = self.clone();
        difference.coin = difference.coin.checked_sub(other.coin)?;
        for (policy, name, quantity) in other.assets() {
            let names = difference.assets.get_mut(policy)?;
            let entry = names.get_mut(name)?;
            *entry = entry.checked_sub(quantity)?;
            if *entry == 0 {
                names.remove(name);
                if names.is_empty() {
                    difference.assets.remove(policy);
                }
            }
        }
        Some(difference)
    }

    /// Whether `self` holds at least `other` of every component.
    pub fn covers(&self, other: &Value) -> bool {
        self.checked_sub(other).is_some()
    }

    pub fn without_coin(&self) -> Value {
        Value { coin: 0, assets: self.assets.clone() }
    }
}

impl<C> Encode<C> for Value {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>, _ctx: &mut C) -> Result<(), encode::Error<W::Error>> {
        if self.assets.is_empty() {
            e.u64(self.coin)?;
            return Ok(());
        }
        e.array(2)?.u64(self.coin)?;
        encode_assets(&self.assets, e, |e, quantity| e.u64(quantity).map(|_| ()))
    }
}

/// JSON form: `{ "lovelace": n, "assets": { "<policy hex><name hex>": n } }`
#[derive(Serialize, Deserialize)]
struct ValueRepr {
    lovelace: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    assets: BTreeMap<String, u64>,
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let assets = self.assets().map(|(policy, name, quantity)| (format!("{policy}{name}"), quantity)).collect();
        ValueRepr { lovelace: self.coin, assets }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = ValueRepr::deserialize(deserializer)?;
        let mut value = Value::lovelace(repr.lovelace);
        for (unit, quantity) in repr.assets {
            let (policy, name) = parse_unit(&unit).map_err(serde::de::Error::custom)?;
            value.insert_asset(policy, name, quantity);
        }
        Ok(value)
    }
}

/// Splits an asset unit, the policy hex followed by the asset name hex.
pub fn parse_unit(unit: &str) -> Result<(PolicyId, AssetName), LedgerError> {
    let invalid = || LedgerError::InvalidAssetUnit(unit.to_string());
    let policy_hex = unit.get(..PolicyId::SIZE * 2).ok_or_else(invalid)?;
    let name_hex = unit.get(PolicyId::SIZE * 2..).ok_or_else(invalid)?;
    Ok((policy_hex.parse().map_err(|_| invalid())?, AssetName::from_hex(name_hex)?))
}

/// Signed per-policy asset quantities of the mint field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mint(Assets<i64>);

impl Mint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, policy: PolicyId, name: AssetName, quantity: i64) {
        *self.0.entry(policy).or_default().entry(name).or_default() += quantity;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Policies in ledger order, which is also the mint redeemer index order.
    pub fn policies(&self) -> impl Iterator<Item = &PolicyId> {
        self.0.keys()
    }

    pub fn quantity_of(&self, policy: &PolicyId, name: &AssetName) -> i64 {
        self.0.get(policy).and_then(|names| names.get(name)).copied().unwrap_or_default()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&PolicyId, &AssetName, i64)> {
        self.0.iter().flat_map(|(policy, names)| names.iter().map(move |(name, quantity)| (policy, name, *quantity)))
    }

    /// Freshly minted assets, which enter the transaction like an input.
    pub fn minted(&self) -> Value {
        let mut value = Value::default();
        for (policy, name, quantity) in self.entries().filter(|(_, _, quantity)| *quantity > 0) {
            value.insert_asset(*policy, name.clone(), quantity as u64);
        }
        value
    }

    /// Burnt assets, which leave the transaction like an output.
    pub fn burnt(&self) -> Value {
        let mut value = Value::default();
        for (policy, name, quantity) in self.entries().filter(|(_, _, quantity)| *quantity < 0) {
            value.insert_asset(*policy, name.clone(), quantity.unsigned_abs());
        }
        value
    }
}

impl<C> Encode<C> for Mint {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>, _ctx: &mut C) -> Result<(), encode::Error<W::Error>> {
        encode_assets(&self.0, e, |e, quantity| e.i64(quantity).map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_cbor;

    fn policy(byte: u8) -> PolicyId {
        PolicyId::from_bytes([byte; 28])
    }

    fn name(s: &str) -> AssetName {
        AssetName::new(s.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_asset_name() {
        assert!(AssetName::new(vec![0; 32]).is_ok());
        assert_eq!(AssetName::new(vec![0; 33]), Err(LedgerError::AssetNameTooLong(33)));
        assert_eq!(AssetName::from_hex("74").unwrap().as_utf8(), Some("t"));
        assert_eq!(AssetName::from_hex("00ff").unwrap().as_utf8(), None);
        assert!(AssetName::from_hex("7").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Value::lovelace(10).with_asset(policy(1), name("a"), 5);
        let b = Value::lovelace(3).with_asset(policy(1), name("a"), 5).with_asset(policy(2), name("b"), 1);

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.coin, 13);
        assert_eq!(sum.quantity_of(&policy(1), &name("a")), 10);
        assert_eq!(sum.asset_count(), 2);

        let difference = sum.checked_sub(&a).unwrap();
        assert_eq!(difference, b);
        assert!(a.checked_sub(&b).is_none());
        assert!(sum.covers(&b));
        assert!(!a.covers(&b));

        // zero quantities are pruned
        assert!(sum.checked_sub(&b).unwrap().checked_sub(&a).unwrap().is_coin_only());
        assert_eq!(Value::lovelace(u64::MAX).checked_add(&Value::lovelace(1)), Err(LedgerError::Overflow));
    }

    #[test]
    fn test_json() {
        let value = Value::lovelace(2_000_000).with_asset(policy(0xab), name("t"), 7);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, format!(r#"{{"lovelace":2000000,"assets":{{"{}74":7}}}}"#, "ab".repeat(28)));
        assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), value);
        assert_eq!(serde_json::from_str::<Value>(r#"{"lovelace":5}"#).unwrap(), Value::lovelace(5));
        assert!(serde_json::from_str::<Value>(r#"{"lovelace":5,"assets":{"abcd":1}}"#).is_err());
        assert!(parse_unit(&"ab".repeat(28)).unwrap().1.is_empty());
    }

    #[test]
    fn test_encoding() {
        assert_eq!(hex::encode(to_cbor(&Value::lovelace(1_000_000))), "1a000f4240");
        let value = Value::lovelace(2).with_asset(policy(0xab), name("t"), 1000);
        assert_eq!(hex::encode(to_cbor(&value)), format!("8202a1581c{}a141741903e8", "ab".repeat(28)));

        let mut mint = Mint::new();
        mint.insert(policy(0xab), name("t"), -5);
        assert_eq!(hex::encode(to_cbor(&mint)), format!("a1581c{}a1417424", "ab".repeat(28)));
        assert_eq!(mint.burnt().quantity_of(&policy(0xab), &name("t")), 5);
        assert!(mint.minted().is_coin_only());
    }
}
