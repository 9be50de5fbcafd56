use crate::to_cbor;
use crate::value::Value;
use minicbor::data::Tag;
use minicbor::{Encode, Encoder, encode};
use progtoken_addresses::Address;
use progtoken_plutus::PlutusData;

/// Fixed per-output overhead, in bytes, of the ledger's minimum lovelace rule.
pub const OUTPUT_OVERHEAD: u64 = 160;

const TAG_ENCODED_CBOR: u64 = 24;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionOutput {
    pub address: Address,
    pub value: Value,
    pub datum: Option<PlutusData>,
}

impl TransactionOutput {
    pub fn new(address: Address, value: Value) -> Self {
        Self { address, value, datum: None }
    }

    pub fn with_datum(mut self, datum: PlutusData) -> Self {
        self.datum = Some(datum);
        self
    }

    /// Smallest lovelace amount this output may carry: the least fixpoint of
    /// `coin = (160 + size(output with coin)) * coins_per_utxo_byte`.
    pub fn min_ada(&self, coins_per_utxo_byte: u64) -> u64 {
        let mut probe = self.clone();
        probe.value.coin = 0;
        loop {
            let required = (OUTPUT_OVERHEAD + to_cbor(&probe).len() as u64) * coins_per_utxo_byte;
            if required <= probe.value.coin {
                return probe.value.coin;
            }
            probe.value.coin = required;
        }
    }

    /// Raises the lovelace amount to [`TransactionOutput::min_ada`] when below it.
    pub fn with_min_ada(mut self, coins_per_utxo_byte: u64) -> Self {
        self.value.coin = self.value.coin.max(self.min_ada(coins_per_utxo_byte));
        self
    }
}

impl<C> Encode<C> for TransactionOutput {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>, ctx: &mut C) -> Result<(), encode::Error<W::Error>> {
        e.map(if self.datum.is_some() { 3 } else { 2 })?;
        e.u8(0)?.bytes(&self.address.to_bytes())?;
        e.u8(1)?;
        self.value.encode(e, ctx)?;
        if let Some(datum) = &self.datum {
            e.u8(2)?.array(2)?.u8(1)?.tag(Tag::new(TAG_ENCODED_CBOR))?.bytes(&datum.to_cbor())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AssetName;
    use progtoken_addresses::{Credential, NetworkId};
    use progtoken_hashes::PolicyId;

    fn address() -> Address {
        Address::enterprise(NetworkId::Testnet, Credential::PubKey([7u8; 28].into()))
    }

    #[test]
    fn test_encoding() {
        let output = TransactionOutput::new(address(), Value::lovelace(1_000_000)).with_datum(PlutusData::unit());
        let expected = format!("a300581d60{}011a000f4240028201d81843d87980", "07".repeat(28));
        assert_eq!(hex::encode(to_cbor(&output)), expected);
    }

    #[test]
    fn test_min_ada_fixpoint() {
        let cpb = 4310;
        let plain = TransactionOutput::new(address(), Value::lovelace(0));
        let min = plain.min_ada(cpb);
        // 34 bytes around a 5 byte coin
        assert_eq!(min, (160 + 39) * cpb);
        let topped = plain.clone().with_min_ada(cpb);
        assert_eq!(topped.value.coin, min);
        assert_eq!(topped.min_ada(cpb), min);

        let rich = TransactionOutput::new(address(), Value::lovelace(50_000_000)).with_min_ada(cpb);
        assert_eq!(rich.value.coin, 50_000_000);

        let with_token = TransactionOutput::new(
            address(),
            Value::lovelace(0).with_asset(PolicyId::from_bytes([1; 28]), AssetName::from_hex("74").unwrap(), 1000),
        )
        .with_datum(PlutusData::unit());
        assert!(with_token.min_ada(cpb) > min);
    }
}
