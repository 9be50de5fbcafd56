use crate::input::UtxoRef;
use crate::output::TransactionOutput;
use crate::value::Value;
use progtoken_addresses::Address;
use progtoken_plutus::{DataError, PlutusData};
use serde::{Deserialize, Serialize};

/// An unspent output as reported by the indexer.
///
/// JSON form: `{ txHash, outputIndex, address, value: { lovelace, assets }, inlineDatum? }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    #[serde(flatten)]
    pub input: UtxoRef,
    pub address: Address,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::serde_bytes")]
    pub inline_datum: Option<Vec<u8>>,
}

impl Utxo {
    pub fn new(input: UtxoRef, address: Address, value: Value) -> Self {
        Self { input, address, value, inline_datum: None }
    }

    pub fn with_datum(mut self, datum: &PlutusData) -> Self {
        self.inline_datum = Some(datum.to_cbor());
        self
    }

    pub fn datum(&self) -> Option<Result<PlutusData, DataError>> {
        self.inline_datum.as_deref().map(PlutusData::from_cbor)
    }

    /// The output this UTxO was created by, when its datum decodes.
    pub fn to_output(&self) -> Result<TransactionOutput, DataError> {
        Ok(TransactionOutput { address: self.address, value: self.value.clone(), datum: self.datum().transpose()? })
    }
}
