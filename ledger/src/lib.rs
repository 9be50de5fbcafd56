pub mod error;
pub mod fee;
pub mod input;
pub mod output;
pub mod params;
pub mod tx;
pub mod utxo;
pub mod value;

mod serde_bytes;

pub use error::LedgerError;
pub use fee::{FeeCalculator, script_data_hash};
pub use input::UtxoRef;
pub use output::TransactionOutput;
pub use params::{ExUnits, ProtocolParameters, Rational};
pub use tx::{Redeemer, RedeemerTag, RewardAccount, Transaction, TransactionBody, WitnessSet};
pub use utxo::Utxo;
pub use value::{AssetName, Mint, Value};

/// Encodes any CBOR-encodable value into a fresh buffer.
pub fn to_cbor<T: minicbor::Encode<()>>(value: &T) -> Vec<u8> {
    let mut encoder = minicbor::Encoder::new(Vec::new());
    encoder.encode(value).expect("encoding into a vector is infallible");
    encoder.into_writer()
}
