use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("asset name of {0} bytes exceeds 32 bytes")]
    AssetNameTooLong(usize),

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid utxo reference {0}")]
    InvalidUtxoRef(String),

    #[error("invalid asset unit {0}")]
    InvalidAssetUnit(String),

    #[error("value overflow")]
    Overflow,
}
