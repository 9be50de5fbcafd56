use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("malformed plutus data: {0}")]
    Malformed(String),
}

impl From<minicbor::decode::Error> for DataError {
    fn from(err: minicbor::decode::Error) -> Self {
        DataError::Malformed(err.to_string())
    }
}

impl From<hex::FromHexError> for DataError {
    fn from(err: hex::FromHexError) -> Self {
        DataError::Malformed(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("compiled code is not a CBOR byte string: {0}")]
    NotByteString(String),

    #[error("flat program is truncated at bit {0}")]
    Truncated(usize),

    #[error("unknown term tag {tag} at bit {position}")]
    UnknownTermTag { tag: u8, position: usize },

    #[error("unsupported constant type tag {0}")]
    UnsupportedConstant(u8),

    #[error("malformed constant type {0:?}")]
    MalformedType(Vec<u8>),

    #[error("natural number overflows at bit {0}")]
    Overflow(usize),

    #[error("unexpected trailing bits after the program term")]
    TrailingBits,
}

#[derive(Error, Debug)]
pub enum BlueprintError {
    #[error("unable to read blueprint {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("malformed blueprint: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validator {0} has non-hex compiled code")]
    InvalidCode(String),

    #[error("blueprint has no validator titled {0}")]
    Missing(String),
}
