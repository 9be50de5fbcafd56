use crate::builder::BuildError;
use progtoken_addresses::AddressError;
use progtoken_hashes::PolicyId;
use progtoken_index_core::IndexError;
use progtoken_ledger::LedgerError;
use progtoken_plutus::{BlueprintError, DataError, ParamError};
use thiserror::Error;

/// Who a failure is attributable to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Client,
    Resource,
    Internal,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Policy {0} is already registered")]
    AlreadyRegistered(PolicyId),

    #[error("Wallet {0} has no UTxOs")]
    WalletEmpty(String),

    #[error("Unknown protocol version {0}")]
    UnknownVersion(String),

    #[error("Blueprint is missing {0}")]
    BlueprintMissing(String),

    #[error("Indexer unavailable: {0}")]
    IndexerUnavailable(String),

    #[error("Registry is inconsistent: {0}")]
    RegistryInconsistent(String),

    #[error("Unable to assemble the transaction: {0}")]
    AssemblyFailure(String),

    #[error("Malformed data: {0}")]
    MalformedData(#[from] DataError),

    #[error("Unable to apply script parameters: {0}")]
    ParamApplyFailure(#[from] ParamError),

    #[error("Startup failure: {0}")]
    Startup(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            Error::WalletEmpty(_) => "WALLET_EMPTY",
            Error::UnknownVersion(_) => "UNKNOWN_VERSION",
            Error::BlueprintMissing(_) => "BLUEPRINT_MISSING",
            Error::IndexerUnavailable(_) => "INDEXER_UNAVAILABLE",
            Error::RegistryInconsistent(_) => "REGISTRY_INCONSISTENT",
            Error::AssemblyFailure(_) => "ASSEMBLY_FAILURE",
            Error::MalformedData(_) => "MALFORMED_DATA",
            Error::ParamApplyFailure(_) => "PARAM_APPLY_FAILURE",
            Error::Startup(_) => "STARTUP_FAILURE",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Error::BadRequest(_) | Error::AlreadyRegistered(_) | Error::WalletEmpty(_) => Category::Client,
            Error::UnknownVersion(_) | Error::BlueprintMissing(_) | Error::IndexerUnavailable(_) => Category::Resource,
            Error::RegistryInconsistent(_)
            | Error::AssemblyFailure(_)
            | Error::MalformedData(_)
            | Error::ParamApplyFailure(_)
            | Error::Startup(_) => Category::Internal,
        }
    }
}

impl From<AddressError> for Error {
    fn from(err: AddressError) -> Self {
        Error::BadRequest(err.to_string())
    }
}

impl From<LedgerError> for Error {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Overflow => Error::AssemblyFailure(err.to_string()),
            _ => Error::BadRequest(err.to_string()),
        }
    }
}

impl From<IndexError> for Error {
    fn from(err: IndexError) -> Self {
        Error::IndexerUnavailable(err.to_string())
    }
}

impl From<BlueprintError> for Error {
    fn from(err: BlueprintError) -> Self {
        match err {
            BlueprintError::Missing(title) => Error::BlueprintMissing(title),
            _ => Error::Startup(err.to_string()),
        }
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Error::AssemblyFailure(err.to_string())
    }
}
