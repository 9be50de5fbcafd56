use progtoken_index_core::IndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Assembler(#[from] progtoken_assembler::Error),

    #[error("unable to load the UTxO snapshot: {0}")]
    Snapshot(#[from] IndexError),

    #[error("unable to read request {path}: {source}")]
    RequestIo { path: String, source: std::io::Error },

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    Argument(String),
}

impl Error {
    /// Short machine readable code, shared with the assembler's error codes.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Assembler(err) => err.code(),
            Error::Snapshot(_) => "STARTUP_FAILURE",
            Error::RequestIo { .. } | Error::SerdeJsonError(_) | Error::Argument(_) => "BAD_REQUEST",
        }
    }
}

impl From<progtoken_plutus::BlueprintError> for Error {
    fn from(err: progtoken_plutus::BlueprintError) -> Self {
        Error::Assembler(err.into())
    }
}
