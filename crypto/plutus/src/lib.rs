//!
//! Plutus primitives: the PlutusData codec, parameter application on
//! flat-encoded UPLC programs, script hashing and blueprint loading.
//!

pub mod blueprint;
pub mod data;
pub mod error;
pub mod flat;
pub mod program;
pub mod script;

pub use blueprint::{Blueprint, BlueprintRegistry, BlueprintValidator};
pub use data::PlutusData;
pub use error::{BlueprintError, DataError, ParamError};
pub use program::{Program, apply_params};
pub use script::{PlutusScript, PlutusVersion};
