//!
//! Assembles unsigned Cardano transactions for programmable tokens:
//! policy registration, minting and transfers through the on-chain registry.
//!

pub mod assembler;
pub mod bootstrap;
pub mod builder;
pub mod cache;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod request;
pub mod result;
pub mod settings;
pub mod substandard;
pub mod transform;

pub use assembler::{AssembledTransaction, Assembler, DiscoveredToken};
pub use bootstrap::{BootstrapCatalog, BootstrapDescriptor};
pub use cache::{DerivedScript, ScriptCache};
pub use error::{Category, Error};
pub use request::{MintTokenRequest, RegisterTokenRequest, TransferRequest};
pub use result::Result;
pub use settings::AssemblerSettings;
pub use substandard::SubstandardCatalog;
