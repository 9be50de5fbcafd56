pub mod navigator;
pub mod node;

pub use navigator::{Position, RegistryEntry, RegistryNavigator};
pub use node::{RegistryCredential, RegistryNode, TAIL_KEY};
