use crate::errors::IndexResult;
use async_trait::async_trait;
use progtoken_addresses::Address;
use progtoken_hashes::Hash28;
use progtoken_ledger::{Utxo, UtxoRef};
use std::fmt::Debug;
use std::sync::Arc;

/// Read access to the chain's unspent outputs.
#[async_trait]
pub trait IndexerApi: Send + Sync + Debug {
    async fn find_by_id(&self, utxo_ref: &UtxoRef) -> IndexResult<Option<Utxo>>;

    /// Unspent outputs locked at exactly `address`.
    async fn list_unspent_by_owner_address(&self, address: &Address) -> IndexResult<Vec<Utxo>>;

    /// Unspent outputs whose payment credential hashes to `hash`, whatever their staking part.
    async fn list_unspent_by_payment_credential_hash(&self, hash: &Hash28) -> IndexResult<Vec<Utxo>>;
}

pub type DynIndexer = Arc<dyn IndexerApi>;
