use crate::IDENT;
use crate::api::IndexerApi;
use crate::errors::{IndexError, IndexResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use progtoken_addresses::Address;
use progtoken_core::{debug, trace};
use progtoken_hashes::Hash28;
use progtoken_ledger::{Transaction, Utxo, UtxoRef};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// UTxO set held in memory, loadable from a JSON snapshot.
///
/// Built transactions can be applied to it, which makes it a stand-in for the chain in tests
/// and offline runs.
#[derive(Debug)]
pub struct MemoryIndexer {
    utxos: RwLock<BTreeMap<UtxoRef, Utxo>>,
    online: AtomicBool,
}

impl Default for MemoryIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndexer {
    pub fn new() -> Self {
        Self { utxos: RwLock::new(BTreeMap::new()), online: AtomicBool::new(true) }
    }

    pub fn from_utxos(utxos: impl IntoIterator<Item = Utxo>) -> Self {
        let indexer = Self::new();
        indexer.extend(utxos);
        indexer
    }

    /// Parses a snapshot: a JSON array of UTxOs.
    pub fn from_json(json: &str) -> IndexResult<Self> {
        let utxos: Vec<Utxo> = serde_json::from_str(json)?;
        Ok(Self::from_utxos(utxos))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> IndexResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| IndexError::SnapshotIo { path: path.display().to_string(), source })?;
        let indexer = Self::from_json(&json)?;
        debug!("[{0}] loaded {1} utxos from {2}", IDENT, indexer.len(), path.display());
        Ok(indexer)
    }

    pub fn insert(&self, utxo: Utxo) {
        self.utxos.write().insert(utxo.input, utxo);
    }

    pub fn extend(&self, utxos: impl IntoIterator<Item = Utxo>) {
        let mut map = self.utxos.write();
        for utxo in utxos {
            map.insert(utxo.input, utxo);
        }
    }

    pub fn remove(&self, utxo_ref: &UtxoRef) -> Option<Utxo> {
        self.utxos.write().remove(utxo_ref)
    }

    pub fn len(&self) -> usize {
        self.utxos.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.read().is_empty()
    }

    pub fn all(&self) -> Vec<Utxo> {
        self.utxos.read().values().cloned().collect()
    }

    /// Toggles availability; while offline every query fails with [`IndexError::Unavailable`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Spends the transaction's inputs and adds its outputs, as if it had been accepted on chain.
    pub fn apply_transaction(&self, tx: &Transaction) {
        let id = tx.id();
        let mut map = self.utxos.write();
        for input in tx.body.inputs.iter() {
            map.remove(input);
        }
        for (index, output) in tx.body.outputs.iter().enumerate() {
            let input = UtxoRef::new(id, index as u32);
            let utxo = Utxo {
                input,
                address: output.address,
                value: output.value.clone(),
                inline_datum: output.datum.as_ref().map(|datum| datum.to_cbor()),
            };
            map.insert(input, utxo);
        }
        trace!("[{0}] applied transaction {1}: -{2} +{3} utxos", IDENT, id, tx.body.inputs.len(), tx.body.outputs.len());
    }

    fn check_online(&self) -> IndexResult<()> {
        match self.online.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(IndexError::Unavailable("indexer is offline".to_string())),
        }
    }

    fn select(&self, predicate: impl Fn(&Utxo) -> bool) -> Vec<Utxo> {
        self.utxos.read().values().filter(|utxo| predicate(utxo)).cloned().collect()
    }
}

#[async_trait]
impl IndexerApi for MemoryIndexer {
    async fn find_by_id(&self, utxo_ref: &UtxoRef) -> IndexResult<Option<Utxo>> {
        self.check_online()?;
        Ok(self.utxos.read().get(utxo_ref).cloned())
    }

    async fn list_unspent_by_owner_address(&self, address: &Address) -> IndexResult<Vec<Utxo>> {
        self.check_online()?;
        Ok(self.select(|utxo| utxo.address == *address))
    }

    async fn list_unspent_by_payment_credential_hash(&self, hash: &Hash28) -> IndexResult<Vec<Utxo>> {
        self.check_online()?;
        Ok(self.select(|utxo| utxo.address.payment_credential().is_some_and(|credential| credential.hash() == hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progtoken_addresses::{Credential, NetworkId};
    use progtoken_hashes::TransactionHash;
    use progtoken_ledger::{TransactionOutput, Value};
    use progtoken_plutus::PlutusData;
    use std::io::Write;

    fn script_address(stake: u8) -> Address {
        Address::base(NetworkId::Testnet, Credential::Script([0xcc; 28].into()), Credential::PubKey([stake; 28].into()))
    }

    fn wallet() -> Address {
        Address::base(NetworkId::Testnet, Credential::PubKey([0x01; 28].into()), Credential::PubKey([0x02; 28].into()))
    }

    fn utxo(tx: u8, index: u32, address: Address, coin: u64) -> Utxo {
        Utxo::new(UtxoRef::new(TransactionHash::from_bytes([tx; 32]), index), address, Value::lovelace(coin))
    }

    #[tokio::test]
    async fn test_queries() {
        let indexer = MemoryIndexer::from_utxos([
            utxo(1, 0, wallet(), 10),
            utxo(1, 1, script_address(0x0a), 20),
            utxo(2, 0, script_address(0x0b), 30),
        ]);
        assert_eq!(indexer.len(), 3);
        assert_eq!(indexer.list_unspent_by_owner_address(&wallet()).await.unwrap().len(), 1);
        assert_eq!(indexer.list_unspent_by_owner_address(&script_address(0x0a)).await.unwrap().len(), 1);
        assert_eq!(indexer.list_unspent_by_payment_credential_hash(&[0xcc; 28].into()).await.unwrap().len(), 2);

        let found = indexer.find_by_id(&UtxoRef::new(TransactionHash::from_bytes([2; 32]), 0)).await.unwrap();
        assert_eq!(found.unwrap().value.coin, 30);
        assert!(indexer.find_by_id(&UtxoRef::new(TransactionHash::from_bytes([2; 32]), 1)).await.unwrap().is_none());

        indexer.set_online(false);
        assert!(matches!(indexer.list_unspent_by_owner_address(&wallet()).await, Err(IndexError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_apply_transaction() {
        let spent = utxo(1, 0, wallet(), 10_000_000);
        let indexer = MemoryIndexer::from_utxos([spent.clone()]);

        let mut tx = Transaction::default();
        tx.body.inputs.insert(spent.input);
        tx.body.outputs.push(TransactionOutput::new(script_address(0x0a), Value::lovelace(2_000_000)).with_datum(PlutusData::unit()));
        tx.body.outputs.push(TransactionOutput::new(wallet(), Value::lovelace(7_800_000)));
        indexer.apply_transaction(&tx);

        assert!(indexer.find_by_id(&spent.input).await.unwrap().is_none());
        let created = indexer.find_by_id(&UtxoRef::new(tx.id(), 0)).await.unwrap().unwrap();
        assert_eq!(created.datum().unwrap().unwrap(), PlutusData::unit());
        assert_eq!(indexer.list_unspent_by_owner_address(&wallet()).await.unwrap()[0].value.coin, 7_800_000);
    }

    #[test]
    fn test_load_snapshot() {
        let utxos = vec![utxo(1, 0, wallet(), 10), utxo(3, 2, script_address(0x0a), 20)];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&utxos).unwrap().as_bytes()).unwrap();

        let indexer = MemoryIndexer::load(file.path()).unwrap();
        assert_eq!(indexer.all(), utxos);
        assert!(matches!(MemoryIndexer::from_json("{}"), Err(IndexError::Snapshot(_))));
        assert!(matches!(MemoryIndexer::load("/nonexistent/utxos.json"), Err(IndexError::SnapshotIo { .. })));
    }
}
