use progtoken_addresses::Credential;
use progtoken_hashes::{Hash28, PolicyId, ScriptHash};
use progtoken_plutus::PlutusData;

/// `next` of the last registry node: 27 bytes of `0xff`, above any policy id.
pub const TAIL_KEY: [u8; 27] = [0xff; 27];

/// Credential recorded in a registry node. The hash is empty when no script is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryCredential {
    PubKey(Vec<u8>),
    Script(Vec<u8>),
}

impl RegistryCredential {
    pub fn script(hash: Option<&ScriptHash>) -> Self {
        RegistryCredential::Script(hash.map(|hash| hash.to_vec()).unwrap_or_default())
    }

    pub fn hash(&self) -> &[u8] {
        match self {
            RegistryCredential::PubKey(hash) | RegistryCredential::Script(hash) => hash,
        }
    }

    pub fn script_hash(&self) -> Option<ScriptHash> {
        match self {
            RegistryCredential::Script(hash) => ScriptHash::try_from_slice(hash).ok(),
            RegistryCredential::PubKey(_) => None,
        }
    }

    fn from_data(data: &PlutusData) -> Option<Self> {
        let (tag, fields) = data.as_constr()?;
        let [hash] = fields else { return None };
        let hash = hash.as_bytes()?;
        if !hash.is_empty() && hash.len() != Hash28::SIZE {
            return None;
        }
        match tag {
            0 => Some(RegistryCredential::PubKey(hash.to_vec())),
            1 => Some(RegistryCredential::Script(hash.to_vec())),
            _ => None,
        }
    }

    fn to_data(&self) -> PlutusData {
        match self {
            RegistryCredential::PubKey(hash) => PlutusData::constr(0, vec![PlutusData::bytes(hash)]),
            RegistryCredential::Script(hash) => PlutusData::constr(1, vec![PlutusData::bytes(hash)]),
        }
    }
}

impl From<Credential> for RegistryCredential {
    fn from(credential: Credential) -> Self {
        match credential {
            Credential::PubKey(hash) => RegistryCredential::PubKey(hash.to_vec()),
            Credential::Script(hash) => RegistryCredential::Script(hash.to_vec()),
        }
    }
}

/// Entry of the on-chain sorted linked list of registered policies.
///
/// Datum: `Constr 0 [key, next, transfer_logic_script, third_party_transfer_logic_script, global_state_policy_id]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryNode {
    pub key: Vec<u8>,
    pub next: Vec<u8>,
    pub transfer_logic_script: RegistryCredential,
    pub third_party_transfer_logic_script: RegistryCredential,
    pub global_state_policy_id: Vec<u8>,
}

impl RegistryNode {
    /// Node of a newly registered `policy`, linked in front of `next`.
    pub fn new(policy: &PolicyId, next: Vec<u8>, transfer_logic: &ScriptHash, third_party: Option<&ScriptHash>) -> Self {
        Self {
            key: policy.to_vec(),
            next,
            transfer_logic_script: RegistryCredential::script(Some(transfer_logic)),
            third_party_transfer_logic_script: RegistryCredential::script(third_party),
            global_state_policy_id: Vec::new(),
        }
    }

    pub fn from_data(data: &PlutusData) -> Option<Self> {
        let (0, fields) = data.as_constr()? else { return None };
        let [key, next, transfer, third_party, global_state] = fields else { return None };
        Some(Self {
            key: key.as_bytes()?.to_vec(),
            next: next.as_bytes()?.to_vec(),
            transfer_logic_script: RegistryCredential::from_data(transfer)?,
            third_party_transfer_logic_script: RegistryCredential::from_data(third_party)?,
            global_state_policy_id: global_state.as_bytes()?.to_vec(),
        })
    }

    /// Parses an inline datum, `None` when it is not a registry node.
    pub fn parse(datum: &[u8]) -> Option<Self> {
        Self::from_data(&PlutusData::from_cbor(datum).ok()?)
    }

    pub fn parse_hex(datum: &str) -> Option<Self> {
        Self::from_data(&PlutusData::from_hex(datum).ok()?)
    }

    pub fn to_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(&self.key),
                PlutusData::bytes(&self.next),
                self.transfer_logic_script.to_data(),
                self.third_party_transfer_logic_script.to_data(),
                PlutusData::bytes(&self.global_state_policy_id),
            ],
        )
    }

    pub fn to_cbor(&self) -> Vec<u8> {
        self.to_data().to_cbor()
    }

    pub fn is_head(&self) -> bool {
        self.key.is_empty()
    }

    pub fn is_tail(&self) -> bool {
        self.next == TAIL_KEY
    }

    /// Whether `key` falls strictly between this node and its successor.
    pub fn covers(&self, key: &[u8]) -> bool {
        self.key.as_slice() < key && key < self.next.as_slice()
    }

    /// This node relinked in front of `next`.
    pub fn with_next(&self, next: Vec<u8>) -> Self {
        Self { next, ..self.clone() }
    }
}
