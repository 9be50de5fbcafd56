use progtoken_hashes::{Hash28, KeyHash, ScriptHash};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

pub mod bech32;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum AddressError {
    #[error("Invalid prefix {0}")]
    InvalidPrefix(String),

    #[error("Prefix is missing")]
    MissingPrefix,

    #[error("Invalid header {0:#04x}")]
    InvalidHeader(u8),

    #[error("Invalid payload length {0}")]
    InvalidLength(usize),

    #[error("Invalid character {0}")]
    DecodingError(char),

    #[error("Mixed case address")]
    MixedCase,

    #[error("Checksum is invalid")]
    BadChecksum,

    #[error("Invalid network {0}")]
    InvalidNetwork(String),

    #[error("Address {0} has no delegation part")]
    MissingDelegation(String),
}

/// Network id carried in the low nibble of the address header.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NetworkId {
    Testnet = 0,
    Mainnet = 1,
}

impl NetworkId {
    fn address_prefix(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "addr",
            NetworkId::Testnet => "addr_test",
        }
    }

    fn reward_prefix(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "stake",
            NetworkId::Testnet => "stake_test",
        }
    }
}

impl TryFrom<u8> for NetworkId {
    type Error = AddressError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(NetworkId::Testnet),
            1 => Ok(NetworkId::Mainnet),
            _ => Err(AddressError::InvalidNetwork(value.to_string())),
        }
    }
}

/// Named Cardano network the assembler is configured for.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Preprod,
    Preview,
}

impl Network {
    pub fn id(&self) -> NetworkId {
        match self {
            Network::Mainnet => NetworkId::Mainnet,
            Network::Preprod | Network::Preview => NetworkId::Testnet,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Preprod => "preprod",
            Network::Preview => "preview",
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "preprod" => Ok(Network::Preprod),
            "preview" => Ok(Network::Preview),
            _ => Err(AddressError::InvalidNetwork(s.to_string())),
        }
    }
}

/// A payment or delegation credential.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash, Serialize, Deserialize)]
pub enum Credential {
    PubKey(KeyHash),
    Script(ScriptHash),
}

impl Credential {
    pub fn hash(&self) -> &Hash28 {
        match self {
            Credential::PubKey(hash) | Credential::Script(hash) => hash,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }

    #[inline(always)]
    fn bit(&self) -> u8 {
        self.is_script() as u8
    }

    fn from_bit(bit: u8, hash: Hash28) -> Self {
        if bit == 0 { Credential::PubKey(hash) } else { Credential::Script(hash) }
    }
}

const BASE_LEN: usize = 1 + 2 * Hash28::SIZE;
const SINGLE_LEN: usize = 1 + Hash28::SIZE;

/// Shelley address: serializes to and from its bech32 form, e.g. `addr_test1qz...`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub enum Address {
    Base { network: NetworkId, payment: Credential, stake: Credential },
    Enterprise { network: NetworkId, payment: Credential },
    Reward { network: NetworkId, stake: Credential },
}

impl Address {
    pub fn base(network: NetworkId, payment: Credential, stake: Credential) -> Self {
        Address::Base { network, payment, stake }
    }

    pub fn enterprise(network: NetworkId, payment: Credential) -> Self {
        Address::Enterprise { network, payment }
    }

    pub fn reward(network: NetworkId, stake: Credential) -> Self {
        Address::Reward { network, stake }
    }

    /// Base address locked by the programmable logic script `logic_base`, delegated like `owner`.
    ///
    /// Tokens held by `owner` under the programmable-token protocol live here.
    pub fn programmable(logic_base: ScriptHash, owner: &Address) -> Result<Self, AddressError> {
        let stake = owner.delegation_credential().ok_or_else(|| AddressError::MissingDelegation(owner.to_string()))?;
        Ok(Address::base(owner.network_id(), Credential::Script(logic_base), stake))
    }

    pub fn network_id(&self) -> NetworkId {
        match self {
            Address::Base { network, .. } | Address::Enterprise { network, .. } | Address::Reward { network, .. } => *network,
        }
    }

    pub fn is_on(&self, network: Network) -> bool {
        self.network_id() == network.id()
    }

    pub fn payment_credential(&self) -> Option<Credential> {
        match self {
            Address::Base { payment, .. } | Address::Enterprise { payment, .. } => Some(*payment),
            Address::Reward { .. } => None,
        }
    }

    pub fn delegation_credential(&self) -> Option<Credential> {
        match self {
            Address::Base { stake, .. } | Address::Reward { stake, .. } => Some(*stake),
            Address::Enterprise { .. } => None,
        }
    }

    pub fn header(&self) -> u8 {
        let kind = match self {
            Address::Base { payment, stake, .. } => (stake.bit() << 1) | payment.bit(),
            Address::Enterprise { payment, .. } => 0b0110 | payment.bit(),
            Address::Reward { stake, .. } => 0b1110 | stake.bit(),
        };
        (kind << 4) | self.network_id() as u8
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Address::Reward { network, .. } => network.reward_prefix(),
            _ => self.network_id().address_prefix(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(BASE_LEN);
        bytes.push(self.header());
        match self {
            Address::Base { payment, stake, .. } => {
                bytes.extend_from_slice(payment.hash().as_ref());
                bytes.extend_from_slice(stake.hash().as_ref());
            }
            Address::Enterprise { payment: credential, .. } | Address::Reward { stake: credential, .. } => {
                bytes.extend_from_slice(credential.hash().as_ref())
            }
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let header = *bytes.first().ok_or(AddressError::InvalidLength(0))?;
        let kind = header >> 4;
        let network = NetworkId::try_from(header & 0x0f).map_err(|_| AddressError::InvalidHeader(header))?;
        let hash_at = |offset: usize| Hash28::try_from_slice(&bytes[offset..offset + Hash28::SIZE]);

        let expected = match kind {
            0..=3 => BASE_LEN,
            6 | 7 | 14 | 15 => SINGLE_LEN,
            _ => return Err(AddressError::InvalidHeader(header)),
        };
        if bytes.len() != expected {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let first = hash_at(1).map_err(|_| AddressError::InvalidLength(bytes.len()))?;

        Ok(match kind {
            0..=3 => {
                let second = hash_at(SINGLE_LEN).map_err(|_| AddressError::InvalidLength(bytes.len()))?;
                Address::Base { network, payment: Credential::from_bit(kind & 1, first), stake: Credential::from_bit(kind >> 1, second) }
            }
            6 | 7 => Address::Enterprise { network, payment: Credential::from_bit(kind & 1, first) },
            _ => Address::Reward { network, stake: Credential::from_bit(kind & 1, first) },
        })
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&bech32::encode(self.prefix(), &self.to_bytes()))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let (prefix, payload) = bech32::decode(address)?;
        let address = Address::from_bytes(&payload)?;
        if address.prefix() != prefix {
            return Err(AddressError::InvalidPrefix(prefix));
        }
        Ok(address)
    }
}

impl TryFrom<&str> for Address {
    type Error = AddressError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<&Address> for String {
    fn from(address: &Address) -> Self {
        address.to_string()
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk() -> Credential {
        Credential::PubKey("9493315cd92eb5d8c4304e67b7e16ae36d61d34502694657811a2c8e".parse().unwrap())
    }

    fn sk() -> Credential {
        Credential::PubKey("337b62cfff6403a06a3acbc34f8c46003c69fe79a3628cefa9c47251".parse().unwrap())
    }

    fn script() -> Credential {
        Credential::Script("c37b1b5dc0669f1d3c61a6fddb2e8fde96be87b881c60bce8e8d542f".parse().unwrap())
    }

    fn cases() -> Vec<(Address, u8, &'static str)> {
        // cspell:disable
        vec![
            (
                Address::base(NetworkId::Mainnet, pk(), sk()),
                0x01,
                "addr1qx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgse35a3x",
            ),
            (
                Address::base(NetworkId::Testnet, script(), sk()),
                0x10,
                "addr_test1zrphkx6acpnf78fuvxn0mkew3l0fd058hzquvz7w36x4gten0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgsxj90mg",
            ),
            (
                Address::base(NetworkId::Testnet, pk(), sk()),
                0x00,
                "addr_test1qz2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgs68faae",
            ),
            (Address::enterprise(NetworkId::Mainnet, pk()), 0x61, "addr1vx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzers66hrl8"),
            (Address::enterprise(NetworkId::Testnet, script()), 0x70, "addr_test1wrphkx6acpnf78fuvxn0mkew3l0fd058hzquvz7w36x4gtcl6szpr"),
            (Address::reward(NetworkId::Mainnet, sk()), 0xe1, "stake1uyehkck0lajq8gr28t9uxnuvgcqrc6070x3k9r8048z8y5gh6ffgw"),
            (Address::reward(NetworkId::Testnet, script()), 0xf0, "stake_test17rphkx6acpnf78fuvxn0mkew3l0fd058hzquvz7w36x4gtcljw6kf"),
        ]
        // cspell:enable
    }

    #[test]
    fn check_into_string() {
        for (address, header, expected) in cases() {
            assert_eq!(address.header(), header);
            assert_eq!(address.to_string(), expected);
        }
    }

    #[test]
    fn check_from_string() {
        for (expected, _, address_str) in cases() {
            let address: Address = address_str.parse().unwrap();
            assert_eq!(address, expected);
            assert_eq!(Address::from_bytes(&address.to_bytes()).unwrap(), expected);
        }
    }

    #[test]
    fn test_credentials() {
        let base = Address::base(NetworkId::Testnet, script(), sk());
        assert_eq!(base.payment_credential(), Some(script()));
        assert_eq!(base.delegation_credential(), Some(sk()));
        assert!(base.is_on(Network::Preprod));
        assert!(base.is_on(Network::Preview));
        assert!(!base.is_on(Network::Mainnet));

        let enterprise = Address::enterprise(NetworkId::Mainnet, pk());
        assert_eq!(enterprise.delegation_credential(), None);

        let reward = Address::reward(NetworkId::Mainnet, sk());
        assert_eq!(reward.payment_credential(), None);
    }

    #[test]
    fn test_programmable() {
        let owner = Address::base(NetworkId::Testnet, pk(), sk());
        let programmable = Address::programmable(*script().hash(), &owner).unwrap();
        assert_eq!(programmable, Address::base(NetworkId::Testnet, script(), sk()));
        assert_eq!(Address::programmable(*script().hash(), &Address::reward(NetworkId::Testnet, sk())).unwrap(), programmable);

        let enterprise = Address::enterprise(NetworkId::Testnet, pk());
        assert!(matches!(Address::programmable(*script().hash(), &enterprise), Err(AddressError::MissingDelegation(_))));
    }

    #[test]
    fn test_errors() {
        // cspell:disable
        let valid = "addr1vx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzers66hrl8";
        assert_eq!("addr1vx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzers66hrl9".parse::<Address>(), Err(AddressError::BadChecksum));
        assert_eq!("addr1vx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzers66hrlb".parse::<Address>(), Err(AddressError::DecodingError('b')));
        // cspell:enable
        let relabeled = bech32::encode("addr_test", &valid.parse::<Address>().unwrap().to_bytes());
        assert_eq!(relabeled.parse::<Address>(), Err(AddressError::InvalidPrefix("addr_test".to_string())));

        let mut pointer = vec![0x41u8];
        pointer.extend_from_slice(&[0u8; 28]);
        assert_eq!(Address::from_bytes(&pointer), Err(AddressError::InvalidHeader(0x41)));
        assert_eq!(Address::from_bytes(&[0x61, 0x00]), Err(AddressError::InvalidLength(2)));
        assert_eq!(Address::from_bytes(&[]), Err(AddressError::InvalidLength(0)));
    }

    #[test]
    fn test_serde() {
        let address = Address::base(NetworkId::Testnet, script(), sk());
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{address}\""));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), address);
        assert_eq!(serde_json::from_str::<Network>("\"preview\"").unwrap(), Network::Preview);
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("devnet".parse::<Network>().is_err());
    }
}
