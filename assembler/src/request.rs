use crate::error::Error;
use crate::result::Result;
use progtoken_addresses::{Address, Network};
use progtoken_hashes::{PolicyId, TransactionHash};
use progtoken_ledger::AssetName;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ASSET_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{1,64}$").expect("valid pattern"));
static QUANTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9][0-9]*$").expect("valid pattern"));
static ADDRESS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^addr(_test)?1[a-z0-9]+$").expect("valid pattern"));

/// Registers a new programmable token policy and mints its first supply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTokenRequest {
    pub registrar_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<String>,
    pub asset_name: String,
    pub quantity: String,
    pub substandard_name: String,
    pub substandard_issue_contract_name: String,
    pub substandard_transfer_contract_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Mints more supply of an already registered token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintTokenRequest {
    pub issuer_base_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<String>,
    pub asset_name: String,
    pub quantity: String,
    pub substandard_name: String,
    pub substandard_issue_contract_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Moves programmable tokens out of the sender's programmable address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: Address,
    pub policy_id: PolicyId,
    pub asset_name: AssetName,
    pub recipients: Vec<(Address, u64)>,
    pub version: Option<TransactionHash>,
}

/// Validated issuance parameters shared by register and mint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Issuance {
    pub payer: Address,
    pub recipient: Address,
    pub asset_name: AssetName,
    pub quantity: i64,
    pub substandard: String,
    pub issue_contract: String,
    pub version: Option<TransactionHash>,
}

impl RegisterTokenRequest {
    pub(crate) fn validate(&self, network: Network) -> Result<Issuance> {
        Issuance::validate(
            &self.registrar_address,
            self.recipient_address.as_deref(),
            &self.asset_name,
            &self.quantity,
            &self.substandard_name,
            &self.substandard_issue_contract_name,
            self.version.as_deref(),
            network,
        )
    }
}

impl MintTokenRequest {
    pub(crate) fn validate(&self, network: Network) -> Result<Issuance> {
        Issuance::validate(
            &self.issuer_base_address,
            self.recipient_address.as_deref(),
            &self.asset_name,
            &self.quantity,
            &self.substandard_name,
            &self.substandard_issue_contract_name,
            self.version.as_deref(),
            network,
        )
    }
}

impl Issuance {
    #[allow(clippy::too_many_arguments)]
    fn validate(
        payer: &str,
        recipient: Option<&str>,
        asset_name: &str,
        quantity: &str,
        substandard: &str,
        issue_contract: &str,
        version: Option<&str>,
        network: Network,
    ) -> Result<Self> {
        let payer = validate_address(payer, network)?;
        let recipient = match recipient.map(str::trim).filter(|recipient| !recipient.is_empty()) {
            Some(recipient) => validate_address(recipient, network)?,
            None => payer,
        };
        if recipient.delegation_credential().is_none() {
            return Err(Error::BadRequest(format!("recipient {recipient} has no delegation credential")));
        }
        let quantity = i64::try_from(validate_quantity(quantity)?)
            .map_err(|_| Error::BadRequest(format!("quantity {quantity} exceeds the mint limit")))?;
        if substandard.is_empty() || issue_contract.is_empty() {
            return Err(Error::BadRequest("substandard name and contract are required".to_string()));
        }
        Ok(Self {
            payer,
            recipient,
            asset_name: validate_asset_name(asset_name)?,
            quantity,
            substandard: substandard.to_string(),
            issue_contract: issue_contract.to_string(),
            version: validate_version(version)?,
        })
    }
}

/// Parses a bech32 Shelley address on `network`.
pub fn validate_address(address: &str, network: Network) -> Result<Address> {
    if !ADDRESS.is_match(address) {
        return Err(Error::BadRequest(format!("malformed address {address}")));
    }
    let parsed: Address = address.parse()?;
    if !parsed.is_on(network) {
        return Err(Error::BadRequest(format!("address {address} is not on {network}")));
    }
    Ok(parsed)
}

/// Hex asset name of 1 to 32 bytes.
pub fn validate_asset_name(asset_name: &str) -> Result<AssetName> {
    if !ASSET_NAME.is_match(asset_name) {
        return Err(Error::BadRequest(format!("malformed asset name {asset_name}")));
    }
    Ok(AssetName::from_hex(asset_name)?)
}

/// Positive decimal quantity.
pub fn validate_quantity(quantity: &str) -> Result<u64> {
    if !QUANTITY.is_match(quantity) {
        return Err(Error::BadRequest(format!("malformed quantity {quantity}")));
    }
    quantity.parse().map_err(|_| Error::BadRequest(format!("quantity {quantity} is out of range")))
}

/// Optional protocol version, the hash of its bootstrap transaction.
pub fn validate_version(version: Option<&str>) -> Result<Option<TransactionHash>> {
    match version.map(str::trim).filter(|version| !version.is_empty()) {
        Some(version) => version.parse().map(Some).map_err(|_| Error::BadRequest(format!("malformed version {version}"))),
        None => Ok(None),
    }
}
