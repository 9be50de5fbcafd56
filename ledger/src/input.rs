use crate::error::LedgerError;
use minicbor::{Encode, Encoder, encode};
use progtoken_hashes::TransactionHash;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Reference to a transaction output. Ordered by transaction id, then index, as the ledger orders inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UtxoRef {
    #[serde(rename = "txHash")]
    pub transaction_id: TransactionHash,
    #[serde(rename = "outputIndex")]
    pub index: u32,
}

impl UtxoRef {
    pub fn new(transaction_id: TransactionHash, index: u32) -> Self {
        Self { transaction_id, index }
    }
}

impl Display for UtxoRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.transaction_id, self.index)
    }
}

impl FromStr for UtxoRef {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidUtxoRef(s.to_string());
        let (hash, index) = s.split_once('#').ok_or_else(invalid)?;
        Ok(Self { transaction_id: hash.parse().map_err(|_| invalid())?, index: index.parse().map_err(|_| invalid())? })
    }
}

impl<C> Encode<C> for UtxoRef {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>, _ctx: &mut C) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?.bytes(self.transaction_id.as_ref())?.u32(self.index)?;
        Ok(())
    }
}
