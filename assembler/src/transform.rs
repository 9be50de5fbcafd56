use crate::error::Error;
use crate::result::Result;
use progtoken_addresses::Address;
use progtoken_core::trace;
use progtoken_ledger::TransactionBody;
use std::collections::BTreeSet;

/// Moves a leading change output to the last slot. Returns whether the outputs were reordered.
///
/// Redeemer indices and the script data hash do not depend on output order.
pub fn rotate_change_last(body: &mut TransactionBody, change_address: &Address) -> bool {
    match body.outputs.first() {
        Some(first) if first.address == *change_address && body.outputs.len() > 1 => {
            body.outputs.rotate_left(1);
            trace!("Moved change output to slot {}", body.outputs.len() - 1);
            true
        }
        _ => false,
    }
}

/// Checks that the outputs paying `address` hold pairwise distinct asset sets. Returns their count.
pub fn ensure_distinct_outputs(body: &TransactionBody, address: &Address) -> Result<usize> {
    let mut seen = Vec::<BTreeSet<_>>::new();
    for output in body.outputs.iter().filter(|output| output.address == *address) {
        let assets = output.value.assets().map(|(policy, name, _)| (*policy, name.clone())).collect::<BTreeSet<_>>();
        if seen.contains(&assets) {
            return Err(Error::AssemblyFailure(format!("outputs to {address} carry the same assets")));
        }
        seen.push(assets);
    }
    Ok(seen.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use progtoken_addresses::{Credential, NetworkId};
    use progtoken_hashes::PolicyId;
    use progtoken_ledger::{AssetName, TransactionOutput, Value};

    fn wallet() -> Address {
        Address::enterprise(NetworkId::Testnet, Credential::PubKey([0x01; 28].into()))
    }

    fn directory() -> Address {
        Address::enterprise(NetworkId::Testnet, Credential::Script([0x07; 28].into()))
    }

    fn nft(name: &[u8]) -> Value {
        Value::lovelace(1_500_000).with_asset(PolicyId::from_bytes([0x0d; 28]), AssetName::new(name.to_vec()).unwrap(), 1)
    }

    #[test]
    fn test_rotate_change_last() {
        let mut body = TransactionBody {
            outputs: vec![
                TransactionOutput::new(wallet(), Value::lovelace(9)),
                TransactionOutput::new(directory(), nft(b"")),
                TransactionOutput::new(directory(), nft(b"p")),
            ],
            ..Default::default()
        };
        assert!(rotate_change_last(&mut body, &wallet()));
        assert_eq!(body.outputs.iter().map(|output| output.address).collect::<Vec<_>>(), vec![directory(), directory(), wallet()]);
        assert_eq!(body.outputs[0].value, nft(b""));

        // already last
        assert!(!rotate_change_last(&mut body, &wallet()));

        let mut lone = TransactionBody { outputs: vec![TransactionOutput::new(wallet(), Value::lovelace(9))], ..Default::default() };
        assert!(!rotate_change_last(&mut lone, &wallet()));
    }

    #[test]
    fn test_ensure_distinct_outputs() {
        let mut body = TransactionBody {
            outputs: vec![
                TransactionOutput::new(directory(), nft(b"")),
                TransactionOutput::new(directory(), nft(b"p")),
                TransactionOutput::new(wallet(), Value::lovelace(9)),
            ],
            ..Default::default()
        };
        assert_eq!(ensure_distinct_outputs(&body, &directory()).unwrap(), 2);
        assert_eq!(ensure_distinct_outputs(&body, &wallet()).unwrap(), 1);

        body.outputs[1] = TransactionOutput::new(directory(), nft(b""));
        assert!(matches!(ensure_distinct_outputs(&body, &directory()), Err(Error::AssemblyFailure(_))));
    }
}
