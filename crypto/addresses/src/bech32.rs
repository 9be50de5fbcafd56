//! BIP-173 bech32 without the 90 character limit, which Shelley addresses exceed.

use crate::AddressError;

const CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const REV_CHARSET: [u8; 123] = [
    100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 15, 100, 10, 17, 21, 20, 26, 30, 7, 5, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 100, 29, 100, 24, 13, 25, 9, 8, 23, 100, 18, 22, 31, 27, 19, 100, 1, 0, 3, 16, 11, 28, 12, 14, 6, 4, 2,
];

const GENERATORS: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
const CHECKSUM_LEN: usize = 6;

fn polymod<'data, I>(values: I) -> u32
where
    I: Iterator<Item = &'data u8>,
{
    let mut c = 1u32;
    for d in values {
        let c0 = c >> 25;
        c = ((c & 0x01ffffff) << 5) ^ (*d as u32);
        for (i, generator) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 != 0 {
                c ^= generator;
            }
        }
    }
    c
}

fn expand_prefix(prefix: &str) -> Vec<u8> {
    let bytes = prefix.as_bytes();
    bytes.iter().map(|c| c >> 5).chain([0u8]).chain(bytes.iter().map(|c| c & 0x1f)).collect()
}

fn checksum(prefix: &[u8], payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let c = polymod(prefix.iter().chain(payload).chain(&[0u8; CHECKSUM_LEN])) ^ 1;
    let mut out = [0u8; CHECKSUM_LEN];
    for (i, v) in out.iter_mut().enumerate() {
        *v = ((c >> (5 * (CHECKSUM_LEN - 1 - i))) & 0x1f) as u8;
    }
    out
}

// Regroup bits, padding the tail with zeros when `pad` is set and dropping it otherwise
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Vec<u8> {
    let mut acc = 0u32;
    let mut bits = 0u32;
    let max = (1u32 << to) - 1;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
    for value in data {
        acc = (acc << from) | *value as u32;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max) as u8);
        }
    }
    if pad && bits > 0 {
        out.push(((acc << (to - bits)) & max) as u8);
    }
    out
}

pub fn encode(prefix: &str, payload: &[u8]) -> String {
    let fivebit_payload = convert_bits(payload, 8, 5, true);
    let checksum = checksum(&expand_prefix(prefix), &fivebit_payload);

    let mut out = String::with_capacity(prefix.len() + 1 + fivebit_payload.len() + CHECKSUM_LEN);
    out.push_str(prefix);
    out.push('1');
    out.extend(fivebit_payload.iter().chain(checksum.iter()).map(|c| CHARSET[*c as usize] as char));
    out
}

/// Decodes a bech32 string into its human readable prefix and 8-bit payload.
pub fn decode(address: &str) -> Result<(String, Vec<u8>), AddressError> {
    let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(AddressError::MixedCase);
    }
    let address = address.to_ascii_lowercase();

    let (prefix, data) = address.rsplit_once('1').ok_or(AddressError::MissingPrefix)?;
    if prefix.is_empty() {
        return Err(AddressError::MissingPrefix);
    }
    if data.len() < CHECKSUM_LEN {
        return Err(AddressError::InvalidLength(data.len()));
    }

    let data_u5 = data
        .bytes()
        .map(|b| match REV_CHARSET.get(b as usize) {
            Some(100) | None => Err(AddressError::DecodingError(b as char)),
            Some(i) => Ok(*i),
        })
        .collect::<Result<Vec<u8>, _>>()?;

    if polymod(expand_prefix(prefix).iter().chain(&data_u5)) != 1 {
        return Err(AddressError::BadChecksum);
    }

    let payload_u5 = &data_u5[..data_u5.len() - CHECKSUM_LEN];
    Ok((prefix.to_string(), convert_bits(payload_u5, 5, 8, false)))
}
