use crate::error::DataError;
use minicbor::data::{Int, Tag, Type};
use minicbor::{Decode, Decoder, Encode, Encoder, decode, encode};

/// Largest byte string chunk the ledger accepts inside PlutusData.
pub const BYTES_CHUNK_SIZE: usize = 64;

const TAG_POS_BIGNUM: u64 = 2;
const TAG_NEG_BIGNUM: u64 = 3;
const TAG_CONSTR_GENERAL: u64 = 102;
const TAG_CONSTR_COMPACT: u64 = 121;
const TAG_CONSTR_EXTENDED: u64 = 1280;

/// Tagged algebraic data carried by datums, redeemers and script parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlutusData {
    Constr { tag: u64, fields: Vec<PlutusData> },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(i128),
    Bytes(Vec<u8>),
}

impl PlutusData {
    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr { tag, fields }
    }

    /// `Constr 0 []`
    pub fn unit() -> Self {
        PlutusData::constr(0, vec![])
    }

    pub fn bytes(bytes: impl AsRef<[u8]>) -> Self {
        PlutusData::Bytes(bytes.as_ref().to_vec())
    }

    pub fn int(value: impl Into<i128>) -> Self {
        PlutusData::Integer(value.into())
    }

    pub fn as_constr(&self) -> Option<(u64, &[PlutusData])> {
        match self {
            PlutusData::Constr { tag, fields } => Some((*tag, fields)),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PlutusData::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            PlutusData::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn to_cbor(&self) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new());
        encoder.encode(self).expect("encoding into a vector is infallible");
        encoder.into_writer()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_cbor())
    }

    /// Decodes a single data item, rejecting trailing bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, DataError> {
        let mut decoder = Decoder::new(bytes);
        let data = decoder.decode()?;
        if decoder.position() != bytes.len() {
            return Err(DataError::Malformed(format!("{} trailing bytes", bytes.len() - decoder.position())));
        }
        Ok(data)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, DataError> {
        Self::from_cbor(&hex::decode(hex_str)?)
    }
}

fn constr_cbor_tag(tag: u64) -> Option<u64> {
    match tag {
        0..=6 => Some(TAG_CONSTR_COMPACT + tag),
        7..=127 => Some(TAG_CONSTR_EXTENDED + tag - 7),
        _ => None,
    }
}

fn encode_list<C, W: encode::Write>(items: &[PlutusData], e: &mut Encoder<W>, ctx: &mut C) -> Result<(), encode::Error<W::Error>> {
    if items.is_empty() {
        e.array(0)?;
        return Ok(());
    }
    e.begin_array()?;
    for item in items {
        item.encode(e, ctx)?;
    }
    e.end()?;
    Ok(())
}

fn encode_bytes<W: encode::Write>(bytes: &[u8], e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
    if bytes.len() <= BYTES_CHUNK_SIZE {
        e.bytes(bytes)?;
        return Ok(());
    }
    e.begin_bytes()?;
    for chunk in bytes.chunks(BYTES_CHUNK_SIZE) {
        e.bytes(chunk)?;
    }
    e.end()?;
    Ok(())
}

fn encode_integer<W: encode::Write>(value: i128, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
    if let Ok(int) = Int::try_from(value) {
        e.int(int)?;
        return Ok(());
    }
    let (tag, magnitude) = if value >= 0 { (TAG_POS_BIGNUM, value as u128) } else { (TAG_NEG_BIGNUM, (-1 - value) as u128) };
    let be = magnitude.to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    e.tag(Tag::new(tag))?.bytes(&be[skip..])?;
    Ok(())
}

impl<C> Encode<C> for PlutusData {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>, ctx: &mut C) -> Result<(), encode::Error<W::Error>> {
        match self {
            PlutusData::Constr { tag, fields } => match constr_cbor_tag(*tag) {
                Some(cbor_tag) => {
                    e.tag(Tag::new(cbor_tag))?;
                    encode_list(fields, e, ctx)?;
                }
                None => {
                    e.tag(Tag::new(TAG_CONSTR_GENERAL))?.array(2)?.u64(*tag)?;
                    encode_list(fields, e, ctx)?;
                }
            },
            PlutusData::Map(entries) => {
                e.map(entries.len() as u64)?;
                for (key, value) in entries {
                    key.encode(e, ctx)?;
                    value.encode(e, ctx)?;
                }
            }
            PlutusData::List(items) => encode_list(items, e, ctx)?,
            PlutusData::Integer(value) => encode_integer(*value, e)?,
            PlutusData::Bytes(bytes) => encode_bytes(bytes, e)?,
        }
        Ok(())
    }
}

fn decode_bytes(d: &mut Decoder<'_>) -> Result<Vec<u8>, decode::Error> {
    let mut out = Vec::new();
    for chunk in d.bytes_iter()? {
        out.extend_from_slice(chunk?);
    }
    Ok(out)
}

fn decode_list<'b, C>(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Vec<PlutusData>, decode::Error> {
    match d.datatype()? {
        Type::Array | Type::ArrayIndef => d.array_iter_with::<C, PlutusData>(ctx)?.collect(),
        other => Err(decode::Error::message(format!("expected a list of fields, found {other}"))),
    }
}

fn decode_bignum(d: &mut Decoder<'_>, negative: bool) -> Result<i128, decode::Error> {
    let magnitude = decode_bytes(d)?;
    let significant = &magnitude[magnitude.iter().take_while(|b| **b == 0).count()..];
    if significant.len() > 16 {
        return Err(decode::Error::message("bignum exceeds 128 bits"));
    }
    let mut be = [0u8; 16];
    be[16 - significant.len()..].copy_from_slice(significant);
    let n = i128::try_from(u128::from_be_bytes(be)).map_err(|_| decode::Error::message("bignum exceeds i128"))?;
    Ok(if negative { -1 - n } else { n })
}

impl<'b, C> Decode<'b, C> for PlutusData {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::Tag => {
                let tag = d.tag()?.as_u64();
                match tag {
                    TAG_POS_BIGNUM => Ok(PlutusData::Integer(decode_bignum(d, false)?)),
                    TAG_NEG_BIGNUM => Ok(PlutusData::Integer(decode_bignum(d, true)?)),
                    121..=127 => Ok(PlutusData::constr(tag - TAG_CONSTR_COMPACT, decode_list(d, ctx)?)),
                    1280..=1400 => Ok(PlutusData::constr(tag - TAG_CONSTR_EXTENDED + 7, decode_list(d, ctx)?)),
                    TAG_CONSTR_GENERAL => {
                        if d.array()? != Some(2) {
                            return Err(decode::Error::message("general constructor must be a pair"));
                        }
                        let index = d.u64()?;
                        Ok(PlutusData::constr(index, decode_list(d, ctx)?))
                    }
                    other => Err(decode::Error::message(format!("unexpected tag {other}"))),
                }
            }
            Type::U8 | Type::U16 | Type::U32 | Type::U64 | Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => {
                Ok(PlutusData::Integer(i128::from(d.int()?)))
            }
            Type::Bytes | Type::BytesIndef => Ok(PlutusData::Bytes(decode_bytes(d)?)),
            Type::Array | Type::ArrayIndef => Ok(PlutusData::List(decode_list(d, ctx)?)),
            Type::Map | Type::MapIndef => {
                Ok(PlutusData::Map(d.map_iter_with::<C, PlutusData, PlutusData>(ctx)?.collect::<Result<_, _>>()?))
            }
            other => Err(decode::Error::message(format!("unexpected {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(data: PlutusData, expected_hex: &str) {
        assert_eq!(data.to_hex(), expected_hex);
        assert_eq!(PlutusData::from_hex(expected_hex).unwrap(), data);
    }

    #[test]
    fn test_constructor_tags() {
        check(PlutusData::unit(), "d87980");
        check(PlutusData::constr(1, vec![PlutusData::int(100)]), "d87a9f1864ff");
        check(PlutusData::constr(7, vec![]), "d9050080");
        check(PlutusData::constr(7, vec![PlutusData::int(1)]), "d905009f01ff");
        check(PlutusData::constr(127, vec![]), "d9057880");
        check(PlutusData::constr(128, vec![PlutusData::int(1)]), "d8668218809f01ff");
    }

    #[test]
    fn test_integers() {
        check(PlutusData::int(-1), "20");
        check(PlutusData::int(-500), "3901f3");
        check(PlutusData::int(1u64 << 32), "1b0000000100000000");
        check(PlutusData::Integer(1i128 << 64), "c249010000000000000000");
        check(PlutusData::Integer(-(1i128 << 64)), "3bffffffffffffffff");
        check(PlutusData::Integer(-(1i128 << 64) - 1), "c349010000000000000000");
        assert!(PlutusData::from_hex(&format!("c25101{}", "00".repeat(16))).is_err());
    }

    #[test]
    fn test_bytes_chunking() {
        let bytes: Vec<u8> = (0..70).collect();
        let expected = format!("5f5840{}46{}ff", hex::encode(&bytes[..64]), hex::encode(&bytes[64..]));
        check(PlutusData::Bytes(bytes), &expected);
        check(PlutusData::bytes([0u8; 64]), &format!("5840{}", "00".repeat(64)));
    }

    #[test]
    fn test_lists_and_maps() {
        check(PlutusData::List(vec![]), "80");
        check(PlutusData::List(vec![PlutusData::int(1), PlutusData::bytes(b"a")]), "9f014161ff");
        check(
            PlutusData::Map(vec![(PlutusData::int(1), PlutusData::bytes(b"a")), (PlutusData::bytes(b""), PlutusData::List(vec![]))]),
            "a20141614080",
        );
        // definite forms decode to the same value
        assert_eq!(PlutusData::from_hex("d8798101").unwrap(), PlutusData::constr(0, vec![PlutusData::int(1)]));
        assert_eq!(PlutusData::from_hex("820102").unwrap(), PlutusData::List(vec![PlutusData::int(1), PlutusData::int(2)]));
    }

    #[test]
    fn test_malformed_input() {
        assert!(PlutusData::from_hex("d879").is_err());
        assert!(PlutusData::from_hex("d87980ff").is_err());
        assert!(PlutusData::from_hex("d87901").is_err());
        assert!(PlutusData::from_hex("f5").is_err());
        assert!(PlutusData::from_hex("d87a9f").is_err());
        assert!(PlutusData::from_hex("not hex").is_err());
        assert!(PlutusData::from_cbor(&[]).is_err());
    }

    #[test]
    fn test_accessors() {
        let data = PlutusData::constr(1, vec![PlutusData::bytes([7u8; 28])]);
        let (tag, fields) = data.as_constr().unwrap();
        assert_eq!(tag, 1);
        assert_eq!(fields[0].as_bytes(), Some(&[7u8; 28][..]));
        assert_eq!(PlutusData::int(42).as_integer(), Some(42));
        assert_eq!(PlutusData::int(42).as_bytes(), None);
    }
}
