use crate::data::PlutusData;
use crate::error::ParamError;
use crate::flat::{BitReader, BitWriter};
use minicbor::{Decoder, Encoder};

const TERM_TAG_BITS: u32 = 4;
const TERM_APPLY: u64 = 3;
const TERM_CONSTANT: u64 = 4;
const BUILTIN_TAG_BITS: u32 = 7;
const TYPE_TAG_BITS: u32 = 4;
const TYPE_DATA: u64 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConstantType {
    Integer,
    ByteString,
    String,
    Unit,
    Bool,
    Data,
    List(Box<ConstantType>),
    Pair(Box<ConstantType>, Box<ConstantType>),
}

impl ConstantType {
    fn parse(tags: &[u8]) -> Result<Self, ParamError> {
        let mut index = 0;
        let ty = Self::parse_at(tags, &mut index)?;
        if index != tags.len() {
            return Err(ParamError::MalformedType(tags.to_vec()));
        }
        Ok(ty)
    }

    fn parse_at(tags: &[u8], index: &mut usize) -> Result<Self, ParamError> {
        let malformed = || ParamError::MalformedType(tags.to_vec());
        let tag = *tags.get(*index).ok_or_else(malformed)?;
        *index += 1;
        match tag {
            0 => Ok(ConstantType::Integer),
            1 => Ok(ConstantType::ByteString),
            2 => Ok(ConstantType::String),
            3 => Ok(ConstantType::Unit),
            4 => Ok(ConstantType::Bool),
            8 => Ok(ConstantType::Data),
            // type application: `7 5 a` is a list, `7 7 6 a b` a pair
            7 => match tags.get(*index) {
                Some(5) => {
                    *index += 1;
                    Ok(ConstantType::List(Box::new(Self::parse_at(tags, index)?)))
                }
                Some(7) if tags.get(*index + 1) == Some(&6) => {
                    *index += 2;
                    let first = Self::parse_at(tags, index)?;
                    let second = Self::parse_at(tags, index)?;
                    Ok(ConstantType::Pair(Box::new(first), Box::new(second)))
                }
                Some(&tag) if tag >= 9 => Err(ParamError::UnsupportedConstant(tag)),
                _ => Err(malformed()),
            },
            5 | 6 => Err(malformed()),
            other => Err(ParamError::UnsupportedConstant(other)),
        }
    }

    fn skip_value(&self, reader: &mut BitReader<'_>) -> Result<(), ParamError> {
        match self {
            ConstantType::Integer => reader.skip_natural(),
            ConstantType::ByteString | ConstantType::String | ConstantType::Data => reader.skip_bytestring(),
            ConstantType::Unit => Ok(()),
            ConstantType::Bool => reader.bit().map(|_| ()),
            ConstantType::List(item) => {
                while reader.bit()? {
                    item.skip_value(reader)?;
                }
                Ok(())
            }
            ConstantType::Pair(first, second) => {
                first.skip_value(reader)?;
                second.skip_value(reader)
            }
        }
    }
}

fn skip_constant(reader: &mut BitReader<'_>) -> Result<(), ParamError> {
    let mut tags = Vec::new();
    while reader.bit()? {
        tags.push(reader.bits(TYPE_TAG_BITS)? as u8);
    }
    ConstantType::parse(&tags)?.skip_value(reader)
}

enum Pending {
    Term,
    /// Continuation bit of a term list (constr fields, case branches)
    ListTail,
}

/// Advances `reader` past exactly one term.
fn skip_term(reader: &mut BitReader<'_>) -> Result<(), ParamError> {
    let mut stack = vec![Pending::Term];
    while let Some(pending) = stack.pop() {
        match pending {
            Pending::ListTail => {
                if reader.bit()? {
                    stack.push(Pending::ListTail);
                    stack.push(Pending::Term);
                }
            }
            Pending::Term => {
                let position = reader.position();
                match reader.bits(TERM_TAG_BITS)? {
                    // var
                    0 => reader.skip_natural()?,
                    // delay, lambda, force
                    1 | 2 | 5 => stack.push(Pending::Term),
                    TERM_APPLY => stack.extend([Pending::Term, Pending::Term]),
                    TERM_CONSTANT => skip_constant(reader)?,
                    // error
                    6 => {}
                    // builtin
                    7 => {
                        reader.bits(BUILTIN_TAG_BITS)?;
                    }
                    // constr
                    8 => {
                        reader.skip_natural()?;
                        stack.push(Pending::ListTail);
                    }
                    // case
                    9 => stack.extend([Pending::ListTail, Pending::Term]),
                    tag => return Err(ParamError::UnknownTermTag { tag: tag as u8, position }),
                }
            }
        }
    }
    Ok(())
}

fn unwrap_cbor_bytes(compiled_code: &[u8]) -> Result<Vec<u8>, ParamError> {
    let mut decoder = Decoder::new(compiled_code);
    let mut flat = Vec::new();
    for chunk in decoder.bytes_iter().map_err(|err| ParamError::NotByteString(err.to_string()))? {
        flat.extend_from_slice(chunk.map_err(|err| ParamError::NotByteString(err.to_string()))?);
    }
    if decoder.position() != compiled_code.len() {
        return Err(ParamError::NotByteString("trailing bytes".to_string()));
    }
    Ok(flat)
}

fn wrap_cbor_bytes(flat: &[u8]) -> Vec<u8> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.bytes(flat).expect("encoding into a vector is infallible");
    encoder.into_writer()
}

/// A flat-encoded UPLC program with the bit span of its top level term.
#[derive(Debug, Clone)]
pub struct Program {
    version: (u64, u64, u64),
    flat: Vec<u8>,
    term_start: usize,
    term_end: usize,
}

impl Program {
    /// Parses compiled code: a CBOR byte string around the flat program.
    pub fn from_compiled_code(compiled_code: &[u8]) -> Result<Self, ParamError> {
        let flat = unwrap_cbor_bytes(compiled_code)?;
        let mut reader = BitReader::new(&flat);
        let version = (reader.natural()?, reader.natural()?, reader.natural()?);
        let term_start = reader.position();
        skip_term(&mut reader)?;
        let term_end = reader.position();

        reader.filler().map_err(|_| ParamError::TrailingBits)?;
        if !reader.is_exhausted() {
            return Err(ParamError::TrailingBits);
        }
        Ok(Self { version, flat, term_start, term_end })
    }

    pub fn version(&self) -> (u64, u64, u64) {
        self.version
    }

    /// Wraps the term in one application per parameter, each parameter being a `data` constant,
    /// and returns the new compiled code.
    pub fn apply(&self, params: &[PlutusData]) -> Vec<u8> {
        let mut writer = BitWriter::new();
        let (major, minor, patch) = self.version;
        writer.natural(major);
        writer.natural(minor);
        writer.natural(patch);
        for _ in params {
            writer.bits(TERM_APPLY, TERM_TAG_BITS);
        }
        writer.copy_bits(&self.flat, self.term_start, self.term_end);
        for param in params {
            writer.bits(TERM_CONSTANT, TERM_TAG_BITS);
            // single element type list: [data]
            writer.bit(true);
            writer.bits(TYPE_DATA, TYPE_TAG_BITS);
            writer.bit(false);
            writer.bytestring(&param.to_cbor());
        }
        writer.filler();
        wrap_cbor_bytes(&writer.finish())
    }
}

/// Applies `params` to a compiled validator, returning the parameterized compiled code.
pub fn apply_params(compiled_code: &[u8], params: &[PlutusData]) -> Result<Vec<u8>, ParamError> {
    Ok(Program::from_compiled_code(compiled_code)?.apply(params))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::script::PlutusScript;

    pub const ISSUE_CODE: &str = "585701010029800aba2aba1aab9eaab9dab9a4888896600264646644b30013370e900218031baa00289919b87375a6012008906400980418039baa0028a504014600c600e002600c004600c00260066ea801a29344d9590011";
    pub const TRANSFER_CODE: &str = "585701010029800aba2aba1aab9eaab9dab9a4888896600264646644b30013370e900218031baa00289919b87375a6012008904801980418039baa0028a504014600c600e002600c004600c00260066ea801a29344d9590011";

    fn hash_of(code: &[u8]) -> String {
        PlutusScript::v3(code.to_vec()).hash().to_string()
    }

    #[test]
    fn test_parse_compiled_scripts() {
        for code in [ISSUE_CODE, TRANSFER_CODE] {
            let program = Program::from_compiled_code(&hex::decode(code).unwrap()).unwrap();
            assert_eq!(program.version(), (1, 1, 0));
        }
    }

    #[test]
    fn test_apply_bytes_param() {
        let code = hex::decode(ISSUE_CODE).unwrap();
        let params = [PlutusData::bytes(hex::decode("0befd1269cf3b5b41cce136c92c64b45dde93e4bfe11875839b713d1").unwrap())];
        let applied = apply_params(&code, &params).unwrap();
        assert_eq!(
            hex::encode(&applied),
            "587a010100329800aba2aba1aab9eaab9dab9a4888896600264646644b30013370e900218031baa00289919b87375a6012008906400980418039baa0028a504014600c600e002600c004600c00260066ea801a29344d95900113011e581c0befd1269cf3b5b41cce136c92c64b45dde93e4bfe11875839b713d10001"
        );
        assert_eq!(hash_of(&applied), "61ffc8060764122c5c3f24e51d527a514eff990a6845fa4982337e61");

        // parameterization is deterministic
        assert_eq!(apply_params(&code, &params).unwrap(), applied);

        // applied programs can be parsed and parameterized again
        let reapplied = apply_params(&applied, &[PlutusData::int(42)]).unwrap();
        assert_eq!(hash_of(&reapplied), "6707dca5fa126d8489a384223bb37b9b807246b09d12d39e1b1a2d4a");
    }

    #[test]
    fn test_apply_constr_params() {
        let code = hex::decode(ISSUE_CODE).unwrap();
        let params = [
            PlutusData::constr(1, vec![PlutusData::bytes([0x11u8; 28])]),
            PlutusData::constr(1, vec![PlutusData::bytes([0x22u8; 28])]),
        ];
        let applied = apply_params(&code, &params).unwrap();
        assert_eq!(hash_of(&applied), "b1be5592c4952acfcf2e2c76b9b440ed1b083d08a39cac57318a723e");
        assert_ne!(hash_of(&applied), hash_of(&apply_params(&code, &params[..1]).unwrap()));
    }

    #[test]
    fn test_rejects_non_templates() {
        assert!(matches!(apply_params(&[0x01, 0x02], &[]), Err(ParamError::NotByteString(_))));
        assert!(matches!(apply_params(&hex::decode("43010100").unwrap(), &[]), Err(ParamError::Truncated(_))));
        assert_eq!(
            apply_params(&hex::decode("44010100f1").unwrap(), &[]),
            Err(ParamError::UnknownTermTag { tag: 15, position: 24 })
        );

        // `error` term with a well formed filler
        let code = hex::decode("4401010061").unwrap();
        assert_eq!(apply_params(&code, &[]).unwrap(), code);

        // filler ending before the byte boundary, and a spare byte after it
        assert_eq!(apply_params(&hex::decode("4401010062").unwrap(), &[]), Err(ParamError::TrailingBits));
        assert_eq!(apply_params(&hex::decode("450101006101").unwrap(), &[]), Err(ParamError::TrailingBits));
    }

    #[test]
    fn test_unsupported_constants() {
        // constant of type bls12_381 G1 element (tag 9): 0100 1 1001 0
        let mut writer = BitWriter::new();
        writer.natural(1);
        writer.natural(1);
        writer.natural(0);
        writer.bits(TERM_CONSTANT, TERM_TAG_BITS);
        writer.bit(true);
        writer.bits(9, TYPE_TAG_BITS);
        writer.bit(false);
        writer.filler();
        let code = wrap_cbor_bytes(&writer.finish());
        assert_eq!(apply_params(&code, &[]), Err(ParamError::UnsupportedConstant(9)));
    }
}
