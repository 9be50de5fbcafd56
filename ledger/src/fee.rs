use crate::params::{ExUnits, ProtocolParameters, Rational};
use crate::tx::{Redeemer, encode_redeemers};
use minicbor::Encoder;
use progtoken_hashes::{Blake2b256, Hash32, Hasher, HasherBase};
use progtoken_plutus::PlutusVersion;

/// Size of one verification key witness `[vkey, signature]` in the witness set.
pub const VKEY_WITNESS_SIZE: u64 = 101;

/// Computes the linear size fee plus the execution unit fee of a transaction.
#[derive(Clone, Debug)]
pub struct FeeCalculator {
    min_fee_a: u64,
    min_fee_b: u64,
    price_mem: Rational,
    price_steps: Rational,
}

impl FeeCalculator {
    pub fn new(min_fee_a: u64, min_fee_b: u64, price_mem: Rational, price_steps: Rational) -> Self {
        Self { min_fee_a, min_fee_b, price_mem, price_steps }
    }

    pub fn new_with_protocol_params(params: &ProtocolParameters) -> Self {
        Self::new(params.min_fee_a, params.min_fee_b, params.price_mem, params.price_steps)
    }

    /// `ceil(mem * price_mem + steps * price_steps)`
    pub fn script_fee(&self, ex_units: ExUnits) -> u64 {
        let (mem_num, mem_den) = (self.price_mem.numerator as u128, self.price_mem.denominator.max(1) as u128);
        let (steps_num, steps_den) = (self.price_steps.numerator as u128, self.price_steps.denominator.max(1) as u128);
        let numerator = ex_units.mem as u128 * mem_num * steps_den + ex_units.steps as u128 * steps_num * mem_den;
        let denominator = mem_den * steps_den;
        numerator.div_ceil(denominator).min(u64::MAX as u128) as u64
    }

    pub fn size_fee(&self, size: u64) -> u64 {
        self.min_fee_a.saturating_mul(size).saturating_add(self.min_fee_b)
    }

    pub fn fee(&self, size: u64, ex_units: ExUnits) -> u64 {
        self.size_fee(size).saturating_add(self.script_fee(ex_units))
    }
}

/// `blake2b-256(redeemers ‖ language views)`; no datums are ever attached to the witness set.
pub fn script_data_hash(redeemers: &[Redeemer], language: PlutusVersion, cost_model: &[i64]) -> Hash32 {
    let mut redeemer_bytes = Encoder::new(Vec::new());
    encode_redeemers(redeemers, &mut redeemer_bytes).expect("encoding into a vector is infallible");

    let mut views = Encoder::new(Vec::new());
    views
        .map(1)
        .and_then(|e| e.u8(language.language_id()))
        .and_then(|e| e.array(cost_model.len() as u64))
        .expect("encoding into a vector is infallible");
    for value in cost_model {
        views.i64(*value).expect("encoding into a vector is infallible");
    }

    let mut hasher = Blake2b256::new();
    hasher.update(redeemer_bytes.into_writer()).update(views.into_writer());
    hasher.finalize()
}
