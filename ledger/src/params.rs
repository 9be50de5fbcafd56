use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

impl ExUnits {
    pub const fn new(mem: u64, steps: u64) -> Self {
        Self { mem, steps }
    }

    pub fn saturating_add(self, other: ExUnits) -> ExUnits {
        ExUnits { mem: self.mem.saturating_add(other.mem), steps: self.steps.saturating_add(other.steps) }
    }

    pub fn fits(&self, limit: &ExUnits) -> bool {
        self.mem <= limit.mem && self.steps <= limit.steps
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: u64,
    pub denominator: u64,
}

impl Rational {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self { numerator, denominator }
    }
}

/// Ledger parameters the balancer needs. Defaults follow the current mainnet values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProtocolParameters {
    pub min_fee_a: u64,
    pub min_fee_b: u64,
    pub coins_per_utxo_byte: u64,
    pub max_tx_size: u64,
    pub collateral_percentage: u64,
    pub max_collateral_inputs: usize,
    pub price_mem: Rational,
    pub price_steps: Rational,
    pub max_tx_ex_units: ExUnits,
    /// Budget assigned to every redeemer, as scripts are not evaluated locally
    pub redeemer_ex_units: ExUnits,
    /// PlutusV3 cost model, hashed into the script data hash
    pub cost_model_v3: Vec<i64>,
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            min_fee_a: 44,
            min_fee_b: 155_381,
            coins_per_utxo_byte: 4_310,
            max_tx_size: 16_384,
            collateral_percentage: 150,
            max_collateral_inputs: 3,
            price_mem: Rational::new(577, 10_000),
            price_steps: Rational::new(721, 10_000_000),
            max_tx_ex_units: ExUnits::new(14_000_000, 10_000_000_000),
            redeemer_ex_units: ExUnits::new(1_000_000, 500_000_000),
            cost_model_v3: Vec::new(),
        }
    }
}
