//! Gas and fee arithmetic.

use super::entities::U256;

/// Price assumed for affordability checks when no fee data is known (1 gwei).
pub const FALLBACK_GAS_PRICE_WEI: u64 = 1_000_000_000;

/// EIP-1559 fee pair suggested by the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eip1559Fees {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Fee parameters attached to a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeStrategy {
    /// Fee cap plus priority fee (type-2 transaction).
    Dynamic(Eip1559Fees),
    /// Single gas price (legacy transaction).
    Legacy { gas_price: U256 },
    /// No override; the ledger adapter picks a price at signing time.
    Unspecified,
}

impl FeeStrategy {
    /// Per-gas price used to bound the cost of the transaction, if known.
    pub fn price_ceiling(&self) -> Option<U256> {
        match self {
            FeeStrategy::Dynamic(fees) => Some(fees.max_fee_per_gas),
            FeeStrategy::Legacy { gas_price } => Some(*gas_price),
            FeeStrategy::Unspecified => None,
        }
    }

    /// Funds needed to pay for `gas_limit` at this strategy's price.
    pub fn required_funds(&self, gas_limit: u64) -> U256 {
        let price = self
            .price_ceiling()
            .unwrap_or_else(|| U256::from(FALLBACK_GAS_PRICE_WEI));
        U256::from(gas_limit).saturating_mul(price)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeeStrategy::Dynamic(_) => "eip1559",
            FeeStrategy::Legacy { .. } => "legacy",
            FeeStrategy::Unspecified => "unspecified",
        }
    }
}

/// Convert a multiplier such as `1.2` to hundredths, never below `100`.
pub fn multiplier_x100(multiplier: f64) -> u64 {
    if !multiplier.is_finite() {
        return 100;
    }
    let scaled = (multiplier * 100.0).round();
    if scaled < 100.0 {
        100
    } else {
        scaled as u64
    }
}

/// Apply a multiplier (in hundredths) to a gas estimate, rounding up.
pub fn apply_gas_multiplier(estimate: u64, mult_x100: u64) -> u64 {
    let scaled = (estimate as u128 * mult_x100 as u128).div_ceil(100);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
