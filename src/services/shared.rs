pub mod env;
pub mod logger;

use rust_decimal::{Decimal, RoundingStrategy};

pub fn round_to_decimals(input: Decimal, decimals: u32) -> Decimal {
    input.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}
