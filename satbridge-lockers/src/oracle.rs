//! Price oracle interface.
//!
//! The registry prices collateral through this trait; staleness and quote
//! sourcing are the oracle's concern. [`FixedPriceOracle`] is the
//! configurable implementation used by tests and local deployments.

use parking_lot::RwLock;
use thiserror::Error;

use satbridge_core::error::CoreError;
use satbridge_core::math;
use satbridge_core::{NATIVE_DECIMALS, WRAPPED_DECIMALS};

/// Assets the registry asks quotes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    /// The target chain's native token.
    Native,
    /// Wrapped BTC.
    WrappedBtc,
}

/// Errors raised by a price oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The oracle has no price for the requested direction.
    #[error("no quote for the requested pair")]
    UnsupportedPair,

    /// The configured price is zero.
    #[error("oracle price is zero")]
    ZeroPrice,

    /// Arithmetic failure while converting.
    #[error(transparent)]
    Math(#[from] CoreError),
}

/// Quote source converting an amount of one asset into another.
pub trait PriceOracle: Send + Sync {
    /// Value of `amount` of `input` (at `input_decimals` precision)
    /// expressed in `output` at `output_decimals` precision.
    fn equivalent_output_amount(
        &self,
        amount: u128,
        input_decimals: u8,
        output_decimals: u8,
        input: Asset,
        output: Asset,
    ) -> std::result::Result<u128, OracleError>;
}

/// Fixed-rate oracle: one whole native token is worth `price` wrapped-BTC
/// units (8 decimals). The rate is settable at runtime.
#[derive(Debug)]
pub struct FixedPriceOracle {
    /// Wrapped-BTC units per 10^18 native units.
    price: RwLock<u128>,
}

impl FixedPriceOracle {
    /// Create with an initial rate.
    pub fn new(price: u128) -> Self {
        Self {
            price: RwLock::new(price),
        }
    }

    /// Replace the rate (tests drive price moves through this).
    pub fn set_price(&self, price: u128) {
        *self.price.write() = price;
    }

    /// Current rate.
    pub fn price(&self) -> u128 {
        *self.price.read()
    }
}

impl PriceOracle for FixedPriceOracle {
    fn equivalent_output_amount(
        &self,
        amount: u128,
        input_decimals: u8,
        output_decimals: u8,
        input: Asset,
        output: Asset,
    ) -> std::result::Result<u128, OracleError> {
        const ONE_NATIVE: u128 = 1_000_000_000_000_000_000;
        let price = *self.price.read();

        match (input, output) {
            (Asset::Native, Asset::WrappedBtc) => {
                let native = math::rescale(amount, input_decimals, NATIVE_DECIMALS, "oracle")?;
                let wrapped = math::mul_div(native, price, ONE_NATIVE, "oracle")?;
                Ok(math::rescale(
                    wrapped,
                    WRAPPED_DECIMALS,
                    output_decimals,
                    "oracle",
                )?)
            }
            (Asset::WrappedBtc, Asset::Native) => {
                if price == 0 {
                    return Err(OracleError::ZeroPrice);
                }
                let wrapped = math::rescale(amount, input_decimals, WRAPPED_DECIMALS, "oracle")?;
                let native = math::mul_div(wrapped, ONE_NATIVE, price, "oracle")?;
                Ok(math::rescale(
                    native,
                    NATIVE_DECIMALS,
                    output_decimals,
                    "oracle",
                )?)
            }
            _ => Ok(math::rescale(
                amount,
                input_decimals,
                output_decimals,
                "oracle",
            )?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_NATIVE: u128 = 1_000_000_000_000_000_000;
    const ONE_BTC: u128 = 100_000_000;

    #[test]
    fn test_native_to_wrapped() {
        // 1 native token = 0.05 BTC.
        let oracle = FixedPriceOracle::new(5_000_000);
        let out = oracle
            .equivalent_output_amount(10 * ONE_NATIVE, 18, 8, Asset::Native, Asset::WrappedBtc)
            .unwrap();
        assert_eq!(out, 50_000_000);
    }

    #[test]
    fn test_wrapped_to_native() {
        let oracle = FixedPriceOracle::new(5_000_000);
        let out = oracle
            .equivalent_output_amount(ONE_BTC, 8, 18, Asset::WrappedBtc, Asset::Native)
            .unwrap();
        // 1 BTC buys 20 native tokens at 0.05 BTC each.
        assert_eq!(out, 20 * ONE_NATIVE);
    }

    #[test]
    fn test_identity_pair_rescales() {
        let oracle = FixedPriceOracle::new(1);
        let out = oracle
            .equivalent_output_amount(123, 8, 8, Asset::Native, Asset::Native)
            .unwrap();
        assert_eq!(out, 123);
    }

    #[test]
    fn test_zero_price_rejected() {
        let oracle = FixedPriceOracle::new(0);
        assert!(matches!(
            oracle.equivalent_output_amount(1, 8, 18, Asset::WrappedBtc, Asset::Native),
            Err(OracleError::ZeroPrice)
        ));
    }

    #[test]
    fn test_price_update() {
        let oracle = FixedPriceOracle::new(5_000_000);
        oracle.set_price(2_500_000);
        let out = oracle
            .equivalent_output_amount(ONE_NATIVE, 18, 8, Asset::Native, Asset::WrappedBtc)
            .unwrap();
        assert_eq!(out, 2_500_000);
    }
}
