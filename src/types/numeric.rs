use std::str::FromStr;

use alloy::primitives::U256;

use crate::{errors, BigDecimal};

pub(crate) const ETH_DECIMALS: u8 = 18;

/// Renders `raw / 10^decimals` with exactly `decimals` fractional digits.
///
/// The division is a pure scale shift on an arbitrary-precision decimal, so
/// nothing is ever rounded; digits beyond `decimals` would be truncated by
/// `with_scale`, which cannot happen for an integer input.
pub(crate) fn normalize_balance(raw: &U256, decimals: u8) -> crate::Result<String> {
    let scaled = BigDecimal::from_str(&format!("{}e-{}", raw, decimals)).map_err(|e| {
        errors::ErrorKind::InternalError(format!(
            "Failed to scale {} by {} decimals: {}",
            raw, decimals, e
        ))
    })?;
    Ok(scaled.with_scale(decimals as i64).to_string())
}

pub(crate) fn wei_to_eth(wei: &U256) -> crate::Result<String> {
    normalize_balance(wei, ETH_DECIMALS)
}
