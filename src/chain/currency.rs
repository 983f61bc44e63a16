//! Wei/ether conversions. All arithmetic is integer (`u128`); no float
//! anywhere, so parsing and formatting are exact and deterministic.
//!
//! 1 ether = 10^18 wei. Amounts on the chain are always wei.

use crate::error::{Result, TestchainError};

/// Wei per ether conversion constant.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Number of fractional decimal digits in an ether string.
const ETHER_DECIMALS: usize = 18;

/// Parses a decimal ether amount ("1", "0.02", "10.5") into wei.
/// At most 18 fractional digits; anything finer has no wei representation.
pub fn parse_ether(amount: &str) -> Result<u128> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(TestchainError::Validation(
            "empty ether amount".to_string(),
        ));
    }

    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount, ""),
    };

    if !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
        || (whole.is_empty() && frac.is_empty())
    {
        return Err(TestchainError::Validation(format!(
            "invalid ether amount: {}",
            amount
        )));
    }
    if frac.len() > ETHER_DECIMALS {
        return Err(TestchainError::Validation(format!(
            "ether amount has more than {} fractional digits: {}",
            ETHER_DECIMALS, amount
        )));
    }

    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .map_err(|e| TestchainError::Validation(format!("invalid ether amount: {}", e)))?
            .checked_mul(WEI_PER_ETHER)
            .ok_or_else(|| {
                TestchainError::Validation(format!("ether amount overflows: {}", amount))
            })?
    };

    let frac_wei = if frac.is_empty() {
        0
    } else {
        // "02" in "0.02" means 2 * 10^16: pad to 18 digits on the right.
        let scale = 10u128.pow((ETHER_DECIMALS - frac.len()) as u32);
        frac.parse::<u128>()
            .map_err(|e| TestchainError::Validation(format!("invalid ether amount: {}", e)))?
            * scale
    };

    whole_wei
        .checked_add(frac_wei)
        .ok_or_else(|| TestchainError::Validation(format!("ether amount overflows: {}", amount)))
}

/// Formats a wei amount as a decimal ether string, trimming trailing zeros.
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let frac = wei % WEI_PER_ETHER;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
