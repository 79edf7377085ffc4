use ethers::types::{Address, U256};
use log::warn;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{MAX_DECIMALS, NATIVE_DECIMALS};
use crate::error::{AirdropError, Result};
use crate::reporter::ProgressReporter;
use crate::types::{AmountTotals, Recipient, ResolvedRecipient};

/// What to do with a non-empty amount that is not a non-negative decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountPolicy {
    /// Abort the run with `InvalidAmountFormat`.
    #[default]
    Strict,
    /// Treat the amount as zero and report it.
    Lenient,
}

impl FromStr for AmountPolicy {
    type Err = AirdropError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(AirdropError::InvalidInput(format!(
                "unknown amount policy {other:?}"
            ))),
        }
    }
}

/// Recipients that survived validation plus the totals they will move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub recipients: Vec<ResolvedRecipient>,
    pub totals: AmountTotals,
    /// (index, raw address) of recipients dropped for a malformed address.
    pub skipped: Vec<(usize, String)>,
}

impl Aggregation {
    pub fn actionable(&self) -> impl Iterator<Item = &ResolvedRecipient> {
        self.recipients.iter().filter(|r| r.has_transfers())
    }
}

/// `0x` followed by exactly 40 hex digits.
pub fn parse_address(raw: &str) -> Option<Address> {
    let raw = raw.trim();
    let hex_part = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Address::from_str(hex_part).ok()
}

pub fn validate_token_address(raw: &str) -> Result<Address> {
    parse_address(raw)
        .ok_or_else(|| AirdropError::InvalidInput(format!("invalid token address {raw:?}")))
}

/// Scale a human decimal string into base units. Blank means zero. Digits past
/// `decimals` are truncated so nothing is ever rounded up.
pub fn parse_amount(raw: &str, decimals: u8) -> std::result::Result<U256, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(U256::zero());
    }
    if decimals > MAX_DECIMALS {
        return Err(format!("precision {decimals} is out of range"));
    }

    let (int_part, frac_part) = match raw.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (raw, ""),
    };
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !digits_only(int_part) || !digits_only(frac_part) {
        return Err(format!("{raw:?} is not a non-negative decimal number"));
    }

    // Base units are the integer digits followed by the fraction padded to
    // exactly `decimals` places.
    let frac_part = &frac_part[..frac_part.len().min(decimals as usize)];
    let scaled = format!("{int_part}{frac_part:0<width$}", width = decimals as usize);
    let digits = scaled.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }

    U256::from_dec_str(digits).map_err(|e| format!("{raw:?} does not fit in uint256: {e}"))
}

/// Resolve every recipient against the token precision and the fixed native
/// precision, dropping malformed addresses before anything is summed.
pub fn aggregate(
    recipients: &[Recipient],
    token_decimals: u8,
    policy: AmountPolicy,
    reporter: &dyn ProgressReporter,
) -> Result<Aggregation> {
    let mut aggregation = Aggregation::default();

    for (index, recipient) in recipients.iter().enumerate() {
        let Some(address) = parse_address(&recipient.address) else {
            warn!("skipping recipient #{} with malformed address {:?}", index + 1, recipient.address);
            reporter.emit(format!("❌ Skipping invalid address: {}", recipient.address));
            aggregation.skipped.push((index, recipient.address.clone()));
            continue;
        };

        let token_amount = resolve_amount(recipient, &recipient.token_amount, token_decimals, policy, reporter)?;
        let native_amount = resolve_amount(recipient, &recipient.native_amount, NATIVE_DECIMALS, policy, reporter)?;

        aggregation.totals.total_token = checked_sum(aggregation.totals.total_token, token_amount)?;
        aggregation.totals.total_native = checked_sum(aggregation.totals.total_native, native_amount)?;
        aggregation.recipients.push(ResolvedRecipient {
            index,
            address,
            token_amount,
            native_amount,
        });
    }

    Ok(aggregation)
}

fn resolve_amount(
    recipient: &Recipient,
    raw: &str,
    decimals: u8,
    policy: AmountPolicy,
    reporter: &dyn ProgressReporter,
) -> Result<U256> {
    match parse_amount(raw, decimals) {
        Ok(amount) => Ok(amount),
        Err(reason) => match policy {
            AmountPolicy::Strict => Err(AirdropError::InvalidAmountFormat {
                recipient: recipient.address.clone(),
                value: raw.to_string(),
            }),
            AmountPolicy::Lenient => {
                warn!("treating amount as zero for {}: {}", recipient.address, reason);
                reporter.emit(format!(
                    "⚠️ Unparsable amount {:?} for {} treated as zero",
                    raw, recipient.address
                ));
                Ok(U256::zero())
            }
        },
    }
}

fn checked_sum(total: U256, amount: U256) -> Result<U256> {
    total
        .checked_add(amount)
        .ok_or_else(|| AirdropError::InvalidInput("amount total overflows uint256".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::RunLog;

    const ALICE: &str = "0xc1b4d877f267c998a2cde3762622e0c0aa0d65e0";
    const BOB: &str = "0x2a175aea05465fc6ccfaa1de550bf611aa379a18";

    fn exp10(n: usize) -> U256 {
        U256::exp10(n)
    }

    #[test]
    fn parses_exact_decimals_without_float_rounding() {
        assert_eq!(parse_amount("100", 18).unwrap(), U256::from(100) * exp10(18));
        assert_eq!(parse_amount("0.001", 18).unwrap(), exp10(15));
        assert_eq!(parse_amount("0.1", 6).unwrap(), U256::from(100_000));
        // 0.1 + 0.2 style values must stay exact
        assert_eq!(parse_amount("0.3", 18).unwrap(), U256::from(3) * exp10(17));
        assert_eq!(parse_amount(".5", 2).unwrap(), U256::from(50));
        assert_eq!(parse_amount("7.", 2).unwrap(), U256::from(700));
    }

    #[test]
    fn blank_is_zero_and_garbage_is_rejected() {
        assert_eq!(parse_amount("", 18).unwrap(), U256::zero());
        assert_eq!(parse_amount("   ", 18).unwrap(), U256::zero());
        assert!(parse_amount("abc", 18).is_err());
        assert!(parse_amount("-1", 18).is_err());
        assert!(parse_amount("1.2.3", 18).is_err());
        assert!(parse_amount(".", 18).is_err());
        assert!(parse_amount("1e18", 18).is_err());
    }

    #[test]
    fn excess_fraction_digits_are_truncated() {
        assert_eq!(parse_amount("1.239", 2).unwrap(), U256::from(123));
        assert_eq!(parse_amount("5.9", 0).unwrap(), U256::from(5));
    }

    #[test]
    fn amounts_beyond_uint256_are_errors() {
        let huge = format!("1{}", "0".repeat(60));
        assert!(parse_amount(&huge, 18).is_err());
        assert!(parse_amount("2", MAX_DECIMALS).is_err());
        assert_eq!(parse_amount("1", MAX_DECIMALS).unwrap(), U256::exp10(77));
        assert_eq!(parse_amount("000.000", 6).unwrap(), U256::zero());
    }

    #[test]
    fn oversized_amount_follows_the_policy() {
        let huge = format!("1{}", "0".repeat(60));
        let recipients = vec![Recipient::new(ALICE, huge.as_str(), "1")];
        let log = RunLog::new();

        let err = aggregate(&recipients, 18, AmountPolicy::Strict, &log).unwrap_err();
        assert!(matches!(err, AirdropError::InvalidAmountFormat { .. }));

        let aggregation = aggregate(&recipients, 18, AmountPolicy::Lenient, &log).unwrap();
        assert_eq!(aggregation.totals.total_token, U256::zero());
        assert_eq!(aggregation.totals.total_native, exp10(18));
    }

    #[test]
    fn address_must_be_prefixed_40_hex() {
        assert!(parse_address(ALICE).is_some());
        assert!(parse_address(&ALICE.to_uppercase().replacen("0X", "0x", 1)).is_some());
        assert!(parse_address("c1b4d877f267c998a2cde3762622e0c0aa0d65e0").is_none());
        assert!(parse_address("0x1234").is_none());
        assert!(parse_address("0xzzb4d877f267c998a2cde3762622e0c0aa0d65e0").is_none());
        assert!(validate_token_address("0xnope").is_err());
    }

    #[test]
    fn totals_sum_only_submitted_amounts() {
        let log = RunLog::new();
        let recipients = vec![
            Recipient::new(ALICE, "100", "0.001"),
            Recipient::new(BOB, "50", "0"),
            Recipient::new("not-an-address", "999", "1"),
        ];

        let aggregation = aggregate(&recipients, 18, AmountPolicy::Strict, &log).unwrap();

        assert_eq!(aggregation.recipients.len(), 2);
        assert_eq!(aggregation.totals.total_token, U256::from(150) * exp10(18));
        assert_eq!(aggregation.totals.total_native, exp10(15));
        assert_eq!(aggregation.skipped, vec![(2, "not-an-address".to_string())]);
        assert!(log.contains("Skipping invalid address"));
    }

    #[test]
    fn strict_policy_rejects_unparsable_amount() {
        let log = RunLog::new();
        let recipients = vec![Recipient::new(ALICE, "ten", "")];

        let err = aggregate(&recipients, 18, AmountPolicy::Strict, &log).unwrap_err();
        assert!(matches!(err, AirdropError::InvalidAmountFormat { .. }));
    }

    #[test]
    fn lenient_policy_zeroes_unparsable_amount() {
        let log = RunLog::new();
        let recipients = vec![
            Recipient::new(ALICE, "ten", "0.5"),
            Recipient::new(BOB, "2", ""),
        ];

        let aggregation = aggregate(&recipients, 6, AmountPolicy::Lenient, &log).unwrap();

        assert_eq!(aggregation.totals.total_token, U256::from(2_000_000));
        assert_eq!(aggregation.totals.total_native, U256::from(5) * exp10(17));
        assert_eq!(aggregation.actionable().count(), 2);
        assert!(log.contains("treated as zero"));
    }

    #[test]
    fn policy_parses_from_env_strings() {
        assert_eq!("Lenient".parse::<AmountPolicy>().unwrap(), AmountPolicy::Lenient);
        assert!("sloppy".parse::<AmountPolicy>().is_err());
    }
}
