use crate::config::{COIN_DECIMALS, MIST_PER_SUI, SUI_SYMBOL};

// Fraction digits shown by `format_balance`
const DISPLAY_FRACTION_DIGITS: u32 = 2;

/// Convert a SUI amount into MIST (1 SUI = 1,000,000,000 MIST)
///
/// The result is rounded to the nearest MIST. Negative and NaN inputs
/// saturate to zero.
pub fn sui_to_mist(sui: f64) -> u64 {
    (sui * MIST_PER_SUI as f64).round() as u64
}

/// Convert a MIST amount into SUI
pub fn mist_to_sui(mist: u64) -> f64 {
    mist as f64 / MIST_PER_SUI as f64
}

/// Format an amount expressed in the smallest unit of `token` for display
///
/// The value is divided by `10^decimals`, rounded half away from zero to at
/// most two fraction digits, trailing zeros are dropped and the integer part
/// is grouped by thousands:
///
/// ```
/// use tortoise_common::utils::format_balance;
///
/// assert_eq!(format_balance(1_000_000_000, "SUI", 9), "1 SUI");
/// assert_eq!(format_balance(100_000_000, "USDC", 6), "100 USDC");
/// assert_eq!(format_balance(1_234_567_891_000, "SUI", 9), "1,234.57 SUI");
/// ```
pub fn format_balance(amount: u64, token: &str, decimals: u8) -> String {
    let scale = 10u128.pow(DISPLAY_FRACTION_DIGITS);
    // Units beyond u128 range make every u64 amount round down to zero
    let hundredths = match 10u128.checked_pow(decimals as u32) {
        Some(unit) => (amount as u128 * scale + unit / 2) / unit,
        None => 0,
    };

    let integer = hundredths / scale;
    let fraction = hundredths % scale;

    let mut value = group_thousands(integer);
    if fraction != 0 {
        let digits = format!("{:02}", fraction);
        value.push('.');
        value.push_str(digits.trim_end_matches('0'));
    }

    format!("{} {}", value, token)
}

/// Format a MIST amount as SUI
pub fn format_sui(amount: u64) -> String {
    format_balance(amount, SUI_SYMBOL, COIN_DECIMALS)
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sui_to_mist() {
        assert_eq!(sui_to_mist(1.0), 1_000_000_000);
        assert_eq!(sui_to_mist(0.5), 500_000_000);
        assert_eq!(sui_to_mist(1000.0), 1_000_000_000_000);
        assert_eq!(sui_to_mist(-1.0), 0);
    }

    #[test]
    fn test_mist_to_sui() {
        assert_eq!(mist_to_sui(1_000_000_000), 1.0);
        assert_eq!(mist_to_sui(500_000_000), 0.5);
        assert_eq!(mist_to_sui(0), 0.0);
    }

    #[test]
    fn test_format_sui() {
        assert_eq!(format_sui(1_000_000_000), "1 SUI");
        assert_eq!(format_sui(500_000_000), "0.5 SUI");
        assert_eq!(format_sui(0), "0 SUI");
        assert_eq!(format_sui(1_000_000_000_000_000), "1,000,000 SUI");
    }

    #[test]
    fn test_format_balance_custom_decimals() {
        assert_eq!(format_balance(100_000_000, "USDC", 6), "100 USDC");
        assert_eq!(format_balance(100_000, "USDC", 6), "0.1 USDC");
        assert_eq!(format_balance(500_000_000_000, "USDC", 6), "500,000 USDC");
        assert_eq!(format_balance(42, "RAW", 0), "42 RAW");
    }

    #[test]
    fn test_format_balance_rounding() {
        // 1.234 SUI -> 1.23, 1.235 SUI -> 1.24
        assert_eq!(format_sui(1_234_000_000), "1.23 SUI");
        assert_eq!(format_sui(1_235_000_000), "1.24 SUI");
        assert_eq!(format_sui(1_050_000_000), "1.05 SUI");
        // Below half a hundredth rounds to zero
        assert_eq!(format_sui(4_000_000), "0 SUI");
        assert_eq!(format_sui(999_999_999), "1 SUI");
    }

    #[test]
    fn test_format_balance_huge_decimals() {
        assert_eq!(format_balance(u64::MAX, "X", 200), "0 X");
    }

    proptest! {
        #[test]
        fn whole_sui_amounts_convert_exactly(sui in 0u64..1_000_000_000) {
            prop_assert_eq!(sui_to_mist(sui as f64), sui * MIST_PER_SUI);
        }

        #[test]
        fn formatted_balance_has_at_most_two_fraction_digits(amount in any::<u64>(), decimals in 0u8..20) {
            let formatted = format_balance(amount, "TOK", decimals);
            let value = formatted.strip_suffix(" TOK").unwrap();
            if let Some((_, fraction)) = value.split_once('.') {
                prop_assert!(!fraction.is_empty() && fraction.len() <= 2);
                prop_assert!(!fraction.ends_with('0'));
            }
        }
    }
}
