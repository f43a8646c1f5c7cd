use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Asset;

/// Decimal places shown for fiat values.
pub const FIAT_DECIMALS: u32 = 2;

/// Decimal places shown for divisible asset amounts.
pub const AMOUNT_DISPLAY_DECIMALS: u32 = 4;

/// Display symbol for a fiat currency code, if it has a conventional one.
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    let symbol = match code.to_uppercase().as_str() {
        "USD" | "CAD" | "AUD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" | "CNY" => "¥",
        "KRW" => "₩",
        "CHF" => "Fr.",
        "RUB" => "₽",
        "INR" => "₹",
        "BRL" => "R$",
        _ => return None,
    };
    Some(symbol)
}

/// Rounds a fiat value for display: 2 places, half away from zero.
pub fn round_fiat(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(FIAT_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Cuts an amount down to `dp` places without rounding.
pub fn truncate_amount(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

fn group_int_digits(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len - i - 1;
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

/// Adds thousands separators to a plain unsigned decimal string.
fn group_number_string(s: &str) -> String {
    match s.split_once('.') {
        Some((int_part, frac)) if !frac.is_empty() => {
            format!("{}.{frac}", group_int_digits(int_part))
        }
        Some((int_part, _)) => group_int_digits(int_part),
        None => group_int_digits(s),
    }
}

fn fixed_fraction(s: &str, dp: usize) -> String {
    let (int_part, frac) = s.split_once('.').unwrap_or((s, ""));
    let mut frac: String = frac.chars().take(dp).collect();
    while frac.len() < dp {
        frac.push('0');
    }
    if dp == 0 {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac}")
    }
}

/// Renders a fiat value as `"$2,548,025.48 USD"`.
///
/// The value is rounded to 2 places for display only; unknown currency codes
/// render without a symbol.
pub fn format_currency_amount(value: Decimal, currency_code: &str) -> String {
    let code = currency_code.to_uppercase();
    let rounded = round_fiat(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let digits = fixed_fraction(&rounded.abs().normalize().to_string(), FIAT_DECIMALS as usize);
    let grouped = group_number_string(&digits);

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if let Some(symbol) = currency_symbol(&code) {
        out.push_str(symbol);
    }
    out.push_str(&grouped);
    out.push(' ');
    out.push_str(&code);
    out
}

/// Renders an asset amount for display.
///
/// Indivisible assets show whole units. Divisible assets are truncated (not
/// rounded) to 4 places and lose trailing zeros.
pub fn format_asset_amount(amount: Decimal, asset: &Asset) -> String {
    let dp = if asset.is_divisible() {
        AMOUNT_DISPLAY_DECIMALS.min(asset.decimals())
    } else {
        0
    };
    let shown = truncate_amount(amount, dp);
    let negative = shown.is_sign_negative() && !shown.is_zero();
    let grouped = group_number_string(&shown.abs().normalize().to_string());
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenInfo;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn currency_amount_groups_pads_and_suffixes_code() {
        assert_eq!(format_currency_amount(dec("2548025.48"), "USD"), "$2,548,025.48 USD");
        assert_eq!(format_currency_amount(dec("18100.00289781"), "usd"), "$18,100.00 USD");
        assert_eq!(format_currency_amount(dec("550"), "EUR"), "€550.00 EUR");
        assert_eq!(format_currency_amount(Decimal::ZERO, "GBP"), "£0.00 GBP");
    }

    #[test]
    fn currency_amount_rounds_half_away_from_zero() {
        assert_eq!(format_currency_amount(dec("0.005"), "USD"), "$0.01 USD");
        assert_eq!(format_currency_amount(dec("0.0049"), "USD"), "$0.00 USD");
        assert_eq!(format_currency_amount(dec("-1234.565"), "USD"), "-$1,234.57 USD");
    }

    #[test]
    fn unknown_currency_has_no_symbol() {
        assert_eq!(format_currency_amount(dec("1000"), "xyz"), "1,000.00 XYZ");
    }

    #[test]
    fn tiny_negative_rounds_to_unsigned_zero() {
        assert_eq!(format_currency_amount(dec("-0.001"), "USD"), "$0.00 USD");
    }

    #[test]
    fn asset_amounts_truncate_divisible_assets() {
        assert_eq!(format_asset_amount(dec("100001"), &Asset::Native), "100,001");
        assert_eq!(format_asset_amount(dec("1000.0001601"), &Asset::Secondary), "1,000.0001");
        assert_eq!(format_asset_amount(dec("0.99999"), &Asset::Secondary), "0.9999");
        assert_eq!(format_asset_amount(dec("12.5000"), &Asset::Secondary), "12.5");
    }

    #[test]
    fn asset_amounts_respect_token_decimals() {
        let info = TokenInfo::new("TKY", "132947096727c84c7f9e076c90f08fec3bc17f18", "1");
        let two_dp = Asset::token(&info.with_decimals(2));
        assert_eq!(format_asset_amount(dec("1234.567"), &two_dp), "1,234.56");
    }

    #[test]
    fn grouping_handles_short_and_exact_multiples() {
        assert_eq!(group_int_digits("1"), "1");
        assert_eq!(group_int_digits("999"), "999");
        assert_eq!(group_int_digits("1000"), "1,000");
        assert_eq!(group_int_digits("123456"), "123,456");
    }
}
