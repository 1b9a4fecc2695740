//! Money type for storefront prices.
//!
//! The storefront API sends `MoneyV2` values as decimal strings
//! (`{"amount": "49.9", "currencyCode": "USD"}`). They are parsed into an
//! integer count of the currency's minor unit so comparisons and ratios never
//! go through float parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CommerceError, CommerceResult};

/// Currency of a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    /// Any other ISO 4217 code, formatted with its code as the symbol.
    Other([u8; 3]),
}

impl Currency {
    pub fn code(&self) -> &str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::Other(code) => std::str::from_utf8(code).unwrap_or("XXX"),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::JPY => "\u{00a5}",
            Currency::CAD => "CA$",
            Currency::AUD => "A$",
            Currency::Other(_) => self.code(),
        }
    }

    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Parse a three-letter currency code.
    pub fn from_code(code: &str) -> Option<Self> {
        let upper = code.trim().to_ascii_uppercase();
        let known = match upper.as_str() {
            "USD" => Currency::USD,
            "EUR" => Currency::EUR,
            "GBP" => Currency::GBP,
            "JPY" => Currency::JPY,
            "CAD" => Currency::CAD,
            "AUD" => Currency::AUD,
            other => {
                let bytes: [u8; 3] = other.as_bytes().try_into().ok()?;
                if !bytes.iter().all(u8::is_ascii_alphabetic) {
                    return None;
                }
                Currency::Other(bytes)
            }
        };
        Some(known)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A monetary value in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "MoneyV2")]
pub struct Money {
    pub amount_minor: i64,
    pub currency: Currency,
}

/// Wire shape of a storefront price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: String,
    pub currency_code: String,
}

impl TryFrom<MoneyV2> for Money {
    type Error = CommerceError;

    fn try_from(value: MoneyV2) -> Result<Self, Self::Error> {
        Money::parse(&value.amount, &value.currency_code)
    }
}

impl From<Money> for MoneyV2 {
    fn from(money: Money) -> Self {
        MoneyV2 {
            amount: money.decimal_string(),
            currency_code: money.currency.code().to_string(),
        }
    }
}

impl Serialize for Money {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MoneyV2::from(*self).serialize(serializer)
    }
}

impl Money {
    pub fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Parse a decimal string such as `"49.9"` in the given currency.
    ///
    /// Digits beyond the currency's precision are rounded half away from zero.
    pub fn parse(amount: &str, currency_code: &str) -> CommerceResult<Self> {
        let invalid = || CommerceError::InvalidMoney(format!("{} {}", amount, currency_code));

        let currency = Currency::from_code(currency_code).ok_or_else(invalid)?;
        let places = currency.decimal_places() as usize;

        let trimmed = amount.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) {
            return Err(invalid());
        }

        let scale = 10_i64.pow(places as u32);
        let whole: i64 = whole.parse().map_err(|_| invalid())?;

        let mut kept: String = fraction.chars().take(places).collect();
        while kept.len() < places {
            kept.push('0');
        }
        let mut minor = if kept.is_empty() {
            0
        } else {
            kept.parse::<i64>().map_err(|_| invalid())?
        };
        if fraction.as_bytes().get(places).is_some_and(|b| *b >= b'5') {
            minor += 1;
        }

        let total = whole
            .checked_mul(scale)
            .and_then(|w| w.checked_add(minor))
            .ok_or_else(invalid)?;

        Ok(Self::new(if negative { -total } else { total }, currency))
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// `self / other`, or `None` across currencies or against zero.
    pub fn ratio_to(&self, other: &Money) -> Option<f64> {
        if self.currency != other.currency || other.amount_minor == 0 {
            return None;
        }
        Some(self.amount_minor as f64 / other.amount_minor as f64)
    }

    /// Plain decimal amount, e.g. `"49.90"`.
    pub fn decimal_string(&self) -> String {
        let places = self.currency.decimal_places();
        let scale = 10_i64.pow(places);
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        if places == 0 {
            return format!("{}{}", sign, abs);
        }
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / scale as u64,
            abs % scale as u64,
            width = places as usize
        )
    }

    /// Formatted with symbol and thousands separators, e.g. `"$1,299.00"`.
    pub fn format(&self) -> String {
        self.format_with(false)
    }

    /// Like [`Money::format`] but whole amounts drop their decimals (`"$50"`).
    pub fn format_without_trailing_zeros(&self) -> String {
        self.format_with(true)
    }

    fn format_with(&self, drop_zero_fraction: bool) -> String {
        let places = self.currency.decimal_places();
        let scale = 10_u64.pow(places);
        let abs = self.amount_minor.unsigned_abs();
        let (whole, fraction) = (abs / scale, abs % scale);

        let mut out = String::new();
        if self.amount_minor < 0 {
            out.push('-');
        }
        out.push_str(self.currency.symbol());
        out.push_str(&group_thousands(whole));
        if places > 0 && !(drop_zero_fraction && fraction == 0) {
            out.push_str(&format!(".{:0width$}", fraction, width = places as usize));
        }
        out
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

fn group_thousands(value: u64) -> String {
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
