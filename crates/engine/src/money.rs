use std::{fmt, str::FromStr};

use crate::EngineError;

/// A flexi-dollar amount in integer cents, used wherever an amount is shown
/// to or typed by a person.
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!(MoneyCents::new(150_000).to_string(), "$1500.00");
/// assert_eq!("$12.5".parse::<MoneyCents>().unwrap().cents(), 1250);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MoneyCents(i64);

impl MoneyCents {
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Balances can go below zero when strict budgeting is off.
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a non-negative amount such as `1500`, `$12.50` or `7,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("\"{}\" is not an amount", s.trim()));

        let raw = s.trim();
        let raw = raw.strip_prefix('$').unwrap_or(raw);
        let (whole, frac) = match raw.split_once(['.', ',']) {
            Some((whole, frac)) => (whole, frac),
            None => (raw, ""),
        };

        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !is_digits(whole) || !is_digits(frac) || frac.len() > 2 {
            return Err(invalid());
        }

        let dollars: i64 = whole.parse().map_err(|_| invalid())?;
        let cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse::<i64>().map_err(|_| invalid())?,
        };

        dollars
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Self)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
    }
}
