use std::{fmt::Display, marker::PhantomData, ops::Deref, str::FromStr};

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use self::constraint::{GreaterEqualZero, Pos};

// These were deprecated as methods on Decimal, so re-implement them.
// Those implementations don't actually do zero checks.
pub fn is_positive(d: &Decimal) -> bool {
    d.is_sign_positive() && !d.is_zero()
}

pub fn is_negative(d: &Decimal) -> bool {
    d.is_sign_negative() && !d.is_zero()
}

pub trait DecConstraint {
    fn is_ok(d: &Decimal) -> bool;
}

pub mod constraint {
    use rust_decimal::Decimal;

    use super::{is_positive, DecConstraint};

    #[derive(PartialEq, Eq, Clone, Copy, Debug)]
    pub struct GreaterEqualZero(());
    impl DecConstraint for GreaterEqualZero {
        fn is_ok(d: &Decimal) -> bool {
            d.is_sign_positive() || d.is_zero()
        }
    }

    #[derive(PartialEq, Eq, Clone, Copy, Debug)]
    pub struct Pos(());
    impl DecConstraint for Pos {
        fn is_ok(d: &Decimal) -> bool {
            is_positive(d)
        }
    }
}

// A constrained instance of Decimal. This can only be created through ::try_from,
// which enforces the DecConstraint.
//
// PhantomData is size zero, and only there so the generic parameter counts as used.
pub struct ConstrainedDecimal<CONSTRAINT>(Decimal, PhantomData<CONSTRAINT>);

impl<CONSTRAINT: DecConstraint> TryFrom<Decimal> for ConstrainedDecimal<CONSTRAINT> {
    type Error = String;

    fn try_from(d: Decimal) -> Result<Self, Self::Error> {
        if CONSTRAINT::is_ok(&d) {
            Ok(Self(d, PhantomData))
        } else {
            Err(format!(
                "{} does not match constraints of {}",
                d,
                std::any::type_name::<CONSTRAINT>()
            ))
        }
    }
}

impl<CONSTRAINT: DecConstraint> Deref for ConstrainedDecimal<CONSTRAINT> {
    type Target = Decimal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<CONSTRAINT: DecConstraint> Display for ConstrainedDecimal<CONSTRAINT> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<CONSTRAINT: DecConstraint> std::fmt::Debug for ConstrainedDecimal<CONSTRAINT> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.0, f)
    }
}

impl<CONSTRAINT: DecConstraint> PartialEq for ConstrainedDecimal<CONSTRAINT> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<CONSTRAINT: DecConstraint> Eq for ConstrainedDecimal<CONSTRAINT> {}

impl<CONSTRAINT: DecConstraint> Clone for ConstrainedDecimal<CONSTRAINT> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<CONSTRAINT: DecConstraint> Copy for ConstrainedDecimal<CONSTRAINT> {}

impl ConstrainedDecimal<GreaterEqualZero> {
    pub fn zero() -> Self {
        Self(Decimal::ZERO, PhantomData)
    }

    /// Subtraction which stops at zero rather than going negative.
    pub fn saturating_sub(self, rhs: Decimal) -> Self {
        if rhs >= self.0 {
            Self::zero()
        } else {
            Self(self.0 - rhs, PhantomData)
        }
    }
}

pub type GreaterEqualZeroDecimal = ConstrainedDecimal<GreaterEqualZero>;
pub type PosDecimal = ConstrainedDecimal<Pos>;

#[macro_export]
macro_rules! pdec {
    ($arg:literal) => {{
        use rust_decimal_macros::dec;
        $crate::util::decimal::PosDecimal::try_from(dec!($arg)).unwrap()
    }};
}

#[macro_export]
macro_rules! gezdec {
    ($arg:literal) => {{
        use rust_decimal_macros::dec;
        $crate::util::decimal::GreaterEqualZeroDecimal::try_from(dec!($arg)).unwrap()
    }};
}

// MARK: money

#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum MoneyParseError {
    #[error("empty money value")]
    Empty,
    #[error("malformed money value '{0}'")]
    Malformed(String),
}

lazy_static! {
    // Optional sign (before or after the currency symbol), optional $,
    // then either plain digits or properly grouped thousands.
    static ref MONEY_RE: Regex = Regex::new(
        r"^(?P<sign1>-)?\$?\s*(?P<sign2>-)?(?P<int>\d{1,3}(?:,\d{3})+|\d+)(?:\.(?P<frac>\d+))?$"
    ).unwrap();
}

/// Parses a brokerage formatted currency string, like "$1,234.56",
/// "-$3.00", "($3.00)" or "12".
pub fn parse_money(s: &str) -> Result<Decimal, MoneyParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(MoneyParseError::Empty);
    }
    let malformed = || MoneyParseError::Malformed(s.to_string());

    // Accounting-style negatives
    let (paren_neg, body) =
        match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            Some(inner) => (true, inner.trim()),
            None => (false, trimmed),
        };

    let caps = MONEY_RE.captures(body).ok_or_else(malformed)?;
    let sign_count = [caps.name("sign1"), caps.name("sign2")]
        .iter()
        .filter(|m| m.is_some())
        .count();
    if sign_count > 1 || (paren_neg && sign_count > 0) {
        return Err(malformed());
    }

    let int_part = caps["int"].replace(",", "");
    let num_str = match caps.name("frac") {
        Some(frac) => format!("{}.{}", int_part, frac.as_str()),
        None => int_part,
    };
    let value = Decimal::from_str(&num_str).map_err(|_| malformed())?;

    Ok(if paren_neg || sign_count == 1 { -value } else { value })
}

pub fn round_to_cents(d: &Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(int_digits: &str) -> String {
    let digits: Vec<char> = int_digits.chars().collect();
    let first_len = match digits.len() % 3 {
        0 => 3,
        n => n,
    };
    let (head, tail) = digits.split_at(first_len.min(digits.len()));
    std::iter::once(head.iter().collect::<String>())
        .chain(tail.chunks(3).map(|c| c.iter().collect::<String>()))
        .filter(|s| !s.is_empty())
        .join(",")
}

/// Renders as "$1,234.56", or "-$1,234.56" for negatives.
pub fn format_money(d: &Decimal) -> String {
    let rounded = round_to_cents(d);
    let neg = is_negative(&rounded);
    let abs_str = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = abs_str.split_once('.').unwrap_or((&abs_str, "00"));
    format!(
        "{}${}.{}",
        if neg { "-" } else { "" },
        group_thousands(int_part),
        frac_part
    )
}

/// Fixed three place rendering used for share counts.
pub fn format_shares(d: &Decimal) -> String {
    format!(
        "{:.3}",
        d.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
    )
}

pub fn dollar_precision_str(d: &Decimal) -> String {
    format!("{:.2}", round_to_cents(d))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{
        constraint, dollar_precision_str, format_money, format_shares, parse_money,
        ConstrainedDecimal, DecConstraint, GreaterEqualZeroDecimal, MoneyParseError,
    };

    #[test]
    #[should_panic]
    #[allow(unused)]
    fn test_decimal_div_sanity() {
        // Decimal refuses NaN, and panics instead.
        dec!(1) / dec!(0);
    }

    #[test]
    fn test_constrained_decimal() {
        _test_constrained_decimal::<constraint::GreaterEqualZero>(
            vec![dec!(1), dec!(0), dec!(-0)],
            vec![dec!(-1)],
        );

        _test_constrained_decimal::<constraint::Pos>(
            vec![dec!(1), dec!(0.001)],
            vec![dec!(-0), dec!(0), dec!(-1)],
        );
    }

    fn _test_constrained_decimal<C: DecConstraint>(
        dec_vals: Vec<Decimal>,
        invalid_dec_vals: Vec<Decimal>,
    ) {
        for inv in invalid_dec_vals {
            let _ = ConstrainedDecimal::<C>::try_from(inv).unwrap_err();
        }

        for dec_val in dec_vals {
            let valid_val = ConstrainedDecimal::<C>::try_from(dec_val).unwrap();
            assert_eq!(*valid_val, dec_val);
            assert_eq!(format!("{}", valid_val), format!("{}", dec_val));
        }
    }

    #[test]
    fn test_saturating_sub() {
        assert_eq!(*gezdec!(30).saturating_sub(dec!(26.81)), dec!(3.19));
        assert_eq!(*gezdec!(20).saturating_sub(dec!(26.81)), dec!(0));
        assert_eq!(GreaterEqualZeroDecimal::zero().saturating_sub(dec!(0)),
                   gezdec!(0));
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("$1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_money(" $ 12.5 ").unwrap(), dec!(12.5));
        assert_eq!(parse_money("12").unwrap(), dec!(12));
        assert_eq!(parse_money("$1,234,567").unwrap(), dec!(1234567));
        assert_eq!(parse_money("-$3.00").unwrap(), dec!(-3));
        assert_eq!(parse_money("$-3.00").unwrap(), dec!(-3));
        assert_eq!(parse_money("($3.10)").unwrap(), dec!(-3.1));
        assert_eq!(parse_money("$0.00").unwrap(), dec!(0));

        assert_eq!(parse_money("  "), Err(MoneyParseError::Empty));
        for bad in ["$1,23.00", "$12,3456", "abc", "$1.2.3", "--$1", "-$-1",
                    "(-$1)", "1,000,00", "$", "1.", "$1 234"] {
            assert_eq!(parse_money(bad),
                       Err(MoneyParseError::Malformed(bad.to_string())),
                       "{bad}");
        }
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(&dec!(0)), "$0.00");
        assert_eq!(format_money(&dec!(1.005)), "$1.01");
        assert_eq!(format_money(&dec!(999.999)), "$1,000.00");
        assert_eq!(format_money(&dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_money(&dec!(-1234.5)), "-$1,234.50");
        assert_eq!(format_money(&dec!(-0.001)), "$0.00");
        assert_eq!(format_money(&dec!(123)), "$123.00");
    }

    #[test]
    fn test_format_shares() {
        assert_eq!(format_shares(&dec!(25.2)), "25.200");
        assert_eq!(format_shares(&dec!(0.4445)), "0.445");
        assert_eq!(format_shares(&dec!(100)), "100.000");
    }

    #[test]
    fn test_dollar_precision_str() {
        assert_eq!(dollar_precision_str(&dec!(1000)), "1000.00");
        assert_eq!(dollar_precision_str(&dec!(1.123456)), "1.12");
    }
}
