use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use time::{macros::date, Date};

use super::term::HoldingThreshold;

type Error = String;

// Dates in the terms file are plain YYYY-MM-DD strings.
mod std_date {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(d: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&d.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let s = String::deserialize(d)?;
        crate::util::date::parse_standard_date(&s)
            .map_err(|e| D::Error::custom(format!("invalid date \"{s}\": {e}")))
    }
}

/// How the holder's shares were split between the cash and stock
/// consideration, as share counts. Only the ratio matters.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ElectionSplit {
    pub cash_shares: u32,
    pub stock_shares: u32,
}

impl ElectionSplit {
    pub fn total(&self) -> u64 {
        self.cash_shares as u64 + self.stock_shares as u64
    }

    /// Portion of each original share exchanged for cash.
    pub fn cash_fraction(&self) -> Decimal {
        Decimal::from(self.cash_shares) / Decimal::from(self.total())
    }
}

impl Default for ElectionSplit {
    fn default() -> Self {
        ElectionSplit { cash_shares: 1, stock_shares: 1 }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpecialDividend {
    pub per_share: Decimal,
    // Lots acquired before this date received the dividend.
    #[serde(with = "std_date")]
    pub effective_date: Date,
}

/// Fixed parameters of the merger and of the tax rules applied to it.
/// Built once per run, and passed by reference to every calculation.
#[derive(PartialEq, Eq, Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergerTerms {
    pub original_symbol: String,
    pub acquirer_symbol: String,
    /// Date the exchange took effect. Sales on or after it are merged lots.
    #[serde(with = "std_date")]
    pub effective_date: Date,
    pub cash_per_share: Decimal,
    /// Acquirer shares per original share, for the stock portion.
    pub avgo_per_share: Decimal,
    pub election: ElectionSplit,
    pub espp_discount: Decimal,
    pub special_dividend: Option<SpecialDividend>,
    pub long_term_threshold: HoldingThreshold,
}

impl Default for MergerTerms {
    fn default() -> Self {
        MergerTerms {
            original_symbol: "VMW".to_string(),
            acquirer_symbol: "AVGO".to_string(),
            effective_date: date!(2023-11-22),
            cash_per_share: dec!(142.50),
            avgo_per_share: dec!(0.252),
            election: ElectionSplit::default(),
            espp_discount: dec!(0.15),
            special_dividend: Some(SpecialDividend {
                per_share: dec!(26.81),
                effective_date: date!(2021-11-01),
            }),
            long_term_threshold: HoldingThreshold::default(),
        }
    }
}

impl MergerTerms {
    pub fn with_election(&self, election: ElectionSplit) -> MergerTerms {
        MergerTerms { election, ..self.clone() }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.election.total() == 0 {
            return Err("Cash and stock election share counts are both zero".to_string());
        }
        if self.avgo_per_share <= Decimal::ZERO {
            return Err(format!(
                "{} shares per {} share must be positive (was {})",
                self.acquirer_symbol, self.original_symbol, self.avgo_per_share));
        }
        if self.cash_per_share < Decimal::ZERO {
            return Err(format!("Cash per share was negative ({})", self.cash_per_share));
        }
        if self.espp_discount < Decimal::ZERO || self.espp_discount >= Decimal::ONE {
            return Err(format!(
                "ESPP discount must be in [0, 1) (was {})", self.espp_discount));
        }
        if let Some(div) = &self.special_dividend {
            if div.per_share < Decimal::ZERO {
                return Err(format!(
                    "Special dividend per share was negative ({})", div.per_share));
            }
        }
        if self.original_symbol.trim().is_empty() || self.acquirer_symbol.trim().is_empty() {
            return Err("Security symbols may not be empty".to_string());
        }
        Ok(())
    }
}
