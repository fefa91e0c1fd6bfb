use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Capital gains holding period classification.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Term {
    Short,
    Long,
}

impl Term {
    pub fn from_long(long: bool) -> Term {
        if long { Term::Long } else { Term::Short }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Term::Short => "short term",
            Term::Long => "long term",
        })
    }
}

/// Minimum holding period for long term treatment. A holding must
/// exceed it to be long term.
///
/// Serialized as eg. {"months": 12} or {"days": 365}.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldingThreshold {
    // Calendar months. "More than one year" is Months(12).
    Months(u32),
    Days(u32),
}

impl Default for HoldingThreshold {
    fn default() -> Self {
        HoldingThreshold::Months(12)
    }
}

impl Display for HoldingThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoldingThreshold::Months(n) => write!(f, "{n} months"),
            HoldingThreshold::Days(n) => write!(f, "{n} days"),
        }
    }
}
