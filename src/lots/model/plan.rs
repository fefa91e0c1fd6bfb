use std::fmt::Display;

use rust_decimal::Decimal;
use time::Date;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum PlanType {
    Espp,
    Rs,
    Purchase,
}

impl PlanType {
    fn pretty_str(&self) -> &str {
        match self {
            PlanType::Espp => "ESPP",
            PlanType::Rs => "RS",
            PlanType::Purchase => "PURCHASE",
        }
    }

    /// Maps an explicit "Plan Type" value from the ledger.
    /// Anything that isn't ESPP or restricted stock is a direct purchase.
    pub fn from_label(label: &str) -> PlanType {
        match label.trim().to_uppercase().as_str() {
            "ESPP" => PlanType::Espp,
            "RS" | "RSU" => PlanType::Rs,
            _ => PlanType::Purchase,
        }
    }
}

impl Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pretty_str())
    }
}

/// Plan specific data for a lot.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum PlanLot {
    Espp {
        // Start of the offer period, which sets the lookback price.
        // Unknown when the ledger has no grant date and no offer period
        // covers the acquisition.
        offer_date: Option<Date>,
    },
    Rs,
    Purchase {
        // The ledger's label, eg. "Purchase" or "Transfer"
        label: String,
        purchase_price: Option<Decimal>,
    },
}

impl PlanLot {
    pub fn plan_type(&self) -> PlanType {
        match self {
            PlanLot::Espp { .. } => PlanType::Espp,
            PlanLot::Rs => PlanType::Rs,
            PlanLot::Purchase { .. } => PlanType::Purchase,
        }
    }

    pub fn offer_date(&self) -> Option<Date> {
        match self {
            PlanLot::Espp { offer_date } => *offer_date,
            _ => None,
        }
    }
}
