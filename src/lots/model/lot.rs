use rust_decimal::Decimal;
use time::Date;

use crate::refdata::DailyPrice;

use super::plan::{PlanLot, PlanType};
use super::term::Term;

/// 1-based line number in the source ledger (the header is row 1).
pub type RowId = u32;

/// How the per-share basis of a lot was arrived at, before any
/// special dividend adjustment.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum BasisSource {
    Espp {
        offer_price: DailyPrice,
        purchase_date_price: DailyPrice,
        discounted_offer_price: Decimal,
    },
    Rs {
        vest_price: DailyPrice,
    },
    Purchase {
        purchase_price: Decimal,
    },
}

/// Results of exchanging a lot in the merger.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MergedLotTax {
    pub basis_source: BasisSource,
    // Per-share basis from the plan rules
    pub plan_cost_base_per_share: Decimal,
    // Amount taken off the per-share basis for the special dividend
    pub special_dividend_adjustment: Decimal,
    pub cost_base_per_share: Decimal,

    // Split of the lot's shares between the cash and stock consideration
    pub cash_share: Decimal,
    pub stock_share: Decimal,
    pub cash_received: Decimal,

    pub avgo_share: Decimal,
    pub avgo_cost_base_per_share: Decimal,
    pub avgo_total_cost_base: Decimal,

    pub total_cost_base: Decimal,
    pub total_capital_gain: Decimal,

    // Holding period measured to the merger's effective date
    pub post_merger_term: Term,
}

/// The acquirer's fractional share cash-out, once traced to a lot.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct FractionalShareTax {
    pub share: Decimal,
    pub proceeds: Decimal,
    pub cost_base: Decimal,
    pub capital_gain: Decimal,
    pub term: Term,
}

/// One sale of the original security.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Lot {
    pub row_id: RowId,
    pub share: u32,
    pub acquire_date: Date,
    pub sold_date: Date,
    pub plan: PlanLot,
    pub merged: bool,
    pub total_proceeds: Decimal,
    // Holding period from acquisition to the recorded sale
    pub pre_merger_term: Term,

    // Only set for merged lots, once calculated
    pub merge_tax: Option<MergedLotTax>,
    // Only set on the lot the fractional share is traced to
    pub fractional: Option<FractionalShareTax>,
}

impl Lot {
    pub fn plan_type(&self) -> PlanType {
        self.plan.plan_type()
    }

    /// The term the lot is summarized under: post-merger for merged
    /// lots, pre-merger otherwise.
    pub fn final_term(&self) -> Term {
        match &self.merge_tax {
            Some(mt) if self.merged => mt.post_merger_term,
            _ => self.pre_merger_term,
        }
    }
}
