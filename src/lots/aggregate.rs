use std::fmt::Display;

use rust_decimal::Decimal;
use tracing::warn;

use super::fractional::FractionalOutcome;
use super::{Lot, LotError, Term};

#[derive(Default, PartialEq, Eq, Clone, Debug)]
pub struct TermTotals {
    pub proceeds: Decimal,
    pub cost_base: Decimal,
    pub capital_gain: Decimal,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ProceedsSource {
    /// The broker's summary row.
    LedgerSummary,
    /// Sum of every sale row, when there is no summary row.
    SaleRows,
}

impl Display for ProceedsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            ProceedsSource::LedgerSummary => "ledger summary",
            ProceedsSource::SaleRows => "sum of sale rows",
        })
    }
}

/// Total proceeds the ledger itself reports, to check the computed
/// total against.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ExpectedProceeds {
    pub amount: Decimal,
    pub source: ProceedsSource,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Reconciliation {
    pub expected: ExpectedProceeds,
    /// expected - computed
    pub difference: Decimal,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.difference.is_zero()
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TaxSummary {
    // Merged lots only
    pub total_vmw_share: u64,
    pub total_avgo_share: Decimal,
    pub short_term: TermTotals,
    pub long_term: TermTotals,
    pub fractional: FractionalOutcome,
    pub total_proceeds: Decimal,
    pub reconciliation: Reconciliation,
}

impl TaxSummary {
    pub fn term_totals(&self, term: Term) -> &TermTotals {
        match term {
            Term::Short => &self.short_term,
            Term::Long => &self.long_term,
        }
    }
}

/// Sums lots into short and long term totals.
///
/// Merged lots add their proceeds, basis and gain under their post-merger
/// term. Lots sold before the merger only add proceeds, under the term
/// of the sale.
pub fn summarize(
    lots: &[Lot],
    fractional: FractionalOutcome,
    expected: ExpectedProceeds,
) -> Result<TaxSummary, LotError> {
    let mut total_vmw_share: u64 = 0;
    let mut total_avgo_share = Decimal::ZERO;
    let mut short_term = TermTotals::default();
    let mut long_term = TermTotals::default();

    for lot in lots {
        let totals = match lot.final_term() {
            Term::Short => &mut short_term,
            Term::Long => &mut long_term,
        };
        totals.proceeds += lot.total_proceeds;

        if !lot.merged {
            continue;
        }
        let mt = lot.merge_tax.as_ref().ok_or_else(|| LotError::InvalidLot {
            row_id: lot.row_id,
            reason: "merged lot was not calculated".to_string(),
        })?;
        totals.cost_base += mt.total_cost_base;
        totals.capital_gain += mt.total_capital_gain;
        total_vmw_share += lot.share as u64;
        total_avgo_share += mt.avgo_share;
    }

    let total_proceeds =
        long_term.proceeds + short_term.proceeds + fractional.included_proceeds();
    let reconciliation = Reconciliation {
        expected,
        difference: expected.amount - total_proceeds,
    };
    if !reconciliation.is_balanced() {
        warn!("summarize: total proceeds {total_proceeds} differ from the {} total {} by {}",
              expected.source, expected.amount, reconciliation.difference);
    }

    Ok(TaxSummary {
        total_vmw_share,
        total_avgo_share,
        short_term,
        long_term,
        fractional,
        total_proceeds,
        reconciliation,
    })
}
