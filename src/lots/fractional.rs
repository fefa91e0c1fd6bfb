use rust_decimal::Decimal;
use time::Date;
use tracing::{info, warn};

use crate::lots::csv_common::LedgerCol;
use crate::lots::io::ledger_csv::LedgerRow;
use crate::util::decimal::PosDecimal;
use crate::util::rw::WriteHandle;
use crate::write_errln;

use super::{FractionalShareTax, Lot, LotError, RowId};

/// The cash paid out for the acquirer's fractional share.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct FractionalCashOut {
    pub row_id: RowId,
    pub share: PosDecimal,
    pub acquire_date: Date,
    pub proceeds: Decimal,
}

impl FractionalCashOut {
    pub fn from_row(row: &LedgerRow) -> Result<FractionalCashOut, LotError> {
        let mut missing = Vec::new();
        if row.qty.is_none() {
            missing.push(LedgerCol::display_name(LedgerCol::QTY));
        }
        if row.date_acquired.is_none() {
            missing.push(LedgerCol::display_name(LedgerCol::DATE_ACQUIRED));
        }
        if row.total_proceeds.is_none() {
            missing.push(LedgerCol::display_name(LedgerCol::TOTAL_PROCEEDS));
        }
        let (qty, acquire_date, proceeds) =
            match (row.qty, row.date_acquired, row.total_proceeds) {
                (Some(q), Some(a), Some(p)) => (q, a, p),
                _ => return Err(LotError::MissingLotData { row_id: row.row_id, fields: missing }),
            };
        let share = PosDecimal::try_from(qty).map_err(|_| LotError::InvalidLot {
            row_id: row.row_id,
            reason: format!("fractional share quantity must be positive (was {qty})"),
        })?;
        Ok(FractionalCashOut { row_id: row.row_id, share, acquire_date, proceeds })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
#[error("Failed to find cost base lot for fractional share on row {row_id}, \
         acquire date {acquire_date}")]
pub struct FractionalShareMatchNotFound {
    pub row_id: RowId,
    pub acquire_date: Date,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum FractionalOutcome {
    /// The ledger had no fractional share cash-out.
    NoCashOut,
    Allocated { cash_out: FractionalCashOut, lot_row_id: RowId },
    Unmatched { cash_out: FractionalCashOut, warning: FractionalShareMatchNotFound },
}

impl FractionalOutcome {
    pub fn cash_out(&self) -> Option<&FractionalCashOut> {
        match self {
            FractionalOutcome::NoCashOut => None,
            FractionalOutcome::Allocated { cash_out, .. }
            | FractionalOutcome::Unmatched { cash_out, .. } => Some(cash_out),
        }
    }

    /// Proceeds that count towards the run's totals. An unmatched
    /// cash-out counts for nothing.
    pub fn included_proceeds(&self) -> Decimal {
        match self {
            FractionalOutcome::Allocated { cash_out, .. } => cash_out.proceeds,
            _ => Decimal::ZERO,
        }
    }
}

/// Traces the fractional share back to the first merged lot acquired on
/// the same date, and sets that lot's fractional tax.
pub fn allocate_fractional_share(
    lots: &mut [Lot],
    cash_out: FractionalCashOut,
    err_stream: &mut WriteHandle,
) -> FractionalOutcome {
    let found = lots.iter_mut().find_map(|l| {
        let avgo_base = l.merge_tax.as_ref().map(|mt| mt.avgo_cost_base_per_share)?;
        if l.merged && l.acquire_date == cash_out.acquire_date {
            Some((l, avgo_base))
        } else {
            None
        }
    });
    let (lot, avgo_cost_base_per_share) = match found {
        Some(f) => f,
        None => {
            let warning = FractionalShareMatchNotFound {
                row_id: cash_out.row_id,
                acquire_date: cash_out.acquire_date,
            };
            warn!("allocate_fractional_share: {warning}");
            write_errln!(err_stream, "Warning: {warning}");
            return FractionalOutcome::Unmatched { cash_out, warning };
        }
    };

    let cost_base = avgo_cost_base_per_share * *cash_out.share;
    let term = lot.final_term();
    info!("allocate_fractional_share: using row {} for the fractional share", lot.row_id);
    lot.fractional = Some(FractionalShareTax {
        share: *cash_out.share,
        proceeds: cash_out.proceeds,
        cost_base,
        capital_gain: cash_out.proceeds - cost_base,
        term,
    });
    FractionalOutcome::Allocated { lot_row_id: lot.row_id, cash_out }
}
