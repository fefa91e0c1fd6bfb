use rust_decimal::Decimal;
use time::Date;
use tracing::{debug, warn};

use crate::refdata::{DailyPrice, ReferenceData};
use crate::util::decimal::{is_negative, GreaterEqualZeroDecimal};
use crate::util::rw::WriteHandle;
use crate::write_errln;

use super::csv_common::LedgerCol;
use super::holding::post_merger_term;
use super::{BasisSource, Lot, LotError, MergedLotTax, MergerTerms, PlanLot, RowId};

fn price_for(
    refdata: &dyn ReferenceData,
    date: Date,
    row_id: RowId,
    purpose: &'static str,
) -> Result<DailyPrice, LotError> {
    refdata
        .closing_price(date)
        .ok_or(LotError::MissingPrice { row_id, date, purpose })
}

/// The lower of the discounted offer date price and the purchase date
/// price. Either can win, including on a tie.
pub fn espp_cost_base_per_share(
    offer_price: Decimal,
    purchase_date_price: Decimal,
    discount: Decimal,
) -> Decimal {
    let discounted = offer_price * (Decimal::ONE - discount);
    discounted.min(purchase_date_price)
}

/// Per-share basis under the rules of the lot's plan.
pub fn plan_cost_base(
    lot: &Lot,
    refdata: &dyn ReferenceData,
    terms: &MergerTerms,
) -> Result<(Decimal, BasisSource), LotError> {
    match &lot.plan {
        PlanLot::Espp { offer_date } => {
            let offer_date = offer_date.ok_or_else(|| LotError::MissingLotData {
                row_id: lot.row_id,
                fields: vec![LedgerCol::display_name(LedgerCol::GRANT_DATE)],
            })?;
            let offer_price = price_for(refdata, offer_date, lot.row_id, "ESPP offer price")?;
            let purchase_date_price =
                price_for(refdata, lot.acquire_date, lot.row_id, "ESPP purchase price")?;
            let discounted_offer_price = offer_price.close * (Decimal::ONE - terms.espp_discount);
            let base = espp_cost_base_per_share(
                offer_price.close, purchase_date_price.close, terms.espp_discount);
            Ok((base, BasisSource::Espp {
                offer_price, purchase_date_price, discounted_offer_price }))
        }
        PlanLot::Rs => {
            let vest_price = price_for(refdata, lot.acquire_date, lot.row_id, "RS vest price")?;
            Ok((vest_price.close, BasisSource::Rs { vest_price }))
        }
        PlanLot::Purchase { purchase_price, .. } => {
            let purchase_price = purchase_price
                .ok_or(LotError::MissingPurchasePrice { row_id: lot.row_id })?;
            if is_negative(&purchase_price) {
                return Err(LotError::InvalidLot {
                    row_id: lot.row_id,
                    reason: format!("purchase price is negative ({purchase_price})"),
                });
            }
            Ok((purchase_price, BasisSource::Purchase { purchase_price }))
        }
    }
}

/// Reduces the per-share basis by the special dividend, for lots acquired
/// before it was paid. Returns the new basis and the amount taken off.
///
/// The basis can't go below zero. When it would, it is set to zero and a
/// warning is written.
pub fn adjust_special_dividend(
    lot: &Lot,
    cost_base_per_share: GreaterEqualZeroDecimal,
    terms: &MergerTerms,
    err_stream: &mut WriteHandle,
) -> (GreaterEqualZeroDecimal, Decimal) {
    let div = match &terms.special_dividend {
        Some(div) if lot.acquire_date < div.effective_date => div,
        _ => return (cost_base_per_share, Decimal::ZERO),
    };

    let adjusted = cost_base_per_share.saturating_sub(div.per_share);
    if div.per_share > *cost_base_per_share {
        warn!("adjust_special_dividend: row {} basis {} is less than the special \
               dividend {}", lot.row_id, cost_base_per_share, div.per_share);
        write_errln!(err_stream,
            "Warning: row {}: cost base per share {} is less than the special dividend \
             of {}. Using a cost base of 0", lot.row_id, cost_base_per_share, div.per_share);
    }
    (adjusted, *cost_base_per_share - *adjusted)
}

/// How one lot's shares were divided in the exchange.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MergeSplit {
    pub cash_share: Decimal,
    pub stock_share: Decimal,
    pub cash_received: Decimal,
    pub avgo_share: Decimal,
    pub avgo_cost_base_per_share: Decimal,
    pub avgo_total_cost_base: Decimal,
}

/// Splits a lot between the cash and stock consideration, per the election.
/// The basis of the stock portion carries over to the acquirer shares.
pub fn calc_merge_tax_and_avgo_cost_base(
    share: u32,
    cost_base_per_share: Decimal,
    terms: &MergerTerms,
) -> MergeSplit {
    let share = Decimal::from(share);
    let cash_share = share * terms.election.cash_fraction();
    let stock_share = share - cash_share;
    MergeSplit {
        cash_received: cash_share * terms.cash_per_share,
        avgo_share: stock_share * terms.avgo_per_share,
        avgo_cost_base_per_share: cost_base_per_share / terms.avgo_per_share,
        avgo_total_cost_base: stock_share * cost_base_per_share,
        cash_share,
        stock_share,
    }
}

/// Total basis and gain of the lot as a whole, as (cost base, gain).
pub fn calc_total(share: u32, cost_base_per_share: Decimal, total_proceeds: Decimal)
    -> (Decimal, Decimal) {
    let total_cost_base = cost_base_per_share * Decimal::from(share);
    (total_cost_base, total_proceeds - total_cost_base)
}

/// Runs the full calculation for a merged lot, and sets its merge_tax.
pub fn calc_lot_tax(
    lot: &mut Lot,
    refdata: &dyn ReferenceData,
    terms: &MergerTerms,
    err_stream: &mut WriteHandle,
) -> Result<(), LotError> {
    let (plan_cost_base_per_share, basis_source) = plan_cost_base(lot, refdata, terms)?;
    let plan_base = GreaterEqualZeroDecimal::try_from(plan_cost_base_per_share)
        .map_err(|reason| LotError::InvalidLot { row_id: lot.row_id, reason })?;
    let (cost_base_per_share, special_dividend_adjustment) =
        adjust_special_dividend(lot, plan_base, terms, err_stream);
    let cost_base_per_share = *cost_base_per_share;

    let split = calc_merge_tax_and_avgo_cost_base(lot.share, cost_base_per_share, terms);
    let (total_cost_base, total_capital_gain) =
        calc_total(lot.share, cost_base_per_share, lot.total_proceeds);

    debug!("calc_lot_tax: row {} basis {} (plan {}, dividend -{}), gain {}",
           lot.row_id, cost_base_per_share, plan_cost_base_per_share,
           special_dividend_adjustment, total_capital_gain);

    lot.merge_tax = Some(MergedLotTax {
        basis_source,
        plan_cost_base_per_share,
        special_dividend_adjustment,
        cost_base_per_share,
        cash_share: split.cash_share,
        stock_share: split.stock_share,
        cash_received: split.cash_received,
        avgo_share: split.avgo_share,
        avgo_cost_base_per_share: split.avgo_cost_base_per_share,
        avgo_total_cost_base: split.avgo_total_cost_base,
        total_cost_base,
        total_capital_gain,
        post_merger_term: post_merger_term(lot.acquire_date, terms),
    });
    Ok(())
}
