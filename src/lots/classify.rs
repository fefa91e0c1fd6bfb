use rust_decimal::prelude::ToPrimitive;
use time::Date;
use tracing::{debug, trace};

use crate::lots::csv_common::LedgerCol;
use crate::lots::io::ledger_csv::LedgerRow;
use crate::refdata::ReferenceData;

use super::holding::pre_merger_term;
use super::{Lot, LotError, MergerTerms, PlanLot, PlanType};

fn require<T: Clone>(
    v: &Option<T>, col: &'static str, missing: &mut Vec<&'static str>,
) -> Option<T> {
    if v.is_none() {
        missing.push(LedgerCol::display_name(col));
    }
    v.clone()
}

/// Determines the plan a lot was acquired under.
///
/// A blank plan type is inferred: ESPP if the acquisition date falls in
/// exactly one offer period, otherwise RS. An explicit type is trusted.
/// An ESPP lot's offer date is left unknown if neither the grant date nor
/// the offer periods give one; only a cost basis needs it.
pub fn classify_plan(
    row: &LedgerRow,
    acquire_date: Date,
    refdata: &dyn ReferenceData,
) -> PlanLot {
    let label = match &row.plan_type {
        None => {
            return match refdata.espp_offer_start(acquire_date) {
                Some(offer_date) => {
                    trace!("classify_plan: row {} acquired {acquire_date} in offer period \
                            starting {offer_date}", row.row_id);
                    PlanLot::Espp { offer_date: Some(offer_date) }
                }
                None => PlanLot::Rs,
            };
        }
        Some(l) => l,
    };

    match PlanType::from_label(label) {
        PlanType::Espp => {
            let offer_date = row.grant_date.or_else(|| refdata.espp_offer_start(acquire_date));
            if offer_date.is_none() {
                debug!("classify_plan: row {} ESPP lot has no known offer date", row.row_id);
            }
            PlanLot::Espp { offer_date }
        }
        PlanType::Rs => PlanLot::Rs,
        PlanType::Purchase => PlanLot::Purchase {
            label: label.clone(),
            purchase_price: row.purchase_price,
        },
    }
}

/// Validates a sale row of the original security and turns it into a lot,
/// with its plan, merge status and pre-merger term set.
pub fn classify_lot(
    row: &LedgerRow,
    refdata: &dyn ReferenceData,
    terms: &MergerTerms,
) -> Result<Lot, LotError> {
    let mut missing = Vec::new();
    let qty = require(&row.qty, LedgerCol::QTY, &mut missing);
    let acquire_date = require(&row.date_acquired, LedgerCol::DATE_ACQUIRED, &mut missing);
    let sold_date = require(&row.date_sold, LedgerCol::DATE_SOLD, &mut missing);
    let total_proceeds = require(&row.total_proceeds, LedgerCol::TOTAL_PROCEEDS, &mut missing);

    let (qty, acquire_date, sold_date, total_proceeds) =
        match (qty, acquire_date, sold_date, total_proceeds) {
            (Some(q), Some(a), Some(s), Some(p)) => (q, a, s, p),
            _ => return Err(LotError::MissingLotData { row_id: row.row_id, fields: missing }),
        };

    let invalid = |reason: String| LotError::InvalidLot { row_id: row.row_id, reason };

    let share = match qty.to_u32() {
        Some(n) if n > 0 && qty.fract().is_zero() => n,
        _ => return Err(invalid(format!(
            "share count must be a positive whole number (was {qty})"))),
    };
    if sold_date < acquire_date {
        return Err(invalid(format!(
            "sold on {sold_date}, before it was acquired on {acquire_date}")));
    }

    let plan = classify_plan(row, acquire_date, refdata);
    let merged = sold_date >= terms.effective_date;
    debug!("classify_lot: row {} is {} {} shares, merged: {merged}",
           row.row_id, share, plan.plan_type());

    Ok(Lot {
        row_id: row.row_id,
        share,
        acquire_date,
        sold_date,
        plan,
        merged,
        total_proceeds,
        pre_merger_term: pre_merger_term(acquire_date, sold_date, terms),
        merge_tax: None,
        fractional: None,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::lots::io::ledger_csv::LedgerRow;
    use crate::lots::{LotError, MergerTerms, PlanLot, Term};
    use crate::refdata::{OfferPeriod, OfferPeriodTable, ReferenceTables};
    use crate::util::date::pub_testlib::ymd;

    use super::{classify_lot, classify_plan};

    fn refdata() -> ReferenceTables {
        ReferenceTables {
            offer_periods: OfferPeriodTable::new(vec![
                OfferPeriod::new(ymd(2018, 1, 1), ymd(2018, 6, 30)).unwrap(),
            ]),
            ..Default::default()
        }
    }

    fn sell_row(row_id: u32, qty: rust_decimal::Decimal, acq: time::Date,
                sold: time::Date) -> LedgerRow {
        LedgerRow {
            row_id,
            symbol: Some("VMW".to_string()),
            record_type: Some("Sell".to_string()),
            qty: Some(qty),
            date_acquired: Some(acq),
            date_sold: Some(sold),
            total_proceeds: Some(dec!(1000)),
            ..Default::default()
        }
    }

    #[test]
    fn test_infer_plan() {
        let rd = refdata();
        let row = sell_row(3, dec!(10), ymd(2018, 3, 15), ymd(2023, 11, 22));
        assert_eq!(classify_plan(&row, ymd(2018, 3, 15), &rd),
                   PlanLot::Espp { offer_date: Some(ymd(2018, 1, 1)) });
        assert_eq!(classify_plan(&row, ymd(2018, 6, 30), &rd),
                   PlanLot::Espp { offer_date: Some(ymd(2018, 1, 1)) });
        assert_eq!(classify_plan(&row, ymd(2018, 7, 1), &rd), PlanLot::Rs);
    }

    #[test]
    fn test_explicit_plan() {
        let rd = refdata();
        let mut row = sell_row(3, dec!(10), ymd(2019, 3, 15), ymd(2023, 11, 22));

        // The grant date is trusted over the lookup
        row.plan_type = Some("ESPP".to_string());
        row.grant_date = Some(ymd(2019, 1, 1));
        assert_eq!(classify_plan(&row, ymd(2019, 3, 15), &rd),
                   PlanLot::Espp { offer_date: Some(ymd(2019, 1, 1)) });

        // No grant date, and no offer period to fall back on
        row.grant_date = None;
        assert_eq!(classify_plan(&row, ymd(2019, 3, 15), &rd),
                   PlanLot::Espp { offer_date: None });
        assert_eq!(classify_plan(&row, ymd(2018, 3, 15), &rd),
                   PlanLot::Espp { offer_date: Some(ymd(2018, 1, 1)) });

        // An explicit RS inside an offer period stays RS
        row.plan_type = Some("RS".to_string());
        assert_eq!(classify_plan(&row, ymd(2018, 3, 15), &rd), PlanLot::Rs);

        row.plan_type = Some("Transfer".to_string());
        row.purchase_price = Some(dec!(31.5));
        assert_eq!(classify_plan(&row, ymd(2018, 3, 15), &rd),
                   PlanLot::Purchase { label: "Transfer".to_string(),
                                       purchase_price: Some(dec!(31.5)) });
    }

    #[test]
    fn test_classify_lot() {
        let rd = refdata();
        let terms = MergerTerms::default();

        let lot = classify_lot(
            &sell_row(3, dec!(10), ymd(2018, 3, 15), ymd(2023, 11, 22)), &rd, &terms)
            .unwrap();
        assert_eq!(lot.share, 10);
        assert!(lot.merged);
        assert_eq!(lot.pre_merger_term, Term::Long);
        assert_eq!(lot.merge_tax, None);

        // Sold the day before the merger took effect
        let lot = classify_lot(
            &sell_row(4, dec!(2), ymd(2023, 1, 15), ymd(2023, 11, 21)), &rd, &terms)
            .unwrap();
        assert!(!lot.merged);
        assert_eq!(lot.pre_merger_term, Term::Short);
        assert_eq!(lot.plan, PlanLot::Rs);
    }

    #[test]
    fn test_classify_lot_errors() {
        let rd = refdata();
        let terms = MergerTerms::default();

        let mut row = sell_row(5, dec!(10), ymd(2018, 3, 15), ymd(2023, 11, 22));
        row.qty = None;
        row.date_acquired = None;
        assert_eq!(classify_lot(&row, &rd, &terms).unwrap_err(),
                   LotError::MissingLotData { row_id: 5, fields: vec!["Qty.", "Date Acquired"] });

        let row = sell_row(6, dec!(0), ymd(2018, 3, 15), ymd(2023, 11, 22));
        assert!(matches!(classify_lot(&row, &rd, &terms).unwrap_err(),
                         LotError::InvalidLot { row_id: 6, .. }));

        let row = sell_row(7, dec!(1.5), ymd(2018, 3, 15), ymd(2023, 11, 22));
        assert!(matches!(classify_lot(&row, &rd, &terms).unwrap_err(),
                         LotError::InvalidLot { row_id: 7, .. }));

        let row = sell_row(8, dec!(3), ymd(2023, 11, 23), ymd(2023, 11, 22));
        let err = classify_lot(&row, &rd, &terms).unwrap_err();
        assert_eq!(err.to_string(),
                   "row 8: sold on 2023-11-22, before it was acquired on 2023-11-23");
    }
}
