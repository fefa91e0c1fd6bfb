use rust_decimal::Decimal;
use tracing::{info, trace, warn};

use crate::lots::io::ledger_csv::{LedgerRow, RecordKind};
use crate::refdata::ReferenceData;
use crate::util::decimal::format_money;
use crate::util::rw::WriteHandle;
use crate::write_errln;

use super::aggregate::{summarize, ExpectedProceeds, ProceedsSource, TaxSummary};
use super::classify::classify_lot;
use super::cost_basis::calc_lot_tax;
use super::fractional::{allocate_fractional_share, FractionalCashOut, FractionalOutcome};
use super::{Lot, LotError, MergerTerms};

/// Everything computed for one ledger.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TaxReport {
    pub terms: MergerTerms,
    /// In ledger order
    pub lots: Vec<Lot>,
    pub summary: TaxSummary,
}

/// Computes every lot in the ledger, allocates the fractional share and
/// sums the results.
///
/// Any bad lot fails the whole calculation. Recoverable problems (an
/// unmatched fractional share, proceeds which don't reconcile) are
/// written to err_stream.
pub fn calc_tax(
    rows: &[LedgerRow],
    refdata: &dyn ReferenceData,
    terms: &MergerTerms,
    err_stream: &mut WriteHandle,
) -> Result<TaxReport, LotError> {
    let mut lots = Vec::<Lot>::new();
    let mut cash_out: Option<FractionalCashOut> = None;
    let mut summary_proceeds: Option<Decimal> = None;
    let mut sale_rows_proceeds = Decimal::ZERO;

    for row in rows {
        match row.kind(terms) {
            RecordKind::OriginalSale => {
                let mut lot = classify_lot(row, refdata, terms)?;
                if lot.merged {
                    calc_lot_tax(&mut lot, refdata, terms, err_stream)?;
                }
                sale_rows_proceeds += lot.total_proceeds;
                lots.push(lot);
            }
            RecordKind::FractionalCashOut => {
                let c = FractionalCashOut::from_row(row)?;
                sale_rows_proceeds += c.proceeds;
                if let Some(prev) = &cash_out {
                    warn!("calc_tax: more than one {} sale (rows {} and {})",
                          terms.acquirer_symbol, prev.row_id, c.row_id);
                    write_errln!(err_stream,
                        "Warning: more than one {} fractional share sale. Using row {} \
                         and ignoring row {}", terms.acquirer_symbol, c.row_id, prev.row_id);
                }
                cash_out = Some(c);
            }
            RecordKind::Summary => {
                if row.total_proceeds.is_some() {
                    summary_proceeds = row.total_proceeds;
                }
            }
            RecordKind::Ignored => {
                trace!("calc_tax: skipping row {}", row.row_id);
            }
        }
    }

    let fractional = match cash_out {
        Some(c) => allocate_fractional_share(&mut lots, c, err_stream),
        None => FractionalOutcome::NoCashOut,
    };

    let expected = match summary_proceeds {
        Some(amount) => ExpectedProceeds { amount, source: ProceedsSource::LedgerSummary },
        None => ExpectedProceeds {
            amount: sale_rows_proceeds, source: ProceedsSource::SaleRows },
    };

    let summary = summarize(&lots, fractional, expected)?;
    if !summary.reconciliation.is_balanced() {
        write_errln!(err_stream,
            "Warning: total proceeds {} do not match the {} total of {} (difference {})",
            format_money(&summary.total_proceeds), expected.source,
            format_money(&expected.amount),
            format_money(&summary.reconciliation.difference));
    }

    info!("calc_tax: {} lots, {} merged", lots.len(),
          lots.iter().filter(|l| l.merged).count());
    Ok(TaxReport { terms: terms.clone(), lots, summary })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::lots::io::ledger_csv::testlib::{LedgerCsvBuilder, TestLedgerRow};
    use crate::lots::io::ledger_csv::{parse_ledger_csv, LedgerCsvParseOptions, LedgerRow};
    use crate::lots::fractional::FractionalOutcome;
    use crate::lots::{LotError, MergerTerms, PlanLot, Term};
    use crate::testlib::{assert_re, sample_reference_tables};
    use crate::util::rw::WriteHandle;

    use super::calc_tax;

    fn rows(b: LedgerCsvBuilder) -> Vec<LedgerRow> {
        parse_ledger_csv(&b.reader(), &LedgerCsvParseOptions::default(),
                         &mut WriteHandle::empty_write_handle()).unwrap()
    }

    #[test]
    fn test_calc_tax() {
        let rows = rows(LedgerCsvBuilder::new()
            .row(TestLedgerRow::summary("$1,990.00"))
            // RS, pre dividend
            .row(TestLedgerRow::vmw_sell("10", "10/29/2021", "11/22/2023", "$1,425.00"))
            // Sold before the merger
            .row(TestLedgerRow::vmw_sell("2", "03/01/2023", "06/01/2023", "$165.00"))
            .row(TestLedgerRow::avgo_sell("0.4", "10/29/2021", "11/24/2023", "$400.00")));

        let (mut err, buff) = WriteHandle::string_buff_write_handle();
        let report = calc_tax(&rows, &sample_reference_tables(), &MergerTerms::default(),
                              &mut err).unwrap();
        assert_eq!(buff.borrow().as_str(), "");

        assert_eq!(report.lots.len(), 2);
        let merged = &report.lots[0];
        assert_eq!(merged.row_id, 3);
        let mt = merged.merge_tax.as_ref().unwrap();
        assert_eq!(mt.cost_base_per_share, dec!(126.38));
        assert_eq!(mt.avgo_cost_base_per_share, dec!(126.38) / dec!(0.252));

        let unmerged = &report.lots[1];
        assert!(!unmerged.merged);
        assert_eq!(unmerged.merge_tax, None);
        assert_eq!(unmerged.final_term(), Term::Short);

        let s = &report.summary;
        assert_eq!(s.total_vmw_share, 10);
        assert_eq!(s.total_avgo_share, dec!(1.26));
        assert_eq!(s.long_term.proceeds, dec!(1425));
        assert_eq!(s.long_term.cost_base, dec!(1263.80));
        assert_eq!(s.short_term.proceeds, dec!(165));
        assert_eq!(s.short_term.cost_base, dec!(0));
        assert!(matches!(s.fractional, FractionalOutcome::Allocated { lot_row_id: 3, .. }));
        assert_eq!(s.total_proceeds, dec!(1990));
        assert!(s.reconciliation.is_balanced());

        let f = merged.fractional.as_ref().unwrap();
        assert_eq!(f.cost_base, mt.avgo_cost_base_per_share * dec!(0.4));
        assert_eq!(f.capital_gain, dec!(400) - f.cost_base);
        assert_eq!(f.term, Term::Long);
    }

    #[test]
    fn test_unmatched_fractional() {
        let rows = rows(LedgerCsvBuilder::new()
            .row(TestLedgerRow::vmw_sell("10", "10/29/2021", "11/22/2023", "$1,425.00"))
            .row(TestLedgerRow::avgo_sell("0.4", "01/04/2022", "11/24/2023", "$400.00")));

        let (mut err, buff) = WriteHandle::string_buff_write_handle();
        let report = calc_tax(&rows, &sample_reference_tables(), &MergerTerms::default(),
                              &mut err).unwrap();
        assert!(matches!(report.summary.fractional, FractionalOutcome::Unmatched { .. }));
        assert_eq!(report.summary.total_proceeds, dec!(1425));
        // Expected comes from the sale rows, which include the fractional sale
        assert_eq!(report.summary.reconciliation.difference, dec!(400));
        let errs = buff.borrow().as_str().to_string();
        assert_re("Failed to find cost base lot for fractional share on row 3, \
                   acquire date 2022-01-04", &errs);
        assert_re(r"do not match the sum of sale rows total of \$1,825.00 \(difference \$400.00\)",
                  &errs);
    }

    #[test]
    fn test_multiple_fractional_rows() {
        let rows = rows(LedgerCsvBuilder::new()
            .row(TestLedgerRow::vmw_sell("10", "10/29/2021", "11/22/2023", "$1,425.00"))
            .row(TestLedgerRow::avgo_sell("0.1", "01/04/2022", "11/24/2023", "$100.00"))
            .row(TestLedgerRow::avgo_sell("0.4", "10/29/2021", "11/24/2023", "$400.00"))
            .row(TestLedgerRow::summary("$1,825.00")));

        let (mut err, buff) = WriteHandle::string_buff_write_handle();
        let report = calc_tax(&rows, &sample_reference_tables(), &MergerTerms::default(),
                              &mut err).unwrap();
        assert_re("more than one AVGO fractional share sale. Using row 4 and ignoring row 3",
                  buff.borrow().as_str());
        assert!(matches!(report.summary.fractional, FractionalOutcome::Allocated { .. }));
        // The ignored row is not part of the computed total
        assert_eq!(report.summary.reconciliation.difference, dec!(0));
    }

    #[test]
    fn test_missing_purchase_price() {
        let rows = rows(LedgerCsvBuilder::new()
            .row(TestLedgerRow::vmw_sell("10", "10/29/2021", "11/22/2023", "$1,425.00"))
            .row(TestLedgerRow {
                pt: "Purchase",
                ..TestLedgerRow::vmw_sell("5", "10/29/2021", "11/22/2023", "$712.50")
            }));
        let err = calc_tax(&rows, &sample_reference_tables(), &MergerTerms::default(),
                           &mut WriteHandle::empty_write_handle()).unwrap_err();
        assert_eq!(err, LotError::MissingPurchasePrice { row_id: 3 });
    }

    #[test]
    fn test_unmerged_espp_without_grant_date() {
        let unmerged = rows(LedgerCsvBuilder::new()
            .row(TestLedgerRow::vmw_sell("10", "10/29/2021", "11/22/2023", "$1,425.00"))
            .row(TestLedgerRow {
                pt: "ESPP",
                ..TestLedgerRow::vmw_sell("2", "03/01/2023", "06/01/2023", "$165.00")
            }));
        let report = calc_tax(&unmerged, &sample_reference_tables(), &MergerTerms::default(),
                              &mut WriteHandle::empty_write_handle()).unwrap();
        let lot = &report.lots[1];
        assert_eq!(lot.plan, PlanLot::Espp { offer_date: None });
        assert_eq!(lot.merge_tax, None);
        assert_eq!(report.summary.short_term.proceeds, dec!(165));

        // Once merged, the basis needs the offer date
        let merged = rows(LedgerCsvBuilder::new()
            .row(TestLedgerRow {
                pt: "ESPP",
                ..TestLedgerRow::vmw_sell("2", "03/01/2023", "11/22/2023", "$285.00")
            }));
        let err = calc_tax(&merged, &sample_reference_tables(), &MergerTerms::default(),
                           &mut WriteHandle::empty_write_handle()).unwrap_err();
        assert_eq!(err, LotError::MissingLotData { row_id: 2, fields: vec!["Grant Date"] });
    }

    #[test]
    fn test_espp_inferred_from_offer_period() {
        let rows = rows(LedgerCsvBuilder::new()
            .row(TestLedgerRow::vmw_sell("10", "06/29/2018", "11/22/2023", "$1,425.00")));
        let report = calc_tax(&rows, &sample_reference_tables(), &MergerTerms::default(),
                              &mut WriteHandle::empty_write_handle()).unwrap();
        let lot = &report.lots[0];
        assert_eq!(lot.plan.offer_date(), Some(crate::util::date::pub_testlib::ymd(2018, 1, 1)));
        let mt = lot.merge_tax.as_ref().unwrap();
        assert_eq!(mt.total_capital_gain, lot.total_proceeds - mt.total_cost_base);
    }

    #[test]
    fn test_idempotent() {
        let b = LedgerCsvBuilder::new()
            .row(TestLedgerRow::vmw_sell("10", "10/29/2021", "11/22/2023", "$1,425.00"))
            .row(TestLedgerRow::vmw_sell("7", "06/29/2018", "11/22/2023", "$997.50"))
            .row(TestLedgerRow::avgo_sell("0.4", "10/29/2021", "11/24/2023", "$400.00"));
        let rows = rows(b);
        let rd = sample_reference_tables();
        let terms = MergerTerms::default();
        let a = calc_tax(&rows, &rd, &terms, &mut WriteHandle::empty_write_handle()).unwrap();
        let b = calc_tax(&rows, &rd, &terms, &mut WriteHandle::empty_write_handle()).unwrap();
        assert_eq!(a, b);
    }
}
