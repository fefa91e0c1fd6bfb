use rust_decimal::Decimal;

use crate::util::decimal::{dollar_precision_str, format_money, format_shares};

use super::aggregate::TaxSummary;
use super::fractional::FractionalOutcome;
use super::process::TaxReport;
use super::{BasisSource, Lot, MergerTerms, RowId, Term};

pub struct RenderTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub footer: Vec<String>,
    pub notes: Vec<String>,
    pub errors: Vec<String>,
}

/// Aligned "key: value" lines, as printed in the text report.
#[derive(Default, PartialEq, Eq, Debug)]
pub struct KeyValueBlock {
    pub entries: Vec<(String, String)>,
}

impl KeyValueBlock {
    fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    fn add_money(&mut self, key: impl Into<String>, value: &Decimal) {
        self.add(key, format_money(value));
    }

    /// Blank line between groups of entries.
    fn add_break(&mut self) {
        self.entries.push((String::new(), String::new()));
    }
}

pub struct LotBlock {
    pub row_id: RowId,
    pub block: KeyValueBlock,
}

/// Everything the output writers need, already formatted.
pub struct ReportModel {
    pub parameters: KeyValueBlock,
    pub summary: KeyValueBlock,
    pub totals_table: RenderTable,
    pub fractional: Option<KeyValueBlock>,
    pub lot_blocks: Vec<LotBlock>,
    pub lots_table: RenderTable,
}

fn yes_no(b: bool) -> String {
    let s = if b { "yes" } else { "no" };
    s.to_string()
}

pub fn render_parameters(terms: &MergerTerms) -> KeyValueBlock {
    let orig = terms.original_symbol.to_lowercase();
    let acq = terms.acquirer_symbol.to_lowercase();
    let mut b = KeyValueBlock::default();
    b.add("merger effective date:", terms.effective_date.to_string());
    b.add_money(format!("cash per {orig} share:"), &terms.cash_per_share);
    b.add(format!("{acq} share per {orig} share:"), terms.avgo_per_share.to_string());
    b.add(format!("{orig} share elected for cash:"), terms.election.cash_shares.to_string());
    b.add(format!("{orig} share elected for stock:"), terms.election.stock_shares.to_string());
    b.add("cash fraction:", terms.election.cash_fraction().round_dp(6).normalize().to_string());
    b.add("espp discount:", terms.espp_discount.to_string());
    b.add("special dividend:", match &terms.special_dividend {
        Some(div) => format!("{} per share, for lots acquired before {}",
                             format_money(&div.per_share), div.effective_date),
        None => "none".to_string(),
    });
    b.add("long term holding:", format!("more than {}", terms.long_term_threshold));
    b
}

pub fn render_summary(summary: &TaxSummary, terms: &MergerTerms) -> KeyValueBlock {
    let mut b = KeyValueBlock::default();
    b.add(format!("total {} share:", terms.original_symbol.to_lowercase()),
          format_shares(&Decimal::from(summary.total_vmw_share)));
    b.add(format!("total {} share:", terms.acquirer_symbol.to_lowercase()),
          format_shares(&summary.total_avgo_share));
    b.add_money("total proceeds:", &summary.total_proceeds);
    b.add_break();
    for term in [Term::Short, Term::Long] {
        let t = summary.term_totals(term);
        b.add_money(format!("total {term} proceeds:"), &t.proceeds);
        b.add_money(format!("total {term} cost base:"), &t.cost_base);
        b.add_money(format!("total {term} capital gain:"), &t.capital_gain);
        b.add_break();
    }
    let rec = &summary.reconciliation;
    b.add_money(format!("expected proceeds ({}):", rec.expected.source), &rec.expected.amount);
    b.add_money("proceeds difference:", &rec.difference);
    b
}

pub fn render_totals_table(report: &TaxReport) -> RenderTable {
    let summary = &report.summary;
    let mut rows = Vec::new();
    let mut total_cost = Decimal::ZERO;
    let mut total_gain = Decimal::ZERO;
    for term in [Term::Short, Term::Long] {
        let t = summary.term_totals(term);
        total_cost += t.cost_base;
        total_gain += t.capital_gain;
        rows.push(vec![term.to_string(), format_money(&t.proceeds),
                       format_money(&t.cost_base), format_money(&t.capital_gain)]);
    }

    let mut notes = Vec::new();
    let mut errors = Vec::new();
    match &summary.fractional {
        FractionalOutcome::NoCashOut => (),
        FractionalOutcome::Allocated { lot_row_id, .. } => {
            let frac = report.lots.iter().find_map(|l| l.fractional.as_ref());
            if let Some(f) = frac {
                // Its basis is already in the matched lot's cost base, so
                // only the proceeds count towards the totals.
                rows.push(vec![format!("fractional share ({})", f.term),
                               format_money(&f.proceeds), format_money(&f.cost_base),
                               format_money(&f.capital_gain)]);
                notes.push(format!(
                    "The fractional share's cost base is part of row {lot_row_id}'s. \
                     Only its proceeds are included in the total."));
            }
        }
        FractionalOutcome::Unmatched { warning, .. } => {
            errors.push(format!("{warning}. Its proceeds are not included."));
        }
    }

    if !summary.reconciliation.is_balanced() {
        notes.push(format!(
            "Total proceeds differ from the {} by {}",
            summary.reconciliation.expected.source,
            format_money(&summary.reconciliation.difference)));
    }

    RenderTable {
        header: vec!["Term".to_string(), "Proceeds".to_string(), "Cost Base".to_string(),
                     "Capital Gain".to_string()],
        rows,
        footer: vec!["Total".to_string(), format_money(&summary.total_proceeds),
                     format_money(&total_cost), format_money(&total_gain)],
        notes,
        errors,
    }
}

pub fn render_fractional(report: &TaxReport) -> Option<KeyValueBlock> {
    let acq = report.terms.acquirer_symbol.to_lowercase();
    let mut b = KeyValueBlock::default();
    match &report.summary.fractional {
        FractionalOutcome::NoCashOut => return None,
        FractionalOutcome::Allocated { cash_out, lot_row_id } => {
            let lot = report.lots.iter().find(|l| l.row_id == *lot_row_id)?;
            let f = lot.fractional.as_ref()?;
            b.add("fractional share cost base lot:", lot_row_id.to_string());
            b.add("acquire date:", cash_out.acquire_date.to_string());
            b.add("term:", f.term.to_string());
            b.add(format!("{acq} fractional share:"), f.share.to_string());
            b.add_money(format!("{acq} fractional share proceeds:"), &f.proceeds);
            b.add_money(format!("{acq} fractional share cost base:"), &f.cost_base);
            b.add_money(format!("{acq} fractional share capital gain:"), &f.capital_gain);
        }
        FractionalOutcome::Unmatched { cash_out, .. } => {
            b.add("fractional share cost base lot:", "not found");
            b.add("acquire date:", cash_out.acquire_date.to_string());
            b.add(format!("{acq} fractional share:"), cash_out.share.to_string());
            b.add_money(format!("{acq} fractional share proceeds:"), &cash_out.proceeds);
        }
    }
    Some(b)
}

pub fn render_lot(lot: &Lot, terms: &MergerTerms) -> KeyValueBlock {
    let orig = terms.original_symbol.to_lowercase();
    let acq = terms.acquirer_symbol.to_lowercase();
    let mut b = KeyValueBlock::default();
    b.add("plan type:", lot.plan_type().to_string());
    b.add(format!("{orig} share:"), lot.share.to_string());
    b.add("acquire date:", lot.acquire_date.to_string());
    b.add("sold date:", lot.sold_date.to_string());
    if let Some(offer_date) = lot.plan.offer_date() {
        b.add("offer date:", offer_date.to_string());
    }
    b.add("merged:", yes_no(lot.merged));
    b.add_money("total proceeds:", &lot.total_proceeds);
    b.add("sale term:", lot.pre_merger_term.to_string());

    if let Some(mt) = &lot.merge_tax {
        match &mt.basis_source {
            BasisSource::Espp { offer_price, purchase_date_price, discounted_offer_price } => {
                b.add_money(format!("offer price ({}):", offer_price.date), &offer_price.close);
                b.add_money("discounted offer price:", discounted_offer_price);
                b.add_money(format!("purchase date price ({}):", purchase_date_price.date),
                            &purchase_date_price.close);
            }
            BasisSource::Rs { vest_price } => {
                b.add_money(format!("vest price ({}):", vest_price.date), &vest_price.close);
            }
            BasisSource::Purchase { purchase_price } => {
                b.add_money("purchase price:", purchase_price);
            }
        }
        b.add_money("plan cost base per share:", &mt.plan_cost_base_per_share);
        b.add_money("special dividend adjustment:", &mt.special_dividend_adjustment);
        b.add_money("cost base per share:", &mt.cost_base_per_share);
        b.add(format!("{orig} share for cash:"), format_shares(&mt.cash_share));
        b.add(format!("{orig} share for stock:"), format_shares(&mt.stock_share));
        b.add_money("cash received:", &mt.cash_received);
        b.add(format!("{acq} share:"), format_shares(&mt.avgo_share));
        b.add_money(format!("{acq} cost base per share:"), &mt.avgo_cost_base_per_share);
        b.add_money(format!("{acq} total cost base:"), &mt.avgo_total_cost_base);
        b.add_money("total cost base:", &mt.total_cost_base);
        b.add_money("total capital gain:", &mt.total_capital_gain);
        b.add("merger term:", mt.post_merger_term.to_string());
    }

    if let Some(f) = &lot.fractional {
        b.add(format!("{acq} fractional share:"), f.share.to_string());
        b.add_money(format!("{acq} fractional share proceeds:"), &f.proceeds);
        b.add_money(format!("{acq} fractional share cost base:"), &f.cost_base);
        b.add_money(format!("{acq} fractional share capital gain:"), &f.capital_gain);
    }
    b
}

pub const LOTS_CSV_HEADER: [&str; 22] = [
    "row", "plan type", "share", "acquire date", "sold date", "offer date", "merged",
    "total proceeds", "sale term", "merger term", "cost base per share",
    "special dividend adjustment", "total cost base", "total capital gain", "cash share",
    "cash received", "avgo share", "avgo cost base per share", "fractional share",
    "fractional share proceeds", "fractional share cost base",
    "fractional share capital gain",
];

/// One row per lot. Amounts are plain numbers, for spreadsheet import.
pub fn render_lots_table(lots: &[Lot]) -> RenderTable {
    let money = |d: &Decimal| dollar_precision_str(d);
    let opt = |v: Option<String>| v.unwrap_or_default();

    let rows = lots.iter().map(|lot| {
        let mt = lot.merge_tax.as_ref();
        let f = lot.fractional.as_ref();
        vec![
            lot.row_id.to_string(),
            lot.plan_type().to_string(),
            lot.share.to_string(),
            lot.acquire_date.to_string(),
            lot.sold_date.to_string(),
            opt(lot.plan.offer_date().map(|d| d.to_string())),
            yes_no(lot.merged),
            money(&lot.total_proceeds),
            lot.pre_merger_term.to_string(),
            opt(mt.map(|m| m.post_merger_term.to_string())),
            opt(mt.map(|m| money(&m.cost_base_per_share))),
            opt(mt.map(|m| money(&m.special_dividend_adjustment))),
            opt(mt.map(|m| money(&m.total_cost_base))),
            opt(mt.map(|m| money(&m.total_capital_gain))),
            opt(mt.map(|m| format_shares(&m.cash_share))),
            opt(mt.map(|m| money(&m.cash_received))),
            opt(mt.map(|m| format_shares(&m.avgo_share))),
            opt(mt.map(|m| money(&m.avgo_cost_base_per_share))),
            opt(f.map(|f| f.share.to_string())),
            opt(f.map(|f| money(&f.proceeds))),
            opt(f.map(|f| money(&f.cost_base))),
            opt(f.map(|f| money(&f.capital_gain))),
        ]
    }).collect();

    RenderTable {
        header: LOTS_CSV_HEADER.iter().map(|h| h.to_string()).collect(),
        rows,
        footer: Vec::new(),
        notes: Vec::new(),
        errors: Vec::new(),
    }
}

pub fn render_report(report: &TaxReport) -> ReportModel {
    ReportModel {
        parameters: render_parameters(&report.terms),
        summary: render_summary(&report.summary, &report.terms),
        totals_table: render_totals_table(report),
        fractional: render_fractional(report),
        lot_blocks: report.lots.iter()
            .map(|l| LotBlock { row_id: l.row_id, block: render_lot(l, &report.terms) })
            .collect(),
        lots_table: render_lots_table(&report.lots),
    }
}
