use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::str::FromStr;

use rust_decimal::Decimal;
use time::Date;
use tracing::{debug, trace};

use crate::lots::csv_common::LedgerCol;
use crate::lots::{LotError, MergerTerms, RowId};
use crate::util::date::DynDateFormat;
use crate::util::decimal::parse_money;
use crate::util::rw::{DescribedReader, WriteHandle};
use crate::write_errln;

type Error = String;

/// What a ledger row is, once the merger's symbols are known.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum RecordKind {
    /// Sale of the original security. Becomes a lot.
    OriginalSale,
    /// The acquirer's fractional share, paid out in cash.
    FractionalCashOut,
    /// The broker's totals row.
    Summary,
    Ignored,
}

/// One ledger row, with fields typed but not yet validated as a lot.
/// Blank cells are None.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct LedgerRow {
    pub row_id: RowId,
    pub symbol: Option<String>,
    pub record_type: Option<String>,
    pub qty: Option<Decimal>,
    pub date_acquired: Option<Date>,
    pub date_sold: Option<Date>,
    pub plan_type: Option<String>,
    pub grant_date: Option<Date>,
    pub total_proceeds: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
}

fn is_record_type(record_type: &Option<String>, name: &str) -> bool {
    record_type.as_ref().map(|t| t.eq_ignore_ascii_case(name)).unwrap_or(false)
}

fn is_symbol(symbol: &Option<String>, name: &str) -> bool {
    symbol.as_ref().map(|s| s.eq_ignore_ascii_case(name)).unwrap_or(false)
}

impl LedgerRow {
    pub fn kind(&self, terms: &MergerTerms) -> RecordKind {
        if is_record_type(&self.record_type, "summary") {
            RecordKind::Summary
        } else if !is_record_type(&self.record_type, "sell") {
            RecordKind::Ignored
        } else if is_symbol(&self.symbol, &terms.original_symbol) {
            RecordKind::OriginalSale
        } else if is_symbol(&self.symbol, &terms.acquirer_symbol) {
            RecordKind::FractionalCashOut
        } else {
            RecordKind::Ignored
        }
    }
}

#[derive(Default)]
pub struct LedgerCsvParseOptions {
    pub date_format: Option<DynDateFormat>,
}

fn parse_qty(value: &str) -> Result<Decimal, String> {
    Decimal::from_str(&value.replace(",", "")).map_err(|e| e.to_string())
}

/// Builds a row from its non-blank cells, keyed by canonical column.
/// Only sell and summary rows have their values parsed. Anything else is
/// kept with just its symbol and record type.
fn ledger_row_from_csv_values(
    mut values: HashMap<&'static str, String>,
    row_id: RowId,
    parse_options: &LedgerCsvParseOptions,
) -> Result<LedgerRow, LotError> {
    let malformed = |field: &'static str, value: &str, reason: String| {
        LotError::MalformedField {
            row_id,
            field: LedgerCol::display_name(field),
            value: value.to_string(),
            reason,
        }
    };

    let mut take_date = |col: &'static str| -> Result<Option<Date>, LotError> {
        match values.remove(col) {
            Some(s) => crate::util::date::parse_date(&s, &parse_options.date_format)
                .map(Some)
                .map_err(|e| malformed(col, &s, e.to_string())),
            None => Ok(None),
        }
    };
    let date_acquired = take_date(LedgerCol::DATE_ACQUIRED)?;
    let date_sold = take_date(LedgerCol::DATE_SOLD)?;
    let grant_date = take_date(LedgerCol::GRANT_DATE)?;

    let mut take_money = |col: &'static str| -> Result<Option<Decimal>, LotError> {
        match values.remove(col) {
            Some(s) => parse_money(&s)
                .map(Some)
                .map_err(|e| malformed(col, &s, e.to_string())),
            None => Ok(None),
        }
    };
    let total_proceeds = take_money(LedgerCol::TOTAL_PROCEEDS)?;
    let purchase_price = take_money(LedgerCol::PURCHASE_PRICE)?;

    let qty = match values.remove(LedgerCol::QTY) {
        Some(s) => Some(parse_qty(&s).map_err(|e| malformed(LedgerCol::QTY, &s, e))?),
        None => None,
    };

    Ok(LedgerRow {
        row_id,
        symbol: values.remove(LedgerCol::SYMBOL),
        record_type: values.remove(LedgerCol::RECORD_TYPE),
        qty,
        date_acquired,
        date_sold,
        plan_type: values.remove(LedgerCol::PLAN_TYPE),
        grant_date,
        total_proceeds,
        purchase_price,
    })
}

/// Line on which a record starts. The reader positions a record before
/// any empty lines it skipped to reach it.
fn record_start_line(content: &[u8], pos: &csv::Position) -> RowId {
    let skipped_lines = content
        .get(pos.byte() as usize..)
        .unwrap_or_default()
        .iter()
        .take_while(|b| **b == b'\n' || **b == b'\r')
        .filter(|b| **b == b'\n')
        .count();
    (pos.line() as usize + skipped_lines) as RowId
}

/// Reads a brokerage gain and loss export.
///
/// Headers are matched case-insensitively, and unrecognized columns are
/// ignored. Row ids are file line numbers, with the header as row 1.
pub fn parse_ledger_csv(
    desc_reader: &DescribedReader,
    parse_options: &LedgerCsvParseOptions,
    err_stream: &mut WriteHandle,
) -> Result<Vec<LedgerRow>, Error> {
    let csv_desc = desc_reader.desc();
    let mut reader = desc_reader.reader()
        .map_err(|e| format!("Failed to open {csv_desc}: {e}"))?;
    let mut content = Vec::new();
    reader.read_to_end(&mut content)
        .map_err(|e| format!("Failed to read {csv_desc}: {e}"))?;

    let mut csv_r = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_slice());

    let col_names = LedgerCol::get_ledger_cols();
    let mut col_index_to_name: HashMap<usize, &'static str> = HashMap::new();
    let mut found_col_names: HashSet<&'static str> = HashSet::new();

    let headers = csv_r
        .headers()
        .map_err(|e| format!("Error in csv headers of {csv_desc}: {e}"))?;
    for (i, col) in headers.iter().enumerate() {
        let lower_col = col.to_lowercase();
        let san_col = lower_col.trim();
        match col_names.get(san_col) {
            Some(&canonical) => {
                if !found_col_names.insert(canonical) {
                    return Err(format!(
                        "{csv_desc} has more than one \"{}\" column",
                        LedgerCol::display_name(canonical)));
                }
                col_index_to_name.insert(i, canonical);
            }
            None => {
                // Brokerage exports carry many columns we have no use for.
                trace!("parse_ledger_csv: ignoring column \"{san_col}\" in {csv_desc}");
            }
        }
    }

    let missing: Vec<&str> = LedgerCol::required_cols()
        .into_iter()
        .filter(|c| !found_col_names.contains(c))
        .map(LedgerCol::display_name)
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "{csv_desc} is missing required columns: {}", missing.join(", ")));
    }

    let mut rows = Vec::<LedgerRow>::new();
    for record_res in csv_r.records() {
        let record = record_res.map_err(|e| match e.position() {
            Some(pos) => format!("Error reading {csv_desc} at row {}: {e}", pos.line()),
            None => format!("Error reading {csv_desc}: {e}"),
        })?;
        let row_id = match record.position() {
            Some(pos) => record_start_line(&content, pos),
            None => return Err(format!("Error reading {csv_desc}: record has no position")),
        };

        let mut values = HashMap::<&'static str, String>::new();
        for (i, col_val) in record.iter().enumerate() {
            if col_val.trim().is_empty() {
                continue;
            }
            if let Some(&col_name) = col_index_to_name.get(&i) {
                values.insert(col_name, col_val.trim().to_string());
            }
        }
        if values.is_empty() {
            continue;
        }

        let record_type = values.get(LedgerCol::RECORD_TYPE).cloned();
        let row = if is_record_type(&record_type, "sell") {
            ledger_row_from_csv_values(values, row_id, parse_options)
        } else if is_record_type(&record_type, "summary") {
            // Only the proceeds total of the summary row is used.
            values.retain(|k, _| *k == LedgerCol::TOTAL_PROCEEDS
                || *k == LedgerCol::RECORD_TYPE || *k == LedgerCol::SYMBOL);
            ledger_row_from_csv_values(values, row_id, parse_options)
        } else {
            Ok(LedgerRow {
                row_id,
                symbol: values.remove(LedgerCol::SYMBOL),
                record_type,
                ..LedgerRow::default()
            })
        }
        .map_err(|e| format!("Error in {csv_desc}: {e}"))?;

        if row.record_type.is_none() {
            write_errln!(err_stream,
                "Warning: row {row_id} of {csv_desc} has no record type, and was skipped");
        }
        rows.push(row);
    }

    debug!("parse_ledger_csv: read {} rows from {csv_desc}", rows.len());
    Ok(rows)
}

#[cfg(any(test, feature = "testlib"))]
pub mod testlib {
    use crate::util::rw::DescribedReader;

    pub const STD_HEADER: &str = "Symbol,Record Type,Qty.,Date Acquired,Date Sold,\
        Plan Type,Grant Date,Total Proceeds,Purchase Price";

    // Names are abbreviated to keep tests short.
    #[derive(Default, Clone)]
    pub struct TestLedgerRow {
        pub sym: &'static str,  // Symbol
        pub rt: &'static str,   // Record Type
        pub qty: &'static str,  // Qty.
        pub acq: &'static str,  // Date Acquired
        pub sold: &'static str, // Date Sold
        pub pt: &'static str,   // Plan Type
        pub gd: &'static str,   // Grant Date
        pub tp: &'static str,   // Total Proceeds
        pub pp: &'static str,   // Purchase Price
    }

    fn quoted(v: &str) -> String {
        if v.contains(',') || v.contains('"') {
            format!("\"{}\"", v.replace('"', "\"\""))
        } else {
            v.to_string()
        }
    }

    impl TestLedgerRow {
        /// A VMW sale with the fields every lot needs.
        pub fn vmw_sell(qty: &'static str, acq: &'static str, sold: &'static str,
                        tp: &'static str) -> TestLedgerRow {
            TestLedgerRow { sym: "VMW", rt: "Sell", qty, acq, sold, tp, ..Default::default() }
        }

        pub fn avgo_sell(qty: &'static str, acq: &'static str, sold: &'static str,
                         tp: &'static str) -> TestLedgerRow {
            TestLedgerRow { sym: "AVGO", rt: "Sell", qty, acq, sold, tp, ..Default::default() }
        }

        pub fn summary(tp: &'static str) -> TestLedgerRow {
            TestLedgerRow { rt: "Summary", tp, ..Default::default() }
        }

        pub fn make_row_line(&self) -> String {
            [self.sym, self.rt, self.qty, self.acq, self.sold, self.pt, self.gd,
             self.tp, self.pp]
                .iter()
                .map(|v| quoted(v))
                .collect::<Vec<String>>()
                .join(",")
        }
    }

    /// Builds in-memory ledgers with the standard header.
    pub struct LedgerCsvBuilder {
        rows: Vec<String>,
    }

    impl LedgerCsvBuilder {
        pub fn new() -> LedgerCsvBuilder {
            LedgerCsvBuilder { rows: Vec::new() }
        }

        pub fn row(mut self, r: TestLedgerRow) -> Self {
            self.rows.push(r.make_row_line());
            self
        }

        pub fn rows(mut self, rs: Vec<TestLedgerRow>) -> Self {
            self.rows.extend(rs.iter().map(|r| r.make_row_line()));
            self
        }

        pub fn raw_row(mut self, line: &str) -> Self {
            self.rows.push(line.to_string());
            self
        }

        pub fn contents(&self) -> String {
            let mut s = STD_HEADER.to_string() + "\n";
            for r in &self.rows {
                s += r;
                s += "\n";
            }
            s
        }

        pub fn reader(&self) -> DescribedReader {
            DescribedReader::from_string("ledger.csv".to_string(), self.contents())
        }
    }
}
