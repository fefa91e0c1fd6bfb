use std::io::Read;

use time::Date;
use tracing::{debug, info};

use crate::{
    util::{date::parse_standard_date, decimal::parse_money, rw::DescribedReader},
};

use super::{DailyPrice, Error, OfferPeriod, OfferPeriodTable, PriceTable, ReferenceTables};

fn parse_field_date(field: Option<&str>, what: &str) -> Result<Date, String> {
    let s = field.ok_or_else(|| format!("missing {what}"))?;
    parse_standard_date(s).map_err(|e| format!("invalid {what} \"{s}\": {e}"))
}

/// Reads two-column records, skipping a leading header row if the first
/// field of the first record is not a date. Each record is passed to
/// handle_record with its 1-based row number.
fn read_two_col_csv(
    r: &mut dyn Read,
    desc: &str,
    mut handle_record: impl FnMut(usize, &csv::StringRecord) -> Result<(), String>,
) -> Result<(), Error> {
    let mut csv_r = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(r);

    for (i, record_res) in csv_r.records().enumerate() {
        let row_num = i + 1;
        let record = record_res
            .map_err(|e| format!("Error reading {desc} at row {row_num}: {e}"))?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        if i == 0 && record.get(0).map(|f| parse_standard_date(f).is_err()).unwrap_or(false) {
            debug!("read_two_col_csv: treating first row of {desc} as a header");
            continue;
        }
        handle_record(row_num, &record)
            .map_err(|e| format!("Error in {desc} at row {row_num}: {e}"))?;
    }
    Ok(())
}

/// Historical closing prices, as `date,close` rows. Closes may be
/// formatted like "$142.50".
pub fn load_price_table(desc_reader: &DescribedReader) -> Result<PriceTable, Error> {
    let desc = desc_reader.desc();
    let mut reader = desc_reader.reader()
        .map_err(|e| format!("Failed to open {desc}: {e}"))?;

    let mut table = PriceTable::new();
    read_two_col_csv(reader.as_mut(), desc, |_, record| {
        let date = parse_field_date(record.get(0), "date")?;
        let close_str = record.get(1).ok_or_else(|| format!("{date} has no price"))?;
        let close = parse_money(close_str).map_err(|e| e.to_string())?;
        if close.is_sign_negative() && !close.is_zero() {
            return Err(format!("{date} has negative price {close}"));
        }
        table.insert(DailyPrice { date, close })
    })?;

    info!("Loaded {} prices from {desc}", table.len());
    Ok(table)
}

/// ESPP offer periods, as `start,end` rows (inclusive).
pub fn load_offer_period_table(
    desc_reader: &DescribedReader,
) -> Result<OfferPeriodTable, Error> {
    let desc = desc_reader.desc();
    let mut reader = desc_reader.reader()
        .map_err(|e| format!("Failed to open {desc}: {e}"))?;

    let mut periods = Vec::<OfferPeriod>::new();
    read_two_col_csv(reader.as_mut(), desc, |_, record| {
        let start = parse_field_date(record.get(0), "offer period start")?;
        let end = parse_field_date(record.get(1), "offer period end")?;
        periods.push(OfferPeriod::new(start, end)?);
        Ok(())
    })?;

    info!("Loaded {} ESPP offer periods from {desc}", periods.len());
    Ok(OfferPeriodTable::new(periods))
}

pub fn load_reference_tables(
    prices: &DescribedReader,
    offer_periods: &DescribedReader,
) -> Result<ReferenceTables, Error> {
    Ok(ReferenceTables {
        prices: load_price_table(prices)?,
        offer_periods: load_offer_period_table(offer_periods)?,
    })
}
