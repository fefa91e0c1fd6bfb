pub use time::Date;
use time::{macros::format_description, Month, UtcOffset};

pub type StaticDateFormat<'a> =
    &'static [time::format_description::BorrowedFormatItem<'a>];
pub type DynDateFormat = time::format_description::OwnedFormatItem;

pub const STANDARD_DATE_FORMAT: StaticDateFormat =
    format_description!("[year]-[month]-[day]");

// The format brokerage gain & loss exports use, eg. 11/22/2023
pub const LEDGER_DATE_FORMAT: StaticDateFormat =
    format_description!("[month]/[day]/[year]");

pub fn parse_standard_date(date_str: &str) -> Result<Date, time::error::Parse> {
    Date::parse(date_str.trim(), STANDARD_DATE_FORMAT)
}

pub fn parse_ledger_date(date_str: &str) -> Result<Date, time::error::Parse> {
    Date::parse(date_str.trim(), LEDGER_DATE_FORMAT)
}

pub fn parse_dyn_date_format(fmt: &str) -> Result<DynDateFormat, String> {
    // The documentation recommends version 2
    const VERSION: usize = 2;
    time::format_description::parse_owned::<VERSION>(fmt)
        .map_err(|e| format!("{}", e))
}

/// Parses with the custom format if one was given, otherwise with
/// the ledger's month/day/year format.
pub fn parse_date(
    date_str: &str,
    fmt: &Option<DynDateFormat>,
) -> Result<Date, time::error::Parse> {
    match fmt {
        Some(fmt_) => Date::parse(date_str.trim(), &fmt_),
        None => parse_ledger_date(date_str),
    }
}

fn days_in_month(year: i32, month: Month) -> u8 {
    time::util::days_in_year_month(year, month)
}

/// Calendar month addition. The day is clamped to the end of the
/// target month, so Feb 29 + 12 months is Feb 28.
pub fn add_months(d: Date, months: u32) -> Date {
    let month_index = d.month() as i32 - 1 + months as i32;
    let year = d.year() + month_index / 12;
    let month = Month::January.nth_next((month_index % 12) as u8);
    let day = d.day().min(days_in_month(year, month));
    // Day is clamped into range. Only a year past Date::MAX can fail.
    Date::from_calendar_date(year, month, day).unwrap_or(Date::MAX)
}

// Using UtcOffset::current_local_offset is unsafe on Linux, and returns an
// error unless an "unsafe" feature is enabled. chrono's Local::now does
// not block itself this way, so it is used instead.
pub fn local_utc_offset() -> Result<UtcOffset, time::error::ComponentRange> {
    let now = chrono::offset::Local::now();
    let offset = now.offset();
    UtcOffset::from_whole_seconds(-1 * offset.utc_minus_local())
}

// Used by both unit and integration tests
pub mod pub_testlib {
    use time::{Date, Month};

    pub fn ymd(year: i32, month: u8, day: u8) -> Date {
        Date::from_calendar_date(year, Month::try_from(month).unwrap(), day)
            .unwrap()
    }
}
