use std::{collections::BTreeMap, fmt::Display};

use rust_decimal::Decimal;
use time::{Date, Duration};
use tracing::{debug, warn};

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct DailyPrice {
    pub date: Date,
    pub close: Decimal,
}

impl Display for DailyPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.date, self.close)
    }
}

/// An ESPP offer period. Both ends are inclusive.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct OfferPeriod {
    pub start: Date,
    pub end: Date,
}

impl OfferPeriod {
    pub fn new(start: Date, end: Date) -> Result<OfferPeriod, super::Error> {
        if end < start {
            return Err(format!(
                "Offer period ends ({end}) before it starts ({start})"));
        }
        Ok(OfferPeriod { start, end })
    }

    pub fn contains(&self, d: Date) -> bool {
        self.start <= d && d <= self.end
    }
}

impl Display for OfferPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// How far back to look for a close when a date was not a trading day.
pub const MAX_PRICE_LOOKBACK_DAYS: i64 = 7;

/// Read-only queries the lot calculations need from reference data.
pub trait ReferenceData {
    /// Closing price on exactly this date, if there was one.
    fn price_on(&self, date: Date) -> Option<Decimal>;

    /// Start of the single ESPP offer period containing date.
    fn espp_offer_start(&self, date: Date) -> Option<Date>;

    /// Closing price on date, or on the latest trading day before it
    /// (within MAX_PRICE_LOOKBACK_DAYS).
    fn closing_price(&self, date: Date) -> Option<DailyPrice> {
        for days_back in 0..=MAX_PRICE_LOOKBACK_DAYS {
            let d = date.checked_sub(Duration::days(days_back))?;
            if let Some(close) = self.price_on(d) {
                if days_back > 0 {
                    debug!("closing_price: no close on {date}, using {d}");
                }
                return Some(DailyPrice { date: d, close });
            }
        }
        None
    }
}

#[derive(Default, Clone, Debug)]
pub struct PriceTable {
    prices: BTreeMap<Date, Decimal>,
}

impl PriceTable {
    pub fn new() -> PriceTable {
        PriceTable { prices: BTreeMap::new() }
    }

    /// Inserts a price. A second, different price for the same date is an error.
    pub fn insert(&mut self, p: DailyPrice) -> Result<(), super::Error> {
        match self.prices.get(&p.date) {
            Some(existing) if *existing != p.close => Err(format!(
                "Conflicting prices for {}: {} and {}", p.date, existing, p.close)),
            _ => {
                self.prices.insert(p.date, p.close);
                Ok(())
            }
        }
    }

    pub fn get(&self, date: Date) -> Option<Decimal> {
        self.prices.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<DailyPrice> for PriceTable {
    // Last one wins, for convenience in tests.
    fn from_iter<T: IntoIterator<Item = DailyPrice>>(iter: T) -> Self {
        PriceTable {
            prices: iter.into_iter().map(|p| (p.date, p.close)).collect(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct OfferPeriodTable {
    // Sorted by start date
    periods: Vec<OfferPeriod>,
}

impl OfferPeriodTable {
    pub fn new(mut periods: Vec<OfferPeriod>) -> OfferPeriodTable {
        periods.sort_by_key(|p| (p.start, p.end));
        OfferPeriodTable { periods }
    }

    pub fn periods(&self) -> &[OfferPeriod] {
        &self.periods
    }

    /// A date is ESPP eligible only if exactly one period contains it.
    pub fn offer_start(&self, date: Date) -> Option<Date> {
        let mut matching = self.periods.iter().filter(|p| p.contains(date));
        let first = matching.next()?;
        if let Some(second) = matching.next() {
            warn!("{date} is in more than one ESPP offer period ({first}, {second}). \
                   Not treating it as ESPP");
            return None;
        }
        Some(first.start)
    }
}

/// Both tables, as loaded for a run.
#[derive(Default, Clone, Debug)]
pub struct ReferenceTables {
    pub prices: PriceTable,
    pub offer_periods: OfferPeriodTable,
}

impl ReferenceData for ReferenceTables {
    fn price_on(&self, date: Date) -> Option<Decimal> {
        self.prices.get(date)
    }

    fn espp_offer_start(&self, date: Date) -> Option<Date> {
        self.offer_periods.offer_start(date)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::util::date::pub_testlib::ymd;

    use super::{
        DailyPrice, OfferPeriod, OfferPeriodTable, PriceTable, ReferenceData,
        ReferenceTables,
    };

    fn dp(y: i32, m: u8, d: u8, close: rust_decimal::Decimal) -> DailyPrice {
        DailyPrice { date: ymd(y, m, d), close }
    }

    #[test]
    fn test_price_string() {
        assert_eq!(dp(2024, 1, 23, dec!(1.1)).to_string(), "2024-01-23 : 1.1");
    }

    #[test]
    fn test_offer_period() {
        let p = OfferPeriod::new(ymd(2018, 1, 1), ymd(2018, 6, 30)).unwrap();
        assert!(p.contains(ymd(2018, 1, 1)));
        assert!(p.contains(ymd(2018, 6, 30)));
        assert!(!p.contains(ymd(2018, 7, 1)));
        assert!(!p.contains(ymd(2017, 12, 31)));
        assert_eq!(p.to_string(), "[2018-01-01, 2018-06-30]");

        let _ = OfferPeriod::new(ymd(2018, 6, 30), ymd(2018, 1, 1)).unwrap_err();
    }

    #[test]
    fn test_offer_start_lookup() {
        let table = OfferPeriodTable::new(vec![
            OfferPeriod::new(ymd(2018, 7, 1), ymd(2018, 12, 31)).unwrap(),
            OfferPeriod::new(ymd(2018, 1, 1), ymd(2018, 6, 30)).unwrap(),
            // Overlaps the one above
            OfferPeriod::new(ymd(2019, 1, 1), ymd(2019, 6, 30)).unwrap(),
            OfferPeriod::new(ymd(2019, 6, 1), ymd(2019, 12, 31)).unwrap(),
        ]);
        assert_eq!(table.periods()[0].start, ymd(2018, 1, 1));

        assert_eq!(table.offer_start(ymd(2018, 3, 15)), Some(ymd(2018, 1, 1)));
        assert_eq!(table.offer_start(ymd(2018, 6, 30)), Some(ymd(2018, 1, 1)));
        assert_eq!(table.offer_start(ymd(2018, 7, 1)), Some(ymd(2018, 7, 1)));
        assert_eq!(table.offer_start(ymd(2017, 7, 1)), None);
        assert_eq!(table.offer_start(ymd(2019, 6, 15)), None);
        assert_eq!(table.offer_start(ymd(2019, 5, 31)), Some(ymd(2019, 1, 1)));
    }

    #[test]
    fn test_price_table() {
        let mut t = PriceTable::new();
        assert!(t.is_empty());
        t.insert(dp(2023, 11, 21, dec!(142.45))).unwrap();
        t.insert(dp(2023, 11, 21, dec!(142.45))).unwrap();
        let _ = t.insert(dp(2023, 11, 21, dec!(100))).unwrap_err();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(ymd(2023, 11, 21)), Some(dec!(142.45)));
        assert_eq!(t.get(ymd(2023, 11, 22)), None);
    }

    #[test]
    fn test_closing_price_lookback() {
        let tables = ReferenceTables {
            prices: PriceTable::from_iter(vec![
                dp(2021, 1, 29, dec!(137.52)), // Friday
                dp(2021, 2, 1, dec!(139.10)),
            ]),
            ..Default::default()
        };
        assert_eq!(tables.price_on(ymd(2021, 1, 30)), None);
        // Weekend resolves to the Friday close
        assert_eq!(tables.closing_price(ymd(2021, 1, 31)),
                   Some(dp(2021, 1, 29, dec!(137.52))));
        assert_eq!(tables.closing_price(ymd(2021, 2, 1)),
                   Some(dp(2021, 2, 1, dec!(139.10))));
        assert_eq!(tables.closing_price(ymd(2021, 2, 5)),
                   Some(dp(2021, 2, 1, dec!(139.10))));
        assert_eq!(tables.closing_price(ymd(2021, 2, 9)), None);
        assert_eq!(tables.closing_price(ymd(2021, 1, 28)), None);
    }
}
