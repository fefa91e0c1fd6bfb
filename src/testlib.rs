use std::fmt::Debug;

use regex::Regex;
use rust_decimal_macros::dec;

use crate::refdata::{DailyPrice, OfferPeriod, OfferPeriodTable, PriceTable, ReferenceTables};
use crate::util::date::pub_testlib::ymd;

pub fn assert_re(pattern: &str, haystack: &str) {
    let re = Regex::new(pattern).unwrap();
    assert!(re.is_match(haystack), "{:?} did not match {:?}", haystack, re);
}

pub fn assert_vec_eq<T: PartialEq + Debug>(left: Vec<T>, right: Vec<T>) {
    assert_vecr_eq(&left, &right);
}

/// Like assert_eq, but reports each mismatched element on its own.
pub fn assert_vecr_eq<T: PartialEq + Debug>(left: &[T], right: &[T]) {
    if left == right {
        return;
    }
    eprintln!("left: {:#?}\n!= right: {:#?}", left, right);
    if left.len() != right.len() {
        panic!("size of left ({}) != size of right ({})", left.len(), right.len());
    }
    for (i, (l, r)) in left.iter().zip(right).enumerate() {
        if l != r {
            eprintln!("Mismatch at index {i}:\nleft: {:#?} != right: {:#?}", l, r);
        }
    }
    panic!("left != right");
}

/// Small set of reference data covering the dates used across tests:
/// - One ESPP offer period, 2018-01-01 to 2018-06-30. The offer date
///   was a holiday, so its price comes from 2017-12-29.
/// - Purchase date close on 2018-06-29.
/// - An RS vest close on 2021-10-29, before the special dividend.
pub fn sample_reference_tables() -> ReferenceTables {
    let mut prices = PriceTable::new();
    for (date, close) in [
        (ymd(2017, 12, 29), dec!(125.40)),
        (ymd(2018, 6, 29), dec!(146.97)),
        (ymd(2021, 10, 29), dec!(153.19)),
        (ymd(2023, 11, 21), dec!(142.50)),
    ] {
        prices.insert(DailyPrice { date, close }).unwrap();
    }
    ReferenceTables {
        prices,
        offer_periods: OfferPeriodTable::new(vec![
            OfferPeriod::new(ymd(2018, 1, 1), ymd(2018, 6, 30)).unwrap(),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::refdata::ReferenceData;
    use crate::util::date::pub_testlib::ymd;

    use super::{assert_vec_eq, sample_reference_tables};

    #[test]
    fn test_sample_reference_tables() {
        let rd = sample_reference_tables();
        assert_eq!(rd.closing_price(ymd(2018, 1, 1)).map(|p| p.close), Some(dec!(125.40)));
        assert_eq!(rd.espp_offer_start(ymd(2018, 6, 29)), Some(ymd(2018, 1, 1)));
        assert_eq!(rd.espp_offer_start(ymd(2021, 10, 29)), None);
    }

    #[test]
    #[should_panic]
    fn test_assert_vec_eq_mismatch() {
        assert_vec_eq(vec![1, 2], vec![1, 3]);
    }
}
