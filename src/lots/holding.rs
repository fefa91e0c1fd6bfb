use time::Date;

use crate::util::date::add_months;

use super::{HoldingThreshold, MergerTerms, Term};

/// Classifies a holding from acquired to disposed. It is long term only
/// when the holding exceeds the threshold.
pub fn holding_term(acquired: Date, disposed: Date, threshold: HoldingThreshold) -> Term {
    let long = match threshold {
        HoldingThreshold::Months(n) => disposed > add_months(acquired, n),
        HoldingThreshold::Days(n) => (disposed - acquired).whole_days() > n as i64,
    };
    Term::from_long(long)
}

/// Term of the recorded sale itself.
pub fn pre_merger_term(acquire_date: Date, sold_date: Date, terms: &MergerTerms) -> Term {
    holding_term(acquire_date, sold_date, terms.long_term_threshold)
}

/// Term of shares exchanged in the merger, which were disposed of on
/// the effective date.
pub fn post_merger_term(acquire_date: Date, terms: &MergerTerms) -> Term {
    holding_term(acquire_date, terms.effective_date, terms.long_term_threshold)
}
