use std::collections::HashMap;

/// Column names of the gain and loss ledger, lowercased.
pub struct LedgerCol();
impl LedgerCol {
    pub const SYMBOL: &'static str = "symbol";
    pub const RECORD_TYPE: &'static str = "record type";
    pub const QTY: &'static str = "qty.";
    pub const DATE_ACQUIRED: &'static str = "date acquired";
    pub const DATE_SOLD: &'static str = "date sold";
    pub const PLAN_TYPE: &'static str = "plan type";
    pub const GRANT_DATE: &'static str = "grant date";
    pub const TOTAL_PROCEEDS: &'static str = "total proceeds";
    pub const PURCHASE_PRICE: &'static str = "purchase price";
    pub const LEGACY_PURCHASE_PRICE: &'static str = "acquisition cost per share";

    /// Maps each accepted (lowercased) header to its canonical column.
    pub fn get_ledger_cols() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (LedgerCol::SYMBOL, LedgerCol::SYMBOL),
            (LedgerCol::RECORD_TYPE, LedgerCol::RECORD_TYPE),
            (LedgerCol::QTY, LedgerCol::QTY),
            // Some exports drop the period
            ("qty", LedgerCol::QTY),
            (LedgerCol::DATE_ACQUIRED, LedgerCol::DATE_ACQUIRED),
            (LedgerCol::DATE_SOLD, LedgerCol::DATE_SOLD),
            (LedgerCol::PLAN_TYPE, LedgerCol::PLAN_TYPE),
            (LedgerCol::GRANT_DATE, LedgerCol::GRANT_DATE),
            (LedgerCol::TOTAL_PROCEEDS, LedgerCol::TOTAL_PROCEEDS),
            (LedgerCol::PURCHASE_PRICE, LedgerCol::PURCHASE_PRICE),
            (LedgerCol::LEGACY_PURCHASE_PRICE, LedgerCol::PURCHASE_PRICE),
        ])
    }

    /// Columns a ledger must have for any lot to be computed.
    pub fn required_cols() -> [&'static str; 6] {
        [
            LedgerCol::SYMBOL,
            LedgerCol::RECORD_TYPE,
            LedgerCol::QTY,
            LedgerCol::DATE_ACQUIRED,
            LedgerCol::DATE_SOLD,
            LedgerCol::TOTAL_PROCEEDS,
        ]
    }

    /// Name used in messages, matching the broker's capitalization.
    pub fn display_name(col: &str) -> &'static str {
        match col {
            LedgerCol::SYMBOL => "Symbol",
            LedgerCol::RECORD_TYPE => "Record Type",
            LedgerCol::QTY => "Qty.",
            LedgerCol::DATE_ACQUIRED => "Date Acquired",
            LedgerCol::DATE_SOLD => "Date Sold",
            LedgerCol::PLAN_TYPE => "Plan Type",
            LedgerCol::GRANT_DATE => "Grant Date",
            LedgerCol::TOTAL_PROCEEDS => "Total Proceeds",
            LedgerCol::PURCHASE_PRICE => "Purchase Price",
            _ => "unknown column",
        }
    }
}
