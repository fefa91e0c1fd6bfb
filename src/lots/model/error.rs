use time::Date;

use crate::refdata::MAX_PRICE_LOOKBACK_DAYS;

use super::lot::RowId;

/// Fatal problems with a ledger row. Each one aborts the run.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum LotError {
    #[error("row {row_id}: lot misses required info: {}", .fields.join(", "))]
    MissingLotData { row_id: RowId, fields: Vec<&'static str> },

    #[error("row {row_id}: PURCHASE type lot misses purchase price")]
    MissingPurchasePrice { row_id: RowId },

    #[error("row {row_id}: no closing price on or up to {} days before {date} (needed for {purpose})",
            MAX_PRICE_LOOKBACK_DAYS)]
    MissingPrice { row_id: RowId, date: Date, purpose: &'static str },

    #[error("row {row_id}: invalid {field} \"{value}\": {reason}")]
    MalformedField { row_id: RowId, field: &'static str, value: String, reason: String },

    #[error("row {row_id}: {reason}")]
    InvalidLot { row_id: RowId, reason: String },
}

impl LotError {
    pub fn row_id(&self) -> RowId {
        match self {
            LotError::MissingLotData { row_id, .. }
            | LotError::MissingPurchasePrice { row_id }
            | LotError::MissingPrice { row_id, .. }
            | LotError::MalformedField { row_id, .. }
            | LotError::InvalidLot { row_id, .. } => *row_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::util::date::pub_testlib::ymd;

    use super::LotError;

    #[test]
    fn test_messages_name_the_row() {
        let e = LotError::MissingLotData { row_id: 7, fields: vec!["Qty.", "Date Acquired"] };
        assert_eq!(e.to_string(), "row 7: lot misses required info: Qty., Date Acquired");
        assert_eq!(e.row_id(), 7);

        let e = LotError::MissingPurchasePrice { row_id: 3 };
        assert_eq!(e.to_string(), "row 3: PURCHASE type lot misses purchase price");

        let e = LotError::MissingPrice {
            row_id: 4, date: ymd(2018, 1, 1), purpose: "ESPP offer price" };
        assert_eq!(e.to_string(),
            "row 4: no closing price on or up to 7 days before 2018-01-01 \
             (needed for ESPP offer price)");
        assert_eq!(e.row_id(), 4);
    }
}
