use std::io::Read;
use std::path::{Path, PathBuf};

use crate::lots::{ElectionSplit, MergerTerms};
use crate::util::os::home_data_file_path;
use crate::util::rw::DescribedReader;

pub type Error = String;

pub const DEFAULT_PRICES_FILE: &str = "prices.csv";
pub const DEFAULT_ESPP_PERIODS_FILE: &str = "espp-periods.csv";

/// Reads merger terms from a JSON file. Fields absent from the file keep
/// their built-in values. Without a file, the built-in terms are used.
pub fn load_merger_terms(config: Option<&DescribedReader>) -> Result<MergerTerms, Error> {
    let terms = match config {
        None => MergerTerms::default(),
        Some(r) => {
            let desc = r.desc();
            let mut text = String::new();
            r.reader()
                .and_then(|mut rd| rd.read_to_string(&mut text))
                .map_err(|e| format!("Failed to read {desc}: {e}"))?;
            serde_json::from_str::<MergerTerms>(&text)
                .map_err(|e| format!("Invalid merger terms in {desc}: {e}"))?
        }
    };
    terms.validate()?;
    Ok(terms)
}

/// Applies -c/--cash and -s/--stock. Both must be given, or neither.
pub fn apply_election_override(
    terms: MergerTerms,
    cash: Option<u32>,
    stock: Option<u32>,
) -> Result<MergerTerms, Error> {
    let terms = match (cash, stock) {
        (None, None) => terms,
        (Some(cash_shares), Some(stock_shares)) => {
            terms.with_election(ElectionSplit { cash_shares, stock_shares })
        }
        _ => {
            return Err("Cash and stock election share counts must be given together"
                .to_string())
        }
    };
    terms.validate()?;
    Ok(terms)
}

/// The explicit path if given, otherwise the file under ~/.vmw-tax/.
pub fn ref_data_path(explicit: Option<PathBuf>, default_name: &str) -> Result<PathBuf, Error> {
    match explicit {
        Some(p) => Ok(p),
        None => home_data_file_path(Path::new(default_name)),
    }
}
