use std::path::PathBuf;

use clap::Parser;

use crate::app::approot::{run_tax_app_to_files, Options};
use crate::lots::csv_common::LedgerCol;
use crate::util::rw::WriteHandle;

const ABOUT: &str = "Capital gains calculation for VMW shares exchanged in the Broadcom merger";

fn get_long_about() -> String {
    format!("\
Computes the cost base and capital gain of every VMW lot in a brokerage gain
and loss export, including lots exchanged for cash and AVGO shares in the
VMware/Broadcom merger, and the AVGO fractional share paid out in cash.

The ledger CSV must contain a header with these column names:
{}
\"Plan Type\", \"Grant Date\" and \"Purchase Price\" are optional. Other columns
are ignored.

Closing prices and ESPP offer periods are read from ~/.vmw-tax/prices.csv and
~/.vmw-tax/espp-periods.csv unless given with --prices and --espp-periods.

Writes <OUTPUT>.txt (report) and <OUTPUT>.csv (one row per lot).",
        LedgerCol::required_cols().iter()
            .map(|c| LedgerCol::display_name(c))
            .collect::<Vec<&str>>()
            .join(", "))
}

#[derive(Parser, Debug)]
#[command(version = crate::app::VMW_TAX_APP_VERSION,
          about = ABOUT, long_about = get_long_about())]
pub struct Args {
    /// Gain and loss ledger exported from the brokerage
    #[arg(required = true)]
    pub input: PathBuf,

    /// Base path for the output files. .txt and .csv are appended.
    #[arg(required = true)]
    pub output: PathBuf,

    /// VMW share count elected for cash. Only the cash:stock ratio is used.
    ///
    /// Must be given with --stock.
    #[arg(short, long, requires = "stock")]
    pub cash: Option<u32>,

    /// VMW share count elected for stock.
    ///
    /// Must be given with --cash.
    #[arg(short, long, requires = "cash")]
    pub stock: Option<u32>,

    /// JSON file overriding merger terms (effective date, exchange ratio,
    /// special dividend, long term threshold, etc.)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Closing prices CSV (date,close)
    #[arg(long)]
    pub prices: Option<PathBuf>,

    /// ESPP offer periods CSV (start,end)
    #[arg(long)]
    pub espp_periods: Option<PathBuf>,

    /// Format of how dates appear in the ledger.
    /// The default is "[month]/[day]/[year]".
    ///
    /// See https://time-rs.github.io/book/api/format-description.html
    #[arg(long)]
    pub date_fmt: Option<String>,

    /// Print verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl From<Args> for Options {
    fn from(args: Args) -> Self {
        Options {
            ledger_path: args.input,
            output_base: args.output,
            prices_path: args.prices,
            espp_periods_path: args.espp_periods,
            config_path: args.config,
            cash: args.cash,
            stock: args.stock,
            date_fmt: args.date_fmt,
        }
    }
}

pub fn command_main() -> Result<(), ()> {
    let args = Args::parse();

    if args.verbose {
        crate::tracing::enable_trace_env("vmw_tax=info");
        crate::log::set_verbose(true);
    }
    crate::tracing::setup_tracing();

    let options = Options::from(args);
    crate::verboseln!("{:#?}", options);

    let report = run_tax_app_to_files(&options, WriteHandle::stderr_write_handle())?;
    crate::verboseln!("Processed {} lots", report.lots.len());
    Ok(())
}
