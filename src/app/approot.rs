use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    lots::{
        io::ledger_csv::{parse_ledger_csv, LedgerCsvParseOptions},
        process::{calc_tax, TaxReport},
        render::{render_report, ReportModel},
        MergerTerms,
    },
    refdata::{load_reference_tables, ReferenceData},
    util::{
        date::parse_dyn_date_format,
        os::{ensure_parent_dir, with_appended_extension},
        rw::{DescribedReader, WriteHandle},
    },
    write_errln,
};

use super::input_parse::{
    apply_election_override, load_merger_terms, ref_data_path, DEFAULT_ESPP_PERIODS_FILE,
    DEFAULT_PRICES_FILE,
};
use super::outfmt::{
    csv::CsvWriter,
    model::{OutputType, ReportWriter},
    text::TextWriter,
};

pub type Error = String;

#[derive(Default, Debug)]
pub struct Options {
    pub ledger_path: PathBuf,
    /// Output files are this, plus .txt and .csv
    pub output_base: PathBuf,
    pub prices_path: Option<PathBuf>,
    pub espp_periods_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub cash: Option<u32>,
    pub stock: Option<u32>,
    pub date_fmt: Option<String>,
}

/// Parses the ledger and computes every lot. Nothing is written
/// except warnings to err_printer.
pub fn run_tax_app_to_report(
    ledger: &DescribedReader,
    refdata: &dyn ReferenceData,
    terms: &MergerTerms,
    parse_options: &LedgerCsvParseOptions,
    mut err_printer: WriteHandle,
) -> Result<TaxReport, Error> {
    let rows = parse_ledger_csv(ledger, parse_options, &mut err_printer)?;
    calc_tax(&rows, refdata, terms, &mut err_printer)
        .map_err(|e| format!("Error in {}: {e}", ledger.desc()))
}

/// Sends every part of the report to writer, in report order.
pub fn write_report(model: &ReportModel, writer: &mut dyn ReportWriter) -> Result<(), Error> {
    writer.print_key_values(OutputType::Parameters, &model.parameters)
        .map_err(|e| format!("Rendering merger parameters: {e}"))?;
    writer.print_key_values(OutputType::Summary, &model.summary)
        .map_err(|e| format!("Rendering summary: {e}"))?;
    writer.print_render_table(OutputType::Totals, &model.totals_table)
        .map_err(|e| format!("Rendering totals: {e}"))?;
    if let Some(fractional) = &model.fractional {
        writer.print_key_values(OutputType::Fractional, fractional)
            .map_err(|e| format!("Rendering fractional share: {e}"))?;
    }
    for lot in &model.lot_blocks {
        writer.print_key_values(OutputType::Lot(lot.row_id), &lot.block)
            .map_err(|e| format!("Rendering row {}: {e}", lot.row_id))?;
    }
    writer.print_render_table(OutputType::Lots, &model.lots_table)
        .map_err(|e| format!("Rendering lots: {e}"))?;
    Ok(())
}

#[derive(PartialEq, Eq, Debug)]
pub struct OutputPaths {
    pub text: PathBuf,
    pub csv: PathBuf,
}

impl OutputPaths {
    pub fn from_base(base: &Path) -> OutputPaths {
        OutputPaths {
            text: with_appended_extension(base, "txt"),
            csv: with_appended_extension(base, "csv"),
        }
    }
}

fn create_output_file(path: &Path) -> Result<WriteHandle, Error> {
    ensure_parent_dir(path)
        .and_then(|_| File::create(path))
        .map(WriteHandle::file_write_handle)
        .map_err(|e| format!("Failed to create {}: {e}", path.display()))
}

fn write_output_files(model: &ReportModel, paths: &OutputPaths) -> Result<(), Error> {
    let writers: Vec<Box<dyn ReportWriter>> = vec![
        Box::new(TextWriter::new(create_output_file(&paths.text)?)),
        Box::new(CsvWriter::new(create_output_file(&paths.csv)?)),
    ];
    for mut writer in writers {
        write_report(model, writer.as_mut())?;
        writer.finish()?;
    }
    Ok(())
}

fn compute_report(options: &Options, err_printer: WriteHandle) -> Result<TaxReport, Error> {
    let config = options.config_path.clone().map(DescribedReader::from_file_path);
    let terms = load_merger_terms(config.as_ref())?;
    let terms = apply_election_override(terms, options.cash, options.stock)?;

    let parse_options = LedgerCsvParseOptions {
        date_format: match &options.date_fmt {
            Some(fmt) => Some(parse_dyn_date_format(fmt)
                .map_err(|e| format!("Invalid date format \"{fmt}\": {e}"))?),
            None => None,
        },
    };

    let prices = ref_data_path(options.prices_path.clone(), DEFAULT_PRICES_FILE)?;
    let periods =
        ref_data_path(options.espp_periods_path.clone(), DEFAULT_ESPP_PERIODS_FILE)?;
    let refdata = load_reference_tables(
        &DescribedReader::from_file_path(prices),
        &DescribedReader::from_file_path(periods),
    )?;

    run_tax_app_to_report(
        &DescribedReader::from_file_path(options.ledger_path.clone()),
        &refdata, &terms, &parse_options, err_printer)
}

/// Computes the whole report first, so a failed run creates no output
/// files, then writes <output>.txt and <output>.csv.
///
/// Returned Err is for exit code determination only.
/// All errors are written to err_printer.
pub fn run_tax_app_to_files(
    options: &Options,
    mut err_printer: WriteHandle,
) -> Result<TaxReport, ()> {
    let report = match compute_report(options, err_printer.clone()) {
        Ok(r) => r,
        Err(e) => {
            write_errln!(err_printer, "{e}");
            return Err(());
        }
    };

    let model = render_report(&report);
    let paths = OutputPaths::from_base(&options.output_base);
    if let Err(e) = write_output_files(&model, &paths) {
        write_errln!(err_printer, "{e}");
        return Err(());
    }
    info!("Wrote {} and {}", paths.text.display(), paths.csv.display());
    Ok(report)
}
