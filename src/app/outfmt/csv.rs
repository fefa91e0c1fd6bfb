use std::io::Write;

use crate::lots::render::{KeyValueBlock, RenderTable};
use crate::util::rw::WriteHandle;

use super::model::{Error, OutputType, ReportWriter};

/// Writes the per-lot table as CSV, one row per lot, for spreadsheet
/// import. Every other part of the report only goes to the text output.
pub struct CsvWriter {
    csv_w: csv::Writer<WriteHandle>,
}

impl CsvWriter {
    pub fn new(w: WriteHandle) -> CsvWriter {
        let csv_w = csv::WriterBuilder::new().has_headers(true).from_writer(w);
        CsvWriter { csv_w }
    }
}

impl ReportWriter for CsvWriter {
    fn print_key_values(
        &mut self,
        _out_type: OutputType,
        _block: &KeyValueBlock,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn print_render_table(
        &mut self,
        out_type: OutputType,
        table_model: &RenderTable,
    ) -> Result<(), Error> {
        if out_type != OutputType::Lots {
            return Ok(());
        }

        self.csv_w
            .write_record(&table_model.header)
            .map_err(|e| e.to_string())?;
        for row in &table_model.rows {
            self.csv_w.write_record(row).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), Error> {
        let mut w = self.csv_w.into_inner().map_err(|e| e.to_string())?;
        w.flush().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::app::outfmt::model::{OutputType, ReportWriter};
    use crate::lots::render::{KeyValueBlock, RenderTable};
    use crate::util::rw::WriteHandle;

    use super::CsvWriter;

    #[test]
    fn test_only_lots_table_written() {
        let (wh, buff) = WriteHandle::string_buff_write_handle();
        let mut w = Box::new(CsvWriter::new(wh));
        let table = RenderTable {
            header: vec!["row".to_string(), "total proceeds".to_string()],
            rows: vec![
                vec!["2".to_string(), "1425.00".to_string()],
                vec!["3".to_string(), "1,000.00".to_string()],
            ],
            footer: vec![],
            notes: vec![],
            errors: vec![],
        };
        w.print_key_values(OutputType::Summary, &KeyValueBlock {
            entries: vec![("a:".to_string(), "b".to_string())] }).unwrap();
        w.print_render_table(OutputType::Totals, &table).unwrap();
        w.print_render_table(OutputType::Lots, &table).unwrap();
        w.finish().unwrap();

        assert_eq!(buff.borrow().as_str(),
                   "row,total proceeds\n2,1425.00\n3,\"1,000.00\"\n");
    }
}
