use std::io::Write;

use tabled::settings::{
    object::{Columns, Rows},
    style::On,
    Alignment, Border,
};

use crate::lots::render::{KeyValueBlock, RenderTable};
use crate::util::rw::WriteHandle;

use super::model::{Error, OutputType, ReportWriter};

const KEY_WIDTH: usize = 35;

/// Human readable report, for the .txt output.
pub struct TextWriter {
    w: WriteHandle,
}

impl TextWriter {
    pub fn new(w: WriteHandle) -> TextWriter {
        TextWriter { w }
    }
}

struct CellBorder {
    top: char,
    bottom: char,
    left: char,
    right: char,
    corner: char,
}

impl CellBorder {
    fn to_border(&self) -> Border<On, On, On, On> {
        Border::full(
            self.top, self.bottom, self.left, self.right,
            self.corner, self.corner, self.corner, self.corner,
        )
    }
}

impl Default for CellBorder {
    fn default() -> Self {
        Self { top: '-', bottom: '-', left: '|', right: '|', corner: '+' }
    }
}

fn map_write_err(e: std::io::Error) -> Error {
    format!("{e}")
}

impl ReportWriter for TextWriter {
    fn print_key_values(
        &mut self,
        out_type: OutputType,
        block: &KeyValueBlock,
    ) -> Result<(), Error> {
        if let OutputType::Lot(row_id) = out_type {
            writeln!(self.w, "\n---------------------- row: {row_id} ----------------------")
                .map_err(map_write_err)?;
        }
        for (key, value) in &block.entries {
            if key.is_empty() && value.is_empty() {
                writeln!(self.w).map_err(map_write_err)?;
            } else {
                writeln!(self.w, "{key:<KEY_WIDTH$}{value}").map_err(map_write_err)?;
            }
        }
        if !matches!(out_type, OutputType::Lot(_)) {
            writeln!(self.w).map_err(map_write_err)?;
        }
        Ok(())
    }

    fn print_render_table(
        &mut self,
        out_type: OutputType,
        table_model: &RenderTable,
    ) -> Result<(), Error> {
        // Lot details are already printed as blocks
        if out_type != OutputType::Totals {
            return Ok(());
        }

        for err in &table_model.errors {
            writeln!(self.w, "[!] {err}").map_err(map_write_err)?;
        }

        let mut table_bldr = tabled::builder::Builder::default();
        table_bldr.push_record(
            table_model.header.iter().map(|h| h.to_uppercase()).collect::<Vec<String>>());
        for row in &table_model.rows {
            table_bldr.push_record(row);
        }
        let footer_row = if !table_model.footer.is_empty() {
            table_bldr.push_record(table_model.footer.clone());
            Some(table_model.rows.len() + 1)
        } else {
            None
        };

        let mut table = table_bldr.build();
        table.with(tabled::settings::Style::ascii());
        table.modify(Rows::first(), Alignment::center());
        // Amounts line up on the right
        table.modify(Columns::new(1..), Alignment::right());
        // Open outer edges on the label column
        table.modify(
            Columns::first(),
            CellBorder { left: ' ', corner: '-', ..Default::default() }.to_border(),
        );
        if let Some(r) = footer_row {
            table.modify(
                Rows::single(r),
                CellBorder { top: '=', ..Default::default() }.to_border(),
            );
        }

        writeln!(self.w, "{table}").map_err(map_write_err)?;
        for note in &table_model.notes {
            writeln!(self.w, "{note}").map_err(map_write_err)?;
        }
        writeln!(self.w).map_err(map_write_err)?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), Error> {
        self.w.flush().map_err(map_write_err)
    }
}

#[cfg(test)]
mod tests {
    use crate::app::outfmt::model::{OutputType, ReportWriter};
    use crate::lots::render::{KeyValueBlock, RenderTable};
    use crate::testlib::assert_re;
    use crate::util::rw::WriteHandle;

    use super::TextWriter;

    fn block() -> KeyValueBlock {
        KeyValueBlock {
            entries: vec![
                ("total proceeds:".to_string(), "$1.00".to_string()),
                (String::new(), String::new()),
                ("term:".to_string(), "long term".to_string()),
            ],
        }
    }

    #[test]
    fn test_key_values() {
        let (wh, buff) = WriteHandle::string_buff_write_handle();
        let mut w = TextWriter::new(wh);
        w.print_key_values(OutputType::Summary, &block()).unwrap();
        assert_eq!(buff.borrow().as_str(),
                   format!("{:<35}$1.00\n\n{:<35}long term\n\n", "total proceeds:", "term:"));

        buff.borrow_mut().clear();
        w.print_key_values(OutputType::Lot(7), &block()).unwrap();
        assert_re(r"^\n-+ row: 7 -+\ntotal proceeds: +\$1\.00\n", buff.borrow().as_str());
    }

    #[test]
    fn test_totals_table() {
        let (wh, buff) = WriteHandle::string_buff_write_handle();
        let mut w = TextWriter::new(wh);
        let table = RenderTable {
            header: vec!["Term".to_string(), "Proceeds".to_string()],
            rows: vec![vec!["short term".to_string(), "$5.00".to_string()]],
            footer: vec!["Total".to_string(), "$5.00".to_string()],
            notes: vec!["A note".to_string()],
            errors: vec!["an error".to_string()],
        };
        w.print_render_table(OutputType::Totals, &table).unwrap();
        let out = buff.borrow().as_str().to_string();
        assert_re(r"^\[!\] an error\n", &out);
        assert_re("PROCEEDS", &out);
        assert_re(r"short term +\| +\$5\.00", &out);
        assert_re("A note\n\n$", &out);

        buff.borrow_mut().clear();
        w.print_render_table(OutputType::Lots, &table).unwrap();
        assert_eq!(buff.borrow().as_str(), "");
    }
}
