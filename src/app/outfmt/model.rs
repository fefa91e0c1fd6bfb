use crate::lots::render::{KeyValueBlock, RenderTable};
use crate::lots::RowId;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum OutputType {
    Parameters,
    Summary,
    Totals,
    Fractional,
    /// Detail of a single lot
    Lot(RowId),
    /// All lots, one row each
    Lots,
}

pub type Error = String;

/// A destination for the rendered report. Writers skip output types
/// their format has no place for.
pub trait ReportWriter {
    fn print_key_values(
        &mut self,
        out_type: OutputType,
        block: &KeyValueBlock,
    ) -> Result<(), Error>;

    fn print_render_table(
        &mut self,
        out_type: OutputType,
        table_model: &RenderTable,
    ) -> Result<(), Error>;

    fn finish(self: Box<Self>) -> Result<(), Error> {
        Ok(())
    }
}
