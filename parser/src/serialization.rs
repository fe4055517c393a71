use std::io::Write;

use crate::error::ParseError;
use crate::model::Statement;

impl Statement {
    /// Writes the statement as CSV, one row per transaction, with the
    /// column header row derived from the record's field renames.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ParseError> {
        let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);

        for tx in &self.transactions {
            wtr.serialize(tx)?;
        }

        wtr.flush()?;
        Ok(())
    }
}
