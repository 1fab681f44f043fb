//! CSV export of harvested records

use crate::directory::record::{FieldName, Record};
use crate::error::HarvestError;
use std::io::Write;
use std::path::Path;

/// Write a header row plus one row per record to `path` (UTF-8)
pub fn write_csv(path: impl AsRef<Path>, records: &[Record]) -> Result<(), HarvestError> {
    let file = std::fs::File::create(path.as_ref())?;
    write_records(file, records)
}

/// Write a header row plus one row per record to `writer`
pub fn write_records<W: Write>(writer: W, records: &[Record]) -> Result<(), HarvestError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(FieldName::ALL.map(FieldName::header))?;
    for record in records {
        csv_writer.write_record(record.values())?;
    }
    csv_writer.flush()?;

    Ok(())
}
