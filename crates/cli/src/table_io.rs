//! CSV reading and writing for [`Table`].

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use catalog::Table;

/// Reads a CSV file whose first record is the header row.
pub fn read_csv(path: &Path) -> Result<Table, csv::Error> {
    read_table(File::open(path)?)
}

/// Writes `table` as CSV, header row first.
pub fn write_csv(path: &Path, table: &Table) -> Result<(), csv::Error> {
    write_table(File::create(path)?, table)
}

/// Reads a table from any CSV source. Short rows are padded with empty cells.
pub fn read_table<R: Read>(source: R) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);

    let mut table = Table::new(reader.headers()?.iter());
    for record in reader.records() {
        table.push_row(record?.iter());
    }
    Ok(table)
}

/// Writes a table to any CSV sink.
pub fn write_table<W: Write>(sink: W, table: &Table) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
