//! CSV output of the chain table.

use std::io;
use std::path::Path;

use tracing::info;

use crate::extract::ChainTable;

/// Header row of the output file.
pub const CSV_HEADERS: [&str; 3] = ["Name", "Protocols", "TVL"];

/// Write `table` as CSV to `path`, replacing any existing file.
///
/// Rows keep the table's discovery order. The header row is written even
/// when the table is empty.
pub fn save_csv(path: &Path, table: &ChainTable) -> Result<(), csv::Error> {
    info!("Saving extracted data to CSV");
    let mut writer = csv::Writer::from_path(path)?;
    write_table(&mut writer, table)?;
    info!("Saving {} chains to CSV completed!", table.len());
    Ok(())
}

/// Write the header and one record per row to any CSV writer.
pub fn write_table<W: io::Write>(
    writer: &mut csv::Writer<W>,
    table: &ChainTable,
) -> Result<(), csv::Error> {
    writer.write_record(CSV_HEADERS)?;
    for row in table {
        let protocols = row.protocol_count.to_string();
        writer.write_record([
            row.chain_name.as_str(),
            protocols.as_str(),
            row.total_value_locked.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
