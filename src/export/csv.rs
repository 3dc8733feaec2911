//! CSV export of walked rows.

use anyhow::{Context as _, Result};
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::xbrl::rows::{OutputRow, ROW_HEADERS};

/// Writes rows to `path` as UTF-8 CSV. A BOM is written first so that
/// spreadsheet applications decode the Japanese labels correctly.
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(b"\xef\xbb\xbf")
        .with_context(|| format!("failed to write to {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer
        .write_record(ROW_HEADERS)
        .context("failed to write CSV header")?;
    for row in rows {
        writer.serialize(row).context("failed to write CSV row")?;
    }
    writer.flush().context("failed to flush CSV")?;

    info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
