//! Conversion of downloaded xlsx workbooks into gzip-compressed CSVs.

use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info};

use crate::error::{EtlError, Result};

/// One worksheet as rows of cell text.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// Read every worksheet of an xlsx workbook held in memory.
pub fn read_sheets(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        debug!(sheet = %name, rows = rows.len(), "read worksheet");
        sheets.push(Sheet { name, rows });
    }

    Ok(sheets)
}

/// Convert every sheet of `bytes` into a gzip CSV in `dir`, naming each
/// file with `file_name(sheet)`. Returns the written paths.
pub fn convert_workbook(
    bytes: &[u8],
    dir: &Path,
    file_name: impl Fn(&str) -> String,
) -> Result<Vec<PathBuf>> {
    let sheets = read_sheets(bytes)?;
    if sheets.is_empty() {
        return Err(EtlError::EmptyData("workbook has no sheets".to_string()));
    }

    let mut written = Vec::with_capacity(sheets.len());
    for sheet in &sheets {
        let path = dir.join(file_name(&sheet.name));
        write_gzip_csv(&path, &sheet.rows)?;
        written.push(path);
    }

    info!(sheets = written.len(), dir = %dir.display(), "converted workbook");
    Ok(written)
}

/// Write rows as a gzip-compressed CSV.
pub fn write_gzip_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let file = File::create(path).map_err(|e| EtlError::io(path, e))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(encoder);

    for row in rows {
        writer.write_record(row)?;
    }

    let encoder = writer
        .into_inner()
        .map_err(|e| EtlError::io(path, e.into_error()))?;
    encoder.finish().map_err(|e| EtlError::io(path, e))?;
    Ok(())
}

/// Text of one cell. Whole numbers print without a fractional part so
/// year headers stored as numbers read back as `1970`, not `1970.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
