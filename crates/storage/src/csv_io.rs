//! CSV import and export
//!
//! One record per row. Cells are typed on import by shape: empty is null,
//! an integer literal is an int, a float literal is a double, anything else
//! a string. Export writes doubles with a decimal point so they come back
//! as doubles. Blobs and record references have no CSV form and are
//! written as empty cells.

use std::io;
use std::path::Path;

use wgbind_core::Datum;

use crate::store::{StoreInner, STATUS_OK};

fn to_io(e: csv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

fn render_cell(datum: &Datum) -> String {
    match datum {
        Datum::Int(i) => i.to_string(),
        Datum::Double(d) => format!("{:?}", d),
        Datum::Str(s) => s.clone(),
        Datum::Null | Datum::Blob(_) | Datum::Record(_) | Datum::Illegal => String::new(),
    }
}

fn parse_cell(cell: &str) -> Datum {
    if cell.is_empty() {
        Datum::Null
    } else if let Ok(i) = cell.parse::<i64>() {
        Datum::Int(i)
    } else if let Ok(d) = cell.parse::<f64>() {
        Datum::Double(d)
    } else {
        Datum::Str(cell.to_string())
    }
}

/// Write every record of `store` to `path`, returning the row count
pub(crate) fn export(store: &StoreInner, path: &Path) -> io::Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)
        .map_err(to_io)?;
    let mut rows = 0;
    for (_, fields) in store.scan_from(None) {
        writer
            .write_record(fields.iter().map(render_cell))
            .map_err(to_io)?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

/// Append one record per row of `path`, returning the row count
pub(crate) fn import(store: &mut StoreInner, path: &Path) -> io::Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)
        .map_err(to_io)?;
    let mut rows = 0;
    for row in reader.records() {
        let row = row.map_err(to_io)?;
        let id = store
            .create(row.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "store is full"))?;
        for (index, cell) in row.iter().enumerate() {
            let datum = parse_cell(cell);
            if !datum.is_null() && store.set(id, index, datum) != STATUS_OK {
                return Err(io::Error::new(io::ErrorKind::OutOfMemory, "store is full"));
            }
        }
        rows += 1;
    }
    Ok(rows)
}
