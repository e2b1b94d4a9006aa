use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::dataset::Dataset;
use crate::params::RequestParams;
use crate::record::Cell;
use crate::{info_time, Error, Result, DEFAULT_LABEL, OUTPUT_EXTENSION};

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// `<dir>/<base>_<values..>_<year>.xlsx`.
/// A spreadsheet extension already on `base` is dropped first.
pub fn output_path(
    dir: impl AsRef<Path>,
    base: &str,
    params: &RequestParams,
    year: Option<&str>,
) -> PathBuf {
    let base = strip_extension(base);
    let file_name = format!("{base}{}.{OUTPUT_EXTENSION}", params.file_suffix(year));
    dir.as_ref().join(file_name)
}

/// Writes the dataset to `path`. Refuses to write an empty dataset.
pub fn export(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    if dataset.is_empty() {
        return Err(Error::NoData);
    }
    let start_time = chrono::Local::now();
    write_xlsx(dataset, path.as_ref())?;
    info_time!(
        start_time,
        "Wrote {} rows to {}",
        dataset.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// One sheet named after the dataset, a bold header row, one row per record.
pub fn write_xlsx(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(dataset.title()))?;

    let bold = Format::new().set_bold();
    for (col, header) in dataset.headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (idx, row) in dataset.rows().iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, row_num, col as u16, cell)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

#[inline]
fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Null => {}
        Cell::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Cell::Float(x) => {
            worksheet.write_number(row, col, *x)?;
        }
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Cell::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

/// Excel only takes up to 31 chars and no `[]:*?/\` in a sheet name.
fn sheet_name(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(|c| !FORBIDDEN_SHEET_CHARS.contains(c))
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let name = name.trim().trim_matches('\'');
    if name.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        name.to_string()
    }
}

fn strip_extension(base: &str) -> &str {
    let lower = base.to_ascii_lowercase();
    for ext in [".xlsx", ".xls"] {
        if lower.ends_with(ext) {
            return &base[..base.len() - ext.len()];
        }
    }
    base
}
