use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::extract::errors::ExtractError;

/// Render every sheet of a workbook (XLS or XLSX) to a CSV-like text block.
///
/// Sheets keep their workbook order; each block starts with a
/// `--- Sheet: {name} ---` header line and blocks are separated by a blank
/// line.
pub fn extract(data: &[u8]) -> Result<String, ExtractError> {
    let cursor = Cursor::new(data.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| ExtractError::extraction("spreadsheet", e.to_string()))?;

    let names = workbook.sheet_names().to_owned();
    let mut blocks = Vec::with_capacity(names.len());

    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ExtractError::extraction("spreadsheet", e.to_string()))?;

        let mut lines = Vec::with_capacity(range.height());
        for row in range.rows() {
            let line = row
                .iter()
                .map(cell_to_string)
                .collect::<Vec<_>>()
                .join(",");
            lines.push(line);
        }

        tracing::debug!(sheet = %name, rows = lines.len(), "sheet rendered");
        blocks.push(format!("--- Sheet: {name} ---\n{}", lines.join("\n")));
    }

    Ok(blocks.join("\n\n"))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
