use std::path::Path;

use serde::Serialize;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::error::ReportError;
use crate::types::ProjectedTable;

fn export_error(path: &Path, err: impl std::fmt::Display) -> ReportError {
    ReportError::Export {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), ReportError> {
    let path = Path::new(path);
    let mut wtr = csv::Writer::from_path(path).map_err(|e| export_error(path, e))?;
    for r in rows {
        wtr.serialize(r).map_err(|e| export_error(path, e))?;
    }
    wtr.flush().map_err(|e| export_error(path, e))?;
    Ok(())
}

/// Export a projection as comma-separated text with a header row. Null cells
/// render as empty fields.
pub fn write_projection_csv(path: &str, table: &ProjectedTable) -> Result<(), ReportError> {
    let path = Path::new(path);
    let mut wtr = csv::Writer::from_path(path).map_err(|e| export_error(path, e))?;
    wtr.write_record(&table.columns)
        .map_err(|e| export_error(path, e))?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
            .map_err(|e| export_error(path, e))?;
    }
    wtr.flush().map_err(|e| export_error(path, e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), ReportError> {
    let path = Path::new(path);
    let s = serde_json::to_string_pretty(value).map_err(|e| export_error(path, e))?;
    std::fs::write(path, s).map_err(|e| export_error(path, e))?;
    Ok(())
}

pub fn preview_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn preview_projection(table: &ProjectedTable, max_rows: usize) {
    if table.rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(table.columns.iter().map(String::as_str));
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")));
    }
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_export_writes_header_and_empty_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relatorio.csv");
        let table = ProjectedTable {
            columns: vec!["codigo_ocorrencia".to_string(), "fator_nome".to_string()],
            rows: vec![
                vec![Some("101".to_string()), Some("FATOR A".to_string())],
                vec![Some("102".to_string()), None],
            ],
        };
        write_projection_csv(path.to_str().unwrap(), &table).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "codigo_ocorrencia,fator_nome\n101,FATOR A\n102,\n");
    }
}
