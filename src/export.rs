//! CSV persistence for pipeline artifacts.
//!
//! Missing values are written as empty cells and read back as `NaN`.

use crate::angles::{AngleColumn, AngleTable};
use crate::fusion::FusedTable;
use crate::scoring::Prediction;
use crate::{Error, Result};
use csv::{ReaderBuilder, WriterBuilder};
use ndarray::{Array2, ArrayView2};
use std::path::Path;

/// Header of the reference label column in fused artifacts
pub const LABEL_COLUMN: &str = "ASD";

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn write_rows(path: &Path, headers: &[String], values: ArrayView2<'_, f64>, label: Option<u8>) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header_row = headers.to_vec();
    if label.is_some() {
        header_row.push(LABEL_COLUMN.to_string());
    }
    writer.write_record(&header_row)?;

    for row in values.rows() {
        let mut record: Vec<String> = row.iter().map(|&v| format_cell(v)).collect();
        if let Some(label) = label {
            record.push(label.to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write an angle table with its column labels as the header
///
/// # Errors
///
/// Returns an error if the file cannot be written
pub fn write_angle_table<P: AsRef<Path>>(path: P, table: &AngleTable) -> Result<()> {
    let headers: Vec<String> = table.columns().iter().map(AngleColumn::label).collect();
    write_rows(path.as_ref(), &headers, table.values().view(), None)
}

/// Read an angle table written by [`write_angle_table`]
///
/// # Errors
///
/// Returns an error if the file cannot be read, a header is not an angle
/// label, or a cell is not a number
pub fn read_angle_table<P: AsRef<Path>>(path: P) -> Result<AngleTable> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new().from_path(path)?;

    let columns = reader
        .headers()?
        .iter()
        .map(|h| {
            AngleColumn::from_label(h)
                .ok_or_else(|| Error::InvalidInput(format!("Unknown column {h:?} in {}", path.display())))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut flat = Vec::new();
    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        for cell in &record {
            let cell = cell.trim();
            let value = if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
                f64::NAN
            } else {
                cell.parse::<f64>()
                    .map_err(|e| Error::InvalidInput(format!("Bad cell {cell:?} in {}: {e}", path.display())))?
            };
            flat.push(value);
        }
        rows += 1;
    }

    let values = Array2::from_shape_vec((rows, columns.len()), flat)?;
    AngleTable::new(columns, values)
}

/// Write a fused table, optionally followed by the reference label column
///
/// # Errors
///
/// Returns an error if the file cannot be written
pub fn write_fused_table<P: AsRef<Path>>(path: P, table: &FusedTable, label: Option<u8>) -> Result<()> {
    let headers: Vec<String> = table.columns().iter().map(AngleColumn::label).collect();
    write_rows(path.as_ref(), &headers, table.values().view(), label)
}

/// Write one row per prediction: `File,Score,Prediction`
///
/// # Errors
///
/// Returns an error if the file cannot be written
pub fn write_predictions<P: AsRef<Path>>(path: P, predictions: &[Prediction]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["File", "Score", "Prediction"])?;
    for prediction in predictions {
        writer.write_record([
            prediction.file.clone(),
            prediction.score.to_string(),
            prediction.diagnosis.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a single prediction without its file name: `Score,Prediction`
///
/// # Errors
///
/// Returns an error if the file cannot be written
pub fn write_prediction_summary<P: AsRef<Path>>(path: P, prediction: &Prediction) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["Score", "Prediction"])?;
    writer.write_record([prediction.score.to_string(), prediction.diagnosis.to_string()])?;
    writer.flush()?;
    Ok(())
}

/// Write a bare score to `path`
///
/// # Errors
///
/// Returns an error if the file cannot be written
pub fn write_score<P: AsRef<Path>>(path: P, score: f64) -> Result<()> {
    std::fs::write(path, score.to_string())?;
    Ok(())
}
