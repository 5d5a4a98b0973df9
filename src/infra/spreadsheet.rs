//! Reference-table loading and report export (xlsx, csv, json).

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{ConfigurationError, ReferenceTable, RosterReport, SkipReason};

pub const DEFAULT_NAME_COLUMN: &str = "物品名称";
pub const DEFAULT_COST_COLUMN: &str = "等效理智";

const REPORT_NAME_HEADER: &str = "干员名称";
const REPORT_COST_HEADER: &str = "总等效理智";
const REPORT_TOTAL_LABEL: &str = "总计";

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("unsupported file type for {0}")]
    UnsupportedFormat(PathBuf),
    #[error("failed to open workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Xlsx(#[from] XlsxError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Header names of the two reference-table columns that matter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceColumns {
    pub name: String,
    pub cost: String,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_COLUMN.to_string(),
            cost: DEFAULT_COST_COLUMN.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FileKind {
    Workbook,
    Csv,
    Json,
}

/// Formats accepted for the reference table.
fn file_kind(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(FileKind::Workbook),
        "csv" => Some(FileKind::Csv),
        "json" => Some(FileKind::Json),
        _ => None,
    }
}

/// Formats `write_report` can produce. Workbooks are always xlsx.
fn report_kind(path: &Path) -> Option<FileKind> {
    match file_kind(path)? {
        FileKind::Workbook => path
            .extension()?
            .to_str()?
            .eq_ignore_ascii_case("xlsx")
            .then_some(FileKind::Workbook),
        kind => Some(kind),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Float(n) => Cell::Number(*n),
            Data::String(s) if s.is_empty() => Cell::Empty,
            other => Cell::Text(other.to_string()),
        }
    }
}

impl Cell {
    fn from_text(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    fn is_header(&self, header: &str) -> bool {
        matches!(self, Cell::Text(s) if s.trim_start_matches('\u{feff}').trim() == header)
    }
}

/// Loads the item -> unit cost table from the first sheet of a workbook or
/// from a CSV file. Both columns are located by header name.
pub fn load_reference_table(
    path: &Path,
    columns: &ReferenceColumns,
) -> Result<ReferenceTable, SheetError> {
    let rows = match file_kind(path) {
        Some(FileKind::Workbook) => read_workbook_rows(path)?,
        Some(FileKind::Csv) => read_csv_rows(path)?,
        _ => return Err(SheetError::UnsupportedFormat(path.to_path_buf())),
    };

    let table = table_from_rows(rows, columns)?;
    info!(
        "[sheet] Loaded {} reference costs from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

fn read_workbook_rows(path: &Path) -> Result<Vec<Vec<Cell>>, SheetError> {
    let mut workbook = open_workbook_auto(path)?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoSheets)?;
    let range = workbook.worksheet_range(&first)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect())
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<Cell>>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(rows)
}

fn table_from_rows(
    rows: Vec<Vec<Cell>>,
    columns: &ReferenceColumns,
) -> Result<ReferenceTable, SheetError> {
    let mut rows = rows.into_iter().enumerate();

    let (name_col, cost_col) = loop {
        let Some((_, row)) = rows.next() else {
            return Err(ConfigurationError::MissingColumn(columns.name.clone()).into());
        };
        let name_col = row.iter().position(|cell| cell.is_header(&columns.name));
        let cost_col = row.iter().position(|cell| cell.is_header(&columns.cost));
        match (name_col, cost_col) {
            (Some(name), Some(cost)) => break (name, cost),
            (Some(_), None) => {
                return Err(ConfigurationError::MissingColumn(columns.cost.clone()).into())
            }
            _ => continue,
        }
    };

    let mut entries = Vec::new();
    for (index, row) in rows {
        let line = index + 1;
        let name = match row.get(name_col) {
            Some(Cell::Text(name)) => name.clone(),
            Some(Cell::Number(n)) => n.to_string(),
            Some(Cell::Empty) | None => continue,
        };
        let cost = match row.get(cost_col) {
            Some(Cell::Number(n)) => *n,
            Some(Cell::Text(raw)) => {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| ConfigurationError::InvalidCostCell {
                        row: line,
                        name: name.clone(),
                        value: raw.clone(),
                    })?
            }
            Some(Cell::Empty) | None => {
                warn!("[sheet] Row {line}: '{name}' has no cost, ignoring");
                continue;
            }
        };
        entries.push((name, cost));
    }

    Ok(ReferenceTable::from_rows(entries)?)
}

/// Writes the report in the format implied by the file extension.
pub fn write_report(path: &Path, report: &RosterReport) -> Result<(), SheetError> {
    match report_kind(path) {
        Some(FileKind::Workbook) => write_xlsx_report(path, report)?,
        Some(FileKind::Csv) => write_csv_report(path, report)?,
        Some(FileKind::Json) => fs::write(path, serde_json::to_string_pretty(report)?)?,
        None => return Err(SheetError::UnsupportedFormat(path.to_path_buf())),
    }
    info!(
        "[sheet] Saved {} operators to {}",
        report.entity_count(),
        path.display()
    );
    Ok(())
}

fn write_xlsx_report(path: &Path, report: &RosterReport) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    // Fixed creation date, otherwise docProps/core.xml embeds the save time.
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));
    let bold = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet().set_name("report")?;
        sheet.write_string_with_format(0, 0, REPORT_NAME_HEADER, &bold)?;
        sheet.write_string_with_format(0, 1, REPORT_COST_HEADER, &bold)?;
        for (index, entry) in report.entries.iter().enumerate() {
            let row = index as u32 + 1;
            sheet.write_string(row, 0, &entry.name)?;
            sheet.write_number(row, 1, entry.total_cost)?;
        }
        let total_row = report.entries.len() as u32 + 1;
        sheet.write_string_with_format(total_row, 0, REPORT_TOTAL_LABEL, &bold)?;
        sheet.write_number_with_format(total_row, 1, report.grand_total, &bold)?;
    }

    if !report.skipped.is_empty() {
        let sheet = workbook.add_worksheet().set_name("skipped")?;
        for (col, header) in [REPORT_NAME_HEADER, DEFAULT_NAME_COLUMN, "数量", "原因"]
            .iter()
            .enumerate()
        {
            sheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        for (index, skipped) in report.skipped.iter().enumerate() {
            let row = index as u32 + 1;
            sheet.write_string(row, 0, &skipped.entity)?;
            sheet.write_string(row, 1, &skipped.item)?;
            sheet.write_string(row, 2, &skipped.quantity)?;
            sheet.write_string(row, 3, skip_reason_text(&skipped.reason))?;
        }
    }

    if !report.failures.is_empty() {
        let sheet = workbook.add_worksheet().set_name("failures")?;
        sheet.write_string_with_format(0, 0, REPORT_NAME_HEADER, &bold)?;
        sheet.write_string_with_format(0, 1, "原因", &bold)?;
        for (index, failure) in report.failures.iter().enumerate() {
            let row = index as u32 + 1;
            sheet.write_string(row, 0, &failure.entity)?;
            sheet.write_string(row, 1, &failure.reason)?;
        }
    }

    let stale: Vec<_> = report.stale_entries().collect();
    if !stale.is_empty() {
        let sheet = workbook.add_worksheet().set_name("stale")?;
        sheet.write_string_with_format(0, 0, REPORT_NAME_HEADER, &bold)?;
        for (index, entry) in stale.iter().enumerate() {
            sheet.write_string(index as u32 + 1, 0, &entry.name)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_csv_report(path: &Path, report: &RosterReport) -> Result<(), SheetError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([REPORT_NAME_HEADER, REPORT_COST_HEADER])?;
    for entry in &report.entries {
        let cost = entry.total_cost.to_string();
        writer.write_record([entry.name.as_str(), cost.as_str()])?;
    }
    let total = report.grand_total.to_string();
    writer.write_record([REPORT_TOTAL_LABEL, total.as_str()])?;
    writer.flush()?;
    Ok(())
}

fn skip_reason_text(reason: &SkipReason) -> &str {
    match reason {
        SkipReason::UnresolvedName => "未找到等效理智",
        SkipReason::UnparsableQuantity(message) => message,
    }
}
