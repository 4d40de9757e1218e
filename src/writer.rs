use crate::types::{Column, FlatRow, FlattenConfig};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Excel rejects longer cell strings
const MAX_CELL_CHARS: usize = 32_767;

/// Worksheet row limit, less the header row
const MAX_SHEET_DATA_ROWS: usize = 1_048_575;

/// What a writer produced once finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteStats {
    pub rows: usize,
    pub sheets: usize,
}

/// Sink for flattened rows
pub trait TableWriter {
    fn write_row(&mut self, row: &FlatRow) -> Result<()>;

    /// Flush everything to the destination
    fn finish(self: Box<Self>) -> Result<WriteStats>;
}

/// Pick a writer from the output extension: `.csv`, `.jsonl`, otherwise a workbook
pub fn open_writer(path: &Path, config: &FlattenConfig) -> Result<Box<dyn TableWriter>> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    let writer: Box<dyn TableWriter> = match extension.as_deref() {
        Some("csv") => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create output file: {}", path.display()))?;
            Box::new(CsvTableWriter::new(BufWriter::new(file))?)
        }
        Some("jsonl") => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create output file: {}", path.display()))?;
            Box::new(JsonLinesWriter::new(BufWriter::new(file)))
        }
        _ => Box::new(WorkbookWriter::new(path, config.rows_per_sheet)?),
    };

    Ok(writer)
}

/// Writes an `.xlsx` workbook, starting a new sheet every `rows_per_sheet` rows
///
/// Sheets run in constant-memory mode: each finished row is flushed to a temp
/// file, so rows must arrive in order.
pub struct WorkbookWriter {
    workbook: Workbook,
    path: PathBuf,
    rows_per_sheet: usize,
    sheets: usize,
    rows_in_sheet: usize,
    rows: usize,
}

impl WorkbookWriter {
    pub fn new(path: impl Into<PathBuf>, rows_per_sheet: usize) -> Result<Self> {
        let mut writer = WorkbookWriter {
            workbook: Workbook::new(),
            path: path.into(),
            rows_per_sheet: rows_per_sheet.clamp(1, MAX_SHEET_DATA_ROWS),
            sheets: 0,
            rows_in_sheet: 0,
            rows: 0,
        };
        writer.add_sheet()?;
        Ok(writer)
    }

    fn add_sheet(&mut self) -> Result<()> {
        let name = format!("Sheet{}", self.sheets + 1);
        let sheet = self.workbook.add_worksheet_with_constant_memory();
        sheet
            .set_name(&name)
            .with_context(|| format!("Failed to name worksheet {}", name))?;
        for column in Column::ALL {
            sheet
                .write_string(0, column.index() as u16, column.as_str())
                .context("Failed to write header row")?;
        }

        self.sheets += 1;
        self.rows_in_sheet = 0;
        Ok(())
    }

    fn current_sheet(&mut self) -> Result<&mut Worksheet> {
        self.workbook
            .worksheet_from_index(self.sheets - 1)
            .context("Worksheet missing from workbook")
    }
}

impl TableWriter for WorkbookWriter {
    fn write_row(&mut self, row: &FlatRow) -> Result<()> {
        if self.rows_in_sheet == self.rows_per_sheet {
            self.add_sheet()?;
        }

        let row_num = (self.rows_in_sheet + 1) as u32;
        let sheet = self.current_sheet()?;
        for (column, value) in row.iter() {
            if value.is_empty() {
                continue;
            }
            sheet
                .write_string(row_num, column.index() as u16, truncate_cell(value))
                .with_context(|| format!("Failed to write cell {}", column.as_str()))?;
        }

        self.rows_in_sheet += 1;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<WriteStats> {
        let path = self.path.clone();
        self.workbook
            .save(&path)
            .with_context(|| format!("Failed to save workbook: {}", path.display()))?;

        Ok(WriteStats {
            rows: self.rows,
            sheets: self.sheets,
        })
    }
}

fn truncate_cell(value: &str) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Writes a single CSV table with a header row
pub struct CsvTableWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> CsvTableWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer
            .write_record(Column::ALL.iter().map(|c| c.as_str()))
            .context("Failed to write CSV header")?;
        Ok(CsvTableWriter { writer, rows: 0 })
    }
}

impl<W: Write> TableWriter for CsvTableWriter<W> {
    fn write_row(&mut self, row: &FlatRow) -> Result<()> {
        self.writer
            .write_record(row.values())
            .context("Failed to write CSV row")?;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<WriteStats> {
        self.writer.flush().context("Failed to flush CSV output")?;
        Ok(WriteStats {
            rows: self.rows,
            sheets: 1,
        })
    }
}

/// Writes one JSON object per row, keys in column order
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    rows: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesWriter { writer, rows: 0 }
    }
}

impl<W: Write> TableWriter for JsonLinesWriter<W> {
    fn write_row(&mut self, row: &FlatRow) -> Result<()> {
        let json = serde_json::to_string(row).context("Failed to serialize row")?;
        writeln!(self.writer, "{}", json).context("Failed to write row")?;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<WriteStats> {
        self.writer.flush().context("Failed to flush writer")?;
        Ok(WriteStats {
            rows: self.rows,
            sheets: 1,
        })
    }
}
