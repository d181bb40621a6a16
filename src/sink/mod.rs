pub mod input;

pub use input::{load_listings, InputListing};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

/// Project (column, value) pairs onto an explicit column order. Missing
/// columns come out empty; when a column appears more than once the last
/// value wins, so callers can append overriding pairs.
pub fn project(columns: &[&str], pairs: &[(String, String)]) -> Vec<String> {
    columns
        .iter()
        .map(|col| {
            pairs
                .iter()
                .rev()
                .find(|(name, _)| name == col)
                .map(|(_, value)| value.clone())
                .unwrap_or_default()
        })
        .collect()
}

/// One tabular output file with a fixed column order.
///
/// The harvester overwrites its table every run; the enricher appends so a
/// crash mid-run loses at most the in-flight record.
pub struct CsvTable {
    path: PathBuf,
    columns: Vec<&'static str>,
    delimiter: u8,
}

impl CsvTable {
    pub fn new(path: impl Into<PathBuf>, columns: &'static [&'static str], delimiter: u8) -> Self {
        Self {
            path: path.into(),
            columns: columns.to_vec(),
            delimiter,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(())
    }

    /// Replace the whole file: header first, then every row.
    pub fn overwrite(&self, rows: &[Vec<(String, String)>]) -> Result<()> {
        self.ensure_parent()?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        writer.write_record(&self.columns)?;
        for row in rows {
            writer.write_record(&project(&self.columns, row))?;
        }
        writer.flush()?;
        info!("Wrote {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }

    /// Open in append mode; the header is written only when the file is new.
    pub fn appender(&self) -> Result<CsvAppender> {
        self.ensure_parent()?;
        let file_exists = self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(file);
        if !file_exists {
            writer.write_record(&self.columns)?;
            writer.flush()?;
        }
        Ok(CsvAppender {
            writer,
            columns: self.columns.clone(),
        })
    }

    /// Ids already present in the file, for resumable runs. A missing file
    /// is simply an empty set.
    pub fn seen_ids(&self, id_column: &str) -> Result<HashSet<String>> {
        let mut seen = HashSet::new();
        if !self.path.exists() {
            return Ok(seen);
        }
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(file);
        let idx = reader
            .headers()?
            .iter()
            .position(|h| h == id_column)
            .unwrap_or(0);
        for record in reader.records() {
            let record = record?;
            if let Some(id) = record.get(idx) {
                if !id.is_empty() {
                    seen.insert(id.to_string());
                }
            }
        }
        Ok(seen)
    }
}

/// Incremental writer over an append-mode table. Each row is flushed as it
/// lands so progress survives an interrupted run.
pub struct CsvAppender {
    writer: csv::Writer<File>,
    columns: Vec<&'static str>,
}

impl CsvAppender {
    pub fn write_row(&mut self, pairs: &[(String, String)]) -> Result<()> {
        self.writer.write_record(&project(&self.columns, pairs))?;
        self.writer.flush()?;
        Ok(())
    }
}
