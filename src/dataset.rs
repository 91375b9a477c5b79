//! Ordered tabular collection of [`ArticleRecord`]s and its CSV persistence.
//!
//! A [`Dataset`] is what the accumulator builds from one run's queries and
//! what the merger loads from and writes back to disk. The column list is the
//! union of every column seen, in first-seen order, so the header written to
//! disk is stable across runs as long as sources keep their field order.
//!
//! # File format
//!
//! ```text
//! url,title,content,publishedAt
//! https://example.com/a,Title A,Body A,2024-07-14T12:00:00Z
//! https://example.com/b,Title B,,2024-07-14T13:00:00Z
//! ```
//!
//! Empty fields are read back as missing cells.

use crate::error::DatasetError;
use crate::models::ArticleRecord;
use itertools::Itertools;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<ArticleRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ArticleRecord>) -> Self {
        let mut dataset = Self::new();
        dataset.extend(records);
        dataset
    }

    /// Append a row, registering any columns not seen before.
    pub fn push(&mut self, record: ArticleRecord) {
        for column in record.columns() {
            if !self.columns.iter().any(|c| c == column) {
                self.columns.push(column.to_string());
            }
        }
        self.rows.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = ArticleRecord>) {
        for record in records {
            self.push(record);
        }
    }

    /// Rows of `self` followed by rows of `other`, relative order preserved.
    pub fn concat(mut self, other: Dataset) -> Dataset {
        for column in other.columns {
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
        self
    }

    /// Keep only the first row for each value of `key`. Rows lacking the key
    /// are grouped together, so at most one of them survives.
    ///
    /// Returns the number of rows removed.
    pub fn dedup_by_key(&mut self, key: &str) -> usize {
        let before = self.rows.len();
        self.rows = std::mem::take(&mut self.rows)
            .into_iter()
            .unique_by(|row| row.get(key).map(str::to_owned))
            .collect();
        before - self.rows.len()
    }

    /// Drop every row missing any of `required`. Returns the number removed.
    pub fn drop_incomplete<S: AsRef<str>>(&mut self, required: &[S]) -> usize {
        let before = self.rows.len();
        self.rows
            .retain(|row| required.iter().all(|column| row.has(column.as_ref())));
        before - self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ArticleRecord] {
        &self.rows
    }

    /// Values of `column` in row order, skipping rows where it is missing.
    pub fn values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows.iter().filter_map(move |row| row.get(column))
    }

    /// Parse CSV text with a header row. A zero-length input is an empty
    /// dataset with no columns.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let mut dataset = Dataset {
            columns: columns.clone(),
            rows: Vec::new(),
        };
        for result in reader.records() {
            let fields = result?;
            let record: ArticleRecord = columns
                .iter()
                .zip(fields.iter())
                .map(|(c, v)| (c.as_str(), v))
                .collect();
            dataset.rows.push(record);
        }
        Ok(dataset)
    }

    /// Render as CSV: header row, then one line per row with missing cells
    /// left empty.
    pub fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(self.columns.iter().map(|c| row.get(c).unwrap_or("")))?;
        }
        writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
    }

    /// Load the dataset at `path`. A missing file is an empty dataset; any
    /// other failure is returned.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, DatasetError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No existing dataset; starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(DatasetError::io(path, e)),
        };
        let dataset = Self::from_csv(&bytes).map_err(|e| DatasetError::csv(path, e))?;
        info!(rows = dataset.len(), columns = dataset.columns.len(), "Loaded existing dataset");
        Ok(dataset)
    }

    /// Overwrite `path` with this dataset.
    ///
    /// The CSV is written to a sibling `*.tmp` file and renamed over the
    /// target, so readers never observe a half-written file. Concurrent
    /// writers are not coordinated: the last rename wins.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn save(&self, path: &Path) -> Result<(), DatasetError> {
        let bytes = self.to_csv().map_err(|e| DatasetError::csv(path, e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DatasetError::io(parent, e))?;
        }

        let tmp = temp_path(path);
        debug!(tmp = %tmp.display(), bytes = bytes.len(), "Writing dataset");
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| DatasetError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(DatasetError::io(path, e));
        }

        info!(rows = self.len(), "Wrote dataset");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
