// ============================================================
// Layer 4 — CSV Dataset Loader
// ============================================================
// Reads the review table from a local CSV file or an HTTP(S)
// URL into memory, and writes partitions back out.
//
// The csv crate deserialises each row straight into a
// ReviewRecord through serde, so a missing `review` or
// `sentiment` column fails at load time with the row number.
//
// Reference: csv crate documentation (serde support)

use std::{fs, io::Read, path::Path};

use crate::domain::review::ReviewRecord;
use crate::domain::traits::DatasetSource;
use crate::error::{PipelineError, Result};

/// A CSV table addressed by a local path or an http(s) URL.
pub struct CsvSource {
    location: String,
}

impl CsvSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self { location: location.into() }
    }

    fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }

    fn fetch_remote(&self) -> Result<Vec<u8>> {
        tracing::debug!(url = %self.location, "Fetching remote CSV");
        let response = reqwest::blocking::get(&self.location)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PipelineError::DataNotFound(self.location.clone()));
        }
        let bytes = response.error_for_status()?.bytes()?;
        Ok(bytes.to_vec())
    }

    fn read_local(&self) -> Result<Vec<u8>> {
        let path = Path::new(&self.location);
        if !path.is_file() {
            return Err(PipelineError::DataNotFound(self.location.clone()));
        }
        Ok(fs::read(path)?)
    }
}

impl DatasetSource for CsvSource {
    fn load_all(&self) -> Result<Vec<ReviewRecord>> {
        let bytes = if self.is_remote() { self.fetch_remote()? } else { self.read_local()? };
        let records = read_records(bytes.as_slice())?;
        tracing::info!(source = %self.location, rows = records.len(), "Loaded CSV data");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}

/// Parse review rows from any CSV reader (header row required).
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ReviewRecord>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    rdr.deserialize::<ReviewRecord>()
        .map(|row| row.map_err(PipelineError::from))
        .collect()
}

/// Write rows to `path` as CSV with a header, creating parent dirs.
pub fn write_records(path: impl AsRef<Path>, records: &[ReviewRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;

    tracing::debug!(path = %path.display(), rows = records.len(), "Wrote CSV data");
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_raw_table_without_label_column() {
        let csv = "review,sentiment\n\"Great, loved it\",positive\nDull,negative\n";
        let rows = read_records(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].review, "Great, loved it");
        assert_eq!(rows[0].sentiment, "positive");
        assert_eq!(rows[0].label, None);
    }

    #[test]
    fn test_reads_label_column_when_present() {
        let csv = "review,sentiment,label\nok,positive,1\n";
        let rows = read_records(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].label, Some(1));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "text,sentiment\nok,positive\n";
        assert!(read_records(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_write_then_load_from_disk() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("train.csv");
        let rows = vec![
            ReviewRecord::new("fine film", "positive").with_label(1),
            ReviewRecord::new("bad film", "negative").with_label(0),
        ];
        write_records(&path, &rows).unwrap();

        let loaded = CsvSource::new(path.to_string_lossy()).load_all().unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_missing_file_is_reported_with_path() {
        let err = CsvSource::new("does/not/exist.csv").load_all().unwrap_err();
        assert!(matches!(err, PipelineError::DataNotFound(ref p) if p == "does/not/exist.csv"));
    }
}
