//! Row validation and normalization for one CSV file
//!
//! A file is read as comma-delimited text with the `csv` crate. The first
//! line is always discarded as a header, whatever its content. Each
//! remaining row is classified:
//!
//! - fewer than [`REQUIRED_FIELDS`] fields, or any field empty or
//!   whitespace-only: **skipped**
//! - otherwise: **valid**, normalized to the fields joined by commas with
//!   `,<date>` appended
//!
//! Every classified row increments the shared [`RowCounters`] exactly once.
//! Valid rows accumulate in file order and are returned as a single batch.

use crate::counters::RowCounters;
use crate::error::CsvError;
use csv::ReaderBuilder;
use std::path::{Component, Path};
use thiserror::Error;

/// Minimum number of fields a valid row must carry
pub const REQUIRED_FIELDS: usize = 10;

/// Sentinel date used when the directory path is too shallow to derive one
pub const UNKNOWN_DATE: &str = "Unknown";

/// Why a row was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    /// Row carries fewer fields than required
    #[error("row has {0} fields, expected at least {REQUIRED_FIELDS}")]
    TooFewFields(usize),

    /// A field is empty or whitespace-only
    #[error("field {0} is empty or whitespace-only")]
    BlankField(usize),
}

/// Classification of a single data row
#[derive(Debug, PartialEq, Eq)]
pub enum RowOutcome {
    /// Row is valid; carries its normalized output line
    Valid(String),

    /// Row was rejected
    Skipped(SkipReason),
}

/// Result of reading one CSV file
#[derive(Debug, Default)]
pub struct FileBatch {
    /// Normalized valid rows, in file order
    pub lines: Vec<String>,

    /// Valid rows in this file
    pub valid: u64,

    /// Skipped rows in this file
    pub skipped: u64,

    /// Set when a malformed record stopped the read early. Rows classified
    /// before the failure are kept; the remainder of the file contributes
    /// nothing.
    pub parse_error: Option<csv::Error>,
}

/// Classify one data row against the validation rules
pub fn classify_row(record: &csv::StringRecord, date: &str) -> RowOutcome {
    if record.len() < REQUIRED_FIELDS {
        return RowOutcome::Skipped(SkipReason::TooFewFields(record.len()));
    }

    if let Some(index) = record.iter().position(|field| field.trim().is_empty()) {
        return RowOutcome::Skipped(SkipReason::BlankField(index));
    }

    let mut line = record.iter().collect::<Vec<_>>().join(",");
    line.push(',');
    line.push_str(date);
    RowOutcome::Valid(line)
}

/// Derive the date tag for a directory from its last three path segments.
/// Shallower paths fail open to [`UNKNOWN_DATE`].
pub fn derive_date(dir: &Path) -> String {
    let segments: Vec<&str> = dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    if segments.len() < 3 {
        return UNKNOWN_DATE.to_string();
    }

    let tail = &segments[segments.len() - 3..];
    format!("{}/{}/{}", tail[0], tail[1], tail[2])
}

/// Read one CSV file, classifying every data row and tallying it into the
/// shared counters.
///
/// The header line is discarded unconditionally. A file that cannot be
/// opened contributes nothing and returns an error; a malformed record
/// mid-file stops the read but keeps the rows already classified (see
/// [`FileBatch::parse_error`]).
pub fn process_file(
    path: &Path,
    date: &str,
    counters: &RowCounters,
) -> Result<FileBatch, CsvError> {
    let file = std::fs::File::open(path).map_err(|e| CsvError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut batch = FileBatch::default();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                batch.parse_error = Some(e);
                break;
            }
        };

        match classify_row(&record, date) {
            RowOutcome::Valid(line) => {
                counters.record_valid();
                batch.valid += 1;
                batch.lines.push(line);
            }
            RowOutcome::Skipped(_) => {
                counters.record_skipped();
                batch.skipped += 1;
            }
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::StringRecord;
    use std::io::Write;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    const FULL_ROW: [&str; 10] = [
        "Jane", "Doe", "12", "Main St", "Ottawa", "ON", "K1A0B1", "Canada",
        "613-555-0100", "jane@example.com",
    ];

    #[test]
    fn test_valid_row_is_normalized() {
        let outcome = classify_row(&record(&FULL_ROW), "2023/10/05");
        let RowOutcome::Valid(line) = outcome else {
            panic!("expected valid row");
        };
        assert!(line.starts_with("Jane,Doe,12,"));
        assert!(line.ends_with(",jane@example.com,2023/10/05"));
    }

    #[test]
    fn test_short_row_is_skipped() {
        let outcome = classify_row(&record(&["a", "b", "c"]), "2023/10/05");
        assert_eq!(outcome, RowOutcome::Skipped(SkipReason::TooFewFields(3)));
    }

    #[test]
    fn test_blank_field_is_skipped() {
        let mut fields = FULL_ROW;
        fields[4] = "   ";
        let outcome = classify_row(&record(&fields), "2023/10/05");
        assert_eq!(outcome, RowOutcome::Skipped(SkipReason::BlankField(4)));

        fields[4] = "";
        let outcome = classify_row(&record(&fields), "2023/10/05");
        assert_eq!(outcome, RowOutcome::Skipped(SkipReason::BlankField(4)));
    }

    #[test]
    fn test_extra_fields_are_kept() {
        let mut fields = FULL_ROW.to_vec();
        fields.push("extra");
        let outcome = classify_row(&record(&fields), "2023/10/05");
        let RowOutcome::Valid(line) = outcome else {
            panic!("expected valid row");
        };
        assert!(line.ends_with(",extra,2023/10/05"));
    }

    #[test]
    fn test_derive_date_deep_path() {
        assert_eq!(derive_date(Path::new("/data/2023/10/05")), "2023/10/05");
        assert_eq!(derive_date(Path::new("a/b/2024/01/31")), "2024/01/31");
    }

    #[test]
    fn test_derive_date_shallow_path_fails_open() {
        assert_eq!(derive_date(Path::new("/data/2023")), UNKNOWN_DATE);
        assert_eq!(derive_date(Path::new("2023")), UNKNOWN_DATE);
        assert_eq!(derive_date(Path::new("/")), UNKNOWN_DATE);
    }

    #[test]
    fn test_process_file_counts_and_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CustomerData.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "FirstName,LastName,StreetNumber,Street,City,Province,PostalCode,Country,PhoneNumber,EmailAddress").unwrap();
        writeln!(file, "{}", FULL_ROW.join(",")).unwrap();
        writeln!(file, "too,short").unwrap();
        writeln!(file, "{}", FULL_ROW.join(",")).unwrap();
        drop(file);

        let counters = RowCounters::new();
        let batch = process_file(&path, "2023/10/05", &counters).unwrap();

        assert_eq!(batch.valid, 2);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.lines.len(), 2);
        assert!(batch.parse_error.is_none());
        assert_eq!(counters.valid(), 2);
        assert_eq!(counters.skipped(), 1);
        assert!(batch.lines[0].ends_with(",2023/10/05"));
    }

    #[test]
    fn test_process_file_header_discarded_even_if_data_shaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CustomerData.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        // First line looks like a valid data row but must still be dropped
        writeln!(file, "{}", FULL_ROW.join(",")).unwrap();
        writeln!(file, "{}", FULL_ROW.join(",")).unwrap();
        drop(file);

        let counters = RowCounters::new();
        let batch = process_file(&path, "2023/10/05", &counters).unwrap();

        assert_eq!(batch.valid, 1);
        assert_eq!(counters.total(), 1);
    }

    #[test]
    fn test_process_file_malformed_record_keeps_prior_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CustomerData.csv");

        // A record the reader cannot decode, between two good rows
        let mut content = Vec::new();
        content.extend_from_slice(b"FirstName,LastName,StreetNumber,Street,City,Province,PostalCode,Country,PhoneNumber,EmailAddress\n");
        content.extend_from_slice(format!("{}\n", FULL_ROW.join(",")).as_bytes());
        content.extend_from_slice(
            b"Jane,\xff\xfe,12,Main St,Ottawa,ON,K1A0B1,Canada,613,j@e.com\n",
        );
        content.extend_from_slice(format!("{}\n", FULL_ROW.join(",")).as_bytes());
        std::fs::write(&path, content).unwrap();

        let counters = RowCounters::new();
        let batch = process_file(&path, "2023/10/05", &counters).unwrap();

        // The row before the failure is kept; the rest of the file
        // contributes nothing, so lines and counters stay in step
        assert_eq!(batch.valid, 1);
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.lines.len(), 1);
        assert!(batch.parse_error.is_some());
        assert_eq!(counters.total(), 1);
    }

    #[test]
    fn test_process_file_missing() {
        let counters = RowCounters::new();
        let err = process_file(Path::new("/no/such/file.csv"), "x", &counters)
            .unwrap_err();
        assert!(matches!(err, CsvError::Open { .. }));
        assert_eq!(counters.total(), 0);
    }
}
