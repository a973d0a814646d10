//! Integration tests for csv-harvester
//!
//! Each test builds a real directory tree under a tempdir and runs the
//! coordinator end to end against it.

use csv_harvester::config::HarvestConfig;
use csv_harvester::sink::OUTPUT_HEADER;
use csv_harvester::summary::RunLogger;
use csv_harvester::walker::{ScanCoordinator, ScanResult};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const VALID_ROW: &str =
    "Jane,Doe,12,Main St,Ottawa,ON,K1A0B1,Canada,613-555-0100,jane@example.com";

fn config(root: &Path, output: &Path, log: &Path, workers: usize) -> HarvestConfig {
    HarvestConfig {
        root: root.to_path_buf(),
        output_path: output.to_path_buf(),
        log_path: log.to_path_buf(),
        worker_count: workers,
        queue_size: 256,
        file_prefix: "CustomerData".into(),
        file_extension: "csv".into(),
        show_progress: false,
        verbose: false,
    }
}

fn run_scan(root: &Path, output: &Path, log: &Path, workers: usize) -> ScanResult {
    let coordinator =
        ScanCoordinator::new(config(root, output, log, workers)).unwrap();
    coordinator.run(None).unwrap()
}

fn write_csv(path: &Path, rows: &[String]) {
    let mut file = fs::File::create(path).unwrap();
    writeln!(file, "FirstName,LastName,StreetNumber,Street,City,Province,PostalCode,Country,PhoneNumber,EmailAddress").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
}

fn data_lines(output: &Path) -> Vec<String> {
    let content = fs::read_to_string(output).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some(OUTPUT_HEADER));
    lines.map(str::to_string).collect()
}

#[test]
fn test_valid_and_skipped_rows_are_counted() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("2023").join("10").join("05");
    fs::create_dir_all(&data_dir).unwrap();

    write_csv(
        &data_dir.join("CustomerData1.csv"),
        &[
            VALID_ROW.to_string(),
            "too,short".to_string(),
            VALID_ROW.to_string(),
            "Jane,Doe, ,Main St,Ottawa,ON,K1A0B1,Canada,613,j@e.com".to_string(),
        ],
    );

    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");
    let result = run_scan(dir.path(), &output, &log, 4);

    assert_eq!(result.valid_rows, 2);
    assert_eq!(result.skipped_rows, 2);
    assert_eq!(result.valid_rows + result.skipped_rows, 4);
    assert_eq!(result.files_processed, 1);

    let lines = data_lines(&output);
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert!(line.ends_with(",2023/10/05"), "bad date tag: {}", line);
        assert!(line.starts_with("Jane,Doe,12,"));
    }
}

#[test]
fn test_non_matching_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("a").join("b").join("c");
    fs::create_dir_all(&data_dir).unwrap();

    write_csv(&data_dir.join("Orders.csv"), &[VALID_ROW.to_string()]);
    write_csv(&data_dir.join("CustomerData.txt"), &[VALID_ROW.to_string()]);
    write_csv(&data_dir.join("CustomerData.csv"), &[VALID_ROW.to_string()]);

    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");
    let result = run_scan(dir.path(), &output, &log, 2);

    assert_eq!(result.files_processed, 1);
    assert_eq!(result.valid_rows, 1);
}

#[test]
fn test_file_with_no_valid_rows_leaves_output_empty() {
    let dir = TempDir::new().unwrap();
    write_csv(
        &dir.path().join("CustomerData1.csv"),
        &["short".to_string(), "a,b,c,d".to_string()],
    );

    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");
    let result = run_scan(dir.path(), &output, &log, 2);

    assert_eq!(result.valid_rows, 0);
    assert_eq!(result.skipped_rows, 2);
    assert!(data_lines(&output).is_empty());
}

#[test]
fn test_rerun_truncates_output_but_appends_log() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("2023").join("11").join("20");
    fs::create_dir_all(&data_dir).unwrap();
    write_csv(
        &data_dir.join("CustomerData1.csv"),
        &[VALID_ROW.to_string(), VALID_ROW.to_string()],
    );

    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");
    let logger = RunLogger::new(&log);

    let first = run_scan(dir.path(), &output, &log, 2);
    logger.append(&first).unwrap();

    let second = run_scan(dir.path(), &output, &log, 2);
    logger.append(&second).unwrap();

    // Output holds only the second run's rows
    assert_eq!(data_lines(&output).len(), second.valid_rows as usize);
    assert_eq!(second.valid_rows, 2);

    // Log holds both records
    let log_content = fs::read_to_string(&log).unwrap();
    assert_eq!(log_content.matches("Log Entry: ").count(), 2);
    assert_eq!(log_content.matches("Total Valid Rows: 2").count(), 2);
}

#[test]
fn test_date_tag_uses_last_three_segments() {
    let dir = TempDir::new().unwrap();
    let shallow = dir.path().join("2024").join("01").join("15");
    let deep = shallow.join("region").join("east").join("ottawa");
    fs::create_dir_all(&deep).unwrap();

    write_csv(&shallow.join("CustomerData1.csv"), &[VALID_ROW.to_string()]);
    write_csv(&deep.join("CustomerData2.csv"), &[VALID_ROW.to_string()]);

    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");
    let result = run_scan(dir.path(), &output, &log, 4);
    assert_eq!(result.valid_rows, 2);

    let lines = data_lines(&output);
    let full_tags: HashSet<String> = lines
        .iter()
        .map(|l| {
            let fields: Vec<&str> = l.split(',').collect();
            fields[10].to_string()
        })
        .collect();
    assert!(full_tags.contains("2024/01/15"));
    assert!(full_tags.contains("region/east/ottawa"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_does_not_block_siblings() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("locked");
    let open = dir.path().join("open");
    fs::create_dir_all(&locked).unwrap();
    fs::create_dir_all(&open).unwrap();

    write_csv(&locked.join("CustomerData1.csv"), &[VALID_ROW.to_string()]);
    write_csv(&open.join("CustomerData2.csv"), &[VALID_ROW.to_string()]);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not apply to root; nothing to test in that case
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");
    let result = run_scan(dir.path(), &output, &log, 4);

    // Sibling still contributed; locked subtree contributed nothing
    assert_eq!(result.valid_rows, 1);
    assert!(result.errors >= 1);
    assert!(result.skipped_paths >= 1);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn test_concurrent_stress_no_lost_or_duplicated_rows() {
    let dir = TempDir::new().unwrap();

    let n_files = 32;
    let rows_per_file = 25;

    for i in 0..n_files {
        let sub = dir
            .path()
            .join(format!("region{}", i % 4))
            .join("2023")
            .join("10")
            .join(format!("{:02}", i % 8));
        fs::create_dir_all(&sub).unwrap();

        let rows: Vec<String> = (0..rows_per_file)
            .map(|j| {
                format!(
                    "First{i},Last{j},12,Main St,Ottawa,ON,K1A0B1,Canada,613-555-{i:02}{j:02},f{i}r{j}@example.com"
                )
            })
            .collect();
        write_csv(&sub.join(format!("CustomerData{}.csv", i)), &rows);
    }

    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");
    let result = run_scan(dir.path(), &output, &log, 8);

    let expected = (n_files * rows_per_file) as u64;
    assert_eq!(result.valid_rows, expected);
    assert_eq!(result.skipped_rows, 0);
    assert_eq!(result.files_processed, n_files as u64);

    let lines = data_lines(&output);
    assert_eq!(lines.len(), expected as usize);

    // Every line unique: nothing lost, nothing duplicated
    let unique: HashSet<&String> = lines.iter().collect();
    assert_eq!(unique.len(), expected as usize);
}

#[test]
fn test_within_file_order_is_preserved() {
    let dir = TempDir::new().unwrap();

    // Several files so batches interleave, one of them ordered
    for i in 0..4 {
        let rows: Vec<String> = (0..50)
            .map(|j| {
                format!(
                    "Ord{i},Seq{j:03},12,Main St,Ottawa,ON,K1A0B1,Canada,613,o{i}s{j}@example.com"
                )
            })
            .collect();
        write_csv(&dir.path().join(format!("CustomerData{}.csv", i)), &rows);
    }

    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");
    run_scan(dir.path(), &output, &log, 4);

    let lines = data_lines(&output);
    for i in 0..4 {
        let marker = format!("Ord{},", i);
        let seqs: Vec<&String> =
            lines.iter().filter(|l| l.starts_with(&marker)).collect();
        assert_eq!(seqs.len(), 50);
        let sorted = {
            let mut s = seqs.clone();
            s.sort();
            s
        };
        assert_eq!(seqs, sorted, "rows from one file must keep file order");
    }
}

#[test]
fn test_malformed_file_keeps_prior_rows_and_exact_counts() {
    let dir = TempDir::new().unwrap();

    // Healthy sibling file
    write_csv(&dir.path().join("CustomerData1.csv"), &[VALID_ROW.to_string()]);

    // One good row, then a record the reader cannot decode
    let mut content = Vec::new();
    content.extend_from_slice(b"FirstName,LastName,StreetNumber,Street,City,Province,PostalCode,Country,PhoneNumber,EmailAddress\n");
    content.extend_from_slice(format!("{}\n", VALID_ROW).as_bytes());
    content
        .extend_from_slice(b"Bad,\xff\xfe,12,Main St,Ottawa,ON,K1A0B1,Canada,613,b@e.com\n");
    content.extend_from_slice(format!("{}\n", VALID_ROW).as_bytes());
    fs::write(dir.path().join("CustomerData2.csv"), content).unwrap();

    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");
    let result = run_scan(dir.path(), &output, &log, 4);

    // The bad file contributes only its pre-failure row; the sibling is
    // unaffected, and output lines match the valid count exactly
    assert_eq!(result.valid_rows, 2);
    assert_eq!(result.files_processed, 2);
    assert!(result.errors >= 1);
    assert_eq!(data_lines(&output).len(), result.valid_rows as usize);
}

#[test]
fn test_output_header_written_even_for_empty_tree() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output.csv");
    let log = dir.path().join("harvest.log");

    let result = run_scan(dir.path(), &output, &log, 2);

    assert_eq!(result.valid_rows, 0);
    assert_eq!(result.files_processed, 0);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        format!("{}\n", OUTPUT_HEADER)
    );
}
