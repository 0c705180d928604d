// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Import pipeline: per-semester CSV tables → one normalized dataset.
//!
//! Source tables disagree on column names across data vintages ("Catalog
//! Number" vs "Catalog Nbr", "W" vs "Total W"), so every canonical field
//! resolves through an alias list, independently per row. Instructor names
//! arrive as "Last, First Middle" and are reordered to "First Middle Last"
//! before interning, so the same person collapses to one id across semester
//! files.
//!
//! The pass is strictly sequential: interned ids are assigned in
//! first-encounter order, and that order must be reproducible. Files are
//! processed in sorted name order (raw directory enumeration order varies by
//! OS and would break idempotence). A row missing a required field is
//! rejected and reported with file/row context; the rest of the batch
//! continues. File-level I/O and CSV errors abort the run.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::dataset::Dataset;
use crate::intern::StringTable;
use crate::types::{GradeCounts, GradeRecord, StringId, MAX_INSTRUCTORS};

/// Accepted names for the catalog number column, by vintage.
pub const CATALOG_NUMBER_ALIASES: [&str; 2] = ["Catalog Number", "Catalog Nbr"];

/// Accepted names for the withdrawal count column, by vintage.
///
/// Treated as the same semantic count, as the original data pipeline did.
/// TODO: confirm with the registrar data owners that "Total W" and "W" are
/// actually the same statistic before the next data refresh.
pub const W_ALIASES: [&str; 2] = ["W", "Total W"];

const INSTRUCTOR_COLUMNS: [&str; MAX_INSTRUCTORS] = [
    "Instructor 1",
    "Instructor 2",
    "Instructor 3",
    "Instructor 4",
    "Instructor 5",
    "Instructor 6",
];

/// A source row rejected because a required field had no alias present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub file: PathBuf,
    /// 1-based line number in the source file, counting the header row.
    pub row: usize,
    /// Canonical name of the missing field.
    pub field: &'static str,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: missing required field \"{}\"",
            self.file.display(),
            self.row,
            self.field
        )
    }
}

/// A count cell that was present but not a base-10 number.
///
/// The row is still imported with that count as zero; blank and missing
/// cells mean zero by contract, but a non-numeric value is a data problem
/// worth surfacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedCount {
    pub file: PathBuf,
    /// 1-based line number in the source file, counting the header row.
    pub row: usize,
    /// Canonical name of the count column.
    pub column: &'static str,
}

impl fmt::Display for MalformedCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: non-numeric value in count column \"{}\" treated as zero",
            self.file.display(),
            self.row,
            self.column
        )
    }
}

/// Summary of an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Source files processed.
    pub files: usize,
    /// Rows accepted into the dataset.
    pub rows: usize,
    /// Rows rejected for missing required fields.
    pub rejected: Vec<RowRejection>,
    /// Count cells imported as zero because their value was non-numeric.
    pub malformed: Vec<MalformedCount>,
}

/// A fatal import failure (file granularity, not row granularity).
#[derive(Debug)]
pub enum ImportError {
    Io { path: PathBuf, source: io::Error },
    Csv { path: PathBuf, source: csv::Error },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ImportError::Csv { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io { source, .. } => Some(source),
            ImportError::Csv { source, .. } => Some(source),
        }
    }
}

// ============================================================================
// NORMALIZATION HELPERS
// ============================================================================

/// Reorder a raw instructor name from "Last, First[ Middle]" to
/// "First[ Middle] Last".
///
/// A value with no comma is taken as a bare surname and kept as-is.
pub fn reorder_name(raw: &str) -> String {
    match raw.split_once(',') {
        Some((last, first)) => {
            let first = first.trim();
            let last = last.trim();
            if first.is_empty() {
                last.to_string()
            } else {
                format!("{} {}", first, last)
            }
        }
        None => raw.trim().to_string(),
    }
}

/// Normalize a section label before interning.
///
/// Purely numeric labels lose leading zeros ("001" → "1"); alphanumeric
/// labels ("0U1", "HON") are preserved verbatim. The query classifier applies
/// the same rule, so interned-id equality holds between the two sides.
pub fn normalize_section(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        let stripped = raw.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        raw.to_string()
    }
}

// ============================================================================
// COLUMN ALIAS RESOLUTION
// ============================================================================

/// One source row viewed through the header of its own file.
///
/// Alias resolution is per-row/per-table; nothing is assumed consistent
/// across the whole import run.
struct RowView<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl RowView<'_> {
    /// The trimmed, non-empty value of a directly-named column, if present.
    fn get(&self, name: &str) -> Option<&str> {
        let index = *self.columns.get(name)?;
        let value = self.record.get(index)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// The first value found among a field's known aliases.
    fn first_of(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|name| self.get(name))
    }

    /// A count column parsed as base-10. Blank or missing means zero; a
    /// present but non-numeric value also means zero and is recorded in
    /// `malformed` under the column's canonical name.
    fn count(&self, name: &'static str, malformed: &mut Vec<&'static str>) -> u32 {
        match self.get(name) {
            None => 0,
            Some(value) => value.parse().unwrap_or_else(|_| {
                malformed.push(name);
                0
            }),
        }
    }

    fn count_of(&self, aliases: &[&'static str], malformed: &mut Vec<&'static str>) -> u32 {
        match self.first_of(aliases) {
            None => 0,
            Some(value) => value.parse().unwrap_or_else(|_| {
                malformed.push(aliases[0]);
                0
            }),
        }
    }
}

// ============================================================================
// RECORD BUILDER
// ============================================================================

/// Build one grade record from a resolved row and its semester context.
///
/// On success the row's categorical values are interned; interning order
/// (instructors 1–6, then subject, catalog number, section) matches the
/// original numbering so re-imports reproduce identical ids. Required fields
/// are checked before anything is interned, so a rejected row leaves the
/// table untouched.
fn build_record(
    row: &RowView<'_>,
    semester: StringId,
    strings: &mut StringTable,
    malformed: &mut Vec<&'static str>,
) -> Result<GradeRecord, &'static str> {
    let subject_raw = row.get("Subject").ok_or("Subject")?;
    let catalog_raw = row.first_of(&CATALOG_NUMBER_ALIASES).ok_or("Catalog Number")?;
    let section_raw = row.get("Section").ok_or("Section")?;

    let mut instructors = [None; MAX_INSTRUCTORS];
    for (slot, column) in INSTRUCTOR_COLUMNS.iter().enumerate() {
        instructors[slot] = row.get(column).map(|raw| strings.intern(&reorder_name(raw)));
    }

    let subject = strings.intern(subject_raw);
    let catalog_number = strings.intern(catalog_raw);
    let section = strings.intern(&normalize_section(section_raw));

    let counts = GradeCounts {
        a_plus: row.count("A+", malformed),
        a: row.count("A", malformed),
        a_minus: row.count("A-", malformed),
        b_plus: row.count("B+", malformed),
        b: row.count("B", malformed),
        b_minus: row.count("B-", malformed),
        c_plus: row.count("C+", malformed),
        c: row.count("C", malformed),
        c_minus: row.count("C-", malformed),
        d_plus: row.count("D+", malformed),
        d: row.count("D", malformed),
        d_minus: row.count("D-", malformed),
        f: row.count("F", malformed),
        cr: row.count("CR", malformed),
        nc: row.count("NC", malformed),
        p: row.count("P", malformed),
        w: row.count_of(&W_ALIASES, malformed),
        i: row.count("I", malformed),
        nf: row.count("NF", malformed),
    };

    Ok(GradeRecord {
        semester,
        subject,
        catalog_number,
        section,
        instructors,
        counts,
    })
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Import every table in a directory into one normalized dataset.
///
/// The file base name (minus extension) is the semester's raw label. Files
/// are processed one at a time in sorted name order; running the pipeline
/// twice over unchanged input yields an identical dataset.
pub fn import_dir(dir: &Path) -> Result<(Dataset, ImportReport), ImportError> {
    let entries = fs::read_dir(dir).map_err(|source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ImportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut strings = StringTable::new();
    let mut records = Vec::new();
    let mut report = ImportReport::default();

    for path in paths {
        let semester_label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let semester = strings.intern(&semester_label);

        let mut reader = csv::Reader::from_path(&path).map_err(|source| ImportError::Csv {
            path: path.clone(),
            source,
        })?;

        let headers = reader
            .headers()
            .map_err(|source| ImportError::Csv {
                path: path.clone(),
                source,
            })?
            .clone();
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name.trim().to_string(), index))
            .collect();

        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|source| ImportError::Csv {
                path: path.clone(),
                source,
            })?;
            let row = RowView {
                columns: &columns,
                record: &record,
            };

            let mut malformed = Vec::new();
            match build_record(&row, semester, &mut strings, &mut malformed) {
                Ok(grade) => {
                    records.push(grade);
                    report.rows += 1;
                    for column in malformed {
                        report.malformed.push(MalformedCount {
                            file: path.clone(),
                            row: index + 2, // 1-based, after the header row
                            column,
                        });
                    }
                }
                Err(field) => report.rejected.push(RowRejection {
                    file: path.clone(),
                    row: index + 2,
                    field,
                }),
            }
        }

        report.files += 1;
    }

    Ok((Dataset::new(strings, records), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reorder_name_handles_middle_initial() {
        assert_eq!(reorder_name("Smith, Jason W"), "Jason W Smith");
        assert_eq!(reorder_name("Cole, John"), "John Cole");
    }

    #[test]
    fn reorder_name_without_comma_is_surname_only() {
        assert_eq!(reorder_name("Cher"), "Cher");
        assert_eq!(reorder_name("Cole,"), "Cole");
    }

    #[test]
    fn normalize_section_strips_leading_zeros_on_numeric() {
        assert_eq!(normalize_section("001"), "1");
        assert_eq!(normalize_section("502"), "502");
        assert_eq!(normalize_section("000"), "0");
    }

    #[test]
    fn normalize_section_keeps_alphanumeric_verbatim() {
        assert_eq!(normalize_section("0U1"), "0U1");
        assert_eq!(normalize_section("HON"), "HON");
    }

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn aliased_columns_resolve_per_file() {
        let dir = tempfile::tempdir().unwrap();
        // One vintage per file: "Catalog Nbr"/"Total W" vs "Catalog Number"/"W"
        write_file(
            dir.path(),
            "Fall 2019.csv",
            "Subject,Catalog Nbr,Section,A,F,Total W,Instructor 1\n\
             CS,1337,001,20,2,3,\"Smith, Jason W\"\n",
        );
        write_file(
            dir.path(),
            "Spring 2018.csv",
            "Subject,Catalog Number,Section,A,F,W,Instructor 1\n\
             HIST,1301,002,15,1,2,\"Brown, Emily\"\n",
        );

        let (dataset, report) = import_dir(dir.path()).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.rows, 2);
        assert!(report.rejected.is_empty());

        for record in dataset.records() {
            assert!(record.counts.w > 0);
            assert!(dataset.strings().resolve(record.catalog_number).is_ok());
        }
    }

    #[test]
    fn missing_required_field_rejects_row_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "Fall 2019.csv",
            "Subject,Catalog Number,Section,A\n\
             CS,1337,001,20\n\
             ,1337,002,10\n\
             CS,,003,5\n\
             CS,2305,004,8\n",
        );

        let (dataset, report) = import_dir(dir.path()).unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(dataset.records().len(), 2);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].row, 3);
        assert_eq!(report.rejected[0].field, "Subject");
        assert_eq!(report.rejected[1].row, 4);
        assert_eq!(report.rejected[1].field, "Catalog Number");
    }

    #[test]
    fn blank_counts_parse_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "Fall 2019.csv",
            "Subject,Catalog Number,Section,A,B,F\n\
             CS,1337,001,,,\n",
        );

        let (dataset, report) = import_dir(dir.path()).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(record.counts.a, 0);
        assert_eq!(record.counts.b, 0);
        assert_eq!(record.counts.f, 0);
        // Blank means zero by contract, not a data problem
        assert!(report.malformed.is_empty());
    }

    #[test]
    fn non_numeric_count_imports_as_zero_and_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "Fall 2019.csv",
            "Subject,Catalog Number,Section,A,Total W\n\
             CS,1337,001,abc,3\n\
             CS,2305,002,10,n/a\n",
        );

        let (dataset, report) = import_dir(dir.path()).unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(dataset.records()[0].counts.a, 0);
        assert_eq!(dataset.records()[0].counts.w, 3);
        assert_eq!(dataset.records()[1].counts.a, 10);
        assert_eq!(dataset.records()[1].counts.w, 0);

        assert_eq!(report.malformed.len(), 2);
        assert_eq!(report.malformed[0].row, 2);
        assert_eq!(report.malformed[0].column, "A");
        assert_eq!(report.malformed[1].row, 3);
        // Aliased columns report under the canonical name
        assert_eq!(report.malformed[1].column, "W");
    }

    #[test]
    fn empty_instructor_slots_are_none_not_interned() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "Fall 2019.csv",
            "Subject,Catalog Number,Section,Instructor 1,Instructor 2\n\
             CS,1337,001,\"Smith, Jason W\",\n",
        );

        let (dataset, _) = import_dir(dir.path()).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(record.instructor_ids().count(), 1);
        // "" must never be interned
        assert_eq!(dataset.strings().lookup(""), None);
    }

    #[test]
    fn same_instructor_across_files_shares_one_id() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Fall 2019.csv", "Spring 2020.csv"] {
            write_file(
                dir.path(),
                name,
                "Subject,Catalog Number,Section,Instructor 1\n\
                 CS,1337,001,\"Smith, Jason W\"\n",
            );
        }

        let (dataset, _) = import_dir(dir.path()).unwrap();
        let ids: Vec<_> = dataset
            .records()
            .iter()
            .flat_map(|r| r.instructor_ids())
            .collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ids[1]);
        assert_eq!(
            dataset.strings().resolve(ids[0]).unwrap(),
            "Jason W Smith"
        );
    }

    #[test]
    fn import_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "Fall 2019.csv",
            "Subject,Catalog Nbr,Section,A,Total W,Instructor 1\n\
             CS,1337,001,20,3,\"Smith, Jason W\"\n\
             BCOM,3310,HON,12,1,\"Lawson, Kristen A\"\n",
        );
        write_file(
            dir.path(),
            "Spring 2018.csv",
            "Subject,Catalog Number,Section,A,W,Instructor 1\n\
             HIST,1301,001,15,2,\"Brown, Emily\"\n",
        );

        let (first, _) = import_dir(dir.path()).unwrap();
        let (second, _) = import_dir(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_bytes(), second.to_bytes());
    }
}
