// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The normalized dataset: grade records plus their interning table.
//!
//! Written once by the import pipeline, read many times by the matcher. The
//! dataset exclusively owns the string table and every record; query-time
//! resolution is read-only against the immutable structure, so concurrent
//! searches need no locking.
//!
//! Loading verifies magic, version, section lengths, and the CRC32 footer
//! before constructing anything. A failed load is fatal and surfaced to the
//! caller before any query can run; it is never disguised as "no matches".

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::binary::{
    decode_record, encode_record, DatasetFooter, DatasetHeader, MAX_FILE_SIZE, VERSION,
};
use crate::intern::StringTable;
use crate::types::{GradeRecord, StringId};

/// The dataset failed to load or decode.
#[derive(Debug)]
pub enum DatasetError {
    /// The file could not be read at all.
    Unavailable { path: PathBuf, source: io::Error },
    /// The file was read but is not a valid dataset (bad magic, version,
    /// checksum, or truncated sections).
    Format { path: PathBuf, source: io::Error },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Unavailable { path, source } => {
                write!(f, "dataset {} unavailable: {}", path.display(), source)
            }
            DatasetError::Format { path, source } => {
                write!(f, "dataset {} is corrupt: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Unavailable { source, .. } | DatasetError::Format { source, .. } => {
                Some(source)
            }
        }
    }
}

/// Grade records plus the interning table that gives their ids meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    strings: StringTable,
    records: Vec<GradeRecord>,
    /// Ids that appear in a subject position. The classifier checks query
    /// tokens against this set, not the whole table.
    subjects: HashSet<StringId>,
    /// Ids that appear in any instructor slot.
    instructors: HashSet<StringId>,
}

impl Dataset {
    /// Assemble a dataset, deriving the subject and instructor id sets.
    pub fn new(strings: StringTable, records: Vec<GradeRecord>) -> Self {
        let mut subjects = HashSet::new();
        let mut instructors = HashSet::new();
        for record in &records {
            subjects.insert(record.subject);
            instructors.extend(record.instructor_ids());
        }
        Self {
            strings,
            records,
            subjects,
            instructors,
        }
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn records(&self) -> &[GradeRecord] {
        &self.records
    }

    /// Whether the exact string is interned as a subject value.
    pub fn is_subject(&self, text: &str) -> bool {
        self.strings
            .lookup(text)
            .is_some_and(|id| self.subjects.contains(&id))
    }

    /// Every distinct instructor id in the dataset.
    pub fn instructor_ids(&self) -> impl Iterator<Item = StringId> + '_ {
        self.instructors.iter().copied()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Encode the full dataset file: header, string table, records, footer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut strings_buf = Vec::new();
        self.strings.encode(&mut strings_buf);

        let mut records_buf = Vec::new();
        for record in &self.records {
            encode_record(record, &mut records_buf);
        }

        let header = DatasetHeader {
            version: VERSION,
            flags: 0,
            string_count: self.strings.len() as u32,
            record_count: self.records.len() as u32,
            strings_len: strings_buf.len() as u32,
            records_len: records_buf.len() as u32,
        };

        let mut out = Vec::with_capacity(header.content_size() + DatasetFooter::SIZE);
        header.write(&mut out).expect("write to Vec cannot fail");
        out.extend_from_slice(&strings_buf);
        out.extend_from_slice(&records_buf);

        let footer = DatasetFooter {
            crc32: DatasetFooter::compute_crc32(&out),
        };
        footer.write(&mut out).expect("write to Vec cannot fail");
        out
    }

    /// Decode and validate a dataset file.
    pub fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() > MAX_FILE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("File size {} exceeds limit", bytes.len()),
            ));
        }

        let footer = DatasetFooter::read(bytes)?;
        let content = &bytes[..bytes.len() - DatasetFooter::SIZE];
        let actual_crc = DatasetFooter::compute_crc32(content);
        if footer.crc32 != actual_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "CRC mismatch: footer says {:08x}, content hashes to {:08x}",
                    footer.crc32, actual_crc
                ),
            ));
        }

        let header = DatasetHeader::read(&mut &content[..])?;
        if header.content_size() != content.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Section lengths sum to {} but file content is {} bytes",
                    header.content_size(),
                    content.len()
                ),
            ));
        }

        let strings_start = DatasetHeader::SIZE;
        let strings_end = strings_start + header.strings_len as usize;
        let (strings, consumed) = StringTable::decode(&content[strings_start..strings_end])?;
        if consumed != header.strings_len as usize || strings.len() != header.string_count as usize
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "String table does not match header counts",
            ));
        }

        let mut records = Vec::with_capacity(header.record_count as usize);
        let mut pos = strings_end;
        for _ in 0..header.record_count {
            let (record, consumed) = decode_record(&content[pos..], header.string_count)?;
            pos += consumed;
            records.push(record);
        }
        if pos != content.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Trailing bytes after last record",
            ));
        }

        Ok(Self::new(strings, records))
    }

    /// Write the dataset to disk as a single atomic unit.
    ///
    /// The file is encoded fully in memory and written in one call, so a
    /// partially-imported dataset is never persisted.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.to_bytes())
    }

    /// Load a dataset from disk, validating before constructing.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let bytes = fs::read(path).map_err(|source| DatasetError::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes).map_err(|source| DatasetError::Format {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GradeCounts, MAX_INSTRUCTORS};

    fn sample_dataset() -> Dataset {
        let mut strings = StringTable::new();
        let fall = strings.intern("Fall 2019");
        let smith = strings.intern("Jason W Smith");
        let cs = strings.intern("CS");
        let catalog = strings.intern("1337");
        let section = strings.intern("1");

        let mut instructors = [None; MAX_INSTRUCTORS];
        instructors[0] = Some(smith);

        let records = vec![GradeRecord {
            semester: fall,
            subject: cs,
            catalog_number: catalog,
            section,
            instructors,
            counts: GradeCounts::from_array([
                5, 12, 3, 4, 9, 2, 1, 6, 0, 0, 2, 0, 1, 0, 0, 0, 3, 0, 0,
            ]),
        }];

        Dataset::new(strings, records)
    }

    #[test]
    fn derived_sets_cover_records() {
        let dataset = sample_dataset();
        assert!(dataset.is_subject("CS"));
        assert!(!dataset.is_subject("Fall 2019"));
        assert!(!dataset.is_subject("HIST"));
        assert_eq!(dataset.instructor_ids().count(), 1);
    }

    #[test]
    fn bytes_round_trip() {
        let dataset = sample_dataset();
        let bytes = dataset.to_bytes();
        let decoded = Dataset::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, dataset);
    }

    #[test]
    fn corrupted_byte_fails_crc() {
        let dataset = sample_dataset();
        let mut bytes = dataset.to_bytes();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        assert!(Dataset::from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_file_fails() {
        let dataset = sample_dataset();
        let mut bytes = dataset.to_bytes();
        bytes.truncate(bytes.len() - 3);
        assert!(Dataset::from_bytes(&bytes).is_err());
    }

    #[test]
    fn oversized_string_length_fails_not_panics() {
        // A crafted file can carry a valid CRC over garbage sections; the
        // string-table length varint must not be trusted.
        use crate::binary::encode_varint;

        let mut strings_buf = Vec::new();
        encode_varint(1, &mut strings_buf);
        encode_varint(u64::MAX, &mut strings_buf);

        let header = DatasetHeader {
            version: VERSION,
            flags: 0,
            string_count: 1,
            record_count: 0,
            strings_len: strings_buf.len() as u32,
            records_len: 0,
        };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        bytes.extend_from_slice(&strings_buf);
        let footer = DatasetFooter {
            crc32: DatasetFooter::compute_crc32(&bytes),
        };
        footer.write(&mut bytes).unwrap();

        assert!(Dataset::from_bytes(&bytes).is_err());
    }

    #[test]
    fn load_missing_file_is_unavailable() {
        let err = Dataset::load(Path::new("/nonexistent/grades.gradex")).unwrap_err();
        assert!(matches!(err, DatasetError::Unavailable { .. }));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grades.gradex");

        let dataset = sample_dataset();
        dataset.save(&path).unwrap();
        let loaded = Dataset::load(&path).unwrap();
        assert_eq!(loaded, dataset);
    }
}
