// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! String interning table (dictionary-encoding style deduplication).
//!
//! Every categorical string in the dataset (subject code, catalog number,
//! section label, semester label, instructor full name) is stored once and
//! referenced everywhere by a dense integer id. Subject "CS" appearing ten
//! thousand times? Store it once. This is the same trick Parquet and Dremel
//! use for columnar compression.
//!
//! Ids are assigned in first-encounter order and never reused or renumbered,
//! so a fixed insertion sequence always reproduces the same table. The import
//! pipeline depends on that for idempotence.
//!
//! # Wire Format
//!
//! ```text
//! count: varint (number of entries)
//! for each entry:
//!   len: varint (string length in bytes)
//!   bytes: [u8; len] (UTF-8 string data)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io;

use crate::binary::{decode_varint, encode_varint, MAX_STRING_COUNT};
use crate::types::StringId;

/// Resolving an id that was never interned.
///
/// This is an internal-consistency bug, not a user error: the matcher only
/// holds ids it obtained from this table. Always fatal, never defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupError {
    pub id: StringId,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no interned string with id {}", self.id)
    }
}

impl std::error::Error for LookupError {}

/// Bidirectional string ⇄ id table with dense first-encounter numbering.
///
/// Populated once during import, read-only thereafter. Owned exclusively by
/// the dataset; tests construct independent tables per case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    /// Ordered list of unique strings; index = id
    strings: Vec<String>,
    /// Reverse lookup: string → id
    lookup: HashMap<String, StringId>,
}

impl StringTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string and return its id.
    ///
    /// Returns the existing id if the string was seen before, otherwise
    /// assigns the next sequential id.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }

        let id = self.strings.len() as StringId;
        assert!(
            id < MAX_STRING_COUNT,
            "String table overflow: cannot intern more than {} unique values",
            MAX_STRING_COUNT
        );

        self.strings.push(s.to_string());
        self.lookup.insert(s.to_string(), id);
        id
    }

    /// Probe for an existing id without interning.
    pub fn lookup(&self, s: &str) -> Option<StringId> {
        self.lookup.get(s).copied()
    }

    /// Resolve an id back to its string.
    pub fn resolve(&self, id: StringId) -> Result<&str, LookupError> {
        self.strings
            .get(id as usize)
            .map(String::as_str)
            .ok_or(LookupError { id })
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// All interned strings in id order.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Encode the table to a byte buffer.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        encode_varint(self.strings.len() as u64, buf);
        for s in &self.strings {
            let bytes = s.as_bytes();
            encode_varint(bytes.len() as u64, buf);
            buf.extend_from_slice(bytes);
        }
    }

    /// Decode a table from bytes, returning the table and bytes consumed.
    pub fn decode(data: &[u8]) -> io::Result<(Self, usize)> {
        let (count, mut pos) = decode_varint(data)?;
        if count > u64::from(MAX_STRING_COUNT) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("String count {} exceeds limit", count),
            ));
        }
        let count = count as usize;

        let mut strings = Vec::with_capacity(count);
        let mut lookup = HashMap::with_capacity(count);

        for id in 0..count {
            let (len, consumed) = decode_varint(&data[pos..])?;
            pos += consumed;

            // The length varint is attacker-controlled; compare against the
            // remaining bytes without computing pos + len, which can overflow.
            if len > (data.len() - pos) as u64 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Interned string extends past end of data",
                ));
            }
            let len = len as usize;

            let s = String::from_utf8(data[pos..pos + len].to_vec())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            pos += len;

            lookup.insert(s.clone(), id as StringId);
            strings.push(s);
        }

        Ok((Self { strings, lookup }, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn intern_assigns_dense_first_encounter_ids() {
        let mut table = StringTable::new();

        let cs = table.intern("CS");
        let hist = table.intern("HIST");
        let cs_again = table.intern("CS");

        assert_eq!(cs, 0);
        assert_eq!(hist, 1);
        assert_eq!(cs_again, 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn resolve_inverts_intern() {
        let mut table = StringTable::new();
        let id = table.intern("Fall 2019");
        assert_eq!(table.resolve(id).unwrap(), "Fall 2019");
    }

    #[test]
    fn resolve_unknown_id_fails() {
        let table = StringTable::new();
        assert_eq!(table.resolve(3), Err(LookupError { id: 3 }));
    }

    #[test]
    fn lookup_does_not_intern() {
        let table = StringTable::new();
        assert_eq!(table.lookup("CS"), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn identical_sequences_produce_identical_tables() {
        let build = || {
            let mut table = StringTable::new();
            for s in ["Fall 2019", "Jason W Smith", "CS", "1337", "1"] {
                table.intern(s);
            }
            table
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut table = StringTable::new();
        table.intern("CS");
        table.intern("1337");
        table.intern("Jason W Smith");

        let mut buf = Vec::new();
        table.encode(&mut buf);

        let (decoded, consumed) = StringTable::decode(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, table);
        assert_eq!(decoded.resolve(2).unwrap(), "Jason W Smith");
    }

    #[test]
    fn decode_rejects_oversized_length_varint() {
        // One entry whose declared length is far past the end of the data.
        // Must surface as an error, never as an arithmetic overflow.
        let mut buf = Vec::new();
        encode_varint(1, &mut buf);
        encode_varint(u64::MAX, &mut buf);
        assert!(StringTable::decode(&buf).is_err());

        // Same shape with a merely-too-large length
        let mut buf = Vec::new();
        encode_varint(1, &mut buf);
        encode_varint(100, &mut buf);
        buf.extend_from_slice(b"short");
        assert!(StringTable::decode(&buf).is_err());
    }

    #[test]
    fn decode_rejects_truncated_data() {
        let mut table = StringTable::new();
        table.intern("BCOM");
        let mut buf = Vec::new();
        table.encode(&mut buf);
        buf.truncate(buf.len() - 1);
        assert!(StringTable::decode(&buf).is_err());
    }

    proptest! {
        #[test]
        fn every_interned_id_resolves_back(values in prop::collection::vec("[A-Za-z0-9 ,.]{1,24}", 1..40)) {
            let mut table = StringTable::new();
            for value in &values {
                let id = table.intern(value);
                prop_assert_eq!(table.resolve(id).unwrap(), value.as_str());
            }
        }

        #[test]
        fn wire_round_trip_preserves_ids(values in prop::collection::vec("[^\\x00]{0,16}", 0..24)) {
            let mut table = StringTable::new();
            for value in &values {
                table.intern(value);
            }

            let mut buf = Vec::new();
            table.encode(&mut buf);
            let (decoded, consumed) = StringTable::decode(&buf).unwrap();
            prop_assert_eq!(consumed, buf.len());
            prop_assert_eq!(decoded, table);
        }
    }
}
