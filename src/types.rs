// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Core data model: grade records, outcome counts, and denormalized results.
//!
//! Everything the matcher reads is built from these types. A `GradeRecord`
//! references the interning table by id only; `SearchResult` is the expanded,
//! display-ready view produced fresh per query.

use serde::{Deserialize, Serialize};

/// Dense identifier assigned by the interning table.
pub type StringId = u32;

/// Maximum instructor slots per section. Source tables carry
/// `Instructor 1` through `Instructor 6`.
pub const MAX_INSTRUCTORS: usize = 6;

/// Outcome column labels, in record order.
pub const GRADE_LABELS: [&str; 19] = [
    "A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-", "D+", "D", "D-", "F", "CR", "NC", "P", "W",
    "I", "NF",
];

/// Aggregate letter/credit outcome counts for one section offering.
///
/// All counts are non-negative; a blank cell in the source data means zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCounts {
    pub a_plus: u32,
    pub a: u32,
    pub a_minus: u32,
    pub b_plus: u32,
    pub b: u32,
    pub b_minus: u32,
    pub c_plus: u32,
    pub c: u32,
    pub c_minus: u32,
    pub d_plus: u32,
    pub d: u32,
    pub d_minus: u32,
    pub f: u32,
    pub cr: u32,
    pub nc: u32,
    pub p: u32,
    pub w: u32,
    pub i: u32,
    pub nf: u32,
}

impl GradeCounts {
    /// Counts in `GRADE_LABELS` order.
    pub fn as_array(&self) -> [u32; 19] {
        [
            self.a_plus,
            self.a,
            self.a_minus,
            self.b_plus,
            self.b,
            self.b_minus,
            self.c_plus,
            self.c,
            self.c_minus,
            self.d_plus,
            self.d,
            self.d_minus,
            self.f,
            self.cr,
            self.nc,
            self.p,
            self.w,
            self.i,
            self.nf,
        ]
    }

    /// Build from counts in `GRADE_LABELS` order.
    pub fn from_array(values: [u32; 19]) -> Self {
        Self {
            a_plus: values[0],
            a: values[1],
            a_minus: values[2],
            b_plus: values[3],
            b: values[4],
            b_minus: values[5],
            c_plus: values[6],
            c: values[7],
            c_minus: values[8],
            d_plus: values[9],
            d: values[10],
            d_minus: values[11],
            f: values[12],
            cr: values[13],
            nc: values[14],
            p: values[15],
            w: values[16],
            i: values[17],
            nf: values[18],
        }
    }

    /// Total enrollments across every outcome column.
    pub fn total(&self) -> u32 {
        self.as_array().iter().sum()
    }
}

/// One course-section-semester offering with interned categorical ids.
///
/// Identity is the tuple (semester, subject, catalog_number, section).
/// Duplicate identities in the source data are preserved as-is; the builder
/// trusts its input. Immutable after import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub semester: StringId,
    pub subject: StringId,
    pub catalog_number: StringId,
    pub section: StringId,
    /// Zero to six listed instructors. Empty slots are `None`, never an
    /// interned empty string.
    pub instructors: [Option<StringId>; MAX_INSTRUCTORS],
    pub counts: GradeCounts,
}

impl GradeRecord {
    /// Iterate the occupied instructor slots in order.
    pub fn instructor_ids(&self) -> impl Iterator<Item = StringId> + '_ {
        self.instructors.iter().flatten().copied()
    }
}

/// An instructor's display name, split on the last whitespace boundary.
///
/// "Jason W Smith" → first `"Jason W"`, last `"Smith"`. A single-component
/// name has no first part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorName {
    pub first: Option<String>,
    pub last: String,
}

impl InstructorName {
    /// Split a stored full name into first/last parts.
    pub fn split(full: &str) -> Self {
        match full.trim().rsplit_once(char::is_whitespace) {
            Some((first, last)) => Self {
                first: Some(first.trim().to_string()),
                last: last.to_string(),
            },
            None => Self {
                first: None,
                last: full.trim().to_string(),
            },
        }
    }
}

/// Denormalized view of a matching `GradeRecord`: ids expanded to display
/// strings. Produced fresh per query; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub semester: String,
    pub subject: String,
    pub catalog_number: String,
    pub section: String,
    pub instructors: Vec<InstructorName>,
    pub counts: GradeCounts,
}
