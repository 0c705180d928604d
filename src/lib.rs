// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Free-text search over university grade distribution archives.
//!
//! Two tightly coupled halves: an import pipeline that reconciles
//! inconsistent per-semester CSV schemas into one string-interned dataset,
//! and a query parser/matcher that classifies loosely structured tokens and
//! resolves them against it.
//!
//! # Architecture
//!
//! ```text
//! import-time:
//! ┌───────────┐    ┌────────────┐    ┌────────────┐    ┌─────────────┐
//! │ CSV files │───▶│ import.rs  │───▶│ intern.rs  │───▶│ dataset.rs  │
//! │ (per sem) │    │ (aliases,  │    │ (string ⇄  │    │ (records +  │
//! └───────────┘    │  builder)  │    │  id table) │    │  table)     │
//!                  └────────────┘    └────────────┘    └──────┬──────┘
//!                                                             │ binary.rs
//! query-time:                                                 ▼
//! ┌───────────┐    ┌────────────┐    ┌────────────┐    ┌─────────────┐
//! │ free text │───▶│ query.rs   │───▶│ search.rs  │───▶│ .gradex file│
//! │           │    │ (classify) │    │ (match,    │    │ (CRC32)     │
//! └───────────┘    └────────────┘    │  rank)     │    └─────────────┘
//!                                    └────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gradex::{import_dir, search, Dataset};
//!
//! let (dataset, report) = import_dir(Path::new("data/raw"))?;
//! dataset.save(Path::new("grades.gradex"))?;
//!
//! let dataset = Dataset::load(Path::new("grades.gradex"))?;
//! let results = search(&dataset, "cs 1337.001 fall 2019 jason smith")?;
//! ```

// Module declarations
pub mod binary;
pub mod cli;
mod dataset;
mod import;
mod intern;
mod query;
mod rating;
mod search;
mod types;

// Re-exports for public API
pub use dataset::{Dataset, DatasetError};
pub use import::{
    import_dir, normalize_section, reorder_name, ImportError, ImportReport, MalformedCount,
    RowRejection, CATALOG_NUMBER_ALIASES, W_ALIASES,
};
pub use intern::{LookupError, StringTable};
pub use query::{classify, parse_query, ParsedQuery, TokenKind, SEASONS};
pub use rating::{extract_rating, lookup_professor_rating, ProfessorRating, RatingLookup};
pub use search::{name_matches, search};
pub use types::{
    GradeCounts, GradeRecord, InstructorName, SearchResult, StringId, GRADE_LABELS,
    MAX_INSTRUCTORS,
};
