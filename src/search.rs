// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Candidate resolver and matcher.
//!
//! Classified query fields become equality constraints on interned ids; name
//! fragments become a tolerant match over the dataset's instructor
//! identities. A record qualifies when it satisfies every present constraint
//! (logical AND), the name constraint across any of its six instructor slots.
//!
//! Tolerant name matching is an explicit two-pass comparison, not fuzzy
//! string distance: the surname fragment must equal the stored surname, each
//! given-name fragment must be a prefix of the positionally corresponding
//! stored component, and the fragment sequence is tried in given order and
//! reversed to accommodate "Last, First" input. Precision here is a
//! correctness contract, not a heuristic.
//!
//! Ranking: semester recency descending (year, then Fall > Summer > Spring >
//! Winter; unparsable labels last), then subject, catalog number, and section
//! ascending. Deterministic and stable.

use std::collections::HashSet;

use crate::dataset::Dataset;
use crate::intern::LookupError;
use crate::query::{parse_query, semester_recency};
use crate::types::{GradeRecord, InstructorName, SearchResult, StringId};

/// Resolved equality constraints over interned ids.
#[derive(Debug, Clone, Copy, Default)]
struct Constraints {
    subject: Option<StringId>,
    catalog_number: Option<StringId>,
    section: Option<StringId>,
    semester: Option<StringId>,
}

impl Constraints {
    fn matches(&self, record: &GradeRecord) -> bool {
        self.subject.is_none_or(|id| record.subject == id)
            && self
                .catalog_number
                .is_none_or(|id| record.catalog_number == id)
            && self.section.is_none_or(|id| record.section == id)
            && self.semester.is_none_or(|id| record.semester == id)
    }
}

// ============================================================================
// TOLERANT NAME MATCHING
// ============================================================================

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn is_prefix_ignore_case(prefix: &str, of: &str) -> bool {
    of.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// One directional pass: last fragment is the surname, the rest are
/// given-name fragments matched positionally against the stored components.
/// Extra stored middle components never block a match.
fn fragments_match(fragments: &[String], stored: &str) -> bool {
    let parts: Vec<&str> = stored.split_whitespace().collect();
    let Some((&surname, given)) = parts.split_last() else {
        return false;
    };
    let Some((query_surname, query_given)) = fragments.split_last() else {
        return false;
    };

    if !eq_ignore_case(query_surname, surname) {
        return false;
    }
    if query_given.len() > given.len() {
        return false;
    }
    query_given
        .iter()
        .zip(given)
        .all(|(fragment, component)| is_prefix_ignore_case(fragment, component))
}

/// Whether the fragment sequence matches a stored instructor name, trying
/// both given order and reversed ("Cole, John" → "John Cole").
pub fn name_matches(fragments: &[String], stored: &str) -> bool {
    if fragments.is_empty() {
        return false;
    }
    if fragments_match(fragments, stored) {
        return true;
    }
    let reversed: Vec<String> = fragments.iter().rev().cloned().collect();
    fragments_match(&reversed, stored)
}

// ============================================================================
// SEARCH
// ============================================================================

/// Resolve a free-text query against the dataset and produce ranked,
/// denormalized results.
///
/// A constraint whose value was never interned yields an empty result set,
/// not an error. A `LookupError` during expansion is an internal-consistency
/// bug and is propagated, never defaulted.
pub fn search(dataset: &Dataset, raw_query: &str) -> Result<Vec<SearchResult>, LookupError> {
    let parsed = parse_query(raw_query, dataset);
    if parsed.is_empty() {
        return Ok(Vec::new());
    }

    let strings = dataset.strings();
    let mut constraints = Constraints::default();

    // Classified fields resolve through the interning table; an unknown
    // value cannot match anything.
    for (value, slot) in [
        (&parsed.subject, &mut constraints.subject),
        (&parsed.catalog_number, &mut constraints.catalog_number),
        (&parsed.section, &mut constraints.section),
        (&parsed.semester, &mut constraints.semester),
    ] {
        if let Some(text) = value {
            match strings.lookup(text) {
                Some(id) => *slot = Some(id),
                None => return Ok(Vec::new()),
            }
        }
    }

    // Name fragments resolve to the set of matching instructor ids.
    let name_ids: Option<HashSet<StringId>> = if parsed.name_fragments.is_empty() {
        None
    } else {
        let mut ids = HashSet::new();
        for id in dataset.instructor_ids() {
            let full = strings.resolve(id)?;
            if name_matches(&parsed.name_fragments, full) {
                ids.insert(id);
            }
        }
        Some(ids)
    };

    let hits = dataset.records().iter().filter(|record| {
        constraints.matches(record)
            && name_ids.as_ref().is_none_or(|ids| {
                record.instructor_ids().any(|id| ids.contains(&id))
            })
    });

    // Expand and attach sort keys in one pass so each id resolves once.
    let mut ranked: Vec<(Option<(u16, u8)>, SearchResult)> = Vec::new();
    for record in hits {
        let semester = strings.resolve(record.semester)?.to_string();
        let recency = semester_recency(&semester);
        let instructors = record
            .instructor_ids()
            .map(|id| strings.resolve(id).map(InstructorName::split))
            .collect::<Result<Vec<_>, _>>()?;

        ranked.push((
            recency,
            SearchResult {
                subject: strings.resolve(record.subject)?.to_string(),
                catalog_number: strings.resolve(record.catalog_number)?.to_string(),
                section: strings.resolve(record.section)?.to_string(),
                semester,
                instructors,
                counts: record.counts,
            },
        ));
    }

    // Recency descending (None last), then subject/catalog/section ascending.
    ranked.sort_by(|(a_recency, a), (b_recency, b)| {
        b_recency
            .cmp(a_recency)
            .then_with(|| a.subject.cmp(&b.subject))
            .then_with(|| a.catalog_number.cmp(&b.catalog_number))
            .then_with(|| a.section.cmp(&b.section))
    });

    Ok(ranked.into_iter().map(|(_, result)| result).collect())
}
