// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Query tokenizer and token classifier.
//!
//! A query is loosely structured text: "cs 1337.001 fall 2019 jason smith"
//! carries a subject, catalog number, section, semester, and name fragments
//! in no guaranteed order. Tokens have overlapping shapes (a 4-digit token
//! could be a catalog number or a year, a bare word could be a subject prefix
//! or a surname), so classification is positional and membership-driven, and
//! every token gets exactly one tag.
//!
//! Classification order matters: semester pairs are recognized before the
//! section rule so "fall" after a catalog number is never eaten as a section
//! label. Whatever survives classification is the name-fragment pool, in
//! original query order.

use crate::dataset::Dataset;

/// Season words accepted in semester position, in within-year calendar order.
pub const SEASONS: [&str; 4] = ["Winter", "Spring", "Summer", "Fall"];

/// One classified token. Every token of the query yields exactly one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Uppercased subject code, confirmed against the interned subject set.
    Subject(String),
    /// 3–4 digit course identifier following the subject.
    CatalogNumber(String),
    /// Normalized section label (numeric zeros stripped, alphanumeric verbatim).
    Section(String),
    /// Canonical semester label, "Fall 2019".
    Semester(String),
    /// Anything else: a candidate professor-name fragment.
    NameFragment(String),
}

/// The transient, per-search parse of a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub subject: Option<String>,
    pub catalog_number: Option<String>,
    pub section: Option<String>,
    pub semester: Option<String>,
    /// Unclassified tokens in original order, trailing commas stripped.
    pub name_fragments: Vec<String>,
}

impl ParsedQuery {
    /// No classified fields and no name fragments: nothing to match.
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.catalog_number.is_none()
            && self.section.is_none()
            && self.semester.is_none()
            && self.name_fragments.is_empty()
    }

    /// A query with no subject token but two or more name fragments.
    pub fn is_professor_only(&self) -> bool {
        self.subject.is_none() && self.name_fragments.len() >= 2
    }
}

// ============================================================================
// TOKEN SHAPES
// ============================================================================

fn is_catalog_shaped(token: &str) -> bool {
    (3..=4).contains(&token.len()) && token.chars().all(|c| c.is_ascii_digit())
}

fn is_subject_shaped(token: &str) -> bool {
    (2..=5).contains(&token.len()) && token.chars().all(|c| c.is_ascii_alphabetic())
}

/// Standalone section labels are short alphanumeric tokens ("001", "0U1",
/// "HON"). The length cap keeps 4-digit years and most surnames out.
fn is_section_shaped(token: &str) -> bool {
    (1..=3).contains(&token.len()) && token.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_plausible_year(token: &str) -> bool {
    token.len() == 4
        && token.chars().all(|c| c.is_ascii_digit())
        && token
            .parse::<u16>()
            .is_ok_and(|year| (1900..=2099).contains(&year))
}

/// Canonical season name for a token, case-insensitive.
fn season_name(token: &str) -> Option<&'static str> {
    SEASONS
        .iter()
        .find(|season| season.eq_ignore_ascii_case(token))
        .copied()
}

/// Sort key for semester recency: (year, within-year season rank).
/// Unparsable labels yield None and rank last.
pub(crate) fn semester_recency(label: &str) -> Option<(u16, u8)> {
    let (season, year) = label.split_once(' ')?;
    let rank = SEASONS
        .iter()
        .position(|s| s.eq_ignore_ascii_case(season))? as u8;
    let year = year.parse().ok()?;
    Some((year, rank))
}

// ============================================================================
// TOKENIZER
// ============================================================================

/// A raw token plus whether it was attached to a catalog-shaped token by `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawToken {
    text: String,
    dotted: bool,
}

/// Split on whitespace, and on `.` when it immediately follows a
/// catalog-number-shaped token ("1337.001" → "1337", "001").
fn tokenize(raw: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    for word in raw.split_whitespace() {
        match word.split_once('.') {
            Some((head, tail)) if is_catalog_shaped(head) && !tail.is_empty() => {
                tokens.push(RawToken {
                    text: head.to_string(),
                    dotted: false,
                });
                tokens.push(RawToken {
                    text: tail.to_string(),
                    dotted: true,
                });
            }
            _ => tokens.push(RawToken {
                text: word.to_string(),
                dotted: false,
            }),
        }
    }
    tokens
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Tag every token of the query. Total: each token gets exactly one tag.
pub fn classify(raw: &str, dataset: &Dataset) -> Vec<TokenKind> {
    let tokens = tokenize(raw);
    let mut tags: Vec<TokenKind> = Vec::with_capacity(tokens.len());

    let mut have_subject = false;
    let mut have_catalog = false;
    let mut have_section = false;
    let mut have_semester = false;

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];

        // Semester pair: season word + plausible year. Checked first so a
        // season word after a catalog number is not mistaken for a section.
        if !have_semester {
            if let Some(season) = season_name(&token.text) {
                if let Some(year) = tokens.get(i + 1).filter(|t| is_plausible_year(&t.text)) {
                    tags.push(TokenKind::Semester(format!("{} {}", season, year.text)));
                    have_semester = true;
                    i += 2;
                    continue;
                }
            }
        }

        // Section attached by `.`: the previous token was catalog-shaped.
        if token.dotted && !have_section && matches!(tags.last(), Some(TokenKind::CatalogNumber(_)))
        {
            tags.push(TokenKind::Section(crate::import::normalize_section(
                &token.text,
            )));
            have_section = true;
            i += 1;
            continue;
        }

        // Subject: short alphabetic token whose uppercase form is interned
        // as a subject value.
        if !have_subject && is_subject_shaped(&token.text) {
            let upper = token.text.to_ascii_uppercase();
            if dataset.is_subject(&upper) {
                tags.push(TokenKind::Subject(upper));
                have_subject = true;
                i += 1;
                continue;
            }
        }

        // Catalog number: 3–4 digits immediately following the subject.
        if !have_catalog
            && is_catalog_shaped(&token.text)
            && matches!(tags.last(), Some(TokenKind::Subject(_)))
        {
            tags.push(TokenKind::CatalogNumber(token.text.clone()));
            have_catalog = true;
            i += 1;
            continue;
        }

        // Standalone section immediately following the catalog number.
        if !have_section
            && is_section_shaped(&token.text)
            && matches!(tags.last(), Some(TokenKind::CatalogNumber(_)))
        {
            tags.push(TokenKind::Section(crate::import::normalize_section(
                &token.text,
            )));
            have_section = true;
            i += 1;
            continue;
        }

        // Everything left over is a name fragment.
        let fragment = token.text.trim_matches(',').to_string();
        tags.push(TokenKind::NameFragment(fragment));
        i += 1;
    }

    tags
}

/// Parse a free-text query against the dataset's known value sets.
pub fn parse_query(raw: &str, dataset: &Dataset) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();
    for tag in classify(raw, dataset) {
        match tag {
            TokenKind::Subject(s) => parsed.subject = Some(s),
            TokenKind::CatalogNumber(s) => parsed.catalog_number = Some(s),
            TokenKind::Section(s) => parsed.section = Some(s),
            TokenKind::Semester(s) => parsed.semester = Some(s),
            TokenKind::NameFragment(s) => {
                if !s.is_empty() {
                    parsed.name_fragments.push(s);
                }
            }
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::StringTable;
    use crate::types::{GradeCounts, GradeRecord, MAX_INSTRUCTORS};

    /// Minimal dataset with CS, BCOM, and HIST interned as subject values.
    fn dataset_with_subjects() -> Dataset {
        let mut strings = StringTable::new();
        let mut records = Vec::new();
        for subject in ["CS", "BCOM", "HIST"] {
            let semester = strings.intern("Fall 2019");
            let subject = strings.intern(subject);
            let catalog_number = strings.intern("1337");
            let section = strings.intern("1");
            records.push(GradeRecord {
                semester,
                subject,
                catalog_number,
                section,
                instructors: [None; MAX_INSTRUCTORS],
                counts: GradeCounts::default(),
            });
        }
        Dataset::new(strings, records)
    }

    #[test]
    fn subject_and_catalog_number() {
        let dataset = dataset_with_subjects();
        let parsed = parse_query("CS 1337", &dataset);
        assert_eq!(parsed.subject.as_deref(), Some("CS"));
        assert_eq!(parsed.catalog_number.as_deref(), Some("1337"));
        assert!(parsed.name_fragments.is_empty());
    }

    #[test]
    fn subject_matching_is_case_insensitive() {
        let dataset = dataset_with_subjects();
        let lower = parse_query("cs 1337", &dataset);
        let upper = parse_query("CS 1337", &dataset);
        assert_eq!(lower, upper);
    }

    #[test]
    fn dotted_section_is_split_and_normalized() {
        let dataset = dataset_with_subjects();
        let parsed = parse_query("CS 1337.001", &dataset);
        assert_eq!(parsed.section.as_deref(), Some("1"));

        let parsed = parse_query("CS 1337.0U1", &dataset);
        assert_eq!(parsed.section.as_deref(), Some("0U1"));

        let parsed = parse_query("BCOM 3310.HON", &dataset);
        assert_eq!(parsed.subject.as_deref(), Some("BCOM"));
        assert_eq!(parsed.section.as_deref(), Some("HON"));
    }

    #[test]
    fn standalone_section_follows_catalog_number() {
        let dataset = dataset_with_subjects();
        let parsed = parse_query("HIST 1301 001", &dataset);
        assert_eq!(parsed.catalog_number.as_deref(), Some("1301"));
        assert_eq!(parsed.section.as_deref(), Some("1"));
    }

    #[test]
    fn semester_pair_wins_over_section_rule() {
        let dataset = dataset_with_subjects();
        let parsed = parse_query("CS 1337 fall 2019", &dataset);
        assert_eq!(parsed.section, None);
        assert_eq!(parsed.semester.as_deref(), Some("Fall 2019"));
    }

    #[test]
    fn semester_casing_is_canonicalized() {
        let dataset = dataset_with_subjects();
        for query in ["CS 1337 FALL 2019", "CS 1337 Fall 2019", "CS 1337 fall 2019"] {
            let parsed = parse_query(query, &dataset);
            assert_eq!(parsed.semester.as_deref(), Some("Fall 2019"));
        }
    }

    #[test]
    fn season_word_without_year_is_a_name_fragment() {
        let dataset = dataset_with_subjects();
        let parsed = parse_query("CS 1337 Fall", &dataset);
        assert_eq!(parsed.semester, None);
        assert_eq!(parsed.name_fragments, vec!["Fall"]);
    }

    #[test]
    fn leftover_tokens_become_name_fragments_in_order() {
        let dataset = dataset_with_subjects();
        let parsed = parse_query("CS 1337 Jason Smith", &dataset);
        assert_eq!(parsed.name_fragments, vec!["Jason", "Smith"]);
    }

    #[test]
    fn comma_form_fragments_are_stripped() {
        let dataset = dataset_with_subjects();
        let parsed = parse_query("Cole, John", &dataset);
        assert_eq!(parsed.name_fragments, vec!["Cole", "John"]);
        assert!(parsed.is_professor_only());
    }

    #[test]
    fn unknown_subject_word_is_a_name_fragment() {
        let dataset = dataset_with_subjects();
        let parsed = parse_query("Perkins 1337", &dataset);
        assert_eq!(parsed.subject, None);
        // 1337 does not follow a subject tag, so it stays unclassified
        assert_eq!(parsed.catalog_number, None);
        assert_eq!(parsed.name_fragments, vec!["Perkins", "1337"]);
    }

    #[test]
    fn all_fields_together() {
        let dataset = dataset_with_subjects();
        let parsed = parse_query("BCOM 3310 HON Fall 2019 Kristen Lawson", &dataset);
        assert_eq!(parsed.subject.as_deref(), Some("BCOM"));
        assert_eq!(parsed.catalog_number.as_deref(), Some("3310"));
        assert_eq!(parsed.section.as_deref(), Some("HON"));
        assert_eq!(parsed.semester.as_deref(), Some("Fall 2019"));
        assert_eq!(parsed.name_fragments, vec!["Kristen", "Lawson"]);
    }

    #[test]
    fn empty_query_parses_empty() {
        let dataset = dataset_with_subjects();
        assert!(parse_query("", &dataset).is_empty());
        assert!(parse_query("   ", &dataset).is_empty());
    }

    #[test]
    fn recency_orders_seasons_within_year() {
        let spring = semester_recency("Spring 2019").unwrap();
        let fall = semester_recency("Fall 2019").unwrap();
        let summer = semester_recency("Summer 2019").unwrap();
        assert!(fall > summer && summer > spring);
        assert!(semester_recency("Fall 2019") > semester_recency("Fall 2018"));
        assert_eq!(semester_recency("Maymester"), None);
    }
}
