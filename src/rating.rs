// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Supplemental professor-rating lookup.
//!
//! Best-effort enrichment from the public rating site: fetch the school's
//! professor-search page and pull the first result's fields out of the
//! embedded JSON blob with a single regex. Non-authoritative, no state
//! machine, and never part of the core matching contract: a miss or a
//! network failure only means `found: false` upstream.
//!
//! The extraction is separated from the fetch so it tests without network.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// School identifier in the rating site's URL scheme.
const SCHOOL_ID: u32 = 1273;

const SEARCH_URL: &str = "https://www.ratemyprofessors.com/search/professors";

/// Rating fields for one professor, as embedded in the search page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorRating {
    pub legacy_id: String,
    pub average_rating: f64,
    pub num_ratings: u32,
    pub would_take_again_percentage: f64,
    pub average_difficulty: f64,
    pub department: String,
    pub first_name: String,
    pub last_name: String,
}

/// Outcome of a lookup. `found: false` carries no data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingLookup {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ProfessorRating>,
}

impl RatingLookup {
    fn miss() -> Self {
        Self {
            found: false,
            data: None,
        }
    }

    fn hit(data: ProfessorRating) -> Self {
        Self {
            found: true,
            data: Some(data),
        }
    }
}

fn rating_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#""legacyId":(\w+),"avgRating":([\d.]+),"numRatings":(\d+),"wouldTakeAgainPercent":([\d.]+),"avgDifficulty":([\d.]+),"department":"([\w\s]+)","school":.+?,"firstName":"([\w-]+)","lastName":"([\w-]+)""#,
        )
        .expect("rating pattern is a valid regex")
    })
}

/// Extract the first professor's rating fields from a fetched search page.
pub fn extract_rating(html: &str) -> Option<ProfessorRating> {
    let captures = rating_pattern().captures(html)?;
    Some(ProfessorRating {
        legacy_id: captures[1].to_string(),
        average_rating: captures[2].parse().ok()?,
        num_ratings: captures[3].parse().ok()?,
        would_take_again_percentage: captures[4].parse().ok()?,
        average_difficulty: captures[5].parse().ok()?,
        department: captures[6].to_string(),
        first_name: captures[7].to_string(),
        last_name: captures[8].to_string(),
    })
}

/// Fetch the search page for a professor name and extract their rating.
///
/// A page with no recognizable professor is a miss, not an error; only
/// transport failures surface as `Err`.
pub fn lookup_professor_rating(name: &str) -> Result<RatingLookup, reqwest::Error> {
    let body = reqwest::blocking::Client::builder()
        .build()?
        .get(format!("{}/{}", SEARCH_URL, SCHOOL_ID))
        .query(&[("q", name)])
        .send()?
        .text()?;

    Ok(match extract_rating(&body) {
        Some(data) => RatingLookup::hit(data),
        None => RatingLookup::miss(),
    })
}
