// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI argument types and terminal rendering.
//!
//! Output is colored only when stdout is a TTY; pipelines get plain text and
//! `--json` gets machine-readable output.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::types::{SearchResult, GRADE_LABELS};

#[derive(Parser)]
#[command(
    name = "gradex",
    about = "Free-text search over university grade distribution archives",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a directory of per-semester CSV tables into a dataset file
    Import {
        /// Input directory; each file's base name is its semester label
        #[arg(short, long)]
        input: PathBuf,

        /// Output .gradex dataset file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Search the dataset with a free-text query
    Search {
        /// Query text, e.g. "cs 1337.001 fall 2019 jason smith"
        #[arg(required = true)]
        query: Vec<String>,

        /// Path to the .gradex dataset file
        #[arg(short, long, default_value = "grades.gradex")]
        dataset: PathBuf,

        /// Emit results as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Maximum number of results to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Inspect a .gradex file's structure
    Inspect {
        /// Path to a .gradex file
        file: PathBuf,
    },

    /// Look up a professor's rating (best-effort, external)
    Rating {
        /// Professor name
        #[arg(required = true)]
        name: Vec<String>,

        /// Emit the lookup result as JSON
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// RENDERING
// ============================================================================

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", code, text, RESET)
    } else {
        text.to_string()
    }
}

/// Render one result as a course line plus its grade distribution.
pub fn render_result(result: &SearchResult, color: bool) -> String {
    let course = format!(
        "{} {}.{}",
        result.subject, result.catalog_number, result.section
    );
    let instructors = if result.instructors.is_empty() {
        String::from("(no instructor listed)")
    } else {
        result
            .instructors
            .iter()
            .map(|name| match &name.first {
                Some(first) => format!("{} {}", first, name.last),
                None => name.last.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut out = format!(
        "{}  {}  {}\n",
        paint(&course, BOLD, color),
        paint(&result.semester, CYAN, color),
        instructors
    );

    let counts = result.counts.as_array();
    let distribution = GRADE_LABELS
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| format!("{} {}", label, count))
        .collect::<Vec<_>>()
        .join("  ");
    let summary = format!("  {} enrolled   {}", result.counts.total(), distribution);
    out.push_str(&paint(&summary, DIM, color));
    out
}

/// Render the full result list, capped at `limit`.
pub fn render_results(results: &[SearchResult], limit: usize, color: bool) -> String {
    if results.is_empty() {
        return String::from("No matching sections.");
    }

    let mut out = String::new();
    for result in results.iter().take(limit) {
        out.push_str(&render_result(result, color));
        out.push('\n');
    }
    if results.len() > limit {
        out.push_str(&format!("... and {} more\n", results.len() - limit));
    }
    out.push_str(&format!(
        "{} matching section{}",
        results.len(),
        if results.len() == 1 { "" } else { "s" }
    ));
    out
}
