// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::fs;
use std::path::Path;

use clap::Parser;

use gradex::binary::{DatasetFooter, DatasetHeader};
use gradex::cli::{render_results, Cli, Commands};
use gradex::{import_dir, lookup_professor_rating, search, Dataset};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Import { input, output } => run_import(&input, &output),
        Commands::Search {
            query,
            dataset,
            json,
            limit,
        } => run_search(&query.join(" "), &dataset, json, limit),
        Commands::Inspect { file } => run_inspect(&file),
        Commands::Rating { name, json } => run_rating(&name.join(" "), json),
    }
}

fn run_import(input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let (dataset, report) = import_dir(input)?;

    for rejection in &report.rejected {
        eprintln!("rejected {}", rejection);
    }
    for warning in &report.malformed {
        eprintln!("warning {}", warning);
    }

    dataset.save(output)?;
    println!(
        "Imported {} rows from {} files ({} strings interned, {} rows rejected) -> {}",
        report.rows,
        report.files,
        dataset.strings().len(),
        report.rejected.len(),
        output.display()
    );
    Ok(())
}

fn run_search(query: &str, path: &Path, json: bool, limit: usize) -> Result<(), Box<dyn Error>> {
    let dataset = Dataset::load(path)?;
    let results = search(&dataset, query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        let color = atty::is(atty::Stream::Stdout);
        println!("{}", render_results(&results, limit, color));
    }
    Ok(())
}

fn run_inspect(path: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = fs::read(path)?;
    let header = DatasetHeader::read(&mut bytes.as_slice())?;
    let footer = DatasetFooter::read(&bytes)?;

    let content = &bytes[..bytes.len() - DatasetFooter::SIZE];
    let crc_ok = DatasetFooter::compute_crc32(content) == footer.crc32;

    println!("{}", path.display());
    println!("  version       {}", header.version);
    println!("  strings       {} entries, {} bytes", header.string_count, header.strings_len);
    println!("  records       {} entries, {} bytes", header.record_count, header.records_len);
    println!("  file size     {} bytes", bytes.len());
    println!(
        "  checksum      {:08x} ({})",
        footer.crc32,
        if crc_ok { "ok" } else { "MISMATCH" }
    );
    Ok(())
}

fn run_rating(name: &str, json: bool) -> Result<(), Box<dyn Error>> {
    let lookup = lookup_professor_rating(name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&lookup)?);
        return Ok(());
    }

    match lookup.data {
        Some(rating) => {
            println!("{} {} ({})", rating.first_name, rating.last_name, rating.department);
            println!(
                "  rating {:.1}/5 over {} ratings, difficulty {:.1}, {:.0}% would take again",
                rating.average_rating,
                rating.num_ratings,
                rating.average_difficulty,
                rating.would_take_again_percentage
            );
        }
        None => println!("No rating found for \"{}\"", name),
    }
    Ok(())
}
