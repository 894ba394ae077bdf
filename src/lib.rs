// src/lib.rs
pub mod application;
pub mod cli;
pub mod constants;
pub mod domain;
pub mod infrastructure;
pub mod util;

use anyhow::{Context, Result};
use application::{GenerateRequest, PackageGenerator};
use infrastructure::{ArtifactStream, Config, PackageSummary};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::cli::args::{Args, Command};

pub fn run(args: Args) -> Result<()> {
    debug!(?args, "Starting ankipack with arguments");

    match args.command {
        Command::Generate {
            request,
            output,
            timestamp,
        } => {
            let config = Config::discover(args.config.as_deref())?;
            generate(&config, &request, &output, timestamp)
        }
        Command::Guid { fields } => {
            println!("{}", domain::guid_for(fields.as_slice()));
            Ok(())
        }
        Command::Inspect { package, json } => {
            let summary = infrastructure::inspect_package(&package)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            Ok(())
        }
    }
}

fn generate(config: &Config, request_path: &Path, output: &Path, timestamp: Option<f64>) -> Result<()> {
    let file = File::open(request_path)
        .with_context(|| format!("Failed to open request {}", request_path.display()))?;
    let request: GenerateRequest = serde_json::from_reader(BufReader::new(file))
        .context("Failed to parse generate request")?;

    let generator =
        PackageGenerator::new(config.scratch_provider()).with_options(config.archive_options());
    let artifact = generator.generate(&request, timestamp)?;
    let stream = artifact
        .into_stream(config.archive.chunk_size)
        .context("Failed to open generated package")?;

    info!(?output, "Writing package");
    if let Err(e) = write_stream(stream, output) {
        // never leave a truncated package behind
        discard_output(output);
        return Err(e);
    }
    Ok(())
}

fn discard_output(output: &Path) {
    match infrastructure::scratch::remove_file_if_exists(output) {
        Ok(()) => debug!(?output, "Removed incomplete package"),
        Err(e) => warn!(?output, error = %e, "Failed to remove incomplete package"),
    }
}

fn write_stream(stream: ArtifactStream, output: &Path) -> Result<()> {
    let mut out = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    for chunk in stream {
        let chunk = chunk.context("Failed to read generated package")?;
        out.write_all(&chunk)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }
    out.sync_all()?;
    Ok(())
}

fn print_summary(summary: &PackageSummary) {
    println!("Models:");
    for model in &summary.models {
        println!(
            "  {}\t{}\tfields: {}\ttemplates: {}",
            model.id,
            model.name,
            model.fields.join(", "),
            model.templates.join(", ")
        );
    }
    println!("Decks:");
    for deck in &summary.decks {
        let notes = summary
            .cards
            .iter()
            .filter(|c| c.deck_id == deck.id)
            .map(|c| c.note_id)
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        println!("  {}\t{}\t{} notes", deck.id, deck.name, notes);
    }
    println!("Notes: {}", summary.notes.len());
    for note in &summary.notes {
        let first = note.fields.first().map(String::as_str).unwrap_or("");
        println!("  {}\t{}\t{}", note.id, note.guid, first);
    }
    println!("Cards: {}", summary.cards.len());
    println!("Media: {}", summary.media.len());
    for media in &summary.media {
        println!("  {}\t{}\t{} bytes", media.index, media.filename, media.size);
    }
}
