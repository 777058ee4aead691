use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pagesplit_core::{pages_per_split_from, plan_split, sanitize_upload_name, SplitPlan, SplitRequest};
use pagesplit_document::{partition, write_bundle, OutputBundle, PdfDocument};
use pagesplit_observability::init_tracing;
use serde::Serialize;
use tempfile::NamedTempFile;

#[derive(Debug, Parser)]
#[command(name = "pagesplit")]
#[command(about = "Split PDFs into fixed-size page chunks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Describe how a document of a given length would be split
    Plan {
        #[arg(long)]
        pages: i64,
        #[arg(long, allow_negative_numbers = true)]
        per: i64,
    },
    /// Read a PDF and describe how it would be split
    Inspect {
        file: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        per: i64,
    },
    /// Split a PDF and write `<name>_split.zip`
    Split {
        file: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        per: i64,
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Accept a shorter last part without asking
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Serialize)]
struct InspectReport<'a> {
    file: String,
    base_name: String,
    plan: &'a SplitPlan,
}

#[derive(Debug, Serialize)]
struct SplitReport {
    archive: String,
    parts: Vec<PartReport>,
}

#[derive(Debug, Serialize)]
struct PartReport {
    name: String,
    pages: String,
}

fn main() -> Result<()> {
    init_tracing("pagesplit_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Plan { pages, per } => {
            let plan = SplitRequest::new(pages, per)?.plan();
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Inspect { file, per } => {
            let (document, base_name) = load(&file)?;
            let plan = plan_split(document.page_count(), pages_per_split_from(per)?);
            let report = InspectReport {
                file: file.display().to_string(),
                base_name,
                plan: &plan,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Split {
            file,
            per,
            out,
            yes,
        } => {
            let report = split(&file, per, &out, yes)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load(file: &Path) -> Result<(PdfDocument, String)> {
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let document = PdfDocument::parse(&bytes)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    let base_name = sanitize_upload_name(file.file_name().and_then(|name| name.to_str()));
    Ok((document, base_name))
}

fn split(file: &Path, per: i64, out: &Path, yes: bool) -> Result<SplitReport> {
    let pages_per_split = pages_per_split_from(per)?;
    let (document, base_name) = load(file)?;

    let plan = plan_split(document.page_count(), pages_per_split).into_result()?;
    if plan.needs_confirmation && !yes {
        bail!("{}. Re-run with --yes to accept.", plan.message);
    }

    let bundle = partition(&document, &plan, &base_name)?;

    let archive_path = write_archive(&bundle, out)?;

    Ok(SplitReport {
        archive: archive_path.display().to_string(),
        parts: bundle
            .documents
            .iter()
            .map(|document| PartReport {
                name: document.name.clone(),
                pages: document.range.to_string(),
            })
            .collect(),
    })
}

/// Writes the bundle's zip into `out`. The archive is staged in a temp file
/// next to its destination and only renamed into place once complete.
fn write_archive(bundle: &OutputBundle, out: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let archive_path = out.join(bundle.archive_name());

    let staged = NamedTempFile::new_in(out)
        .with_context(|| format!("failed to create a temp file in {}", out.display()))?;
    let mut writer = write_bundle(bundle, BufWriter::new(staged))?;
    writer.flush()?;
    let staged = writer.into_inner().map_err(|error| error.into_error())?;

    staged
        .persist(&archive_path)
        .map_err(|error| error.error)
        .with_context(|| format!("failed to write {}", archive_path.display()))?;
    Ok(archive_path)
}
