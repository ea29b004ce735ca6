//! Duplex Badges CLI tool
//!
//! Stamps names from a text file onto a PDF template and writes one
//! duplex-ready PDF per name.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process;

use duplex_badges::batch::{run_batch, BadgeEvent, BatchOptions, BatchSummary};
use duplex_badges::pdf::count_pages;
use duplex_badges::pdf::stamp::DEFAULT_FONT_SIZE;

/// Add names from a text file to a PDF template and create duplex PDFs
#[derive(Parser)]
#[command(name = "duplex-badges")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Stamp every name in attendees.txt onto the template
    duplex-badges badge-template.pdf attendees.txt

    # Choose the output folder and typeface
    duplex-badges badge-template.pdf attendees.txt -o badges --font fonts/Narrow.ttf")]
struct Cli {
    /// Path to the template PDF file
    template_pdf: PathBuf,

    /// Path to the text file containing names (one per line)
    names_file: PathBuf,

    /// Output folder for the generated PDFs
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Path to the badge typeface (TrueType)
    #[arg(long, default_value = "./ObviouslyNarwSemi.ttf")]
    font: PathBuf,

    /// Text size for the stamped name in points
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    font_size: f32,
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(summary) => {
            if summary.all_succeeded() {
                println!(
                    "All duplex PDFs have been generated in the '{}' folder.",
                    cli.output.display()
                );
            } else {
                eprintln!("{} name(s) failed:", summary.failed.len());
                for (name, error) in &summary.failed {
                    eprintln!("  {}: {}", name, error);
                }
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<BatchSummary> {
    let page_count = count_pages(&cli.template_pdf)
        .with_context(|| format!("cannot read template {}", cli.template_pdf.display()))?;
    eprintln!(
        "Template: {} ({} page{})",
        cli.template_pdf.display(),
        page_count,
        if page_count == 1 { "" } else { "s" }
    );

    let options = BatchOptions {
        template: cli.template_pdf.clone(),
        names: cli.names_file.clone(),
        output_dir: cli.output.clone(),
        font: cli.font.clone(),
        font_size: cli.font_size,
    };

    let summary = run_batch(&options, |event| match event {
        BadgeEvent::Stamped { path, .. } => {
            println!("Created duplex PDF: {}", path.display());
        }
        BadgeEvent::Failed { name, error } => {
            eprintln!("Failed: {}: {}", name, error);
        }
    })
    .context("badge batch failed")?;

    Ok(summary)
}
