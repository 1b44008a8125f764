// src/main.rs
mod convert;
mod docx;
mod extractors;
mod profiles;
mod replace;
mod storage;
mod utils;

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use convert::{ElisaConverter, KitNumbers};
use docx::WordDocument;
use profiles::ProfileTable;
use storage::StorageManager;
use utils::validate::{require_input_docx, require_output_target, require_text};
use utils::AppError;

/// Command Line Interface for the lab kit documentation converter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Company profile table (JSON) replacing the built-in one
    #[arg(long, global = true)]
    profiles: Option<PathBuf>,

    /// Write a JSON conversion report next to the output document
    #[arg(long, global = true)]
    report: bool,

    /// Debug mode - dump the extracted source sections next to the output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace one piece of text throughout a document
    Replace {
        input: PathBuf,
        output: PathBuf,
        find: String,
        #[arg(default_value = "")]
        replace: String,
    },

    /// Replace several pieces of text, entered one pair at a time
    #[command(name = "replace_multiple")]
    ReplaceMultiple { input: PathBuf, output: PathBuf },

    /// Convert a supplier ELISA kit document into the company template
    Elisa {
        outside: PathBuf,
        template: PathBuf,
        output: PathBuf,
        catalog_number: String,
        lot_number: String,
    },
}

fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.verbose);
    tracing::debug!("Starting with args: {:?}", args);

    let result = run(&args);
    if let Err(e) = &result {
        tracing::error!("{}", e);
    }
    result
}

fn run(args: &Args) -> Result<(), AppError> {
    match &args.command {
        Command::Replace {
            input,
            output,
            find,
            replace,
        } => {
            if find.is_empty() {
                return Err(AppError::InvalidInput("Text to find must not be empty".to_string()));
            }
            run_replace(input, output, &[(find.clone(), replace.clone())])
        }
        Command::ReplaceMultiple { input, output } => {
            require_input_docx(input, "Input document")?;
            require_output_target(output)?;
            let pairs = replace::collect_replacements(io::stdin().lock(), io::stdout())?;
            if pairs.is_empty() {
                return Err(AppError::InvalidInput("No replacements entered".to_string()));
            }
            run_replace(input, output, &pairs)
        }
        Command::Elisa {
            outside,
            template,
            output,
            catalog_number,
            lot_number,
        } => run_elisa(args, outside, template, output, catalog_number, lot_number),
    }
}

fn run_replace(input: &Path, output: &Path, pairs: &[(String, String)]) -> Result<(), AppError> {
    require_input_docx(input, "Input document")?;
    require_output_target(output)?;

    let mut doc = WordDocument::open(input)?;
    let count = replace::replace_all(&mut doc, pairs);
    tracing::info!("Applied {} replacement pairs, {} occurrences", pairs.len(), count);

    let storage = StorageManager::new(output, input)?;
    let saved = storage.save_document(&doc)?;
    println!("Replaced {} occurrences; saved to {}", count, saved.display());
    Ok(())
}

fn run_elisa(
    args: &Args,
    outside: &Path,
    template: &Path,
    output: &Path,
    catalog_number: &str,
    lot_number: &str,
) -> Result<(), AppError> {
    // 3. Validate everything before any document is opened
    require_input_docx(outside, "Source document")?;
    require_input_docx(template, "Template document")?;
    require_output_target(output)?;
    let numbers = KitNumbers {
        catalog: require_text(catalog_number, "Catalog number")?,
        lot: require_text(lot_number, "Lot number")?,
    };

    // 4. Load company profiles
    let loaded;
    let profiles = match &args.profiles {
        Some(path) => {
            loaded = ProfileTable::load(path)?;
            &loaded
        }
        None => ProfileTable::builtin(),
    };

    // 5. Convert in memory, then write
    let conversion = ElisaConverter::new(profiles).convert_files(outside, template, &numbers)?;

    let storage = StorageManager::new(output, outside)?;
    let saved = storage.save_document(&conversion.document)?;
    if args.report {
        storage.save_report(&conversion.report)?;
    }
    if args.debug {
        storage.save_extraction_dump(&conversion.content)?;
    }

    println!("Converted document saved to {}", saved.display());
    Ok(())
}
