//! MaterialX to USD conversion CLI tool.
//!
//! Converts single MaterialX documents or whole directories of them to USDA, using the
//! node definitions found in the MaterialX data libraries.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use mtlxusd::mtlx::{self, Library};
use mtlxusd::translate::{self, TranslateOptions, Translation};

/// Translate MaterialX shading graphs into USD.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directories searched for library folders (platform path list separator).
    #[arg(long, env = mtlx::library::SEARCH_PATH_ENV, global = true)]
    search_path: Option<String>,

    /// Library folders loaded under each search path root (can be specified multiple times).
    #[arg(long = "library", short = 'l', global = true, default_value = "libraries")]
    libraries: Vec<String>,

    /// Show debug output.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a MaterialX document to USDA.
    Convert {
        /// MaterialX file to convert.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file, stdout when omitted.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Only author values set on node instances, not definition defaults.
        #[arg(long)]
        instance_only: bool,
    },

    /// Convert every .mtlx file under a directory.
    Batch {
        /// Directory to convert.
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Write results under this directory instead of next to the inputs.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Skip files matching these patterns (can be specified multiple times).
        #[arg(long = "skip", short = 'x')]
        skip_patterns: Vec<String>,

        /// Only author values set on node instances, not definition defaults.
        #[arg(long)]
        instance_only: bool,

        /// Only show summary statistics.
        #[arg(long, short = 's')]
        summary: bool,
    },

    /// Re-serialize a MaterialX document.
    Format {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file, stdout when omitted.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the element name paths of a document in translation order.
    Nodes {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Outcome of converting one file in batch mode.
#[derive(Debug)]
enum ConversionResult {
    Converted { prims: usize, diagnostics: usize },
    Empty,
    Failed { error: String },
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(err) = run(&args) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Convert {
            file,
            output,
            instance_only,
        } => {
            let library = load_library(args)?;
            let translation = convert_file(file, &library, options(*instance_only))?;
            write_output(output.as_deref(), &translation.usda)
        }
        Command::Batch {
            dir,
            out_dir,
            skip_patterns,
            instance_only,
            summary,
        } => {
            let library = load_library(args)?;
            run_batch(dir, out_dir.as_deref(), skip_patterns, &library, options(*instance_only), *summary)
        }
        Command::Format { file, output } => {
            let doc = mtlx::parse_mtlx_file(file)?;
            write_output(output.as_deref(), &mtlx::write_mtlx(&doc))
        }
        Command::Nodes { file } => {
            let doc = mtlx::parse_mtlx_file(file)?;
            for path in translate::find_material_nodes(&doc) {
                let id = doc.descendant(&path).context("Discovered path does not resolve")?;
                println!("{:<12} {}", doc.element(id).category(), path);
            }
            Ok(())
        }
    }
}

fn options(instance_only: bool) -> TranslateOptions {
    TranslateOptions {
        emit_all_value_elements: !instance_only,
    }
}

fn load_library(args: &Args) -> Result<Library> {
    let search_path: Vec<PathBuf> = match &args.search_path {
        Some(paths) => std::env::split_paths(paths).collect(),
        None => vec![PathBuf::from(".")],
    };
    Library::load(&args.libraries, &search_path)
}

fn convert_file(path: &Path, library: &Library, options: TranslateOptions) -> Result<Translation> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    translate::convert_mtlx_str_to_usd(&content, library, options)
        .with_context(|| format!("Failed to convert: {}", path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("Failed to write: {}", path.display()))
        }
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

fn should_skip(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();
    patterns.iter().any(|p| path_str.contains(p))
}

fn collect_mtlx_files(dir: &Path, skip_patterns: &[String]) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("mtlx"))
        .filter(|p| !should_skip(p, skip_patterns))
        .collect()
}

/// Output path for a batch input: same relative location, `.usda` extension.
fn output_path(file: &Path, dir: &Path, out_dir: Option<&Path>) -> PathBuf {
    let target = match out_dir {
        Some(out_dir) => out_dir.join(file.strip_prefix(dir).unwrap_or(file)),
        None => file.to_path_buf(),
    };
    target.with_extension("usda")
}

fn convert_batch_file(
    file: &Path,
    dir: &Path,
    out_dir: Option<&Path>,
    library: &Library,
    options: TranslateOptions,
) -> Result<ConversionResult> {
    let translation = convert_file(file, library, options)?;
    if translation.is_empty() {
        return Ok(ConversionResult::Empty);
    }

    let target = output_path(file, dir, out_dir);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create: {}", parent.display()))?;
    }
    write_output(Some(&target), &translation.usda)?;

    Ok(ConversionResult::Converted {
        prims: translation.stage.len(),
        diagnostics: translation.diagnostics.len(),
    })
}

fn run_batch(
    dir: &Path,
    out_dir: Option<&Path>,
    skip_patterns: &[String],
    library: &Library,
    options: TranslateOptions,
    summary: bool,
) -> Result<()> {
    let start = Instant::now();
    let files = collect_mtlx_files(dir, skip_patterns);
    anyhow::ensure!(!files.is_empty(), "No MaterialX files found in: {}", dir.display());

    println!("Converting {} MaterialX files...\n", files.len());

    let progress = if summary {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let converted = AtomicUsize::new(0);
    let empty = AtomicUsize::new(0);
    let warnings = AtomicUsize::new(0);
    let failures: Mutex<Vec<(PathBuf, String)>> = Mutex::new(Vec::new());

    files.par_iter().for_each(|file| {
        let result = match convert_batch_file(file, dir, out_dir, library, options) {
            Ok(result) => result,
            Err(err) => ConversionResult::Failed {
                error: format!("{:#}", err),
            },
        };

        if let Some(ref pb) = progress {
            pb.inc(1);
        }

        let rel_path = file.strip_prefix(dir).unwrap_or(file);
        match result {
            ConversionResult::Converted { prims, diagnostics } => {
                converted.fetch_add(1, Ordering::Relaxed);
                warnings.fetch_add(diagnostics, Ordering::Relaxed);
                if !summary {
                    println!("[ OK ] {} ({} prims, {} warnings)", rel_path.display(), prims, diagnostics);
                }
            }
            ConversionResult::Empty => {
                empty.fetch_add(1, Ordering::Relaxed);
                if !summary {
                    println!("[SKIP] {} - empty document", rel_path.display());
                }
            }
            ConversionResult::Failed { error } => {
                if !summary {
                    println!("[FAIL] {}", rel_path.display());
                    println!("       Error: {}", error);
                }
                if let Ok(mut failures) = failures.lock() {
                    failures.push((rel_path.to_path_buf(), error));
                }
            }
        }
    });

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let failures = failures.into_inner().unwrap_or_default();

    println!();
    println!("================================================================================");
    println!("Conversion Summary");
    println!("================================================================================");
    println!("Total files:  {}", files.len());
    println!("Converted:    {}", converted.load(Ordering::Relaxed));
    println!("Empty:        {}", empty.load(Ordering::Relaxed));
    println!("Failed:       {}", failures.len());
    println!("Warnings:     {}", warnings.load(Ordering::Relaxed));

    if !failures.is_empty() {
        println!("\nFailed files:");
        for (path, error) in &failures {
            println!("  - {}", path.display());
            if summary {
                println!("    {}", error);
            }
        }
    }

    println!("\nTime elapsed: {:.2}s", start.elapsed().as_secs_f64());

    anyhow::ensure!(failures.is_empty(), "{} files failed to convert", failures.len());
    Ok(())
}
