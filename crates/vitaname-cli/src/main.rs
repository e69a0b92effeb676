//! vitaname - Rename game archives from their embedded SFO metadata
//!
//! This tool scans zip archives for embedded `param.sfo` metadata records,
//! folds every record found in one archive into a naming decision, and
//! renames the archive to its canonical
//! `"Title (app_ver-version-addons) [TITLE_ID] (REGION).zip"` form.

use anyhow::{bail, Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use rayon::prelude::*;
use std::fs::{self, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use vitaname_core::{decode, NamingDescriptor, MAX_CAPTURE_SIZE};
use walkdir::WalkDir;

/// Default name suffix identifying a metadata entry inside an archive
const DEFAULT_METADATA_SUFFIX: &str = "param.sfo";

/// Rename game archives from the SFO metadata records embedded inside them
#[derive(Parser, Debug)]
#[command(name = "vitaname")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory containing the archives to rename
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Descend into subdirectories instead of only the top level
    #[arg(short, long)]
    recursive: bool,

    /// Show the computed names without renaming anything
    #[arg(long)]
    dry_run: bool,

    /// Entry-name suffix identifying metadata records inside an archive
    #[arg(long, default_value = DEFAULT_METADATA_SUFFIX)]
    suffix: String,

    /// Number of archives processed in parallel (0 = one per CPU)
    #[arg(short, long, default_value = "0")]
    jobs: usize,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Per-archive result of one processing attempt.
///
/// Every variant is terminal for its archive only; no outcome aborts the
/// run.
#[derive(Debug)]
enum Outcome {
    /// Archive renamed to the candidate name
    Renamed { to: String },
    /// Dry run: the candidate name that would have been used
    WouldRename { to: String },
    /// Candidate name equals the current name; nothing to do
    AlreadyNamed,
    /// No qualifying metadata record found; archive left untouched
    NoMetadata,
    /// A file with the candidate name already exists
    TargetExists { to: String },
    /// Archive could not be read or renamed
    Failed { error: anyhow::Error },
}

/// Counters for the end-of-run summary
#[derive(Debug, Default)]
struct RunStats {
    renamed: usize,
    already_named: usize,
    no_metadata: usize,
    conflicts: usize,
    failed: usize,
}

impl RunStats {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Renamed { .. } | Outcome::WouldRename { .. } => self.renamed += 1,
            Outcome::AlreadyNamed => self.already_named += 1,
            Outcome::NoMetadata => self.no_metadata += 1,
            Outcome::TargetExists { .. } => self.conflicts += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    fn print_summary(&self, dry_run: bool) {
        let renamed = if dry_run { "would rename" } else { "renamed" };
        println!(
            "Summary: {} {}, {} already named, {} without metadata, {} conflicts, {} failed",
            renamed, self.renamed, self.already_named, self.no_metadata, self.conflicts,
            self.failed,
        );
    }
}

/// Console styling, disabled when `NO_COLOR` is set
#[derive(Debug, Clone, Copy)]
struct OutputStyle {
    use_color: bool,
}

impl OutputStyle {
    fn from_env() -> Self {
        Self {
            use_color: std::env::var("NO_COLOR").is_err(),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if !self.use_color {
            return text.to_string();
        }
        match color {
            Color::Cyan => text.cyan().to_string(),
            Color::Yellow => text.yellow().to_string(),
            Color::Green => text.green().to_string(),
            Color::Red => text.red().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Color {
    Cyan,
    Yellow,
    Green,
    Red,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    if cli.jobs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.jobs)
            .build_global()
            .context("Failed to configure worker pool")?;
    }

    // Enumeration failure at the very top is the only fatal condition.
    let archives = discover_archives(&cli.path, cli.recursive)?;
    if archives.is_empty() {
        println!("No archives found under {}", cli.path.display());
        return Ok(());
    }
    debug!("Found {} archive(s)", archives.len());

    // One independent unit of work per archive; nothing mutable is shared.
    let outcomes: Vec<(PathBuf, Outcome)> = archives
        .par_iter()
        .map(|path| (path.clone(), process_archive(&cli, path)))
        .collect();

    let style = OutputStyle::from_env();
    let mut stats = RunStats::default();
    for (path, outcome) in &outcomes {
        stats.record(outcome);
        report(&style, path, outcome);
    }
    stats.print_summary(cli.dry_run);

    Ok(())
}

/// Collect the zip archives under `root`, sorted for deterministic order.
fn discover_archives(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Directory does not exist: {}", root.display());
    }
    if !root.is_dir() {
        bail!("Path is not a directory: {}", root.display());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut archives = Vec::new();

    for entry in WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if is_zip {
            archives.push(path.to_path_buf());
        } else {
            trace!("Skipping non-archive: {}", path.display());
        }
    }

    archives.sort();
    Ok(archives)
}

/// Process one archive end to end: capture, decode, aggregate, rename.
fn process_archive(cli: &Cli, path: &Path) -> Outcome {
    let captures = match capture_records(path, &cli.suffix) {
        Ok(captures) => captures,
        Err(error) => return Outcome::Failed { error },
    };

    let mut descriptor = NamingDescriptor::new();
    for (name, raw) in &captures {
        // A malformed record is the same as no metadata for this entry;
        // it never discards the other entries of the archive.
        match decode(raw) {
            Ok(record) => descriptor.absorb(&record),
            Err(e) => {
                debug!("Malformed record in entry '{}': {}", name, e);
            }
        }
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("zip");
    let Some(candidate) = descriptor.file_name(ext) else {
        return Outcome::NoMetadata;
    };

    rename_archive(path, &candidate, cli.dry_run)
}

/// Capture the raw bytes of every metadata entry in the archive, in entry
/// order. Each capture is bounded by [`MAX_CAPTURE_SIZE`]; a short read
/// yields a smaller, still-decodable buffer.
fn capture_records(path: &Path, suffix: &str) -> Result<Vec<(String, Vec<u8>)>> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open archive: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read archive: {}", path.display()))?;

    let mut captures = Vec::new();
    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry {} in {}: {}", i, path.display(), e);
                continue;
            }
        };
        if !entry.name().ends_with(suffix) {
            continue;
        }

        let name = entry.name().to_string();
        let declared = entry.size();
        trace!(
            "Capturing '{}' ({} bytes declared) from {}",
            name,
            declared,
            path.display()
        );

        let mut raw = Vec::new();
        match entry.take(MAX_CAPTURE_SIZE).read_to_end(&mut raw) {
            Ok(read) => {
                if (read as u64) < declared {
                    debug!(
                        "Capture of '{}' truncated at {} of {} bytes",
                        name, read, declared
                    );
                }
                captures.push((name, raw));
            }
            Err(e) => {
                // One unreadable entry must not discard the archive.
                warn!("Failed to read entry '{}' in {}: {}", name, path.display(), e);
            }
        }
    }

    Ok(captures)
}

/// Rename the archive to `candidate` within its parent directory.
///
/// The target is reserved with an exclusive create before the rename, so
/// two workers that compute the same candidate cannot both succeed; the
/// loser reports a conflict instead of silently overwriting.
fn rename_archive(path: &Path, candidate: &str, dry_run: bool) -> Outcome {
    let target = match path.parent() {
        Some(parent) => parent.join(candidate),
        None => PathBuf::from(candidate),
    };

    if target == path {
        return Outcome::AlreadyNamed;
    }
    if dry_run {
        return Outcome::WouldRename {
            to: candidate.to_string(),
        };
    }

    match OpenOptions::new().write(true).create_new(true).open(&target) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Outcome::TargetExists {
                to: candidate.to_string(),
            };
        }
        Err(e) => {
            return Outcome::Failed {
                error: anyhow::Error::new(e)
                    .context(format!("Failed to reserve target: {}", target.display())),
            };
        }
    }

    if let Err(e) = fs::rename(path, &target) {
        // Release the reservation so a later run can retry cleanly.
        let _ = fs::remove_file(&target);
        return Outcome::Failed {
            error: anyhow::Error::new(e)
                .context(format!("Failed to rename to: {}", target.display())),
        };
    }

    Outcome::Renamed {
        to: candidate.to_string(),
    }
}

/// Print the user-facing line for one archive outcome.
fn report(style: &OutputStyle, path: &Path, outcome: &Outcome) {
    let original = path.display().to_string();
    match outcome {
        Outcome::Renamed { to } => {
            println!(
                "Moving '{}' to '{}': {}",
                style.paint(&original, Color::Cyan),
                style.paint(to, Color::Yellow),
                style.paint("OK", Color::Green),
            );
        }
        Outcome::WouldRename { to } => {
            println!(
                "Would move '{}' to '{}'",
                style.paint(&original, Color::Cyan),
                style.paint(to, Color::Yellow),
            );
        }
        Outcome::AlreadyNamed => {
            debug!("Already named: {}", original);
        }
        Outcome::NoMetadata => {
            debug!("No qualifying metadata in {}", original);
        }
        Outcome::TargetExists { to } => {
            println!(
                "Moving '{}' to '{}': {}",
                style.paint(&original, Color::Cyan),
                style.paint(to, Color::Yellow),
                style.paint("target exists", Color::Red),
            );
        }
        Outcome::Failed { error } => {
            println!(
                "Processing '{}': {}",
                style.paint(&original, Color::Cyan),
                style.paint(&format!("{error:#}"), Color::Red),
            );
        }
    }
}
