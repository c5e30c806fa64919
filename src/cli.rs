//! Command-line interface for vhdl-facts.

use clap::{Parser, Subcommand};
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::extract::Extractor;
use crate::parser;
use crate::report::{self, Failure, Format, Report};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Semantic fact extraction for VHDL syntax trees.
///
/// Reads concrete syntax trees (s-expression or JSON dumps) and emits
/// structural, behavioral and clock-domain facts for downstream rules.
#[derive(Parser)]
#[command(name = "vhdl-facts")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract facts from a file or directory
    Extract(ExtractArgs),
    /// Write the default configuration file
    Init(InitArgs),
}

/// Arguments for the extract command.
#[derive(Parser)]
pub struct ExtractArgs {
    /// Path to extract (file or directory)
    pub path: PathBuf,

    /// Output format: json, tables, or pretty
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Path to configuration YAML (default: ./vhdl-facts.yaml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub output: PathBuf,
}

/// Collect files with a registered suffix under `root`.
/// Hidden directories and excluded paths are skipped. The result is sorted.
pub fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            !(e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.'))
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !parser::is_supported(path) {
            continue;
        }
        if config.is_path_excluded(path) {
            debug!("excluded {}", path.display());
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Run the extract command.
pub fn run_extract(args: &ExtractArgs) -> anyhow::Result<i32> {
    parser::init();

    let Some(format) = Format::parse(&args.format) else {
        eprintln!(
            "Error: invalid format {:?}, must be one of {}",
            args.format,
            Format::NAMES.join(", ")
        );
        return Ok(EXIT_ERROR);
    };

    let cwd = std::env::current_dir()?;
    let config = Config::load(args.config.as_deref(), &cwd)?;

    let metadata = match fs::metadata(&args.path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = if metadata.is_dir() {
        collect_files(&args.path, &config)?
    } else {
        vec![args.path.clone()]
    };

    if files.is_empty() {
        eprintln!(
            "Warning: no files to extract (supported suffixes: {})",
            parser::supported_extensions().join(", ")
        );
    }
    info!("extracting {} files", files.len());

    let extractor = Extractor::with_config(config);
    let mut report = Report {
        path: args.path.to_string_lossy().to_string(),
        ..Report::default()
    };
    for file in extractor.extract_files(&files) {
        match file.result {
            Ok(facts) => report.facts.push(facts),
            Err(e) => {
                eprintln!("Error: {}", e);
                report.failures.push(Failure {
                    file: e.path().to_string_lossy().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    match &args.output {
        Some(path) => {
            let mut out = io::BufWriter::new(fs::File::create(path)?);
            report::write(&mut out, format, &report)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            report::write(&mut out, format, &report)?;
        }
    }

    if report.failures.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(&args.output, Config::default().to_yaml()?)?;

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize extraction", args.output.display());
    println!(
        "  2. Run: vhdl-facts extract . --config {}",
        args.output.display()
    );

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_files_filters_and_sorts() {
        parser::init();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("rtl/sim")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("rtl/b.sexp"), "(design_file)").unwrap();
        fs::write(root.join("rtl/a.sexp"), "(design_file)").unwrap();
        fs::write(root.join("rtl/sim/tb.sexp"), "(design_file)").unwrap();
        fs::write(root.join("rtl/notes.txt"), "").unwrap();
        fs::write(root.join(".git/x.sexp"), "(design_file)").unwrap();

        let config = Config {
            excluded_paths: vec!["**/sim/**".to_string()],
            ..Config::default()
        };
        let files = collect_files(root, &config).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["rtl/a.sexp", "rtl/b.sexp"]);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cfg/vhdl-facts.yaml");
        let args = InitArgs {
            output: output.clone(),
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        let config = Config::parse_file(&output).unwrap();
        assert!(config.detect_cdc);
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }
}
