//! CLI module for onboarder

mod args;
pub mod clone;

pub use args::Args;

use crate::analysis::{AnalysisResult, Analyzer, Diagnostic};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{OutputFormat, OutputWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment file read by `--load-env`, relative to the working directory
const ENV_FILE: &str = ".env";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    init_logging(args.verbose);

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "onboarder=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn execute(args: Args) -> Result<()> {
    let format: OutputFormat = args.format.parse()?;

    if args.load_env {
        load_env_file(Path::new(ENV_FILE));
    }

    let (repo, cloned) = if clone::is_remote(&args.path, args.clone) {
        let url = clone::normalize_url(&args.path);
        println!("Cloning {}...", url);
        let path = clone::clone_repo(&url)?;
        println!("Repository cloned to: {}", path.display());
        (path, true)
    } else {
        let path = PathBuf::from(&args.path);
        if !path.exists() {
            return Err(Error::PathNotFound(path));
        }
        (path, false)
    };

    let mut cfg = Config::resolve(&repo, args.config.as_deref());
    cfg.merge_cli(args.output.clone(), args.no_llm);

    if args.verbose {
        println!("Analyzing: {}", repo.display());
        println!("Output: {}", cfg.output_dir.display());
        println!("Format: {:?}", format);
        println!("Depth: {}", cfg.depth);
        println!("Max items per directory: {}", cfg.max_items_per_dir);
        println!("LLM summary: {}", cfg.llm_enabled);
        println!("Ignore: {:?}", cfg.ignore);
    }

    let output_dir = cfg.output_path(&repo);
    let analyzer = Analyzer::new(cfg)?.with_verbose(args.verbose);

    println!("Analyzing repository...");
    let analysis = analyzer.analyze(&repo)?;
    print_summary(&analysis, args.verbose);

    println!("\nGenerating onboarding files...");
    let report = OutputWriter::new(&output_dir, format)
        .with_title(project_name(&repo))
        .write_all(&analysis)?;

    println!("{}", report.summary());
    println!("Onboarding files written to: {}", output_dir.display());
    if cloned {
        println!("Open: {}", output_dir.join("index.html").display());
    }

    Ok(())
}

/// Export variables from a dotenv file; existing variables are kept
fn load_env_file(path: &Path) -> bool {
    if !path.is_file() {
        println!("Tip: create a .env file with ANTHROPIC_API_KEY for LLM features");
        return false;
    }

    match dotenvy::from_path(path) {
        Ok(()) => {
            println!("Loaded environment variables from {}", path.display());
            true
        }
        Err(e) => {
            tracing::warn!("Could not load {}: {}", path.display(), e);
            false
        }
    }
}

fn project_name(repo: &Path) -> String {
    repo.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "Repository".to_string())
}

fn print_summary(analysis: &AnalysisResult, verbose: bool) {
    println!(
        "Analysis complete: {} files scanned, {} entrypoints, {} routes, {} external systems",
        analysis.scanned_files.len(),
        analysis.entrypoints.len(),
        analysis.routes.len(),
        analysis.systems.nodes.len()
    );

    if analysis.diagnostics.is_empty() {
        return;
    }

    println!("\nWarnings ({}):", analysis.diagnostics.len());
    let shown = if verbose { analysis.diagnostics.len() } else { 5 };
    for diagnostic in analysis.diagnostics.iter().take(shown) {
        match diagnostic {
            Diagnostic::FileSkipped { path, reason } => println!("  {}: {}", path, reason),
            Diagnostic::StageWarning { stage, message } => println!("  [{}] {}", stage, message),
        }
    }
    if analysis.diagnostics.len() > shown {
        println!("  ... and {} more", analysis.diagnostics.len() - shown);
    }
}
