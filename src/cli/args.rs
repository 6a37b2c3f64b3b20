//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Generate onboarding docs from repositories
#[derive(Parser, Debug)]
#[command(name = "onboarder")]
#[command(about = "Generate onboarding docs from repositories")]
#[command(version)]
pub struct Args {
    /// Path to the repository, or a GitHub URL to clone
    pub path: String,

    /// Config file (YAML or TOML); defaults to <repo>/.onboarder.{yml,yaml,toml}
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory, relative to the repository unless absolute
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the LLM summary
    #[arg(long)]
    pub no_llm: bool,

    /// Load environment variables from ./.env before running
    #[arg(long)]
    pub load_env: bool,

    /// Treat PATH as a git URL and clone it
    #[arg(long)]
    pub clone: bool,

    /// Output format (all, json, markdown, html)
    #[arg(long, default_value = "all")]
    pub format: String,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}
