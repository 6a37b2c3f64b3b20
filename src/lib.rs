//! Onboarder - Generate onboarding docs from repositories
//!
//! Scans a repository for its technology stack, entrypoints, layout, HTTP
//! routes and external systems, then writes a JSON report, a Markdown
//! overview, Mermaid diagrams and a small HTML viewer.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;

// Re-export main types
pub use analysis::{AnalysisResult, Analyzer, Diagnostic};
pub use config::Config;
pub use error::{Error, Result};
pub use output::{OutputFormat, OutputWriter};
