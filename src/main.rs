// SPDX-License-Identifier: PMPL-1.0-or-later
//! accessibility-engine CLI - check a content file for accessibility compliance

use accessibility_engine::ai::UnavailableProvider;
use accessibility_engine::config::load_config;
use accessibility_engine::model::ImageDescriptor;
use accessibility_engine::report::{render, OutputFormat};
use accessibility_engine::ComplianceEngine;
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Accessibility compliance engine
#[derive(Parser)]
#[command(name = "accessibility-engine")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a content file
    Check {
        /// File containing the markup to check
        content: PathBuf,

        /// JSON file with the image list ([{"src", "alt", "data", "mimeType"}])
        #[arg(long)]
        images: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Configuration file
        #[arg(long, default_value = "accessibility-engine.toml")]
        config: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the rule catalog
    Rules {
        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,
    },
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("accessibility_engine=debug")
    } else {
        EnvFilter::new("accessibility_engine=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { content, images, format, config, output, verbose } => {
            init_logging(verbose);
            let config = load_config(&config)?;

            let markup = std::fs::read_to_string(&content)
                .with_context(|| format!("Failed to read {}", content.display()))?;
            let images = match images {
                Some(path) => read_images(&path)?,
                None => Vec::new(),
            };

            // No AI transport ships with the CLI: reports carry rule coverage only
            let engine = ComplianceEngine::new(config, Arc::new(UnavailableProvider));
            let report = engine.check_content(&markup, &images).await?;
            write_output(&render(&report, format.into()), output.as_deref())?;

            if report.has_high_severity() {
                std::process::exit(1);
            }
        }

        Commands::Rules { format } => {
            let rules = &accessibility_engine::rules::RULES;
            match format {
                FormatArg::Json => println!("{}", serde_json::to_string_pretty(rules)?),
                FormatArg::Text => {
                    for rule in rules.iter() {
                        println!(
                            "{:<16} WCAG {} (Level {}, {}) - {}: {}",
                            rule.id, rule.wcag_criterion, rule.compliance_level, rule.category, rule.name, rule.description
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn read_images(path: &Path) -> anyhow::Result<Vec<ImageDescriptor>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid image list in {}", path.display()))
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
