use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use glossary_core::{ExtractConfig, Extractor};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glossary-extract")]
#[command(about = "Export tag dropdowns and resource links from a glossary workbook", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Glossary workbook (overrides `input` from the config)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Worksheet name (overrides `sheet` from the config)
    #[arg(short, long, value_name = "SHEET")]
    sheet: Option<String>,

    /// Output path for the tag dropdown JSON
    #[arg(long, value_name = "FILE")]
    tags_out: Option<PathBuf>,

    /// Output path for the resource JSON
    #[arg(long, value_name = "FILE")]
    resources_out: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        ExtractConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try to load default config from current directory if it exists
        let default_config_path = PathBuf::from("glossary.toml");
        if default_config_path.exists() {
            ExtractConfig::from_file(&default_config_path).with_context(|| {
                format!(
                    "Failed to load config from {}",
                    default_config_path.display()
                )
            })?
        } else {
            ExtractConfig::default()
        }
    };

    if let Some(input) = cli.input {
        config.input = input;
    }
    if let Some(sheet) = cli.sheet {
        config.sheet = sheet;
    }
    if let Some(path) = cli.tags_out {
        config.tag_dropdowns_output = path;
    }
    if let Some(path) = cli.resources_out {
        config.resources_output = path;
    }

    log::debug!("Using configuration: {:?}", config);

    let summary = Extractor::with_config(config).run()?;

    println!(
        "{} Saved {} tag dropdown entries to '{}'",
        "✓".green().bold(),
        summary.tag_dropdown_count,
        summary.tag_dropdowns_path.display()
    );
    println!(
        "{} Saved {} resources to '{}'",
        "✓".green().bold(),
        summary.resource_count,
        summary.resources_path.display()
    );

    Ok(())
}
