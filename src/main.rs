//! Remold CLI - run JSON transformation pipelines
//!
//! # Main Commands
//!
//! ```bash
//! remold transform input.json -c config.json   # Rewrite a document
//! remold validate config.json                  # Check a configuration
//! ```
//!
//! # Reference Commands
//!
//! ```bash
//! remold operations          # Show available pipeline operations
//! remold example-config      # Show a worked example configuration
//! ```

use clap::{Parser, Subcommand};
use remold::{execute, operations_description, validate};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "remold")]
#[command(about = "Rewrite JSON documents with declarative pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline configuration against an input document
    Transform {
        /// Input JSON document
        input: PathBuf,

        /// Pipeline configuration JSON file
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,

        /// Skip configuration validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Validate a pipeline configuration
    Validate {
        /// Configuration JSON file
        config: PathBuf,
    },

    /// Show available pipeline operations
    Operations,

    /// Show a worked example configuration
    ExampleConfig,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform {
            input,
            config,
            output,
            compact,
            no_validate,
        } => cmd_transform(&input, &config, output.as_deref(), compact, no_validate),

        Commands::Validate { config } => cmd_validate(&config),

        Commands::Operations => cmd_operations(),

        Commands::ExampleConfig => cmd_example_config(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_transform(
    input: &Path,
    config: &Path,
    output: Option<&Path>,
    compact: bool,
    no_validate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Transforming: {}", input.display());

    let input_doc: Value = serde_json::from_str(&fs::read_to_string(input)?)?;
    let config_doc: Value = serde_json::from_str(&fs::read_to_string(config)?)?;

    if no_validate {
        eprintln!("   (validation skipped)");
    } else {
        validate(&config_doc)?;
        eprintln!("   ✅ Configuration valid");
    }

    let steps = config_doc
        .get("pipeline")
        .and_then(Value::as_array)
        .map(|s| s.len())
        .unwrap_or(0);
    eprintln!("   Pipeline: {} step(s)", steps);

    let result = execute(&input_doc, &config_doc);
    eprintln!("✅ Done");

    let json = if compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    write_output(&json, output)?;

    Ok(())
}

fn cmd_validate(config: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Validating: {}", config.display());

    let config_doc: Value = serde_json::from_str(&fs::read_to_string(config)?)?;
    validate(&config_doc)?;

    let steps = config_doc
        .get("pipeline")
        .and_then(Value::as_array)
        .map(|s| s.len())
        .unwrap_or(0);
    eprintln!("✅ Configuration is valid ({} step(s))", steps);

    Ok(())
}

fn cmd_operations() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", operations_description());
    Ok(())
}

fn cmd_example_config() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", remold::example_config().to_json()?);
    Ok(())
}

/// Write to a file or stdout
fn write_output(content: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("💾 Written to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
