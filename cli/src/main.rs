#![deny(missing_docs)]

//! # OAS Reflect CLI
//!
//! Command Line Interface for generating OpenAPI output from type manifests.
//!
//! Supported Commands:
//! - `document`: Manifest -> OpenAPI 3.0 document.
//! - `schema`: Manifest + type expression -> schema and referenced components.

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::CliResult;

mod error;
mod generate;
mod schema_gen;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI generation from reflected type metadata")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a complete OpenAPI document.
    Document(generate::DocumentArgs),
    /// Generate the schema of a single type.
    Schema(schema_gen::SchemaGenArgs),
}

fn main() -> CliResult<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Document(args) => generate::execute(args),
        Commands::Schema(args) => schema_gen::execute(args),
    };
    if let Err(e) = &result {
        error!(error = %e, "generation failed");
    }
    result
}
