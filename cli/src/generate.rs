#![deny(missing_docs)]

//! # Document Command
//!
//! Builds a complete OpenAPI document from a manifest.

use crate::error::{CliError, CliResult};
use oas_reflect_core::{
    ApiOperation, CatalogContractResolver, DocumentGenerator, DocumentGeneratorOptions, Info,
    Manifest, ResolverOptions, SchemaGenerator, SchemaGeneratorOptions, TypeCatalog,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Generator switches shared by every command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GeneratorArgs {
    /// Describe subtypes through `allOf` references to their base.
    #[clap(long)]
    pub all_of: bool,

    /// Describe types with known subtypes as `oneOf` unions.
    #[clap(long)]
    pub one_of: bool,

    /// Emit enums inline instead of as components.
    #[clap(long)]
    pub inline_enums: bool,

    /// Serialize enums by name.
    #[clap(long)]
    pub enums_as_strings: bool,

    /// Wrap annotated member references in `allOf`.
    #[clap(long)]
    pub all_of_refs: bool,

    /// Skip obsolete members.
    #[clap(long)]
    pub ignore_obsolete: bool,

    /// Keep declared member names instead of camelCasing them.
    #[clap(long)]
    pub keep_names: bool,
}

impl GeneratorArgs {
    /// Loads the manifest and builds a schema generator over its catalog.
    pub fn load(&self, manifest: &Path) -> CliResult<(SchemaGenerator, Vec<ApiOperation>)> {
        if !manifest.exists() {
            return Err(CliError::General(format!(
                "Manifest not found: {:?}",
                manifest
            )));
        }
        let (catalog, operations) = Manifest::from_path(manifest)?.build()?;
        info!(types = catalog.len(), operations = operations.len(), "loaded manifest");
        Ok((self.generator(catalog), operations))
    }

    /// Builds a schema generator over `catalog` with the selected switches.
    pub fn generator(&self, catalog: TypeCatalog) -> SchemaGenerator {
        let mut resolver_options = ResolverOptions::default();
        if self.keep_names {
            resolver_options = resolver_options.with_naming_policy(None);
        }
        if self.enums_as_strings {
            resolver_options = resolver_options.with_enums_as_strings(None);
        }

        let mut options = SchemaGeneratorOptions::new();
        if self.all_of {
            options = options.with_all_of_for_inheritance();
        }
        if self.one_of {
            options = options.with_one_of_for_polymorphism();
        }
        if self.inline_enums {
            options = options.with_inline_enums();
        }
        if self.all_of_refs {
            options = options.with_all_of_to_extend_reference_schemas();
        }
        if self.ignore_obsolete {
            options = options.with_ignore_obsolete_properties();
        }

        let catalog = Arc::new(catalog);
        let resolver = Arc::new(CatalogContractResolver::new(
            catalog.clone(),
            resolver_options,
        ));
        SchemaGenerator::new(catalog, resolver, options)
    }
}

/// Arguments for the document command.
#[derive(clap::Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Path to the YAML or JSON manifest.
    #[clap(long)]
    pub manifest: PathBuf,

    /// Output path. `.yaml`/`.yml` writes YAML, anything else JSON.
    /// If not provided, prints JSON to stdout.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Document title.
    #[clap(long, default_value = "API")]
    pub title: String,

    /// Document version.
    #[clap(long, default_value = "v1")]
    pub version: String,

    /// Document description.
    #[clap(long)]
    pub description: Option<String>,

    #[clap(flatten)]
    /// Generator switches.
    pub generator: GeneratorArgs,
}

/// Executes the document generation.
pub fn execute(args: &DocumentArgs) -> CliResult<()> {
    let (generator, operations) = args.generator.load(&args.manifest)?;

    let mut info = Info::new(args.title.clone(), args.version.clone());
    if let Some(description) = &args.description {
        info = info.with_description(description.clone());
    }
    let documents = DocumentGenerator::new(generator, DocumentGeneratorOptions::new(info));
    let document = documents.generate_document(&operations)?;

    write_output(args.output.as_deref(), &document)
}

/// Renders `value` by output extension and writes it, or prints JSON.
pub fn write_output<T: Serialize>(output: Option<&Path>, value: &T) -> CliResult<()> {
    let Some(out_path) = output else {
        println!("{}", render_json(value)?);
        return Ok(());
    };

    let ext = out_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("json");
    let rendered = match ext {
        "yaml" | "yml" => serde_yaml::to_string(value)
            .map_err(|e| CliError::General(format!("YAML serialization failed: {}", e)))?,
        _ => render_json(value)?,
    };

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(out_path, rendered)?;
    info!(path = ?out_path, "wrote output");
    Ok(())
}

fn render_json<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))
}
