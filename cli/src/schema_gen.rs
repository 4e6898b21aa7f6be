#![deny(missing_docs)]

//! # Schema Generation Command
//!
//! Generates the schema of a single type expression together with every
//! component definition it references.

use crate::error::{CliError, CliResult};
use crate::generate::{write_output, GeneratorArgs};
use oas_reflect_core::document::Components;
use oas_reflect_core::manifest::resolve_type;
use oas_reflect_core::{Manifest, Schema, SchemaRepository};
use serde::Serialize;
use std::path::PathBuf;

/// Arguments for the schema command.
#[derive(clap::Args, Debug, Clone)]
pub struct SchemaGenArgs {
    /// Path to the YAML or JSON manifest.
    #[clap(long)]
    pub manifest: PathBuf,

    /// Type expression to describe, e.g. `User`, `List<Order>` or `Page<User>?`.
    #[clap(long = "type")]
    pub type_expr: String,

    /// Output path. `.yaml`/`.yml` writes YAML, anything else JSON.
    /// If not provided, prints JSON to stdout.
    #[clap(long)]
    pub output: Option<PathBuf>,

    #[clap(flatten)]
    /// Generator switches.
    pub generator: GeneratorArgs,
}

#[derive(Serialize)]
struct SchemaOutput {
    schema: Schema,
    components: Components,
}

/// Executes the schema generation.
pub fn execute(args: &SchemaGenArgs) -> CliResult<()> {
    if !args.manifest.exists() {
        return Err(CliError::General(format!(
            "Manifest not found: {:?}",
            args.manifest
        )));
    }

    // Constructed types named on the command line have to be interned before
    // the catalog is frozen into the generator.
    let (mut catalog, _) = Manifest::from_path(&args.manifest)?.build()?;
    let (ty, nullable) = resolve_type(&mut catalog, &args.type_expr)?;
    let generator = args.generator.generator(catalog);

    let mut repository = SchemaRepository::new();
    let mut schema = generator.generate_schema(ty, &mut repository)?;
    schema.nullable |= nullable;

    let output = SchemaOutput {
        schema,
        components: Components {
            schemas: repository.schemas(),
        },
    };
    write_output(args.output.as_deref(), &output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"{
  "types": [
    {"name": "Order", "namespace": "Shop", "members": [
      {"name": "Id", "type": "Guid", "required": true},
      {"name": "Lines", "type": "OrderLine[]"}
    ]},
    {"name": "OrderLine", "namespace": "Shop", "members": [
      {"name": "Sku", "type": "string"},
      {"name": "Quantity", "type": "int"}
    ]}
  ]
}"#;

    #[test]
    fn test_schema_gen_collection_to_json() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("shop.json");
        fs::write(&manifest, MANIFEST).unwrap();
        let out_path = dir.path().join("orders.json");

        let args = SchemaGenArgs {
            manifest,
            type_expr: "List<Order>".to_string(),
            output: Some(out_path.clone()),
            generator: GeneratorArgs::default(),
        };
        execute(&args).unwrap();

        let rendered: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(
            rendered["schema"],
            serde_json::json!({"type": "array", "items": {"$ref": "#/components/schemas/Order"}})
        );
        assert_eq!(
            rendered["components"]["schemas"]["Order"]["properties"]["id"]["format"],
            "uuid"
        );
        assert!(rendered["components"]["schemas"]["OrderLine"].is_object());
    }

    #[test]
    fn test_schema_gen_keep_names_to_yaml() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("shop.json");
        fs::write(&manifest, MANIFEST).unwrap();
        let out_path = dir.path().join("line.yml");

        let args = SchemaGenArgs {
            manifest,
            type_expr: "OrderLine".to_string(),
            output: Some(out_path.clone()),
            generator: GeneratorArgs {
                keep_names: true,
                ..GeneratorArgs::default()
            },
        };
        execute(&args).unwrap();

        let content = fs::read_to_string(&out_path).unwrap();
        assert!(content.contains("Quantity:"));
        assert!(content.contains("OrderLine"));
    }

    #[test]
    fn test_schema_gen_unknown_type() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("shop.json");
        fs::write(&manifest, MANIFEST).unwrap();

        let args = SchemaGenArgs {
            manifest,
            type_expr: "Invoice".to_string(),
            output: None,
            generator: GeneratorArgs::default(),
        };
        assert!(matches!(execute(&args), Err(CliError::App(_))));
    }
}
