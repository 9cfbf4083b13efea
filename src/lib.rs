//! CRUD Type Generator
//!
//! Aggregates the input and output types of a remote resource's create, read,
//! update and delete operations into one schema each, resolves every named type
//! those schemas depend on, and emits deterministic Go-style type declarations.
//!
//! # Example
//!
//! ```
//! use crud_typegen::{
//!     Aggregator, Emitter, FieldFilter, Flattener, GenerationContext, IgnoreRule,
//!     Role, Templates, load_universe_str,
//! };
//! use crud_typegen::{QualifiedName, TypeOracle};
//!
//! let universe = load_universe_str(r#"{"types": [
//!     {"package": "example.com/rds", "name": "CreateInput", "kind": "struct", "fields": [
//!         {"name": "Name", "type": "string"},
//!         {"name": "Region", "type": "string"}
//!     ]},
//!     {"package": "example.com/rds", "name": "ReadInput", "kind": "struct", "fields": [
//!         {"name": "Name", "type": "string"},
//!         {"name": "ID", "type": "string"}
//!     ]}
//! ]}"#).unwrap();
//!
//! let create = universe.lookup_in("example.com/rds", "CreateInput").unwrap();
//! let read = universe.lookup_in("example.com/rds", "ReadInput").unwrap();
//!
//! let mut aggregator = Aggregator::new()
//!     .with_input_filter(FieldFilter::from_rules([IgnoreRule::Name("ID".into())]));
//! aggregator.register(Role::CreateInput, create);
//! aggregator.register(Role::ReadInput, read);
//!
//! let params = aggregator.aggregate_inputs(QualifiedName::new("example.com/apis/v1", "Params"));
//! assert_eq!(params.field_names(), vec!["Name", "Region"]);
//!
//! let root = params.into_schema();
//! let closure = Flattener::new(&universe).flatten(&root).unwrap();
//! let templates = Templates::builtin().unwrap();
//! let mut ctx = GenerationContext::new("example.com/apis/v1", "v1");
//! let out = Emitter::new(&templates).emit(&mut ctx, &closure, "Params", "").unwrap();
//! assert!(out.contains("type Params struct {\n\tName string ``\n\tRegion string ``\n}"));
//! ```
//!
//! # Collision precedence
//!
//! | Aggregation | Role order (later wins) |
//! |-------------|-------------------------|
//! | inputs | create, read, update, deletion |
//! | outputs | read, create |
//!
//! Within a role, later registrations win; within a type, fields are folded in
//! name order.

mod aggregate;
mod emit;
mod error;
mod file;
mod filter;
mod flatten;
mod generate;
mod imports;
mod linter;
mod loader;
mod manifest;
mod oracle;
mod template;
mod types;
mod validator;

pub use aggregate::{AggregatedSchema, Aggregator, AGGREGATED_MARKER};
pub use emit::{
    DestinationNamespace, Emitter, GenerationContext, Templates, ENUM_TEMPLATE, FIELD_TEMPLATE,
    STRUCT_TEMPLATE,
};
pub use error::{
    EmitError, FlattenError, GenerateError, LoadError, SchemaError, TemplateError, TypeRefError,
    ValidateError,
};
pub use file::{is_generated, OutputFile, FILE_TEMPLATE, GENERATED_MARKER};
pub use filter::{FieldFilter, IgnoreFieldFn, IgnoreRule};
pub use flatten::{Flattener, TypeClosure};
pub use generate::{generate, GeneratedFile, Generator};
pub use imports::ImportTable;
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{
    is_url, load_json, load_json_auto, load_json_str, load_manifest, load_manifest_str,
    load_templates, load_universe, load_universe_auto, load_universe_str, manifest_from_value,
    read_text, universe_from_value,
};
pub use manifest::{Manifest, PackageSpec, RoleSpec, TargetSpec};
pub use oracle::{TypeOracle, TypeUniverse};
pub use template::Template;
pub use types::{FieldDescriptor, QualifiedName, Role, SourceSchema, TypeRef, TypeShape};
pub use validator::{validate_against_schema, validate_manifest, validate_universe};

#[cfg(feature = "remote")]
pub use loader::load_json_url;
