//! Running a manifest end to end: aggregate, flatten, emit, wrap.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::aggregate::{AggregatedSchema, Aggregator};
use crate::emit::{Emitter, GenerationContext, Templates};
use crate::error::GenerateError;
use crate::file::OutputFile;
use crate::flatten::Flattener;
use crate::manifest::{Manifest, PackageSpec, TargetSpec};
use crate::oracle::{TypeOracle, TypeUniverse};
use crate::types::{QualifiedName, Role, SourceSchema};

/// A rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub content: String,
    /// Short names declared by this run, sorted.
    pub emitted: Vec<String>,
    /// `alias "path"` import lines, sorted by path.
    pub imports: Vec<String>,
}

/// Run `manifest` against `universe` with `templates` and no header.
pub fn generate(
    universe: &TypeUniverse,
    manifest: &Manifest,
    templates: &Templates,
) -> Result<GeneratedFile, GenerateError> {
    Generator::new(universe, templates.clone()).run(manifest)
}

/// Generation pipeline over one type universe.
#[derive(Debug, Clone)]
pub struct Generator<'u> {
    universe: &'u TypeUniverse,
    templates: Templates,
    header: String,
}

impl<'u> Generator<'u> {
    pub fn new(universe: &'u TypeUniverse, templates: Templates) -> Self {
        Self {
            universe,
            templates,
            header: String::new(),
        }
    }

    /// License text placed above the generated marker.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Fresh context for `manifest`'s destination package.
    ///
    /// The namespace starts with every universe type already living in the
    /// destination package plus the manifest's `declared` names.
    pub fn context(&self, manifest: &Manifest) -> GenerationContext {
        let package = &manifest.package;
        GenerationContext::new(package.path.as_str(), package.name.as_str())
            .with_declared(
                self.universe
                    .package_types(&package.path)
                    .map(|schema| schema.name.name.clone()),
            )
            .with_declared(manifest.declared.iter().cloned())
    }

    /// Generate every target of `manifest` into one file.
    ///
    /// # Errors
    ///
    /// Fails on the first target whose role types cannot be resolved, whose
    /// closure references an unknown type, or whose templates fail.
    pub fn run(&self, manifest: &Manifest) -> Result<GeneratedFile, GenerateError> {
        let mut ctx = self.context(manifest);
        let seeded: BTreeSet<String> = ctx.namespace.iter().map(str::to_string).collect();

        let mut types = String::new();
        for target in &manifest.targets {
            types.push_str(&self.generate_target(&mut ctx, &manifest.package, target)?);
        }

        let file = OutputFile::new(manifest.package.name.as_str(), self.templates.file.clone())
            .with_header(self.header.as_str());
        let values = BTreeMap::from([("Types".to_string(), types)]);
        let content = file.wrap(&ctx.imports, &values)?;

        Ok(GeneratedFile {
            content,
            emitted: ctx
                .namespace
                .iter()
                .filter(|name| !seeded.contains(*name))
                .map(str::to_string)
                .collect(),
            imports: ctx.imports.statements(),
        })
    }

    /// Aggregate, flatten and emit one target into `ctx`.
    pub fn generate_target(
        &self,
        ctx: &mut GenerationContext,
        package: &PackageSpec,
        target: &TargetSpec,
    ) -> Result<String, GenerateError> {
        let sources = self.resolve_roles(target)?;
        if sources.is_empty() {
            warn!(input = %target.input, "target registers no source types");
        }

        let mut aggregator = Aggregator::new().with_input_filter(target.input_filter());
        for (role, schema) in &sources {
            aggregator.register(*role, *schema);
        }

        let input = aggregator.aggregate_inputs(QualifiedName::new(
            package.path.as_str(),
            target.input.as_str(),
        ));
        let input_fields: Vec<String> = input.field_names().into_iter().map(String::from).collect();
        let mut out = self.emit_root(ctx, target, input)?;

        if let Some(output_name) = &target.output {
            let mut filter = target.output_filter();
            if target.output_skips_input_fields {
                filter = filter.excluding_names(input_fields);
            }
            let aggregator = aggregator.with_output_filter(filter);
            let output = aggregator
                .aggregate_outputs(QualifiedName::new(package.path.as_str(), output_name.as_str()));
            out.push_str(&self.emit_root(ctx, target, output)?);
        }

        Ok(out)
    }

    fn resolve_roles(
        &self,
        target: &TargetSpec,
    ) -> Result<Vec<(Role, &'u SourceSchema)>, GenerateError> {
        let universe: &'u TypeUniverse = self.universe;
        target
            .roles
            .registrations()
            .map(|(role, text)| -> Result<(Role, &'u SourceSchema), GenerateError> {
                let name =
                    QualifiedName::parse(text).map_err(|source| GenerateError::InvalidTypeName {
                        target: target.input.clone(),
                        role,
                        name: text.to_string(),
                        source,
                    })?;
                let schema =
                    universe
                        .lookup(&name)
                        .ok_or_else(|| GenerateError::UnknownSourceType {
                            target: target.input.clone(),
                            role,
                            name: name.to_string(),
                        })?;
                Ok((role, schema))
            })
            .collect()
    }

    fn emit_root(
        &self,
        ctx: &mut GenerationContext,
        target: &TargetSpec,
        aggregated: AggregatedSchema,
    ) -> Result<String, GenerateError> {
        let annotation = annotation(&target.markers, aggregated.provenance_marker());
        let root = aggregated.into_schema();

        let closure = Flattener::new(self.universe)
            .flatten(&root)
            .map_err(|source| GenerateError::Flatten {
                target: target.input.clone(),
                source,
            })?;
        let rendered = Emitter::new(&self.templates)
            .emit(ctx, &closure, &root.name.name, &annotation)
            .map_err(|source| GenerateError::Emit {
                target: target.input.clone(),
                source,
            })?;

        info!(
            type_name = %root.name,
            fields = root.fields().len(),
            closure = closure.len(),
            "generated aggregated type"
        );
        Ok(rendered)
    }
}

/// Target markers followed by the provenance marker, one per line.
fn annotation(markers: &str, provenance: Option<String>) -> String {
    let mut out = String::new();
    let markers = markers.trim_end();
    if !markers.is_empty() {
        out.push_str(markers);
        out.push('\n');
    }
    if let Some(provenance) = provenance {
        out.push_str(&provenance);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load_manifest_str, load_universe_str};

    const UNIVERSE: &str = r#"{"types": [
        {"package": "example.com/rds", "name": "CreateInput", "kind": "struct", "fields": [
            {"name": "Name", "type": "string", "tag": "json:\"name\""},
            {"name": "Tags", "type": "[]*example.com/rds.Tag"}
        ]},
        {"package": "example.com/rds", "name": "DeleteInput", "kind": "struct", "fields": [
            {"name": "ID", "type": "string"}
        ]},
        {"package": "example.com/rds", "name": "Instance", "kind": "struct", "fields": [
            {"name": "Name", "type": "string"},
            {"name": "Status", "type": "example.com/rds.Status"}
        ]},
        {"package": "example.com/rds", "name": "Tag", "kind": "struct", "fields": [
            {"name": "Key", "type": "string"}
        ]},
        {"package": "example.com/rds", "name": "Status", "kind": "basic", "underlying": "string"},
        {"package": "example.com/apis/v1", "name": "Existing", "kind": "struct"}
    ]}"#;

    fn manifest(extra: &str) -> Manifest {
        load_manifest_str(&format!(
            r#"{{"package": {{"path": "example.com/apis/v1", "name": "v1"}},
                "targets": [{{
                    "input": "Params",
                    "output": "Observation",
                    "roles": {{
                        "create_input": ["example.com/rds.CreateInput"],
                        "deletion_input": ["example.com/rds.DeleteInput"],
                        "read_output": ["example.com/rds.Instance"]
                    }},
                    "input_ignore": [{{"name": "ID"}}]
                    {}
                }}]}}"#,
            extra
        ))
        .unwrap()
    }

    #[test]
    fn context_seeds_destination_types() {
        let universe = load_universe_str(UNIVERSE).unwrap();
        let mut m = manifest("");
        m.declared.push("ProviderConfig".into());
        let ctx = Generator::new(&universe, Templates::builtin().unwrap()).context(&m);
        assert!(ctx.namespace.declares("Existing"));
        assert!(ctx.namespace.declares("ProviderConfig"));
        assert!(!ctx.namespace.declares("Tag"));
    }

    #[test]
    fn generates_inputs_and_outputs() {
        let universe = load_universe_str(UNIVERSE).unwrap();
        let file = generate(&universe, &manifest(""), &Templates::builtin().unwrap()).unwrap();

        assert_eq!(file.emitted, vec!["Observation", "Params", "Status", "Tag"]);
        assert!(file.imports.is_empty());
        assert!(file.content.contains(
            "// +crud-typegen:types:aggregated=example.com/rds.CreateInput\ntype Params struct {\n\tName string `json:\"name\"`\n\tTags []*Tag ``\n}\n"
        ));
        assert!(file.content.contains("type Observation struct {\n\tName string ``\n\tStatus Status ``\n}\n"));
        assert!(!file.content.contains("ID string"));
    }

    #[test]
    fn output_skips_input_fields() {
        let universe = load_universe_str(UNIVERSE).unwrap();
        let m = manifest(r#", "output_skips_input_fields": true, "markers": "// +genclient""#);
        let file = generate(&universe, &m, &Templates::builtin().unwrap()).unwrap();

        assert!(file.content.contains("type Observation struct {\n\tStatus Status ``\n}\n"));
        assert!(file.content.contains(
            "// +genclient\n// +crud-typegen:types:aggregated=example.com/rds.Instance\ntype Observation"
        ));
    }

    #[test]
    fn unknown_role_type() {
        let universe = load_universe_str(UNIVERSE).unwrap();
        let mut m = manifest("");
        m.targets[0].roles.update_input.push("example.com/rds.ModifyInput".into());

        let err = generate(&universe, &m, &Templates::builtin().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::UnknownSourceType { role: Role::UpdateInput, ref name, .. }
                if name == "example.com/rds.ModifyInput"
        ));
    }

    #[test]
    fn invalid_role_type_name() {
        let universe = load_universe_str(UNIVERSE).unwrap();
        let mut m = manifest("");
        m.targets[0].roles.read_input.push("example.com/rds".into());

        let err = generate(&universe, &m, &Templates::builtin().unwrap()).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidTypeName { role: Role::ReadInput, .. }));
    }

    #[test]
    fn annotation_joins_markers_and_provenance() {
        assert_eq!(annotation("", None), "");
        assert_eq!(annotation("// +a\n\n", None), "// +a\n");
        assert_eq!(annotation("// +a", Some("// +b".into())), "// +a\n// +b\n");
    }
}
