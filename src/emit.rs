//! Rendering a type closure into source declarations.
//!
//! Output order is fixed by the closure (qualified-name order). Members whose
//! short name the destination namespace already declares are skipped without a
//! structural comparison, and every member rendered here is declared afterwards,
//! so emitting the same closure twice into one context yields nothing the
//! second time.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::{EmitError, TemplateError};
use crate::file::FILE_TEMPLATE;
use crate::flatten::TypeClosure;
use crate::imports::ImportTable;
use crate::template::Template;
use crate::types::{FieldDescriptor, QualifiedName, SourceSchema, TypeShape};

/// Declaration of a struct-shaped member.
pub const STRUCT_TEMPLATE: &str = "\n{{ .CommentMarkers }}type {{ .Name }} struct {\n{{ .Fields }}}\n";

/// One line of a struct body.
pub const FIELD_TEMPLATE: &str = "\t{{ .Name }} {{ .Type }} `{{ .Tag }}`\n";

/// Declaration of a basic-shaped member as an alias of its primitive.
pub const ENUM_TEMPLATE: &str = "\n{{ .CommentMarkers }}type {{ .Name }} {{ .UnderlyingType }}\n";

/// Template set used for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub structure: Template,
    pub field: Template,
    pub enumeration: Template,
    pub file: Template,
}

impl Templates {
    /// The built-in templates.
    pub fn builtin() -> Result<Self, TemplateError> {
        Ok(Self {
            structure: Template::parse("struct", STRUCT_TEMPLATE)?,
            field: Template::parse("field", FIELD_TEMPLATE)?,
            enumeration: Template::parse("enum", ENUM_TEMPLATE)?,
            file: Template::parse("file", FILE_TEMPLATE)?,
        })
    }

    pub fn with_structure(mut self, template: Template) -> Self {
        self.structure = template;
        self
    }

    pub fn with_field(mut self, template: Template) -> Self {
        self.field = template;
        self
    }

    pub fn with_enumeration(mut self, template: Template) -> Self {
        self.enumeration = template;
        self
    }

    pub fn with_file(mut self, template: Template) -> Self {
        self.file = template;
        self
    }
}

/// Short names already declared in the output package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationNamespace {
    declared: BTreeSet<String>,
}

impl DestinationNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            declared: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    /// Returns false if the name was already declared.
    pub fn declare(&mut self, name: impl Into<String>) -> bool {
        self.declared.insert(name.into())
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }
}

/// Mutable state of one generation run, passed to every [`Emitter::emit`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    pub namespace: DestinationNamespace,
    pub imports: ImportTable,
}

impl GenerationContext {
    /// Empty context for output declared in package `package_name` at `package_path`.
    pub fn new(package_path: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            namespace: DestinationNamespace::new(),
            imports: ImportTable::new(package_path, package_name),
        }
    }

    pub fn with_declared<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.namespace.declare(name);
        }
        self
    }
}

/// Renders closures through a [`Templates`] set.
#[derive(Debug, Clone, Copy)]
pub struct Emitter<'t> {
    templates: &'t Templates,
}

impl<'t> Emitter<'t> {
    pub fn new(templates: &'t Templates) -> Self {
        Self { templates }
    }

    /// Render every member of `closure` not yet declared in `ctx`.
    ///
    /// `annotation` (comment markers) is attached only to the member named
    /// `root_name`. Unsupported shapes are skipped with a warning and left
    /// undeclared.
    ///
    /// # Errors
    ///
    /// Returns `EmitError::Template` naming the member whose template failed.
    /// The context may already hold declarations and imports from members
    /// rendered before the failure.
    pub fn emit(
        &self,
        ctx: &mut GenerationContext,
        closure: &TypeClosure<'_>,
        root_name: &str,
        annotation: &str,
    ) -> Result<String, EmitError> {
        let annotation = normalize_annotation(annotation);
        let mut out = String::new();

        for member in closure.members() {
            let name = &member.name.name;
            let shadowed = !matches!(member.shape, TypeShape::Unsupported { .. })
                && !closure.declares_locally(&member.name);
            if shadowed {
                warn!(
                    type_name = %member.name,
                    owner = ?closure.local_owner(name).map(ToString::to_string),
                    "short name owned by another type in the closure, referencing through an import"
                );
                continue;
            }
            if ctx.namespace.declares(name) {
                debug!(type_name = %member.name, "already declared in destination, skipping");
                continue;
            }
            let markers = if name == root_name { annotation.as_str() } else { "" };

            let rendered = match &member.shape {
                TypeShape::Struct { fields } => {
                    self.render_struct(ctx, closure, member, fields, markers)
                }
                TypeShape::Basic { underlying } => self.render_enum(member, underlying, markers),
                TypeShape::Unsupported { kind } => {
                    warn!(
                        type_name = %member.name,
                        kind = %kind,
                        "underlying type is neither struct nor basic, skipping"
                    );
                    continue;
                }
            }
            .map_err(|source| EmitError::Template {
                type_name: member.name.to_string(),
                source,
            })?;

            out.push_str(&rendered);
            ctx.namespace.declare(name.clone());
        }

        Ok(out)
    }

    fn render_struct(
        &self,
        ctx: &mut GenerationContext,
        closure: &TypeClosure<'_>,
        member: &SourceSchema,
        fields: &[FieldDescriptor],
        markers: &str,
    ) -> Result<String, TemplateError> {
        let mut ordered: Vec<&FieldDescriptor> = fields.iter().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name));

        let local_path = ctx.imports.local_path().to_string();
        let rehome = |name: &QualifiedName| {
            if closure.declares_locally(name) {
                QualifiedName::new(local_path.as_str(), name.name.as_str())
            } else {
                name.clone()
            }
        };

        let mut body = String::new();
        for field in ordered {
            let ty = ctx.imports.use_type(&field.ty.map_named(&rehome));
            let values = BTreeMap::from([
                ("Name", field.name.as_str()),
                ("Type", ty.as_str()),
                ("Tag", field.tag.as_str()),
                ("Comment", ""),
                ("CommentMarkers", ""),
            ]);
            body.push_str(&self.templates.field.render(&values)?);
        }

        let values = BTreeMap::from([
            ("Name", member.name.name.as_str()),
            ("Fields", body.as_str()),
            ("Comment", ""),
            ("CommentMarkers", markers),
        ]);
        self.templates.structure.render(&values)
    }

    fn render_enum(
        &self,
        member: &SourceSchema,
        underlying: &str,
        markers: &str,
    ) -> Result<String, TemplateError> {
        let values = BTreeMap::from([
            ("Name", member.name.name.as_str()),
            ("UnderlyingType", underlying),
            ("Comment", ""),
            ("CommentMarkers", markers),
        ]);
        self.templates.enumeration.render(&values)
    }
}

fn normalize_annotation(annotation: &str) -> String {
    if annotation.is_empty() || annotation.ends_with('\n') {
        annotation.to_string()
    } else {
        format!("{}\n", annotation)
    }
}
