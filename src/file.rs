//! Assembling a complete output file around rendered declarations.

use std::collections::BTreeMap;

use crate::error::TemplateError;
use crate::imports::ImportTable;
use crate::template::Template;

/// Marker line identifying files this tool wrote.
pub const GENERATED_MARKER: &str = "// Code generated by crud-typegen. DO NOT EDIT.";

/// Default file layout. Callers supply `Types`; the rest is filled in by [`OutputFile::wrap`].
pub const FILE_TEMPLATE: &str = "{{ .Header }}\n\npackage {{ .PackageName }}\n{{ .Imports }}{{ .Types }}";

/// One output file in package `package_name`.
#[derive(Debug, Clone)]
pub struct OutputFile {
    package_name: String,
    template: Template,
    header: String,
}

impl OutputFile {
    pub fn new(package_name: impl Into<String>, template: Template) -> Self {
        Self {
            package_name: package_name.into(),
            template,
            header: String::new(),
        }
    }

    /// License or other text placed above the generated marker.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Render the file template.
    ///
    /// `Header`, `PackageName` and `Imports` are always provided; `values` may
    /// add more keys and overrides none of these three.
    pub fn wrap(
        &self,
        imports: &ImportTable,
        values: &BTreeMap<String, String>,
    ) -> Result<String, TemplateError> {
        let mut bag = values.clone();
        bag.insert("Header".to_string(), self.header_block());
        bag.insert("PackageName".to_string(), self.package_name.clone());
        bag.insert("Imports".to_string(), import_block(imports));
        self.template.render(&bag)
    }

    fn header_block(&self) -> String {
        let header = self.header.trim();
        if header.is_empty() {
            GENERATED_MARKER.to_string()
        } else {
            format!("{}\n\n{}", header, GENERATED_MARKER)
        }
    }
}

/// `import ( ... )` block with one aliased line per package, or nothing.
///
/// Aliases are always written: a package's name need not match its last path segment.
fn import_block(imports: &ImportTable) -> String {
    if imports.is_empty() {
        return String::new();
    }
    let mut block = String::from("\nimport (\n");
    for statement in imports.statements() {
        block.push('\t');
        block.push_str(&statement);
        block.push('\n');
    }
    block.push_str(")\n");
    block
}

/// True if `text` carries a generated-code marker line.
pub fn is_generated(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_end();
        line.starts_with("// Code generated ") && line.ends_with(" DO NOT EDIT.")
    })
}
