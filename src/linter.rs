//! Universe linting - static analysis of type universe files.
//!
//! Validates universe files for:
//! - JSON syntax errors and schema violations
//! - Duplicate types, empty or duplicate field names
//! - Unparsable or unresolved field types
//! - Shapes the emitter will skip

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{LoadError, ValidateError};
use crate::loader::{load_json, raw_universe, RawType};
use crate::types::{is_identifier, QualifiedName, TypeRef};
use crate::validator::validate_universe;

/// Diagnostic severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One finding, located by JSON pointer within its file.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/types/3/fields/0/type")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl FileResult {
    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Status of a linted file: the worst severity among its diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Totals over every universe file under a path.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// No file has an error diagnostic.
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a universe file or every `.json` universe under a directory.
///
/// With `strict`, a file with warnings counts as failed.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let results: Vec<FileResult> = collect_universe_files(path)
        .iter()
        .map(|file| lint_file(file, path))
        .collect();

    let fails = |r: &&FileResult| match r.status {
        FileStatus::Ok => false,
        FileStatus::Warning => strict,
        FileStatus::Error => true,
    };
    let failed = results.iter().filter(fails).count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: results.len(),
        passed: results.len() - failed,
        failed,
        errors: results.iter().map(|r| r.count(Severity::Error)).sum(),
        warnings: results.iter().map(|r| r.count(Severity::Warning)).sum(),
        results,
    }
}

/// Lint a single universe file; the reported path is relative to `base_path`.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut lints = Lints {
        file: file.to_path_buf(),
        diagnostics: Vec::new(),
    };

    match load_json(file) {
        Ok(document) => match validate_universe(&document) {
            Ok(()) => match raw_universe(&document) {
                Ok(raw) => check_types(&raw.types, &mut lints),
                Err(e) => lints.error("E002", "/", e.to_string()),
            },
            Err(ValidateError::Invalid { errors }) => {
                for e in errors {
                    lints.error("E002", &e.path, e.message);
                }
            }
            Err(e) => lints.error("E002", "/", e.to_string()),
        },
        Err(e @ LoadError::InvalidJson { .. }) => {
            lints.error("E001", "/", format!("syntax error: {}", e))
        }
        Err(e) => lints.error("E001", "/", e.to_string()),
    }

    lints.finish(file.strip_prefix(base_path).unwrap_or(file))
}

struct Lints {
    file: PathBuf,
    diagnostics: Vec<Diagnostic>,
}

impl Lints {
    fn push(&mut self, severity: Severity, code: &str, path: &str, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.clone(),
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            message,
        });
    }

    fn error(&mut self, code: &str, path: &str, message: String) {
        self.push(Severity::Error, code, path, message);
    }

    fn warning(&mut self, code: &str, path: &str, message: String) {
        self.push(Severity::Warning, code, path, message);
    }

    fn finish(self, shown_as: &Path) -> FileResult {
        let status = match self.diagnostics.iter().map(|d| d.severity).max() {
            Some(Severity::Error) => FileStatus::Error,
            Some(Severity::Warning) => FileStatus::Warning,
            None => FileStatus::Ok,
        };
        FileResult {
            file: shown_as.to_path_buf(),
            status,
            diagnostics: self.diagnostics,
        }
    }
}

fn check_types(types: &[RawType], lints: &mut Lints) {
    let mut declared = BTreeSet::new();
    for (index, raw) in types.iter().enumerate() {
        let name = QualifiedName::new(raw.package.as_str(), raw.name.as_str());
        if !is_identifier(&raw.name) {
            lints.error(
                "E005",
                &format!("/types/{}/name", index),
                format!("\"{}\" is not a valid type name", raw.name),
            );
        }
        if !declared.insert(name.clone()) {
            lints.error(
                "E003",
                &format!("/types/{}", index),
                format!("duplicate type {}", name),
            );
        }
    }

    for (index, raw) in types.iter().enumerate() {
        let owner = QualifiedName::new(raw.package.as_str(), raw.name.as_str());
        let type_path = format!("/types/{}", index);
        match raw.kind.as_str() {
            "struct" => check_fields(raw, &owner, &type_path, &declared, lints),
            "basic" => {
                let underlying = raw.underlying.as_deref().unwrap_or("").trim();
                if !is_identifier(underlying) {
                    lints.error(
                        "E005",
                        &format!("{}/underlying", type_path),
                        format!("\"{}\" is not a basic type", underlying),
                    );
                }
            }
            kind => lints.warning(
                "W001",
                &format!("{}/kind", type_path),
                format!(
                    "{} has kind \"{}\" and will be skipped when emitted",
                    owner, kind
                ),
            ),
        }
        if raw.kind != "struct" && !raw.fields.is_empty() {
            lints.warning(
                "W002",
                &format!("{}/fields", type_path),
                format!("fields of non-struct type {} are ignored", owner),
            );
        }
    }
}

fn check_fields(
    raw: &RawType,
    owner: &QualifiedName,
    type_path: &str,
    declared: &BTreeSet<QualifiedName>,
    lints: &mut Lints,
) {
    let mut seen = BTreeSet::new();
    for (position, field) in raw.fields.iter().enumerate() {
        let field_path = format!("{}/fields/{}", type_path, position);
        if field.name.is_empty() {
            lints.error(
                "E004",
                &format!("{}/name", field_path),
                format!("empty field name in {}", owner),
            );
        } else if !seen.insert(field.name.as_str()) {
            lints.error(
                "E004",
                &format!("{}/name", field_path),
                format!("duplicate field {} in {}", field.name, owner),
            );
        }

        match TypeRef::parse(&field.ty) {
            Ok(ty) => {
                for name in ty.named_refs() {
                    if !declared.contains(name) {
                        lints.error(
                            "E006",
                            &format!("{}/type", field_path),
                            format!("unresolved type {} in field {} of {}", name, field.name, owner),
                        );
                    }
                }
            }
            Err(e) => lints.error("E005", &format!("{}/type", field_path), e.to_string()),
        }
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_universe_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
