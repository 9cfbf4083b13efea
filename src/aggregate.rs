//! Schema aggregation across CRUD roles.
//!
//! A remote resource is usually described by several operation types:
//! `CreateDBInstanceInput`, `DescribeDBInstancesInput`, `ModifyDBInstanceInput`
//! and so on. The [`Aggregator`] folds the fields of every type registered under
//! the input roles into one schema, and likewise for the output roles.
//!
//! # Collision precedence
//!
//! When two source types declare a field with the same name, the later insertion
//! wins. Insertions happen in a fixed order:
//!
//! 1. roles in aggregation order (`Role::INPUTS` / `Role::OUTPUTS`),
//! 2. schemas within a role in registration order,
//! 3. fields within a schema sorted by name.
//!
//! Types are not checked for compatibility; collisions are resolved silently.
//!
//! # Provenance
//!
//! Provenance lists a registered type only if at least one of its fields
//! survived the filter. Registered types whose fields were all filtered out
//! are left out.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::filter::FieldFilter;
use crate::types::{FieldDescriptor, QualifiedName, Role, SourceSchema};

/// Marker prefix recording which source types an aggregated schema was built from.
pub const AGGREGATED_MARKER: &str = "// +crud-typegen:types:aggregated=";

/// A synthesized struct unioning the fields of several source types.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSchema {
    name: QualifiedName,
    fields: IndexMap<String, FieldDescriptor>,
    provenance: BTreeSet<String>,
}

impl AggregatedSchema {
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Fields in insertion order. The order carries no meaning.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Field names, sorted.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// `package.Name` of every source type that contributed a surviving field.
    pub fn provenance(&self) -> &BTreeSet<String> {
        &self.provenance
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Comment marker listing the provenance, or `None` when nothing contributed.
    pub fn provenance_marker(&self) -> Option<String> {
        if self.provenance.is_empty() {
            return None;
        }
        let sources: Vec<&str> = self.provenance.iter().map(String::as_str).collect();
        Some(format!("{}{}", AGGREGATED_MARKER, sources.join(",")))
    }

    /// Struct-shaped schema with the aggregated fields.
    pub fn to_schema(&self) -> SourceSchema {
        SourceSchema::structure(self.name.clone(), self.fields.values().cloned().collect())
    }

    pub fn into_schema(self) -> SourceSchema {
        SourceSchema::structure(self.name, self.fields.into_values().collect())
    }
}

/// Role-tagged source types plus the input and output exclusion chains.
#[derive(Debug, Default)]
pub struct Aggregator<'a> {
    roles: BTreeMap<Role, Vec<&'a SourceSchema>>,
    input_filter: FieldFilter,
    output_filter: FieldFilter,
}

impl<'a> Aggregator<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_filter(mut self, filter: FieldFilter) -> Self {
        self.input_filter = filter;
        self
    }

    pub fn with_output_filter(mut self, filter: FieldFilter) -> Self {
        self.output_filter = filter;
        self
    }

    /// Append a source type under `role`. Several types per role are allowed.
    pub fn register(&mut self, role: Role, schema: &'a SourceSchema) {
        self.roles.entry(role).or_default().push(schema);
    }

    /// Source types registered under `role`, in registration order.
    pub fn registered(&self, role: Role) -> &[&'a SourceSchema] {
        self.roles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Union of the create, read, update and deletion inputs.
    pub fn aggregate_inputs(&self, target: QualifiedName) -> AggregatedSchema {
        self.aggregate(target, &Role::INPUTS, &self.input_filter)
    }

    /// Union of the read and create outputs.
    pub fn aggregate_outputs(&self, target: QualifiedName) -> AggregatedSchema {
        self.aggregate(target, &Role::OUTPUTS, &self.output_filter)
    }

    fn aggregate(
        &self,
        target: QualifiedName,
        roles: &[Role],
        filter: &FieldFilter,
    ) -> AggregatedSchema {
        let mut fields: IndexMap<String, FieldDescriptor> = IndexMap::new();
        let mut provenance = BTreeSet::new();

        for &role in roles {
            for schema in self.registered(role) {
                if !schema.is_struct() {
                    warn!(
                        role = %role,
                        type_name = %schema.name,
                        kind = schema.shape.kind(),
                        "registered type is not a struct, it contributes no fields"
                    );
                    continue;
                }

                let mut ordered: Vec<&FieldDescriptor> = schema.fields().iter().collect();
                ordered.sort_by(|a, b| a.name.cmp(&b.name));

                let mut contributed = false;
                for field in ordered {
                    if filter.should_ignore(field) {
                        continue;
                    }
                    contributed = true;
                    if let Some(previous) = fields.insert(field.name.clone(), field.clone()) {
                        debug!(
                            target_type = %target,
                            field = %field.name,
                            previous = %previous.origin,
                            winner = %field.origin,
                            "field declared by several source types, keeping the later one"
                        );
                    }
                }

                if contributed {
                    provenance.insert(schema.name.to_string());
                }
            }
        }

        AggregatedSchema {
            name: target,
            fields,
            provenance,
        }
    }
}
