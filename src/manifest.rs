//! Generation manifest: destination package, targets and their role registrations.
//!
//! ```json
//! {
//!   "package": { "path": "example.com/apis/v1", "name": "v1" },
//!   "declared": ["ProviderConfig"],
//!   "targets": [{
//!     "input": "DBParameters",
//!     "output": "DBObservation",
//!     "roles": {
//!       "create_input": ["example.com/rds.CreateDBInstanceInput"],
//!       "read_output": ["example.com/rds.DBInstance"]
//!     },
//!     "input_ignore": [{ "name": "DBInstanceIdentifier" }],
//!     "output_skips_input_fields": true,
//!     "markers": "// +kubebuilder:object:generate=true"
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::filter::{FieldFilter, IgnoreRule};
use crate::types::Role;

/// One generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub package: PackageSpec,
    /// Names already declared in the destination package besides those the
    /// universe knows about.
    #[serde(default)]
    pub declared: Vec<String>,
    pub targets: Vec<TargetSpec>,
}

/// The package generated declarations land in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub path: String,
    pub name: String,
}

/// One aggregated input type, and optionally one aggregated output type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Short name of the aggregated input type.
    pub input: String,
    /// Short name of the aggregated output type; outputs are skipped when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default)]
    pub roles: RoleSpec,
    #[serde(default)]
    pub input_ignore: Vec<IgnoreRule>,
    #[serde(default)]
    pub output_ignore: Vec<IgnoreRule>,
    /// Drop output fields whose name the aggregated input already has.
    #[serde(default)]
    pub output_skips_input_fields: bool,
    /// Comment markers attached to each aggregated root.
    #[serde(default)]
    pub markers: String,
}

impl TargetSpec {
    pub fn input_filter(&self) -> FieldFilter {
        FieldFilter::from_rules(self.input_ignore.iter().cloned())
    }

    pub fn output_filter(&self) -> FieldFilter {
        FieldFilter::from_rules(self.output_ignore.iter().cloned())
    }
}

/// Qualified source type names per role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    #[serde(default)]
    pub create_input: Vec<String>,
    #[serde(default)]
    pub read_input: Vec<String>,
    #[serde(default)]
    pub update_input: Vec<String>,
    #[serde(default)]
    pub deletion_input: Vec<String>,
    #[serde(default)]
    pub create_output: Vec<String>,
    #[serde(default)]
    pub read_output: Vec<String>,
}

impl RoleSpec {
    pub fn names(&self, role: Role) -> &[String] {
        match role {
            Role::CreateInput => &self.create_input,
            Role::ReadInput => &self.read_input,
            Role::UpdateInput => &self.update_input,
            Role::DeletionInput => &self.deletion_input,
            Role::CreateOutput => &self.create_output,
            Role::ReadOutput => &self.read_output,
        }
    }

    /// `(role, name)` pairs, roles in `Role::ALL` order and names as listed.
    pub fn registrations(&self) -> impl Iterator<Item = (Role, &str)> {
        Role::ALL
            .into_iter()
            .flat_map(move |role| self.names(role).iter().map(move |name| (role, name.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        Role::ALL.iter().all(|role| self.names(*role).is_empty())
    }
}
