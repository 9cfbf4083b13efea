//! Dependency closure of a root type.

use std::collections::BTreeMap;

use crate::error::FlattenError;
use crate::oracle::TypeOracle;
use crate::types::{QualifiedName, SourceSchema, TypeShape};

/// The root type plus every named type reachable from it through field references.
///
/// Members are keyed by qualified name, which is also the iteration order.
///
/// Struct and basic members render as declarations in the destination
/// package under their short name. When several members share a short name,
/// only one owns it: the root if it is among them, otherwise the first in
/// qualified-name order. The others stay external.
#[derive(Debug, Clone)]
pub struct TypeClosure<'a> {
    root: QualifiedName,
    members: BTreeMap<QualifiedName, &'a SourceSchema>,
    owners: BTreeMap<String, QualifiedName>,
}

impl<'a> TypeClosure<'a> {
    pub fn root(&self) -> &QualifiedName {
        &self.root
    }

    /// Members ordered by qualified name.
    pub fn members(&self) -> impl Iterator<Item = &'a SourceSchema> + '_ {
        self.members.values().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &QualifiedName> {
        self.members.keys()
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&'a SourceSchema> {
        self.members.get(name).copied()
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.members.contains_key(name)
    }

    /// True if `name` is a member that renders as a local declaration.
    pub fn declares_locally(&self, name: &QualifiedName) -> bool {
        self.owners.get(&name.name) == Some(name)
    }

    /// Member owning the local short name `name`, if any.
    pub fn local_owner(&self, name: &str) -> Option<&QualifiedName> {
        self.owners.get(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Walks field references through a [`TypeOracle`].
pub struct Flattener<'o, O: TypeOracle + ?Sized> {
    oracle: &'o O,
}

impl<'o, O: TypeOracle + ?Sized> Flattener<'o, O> {
    pub fn new(oracle: &'o O) -> Self {
        Self { oracle }
    }

    /// Compute the closure of `root`.
    ///
    /// `root` does not need to be known to the oracle (aggregated schemas are
    /// not). Every other reachable name must be.
    ///
    /// # Errors
    ///
    /// Returns `FlattenError::TypeNotFound` for the first referenced name the
    /// oracle cannot resolve.
    pub fn flatten<'a>(&self, root: &'a SourceSchema) -> Result<TypeClosure<'a>, FlattenError>
    where
        'o: 'a,
    {
        let mut members = BTreeMap::new();
        members.insert(root.name.clone(), root);
        self.visit(root, &mut members)?;
        let owners = local_owners(&root.name, &members);
        Ok(TypeClosure {
            root: root.name.clone(),
            members,
            owners,
        })
    }

    fn visit<'a>(
        &self,
        schema: &'a SourceSchema,
        members: &mut BTreeMap<QualifiedName, &'a SourceSchema>,
    ) -> Result<(), FlattenError>
    where
        'o: 'a,
    {
        for field in schema.fields() {
            for dependency in field.ty.named_refs() {
                if members.contains_key(dependency) {
                    continue;
                }
                let found = self.oracle.lookup(dependency).ok_or_else(|| {
                    FlattenError::TypeNotFound {
                        name: dependency.to_string(),
                        referenced_by: schema.name.to_string(),
                        field: field.name.clone(),
                    }
                })?;
                // Insert before descending so cycles terminate.
                members.insert(dependency.clone(), found);
                self.visit(found, members)?;
            }
        }
        Ok(())
    }
}

fn renders_locally(schema: &SourceSchema) -> bool {
    matches!(
        schema.shape,
        TypeShape::Struct { .. } | TypeShape::Basic { .. }
    )
}

fn local_owners(
    root: &QualifiedName,
    members: &BTreeMap<QualifiedName, &SourceSchema>,
) -> BTreeMap<String, QualifiedName> {
    let mut owners = BTreeMap::new();
    let candidates = members
        .get(root)
        .into_iter()
        .chain(members.values())
        .filter(|schema| renders_locally(schema));
    for schema in candidates {
        owners
            .entry(schema.name.name.clone())
            .or_insert_with(|| schema.name.clone());
    }
    owners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::TypeUniverse;
    use crate::types::{FieldDescriptor, TypeRef};

    const PKG: &str = "example.com/rds";

    fn qn(name: &str) -> QualifiedName {
        QualifiedName::new(PKG, name)
    }

    fn structure(name: &str, fields: &[(&str, &str)]) -> SourceSchema {
        SourceSchema::structure(
            qn(name),
            fields
                .iter()
                .map(|(n, t)| FieldDescriptor::new(*n, TypeRef::parse(t).unwrap(), "", qn(name)))
                .collect(),
        )
    }

    fn names(closure: &TypeClosure<'_>) -> Vec<String> {
        closure.names().map(|n| n.name.clone()).collect()
    }

    #[test]
    fn self_reference_terminates() {
        let universe: TypeUniverse =
            [structure("Node", &[("Children", "[]example.com/rds.Node")])]
                .into_iter()
                .collect();
        let root = universe.lookup(&qn("Node")).unwrap();

        let closure = Flattener::new(&universe).flatten(root).unwrap();
        assert_eq!(closure.len(), 1);
        assert!(closure.contains(&qn("Node")));
    }

    #[test]
    fn mutual_cycle_terminates() {
        let universe: TypeUniverse = [
            structure("A", &[("B", "*example.com/rds.B")]),
            structure("B", &[("A", "map[string]example.com/rds.A")]),
        ]
        .into_iter()
        .collect();
        let root = universe.lookup(&qn("A")).unwrap();

        let closure = Flattener::new(&universe).flatten(root).unwrap();
        assert_eq!(names(&closure), vec!["A", "B"]);
    }

    #[test]
    fn discovers_through_indirection() {
        let universe: TypeUniverse = [
            structure("Tag", &[("Key", "string")]),
            SourceSchema::basic(qn("Engine"), "string"),
        ]
        .into_iter()
        .collect();
        let root = structure(
            "Params",
            &[("Tags", "*[]example.com/rds.Tag"), ("Engine", "example.com/rds.Engine")],
        );

        let closure = Flattener::new(&universe).flatten(&root).unwrap();
        assert_eq!(names(&closure), vec!["Engine", "Params", "Tag"]);
        assert_eq!(closure.root(), &qn("Params"));
    }

    #[test]
    fn transitive_dependencies() {
        let universe: TypeUniverse = [
            structure("Filter", &[("Values", "[]example.com/rds.Value")]),
            structure("Value", &[("Raw", "string")]),
        ]
        .into_iter()
        .collect();
        let root = structure("Query", &[("Filters", "map[string]*example.com/rds.Filter")]);

        let closure = Flattener::new(&universe).flatten(&root).unwrap();
        assert_eq!(names(&closure), vec!["Filter", "Query", "Value"]);
    }

    #[test]
    fn root_without_dependencies() {
        let universe = TypeUniverse::new();
        let root = structure("Params", &[("Name", "string")]);

        let closure = Flattener::new(&universe).flatten(&root).unwrap();
        assert_eq!(closure.len(), 1);
        assert!(!closure.is_empty());
    }

    #[test]
    fn unknown_reference_is_error() {
        let universe = TypeUniverse::new();
        let root = structure("Params", &[("Tags", "[]example.com/rds.Tag")]);

        let err = Flattener::new(&universe).flatten(&root).unwrap_err();
        assert_eq!(
            err,
            FlattenError::TypeNotFound {
                name: "example.com/rds.Tag".into(),
                referenced_by: "example.com/rds.Params".into(),
                field: "Tags".into(),
            }
        );
    }

    #[test]
    fn unsupported_members_are_leaves() {
        let universe: TypeUniverse = [SourceSchema::unsupported(qn("Handler"), "interface")]
            .into_iter()
            .collect();
        let root = structure("Params", &[("Handler", "example.com/rds.Handler")]);

        let closure = Flattener::new(&universe).flatten(&root).unwrap();
        assert_eq!(closure.len(), 2);
        assert!(!closure.declares_locally(&qn("Handler")));
        assert!(closure.declares_locally(&qn("Params")));
    }

    #[test]
    fn shared_short_name_has_one_owner() {
        let ec2_tag = SourceSchema::structure(
            QualifiedName::new("example.com/ec2", "Tag"),
            vec![],
        );
        let universe: TypeUniverse = [structure("Tag", &[("Key", "string")]), ec2_tag]
            .into_iter()
            .collect();
        let root = structure(
            "Params",
            &[("A", "example.com/rds.Tag"), ("B", "example.com/ec2.Tag")],
        );

        let closure = Flattener::new(&universe).flatten(&root).unwrap();
        assert_eq!(closure.len(), 3);
        let ec2 = QualifiedName::new("example.com/ec2", "Tag");
        assert!(closure.declares_locally(&ec2));
        assert!(!closure.declares_locally(&qn("Tag")));
        assert_eq!(closure.local_owner("Tag"), Some(&ec2));
    }

    #[test]
    fn root_owns_its_short_name() {
        let universe: TypeUniverse = [structure("Params", &[("Name", "string")])]
            .into_iter()
            .collect();
        let root = SourceSchema::structure(
            QualifiedName::new("example.com/apis/v1", "Params"),
            vec![FieldDescriptor::new(
                "Inner",
                TypeRef::parse("example.com/rds.Params").unwrap(),
                "",
                qn("Params"),
            )],
        );

        let closure = Flattener::new(&universe).flatten(&root).unwrap();
        assert!(closure.declares_locally(closure.root()));
        assert!(!closure.declares_locally(&qn("Params")));
    }

    #[test]
    fn members_iterate_in_name_order() {
        let universe: TypeUniverse = [
            structure("Zeta", &[]),
            structure("Alpha", &[]),
            structure("Mid", &[]),
        ]
        .into_iter()
        .collect();
        let root = structure(
            "Root",
            &[
                ("Z", "example.com/rds.Zeta"),
                ("A", "example.com/rds.Alpha"),
                ("M", "example.com/rds.Mid"),
            ],
        );

        let closure = Flattener::new(&universe).flatten(&root).unwrap();
        let order: Vec<&str> = closure.members().map(|m| m.name.name.as_str()).collect();
        assert_eq!(order, vec!["Alpha", "Mid", "Root", "Zeta"]);
    }
}
