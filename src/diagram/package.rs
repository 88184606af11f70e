//! Package diagram model.
//!
//! Every non-anonymous, non-inline namespace the traversal admits becomes a
//! package node. A dependency edge `A -> B` exists iff at least one
//! declaration inside `A` references a type declared inside `B`; the
//! traversal records the ids in the package payload and finalization turns
//! them into relationship edges.

use crate::filter::DiagramFilter;
use crate::model::{
    Element, ElementPayload, EntityId, QualifiedName, Relationship, RelationshipKind,
};

use super::DiagramModel;

#[derive(Debug, Default)]
pub struct PackageDiagram {
    pub model: DiagramModel,
    /// Cross-package references recorded by target namespace; resolved after
    /// the merge, when the target package may finally exist.
    pending: Vec<(EntityId, String)>,
}

impl PackageDiagram {
    pub fn new(name: impl Into<String>, using_namespace: QualifiedName) -> Self {
        Self {
            model: DiagramModel::new(name, using_namespace),
            pending: Vec::new(),
        }
    }

    /// Records that package `from` references a type declared in namespace
    /// `target_namespace`.
    pub fn add_pending_dependency(&mut self, from: EntityId, target_namespace: impl Into<String>) {
        self.pending.push((from, target_namespace.into()));
    }

    /// Unions a partial diagram produced by one translation-unit worker.
    pub fn merge_from(&mut self, partial: PackageDiagram) -> Result<(), crate::error::ModelError> {
        self.model.merge_from(partial.model)?;
        self.pending.extend(partial.pending);
        Ok(())
    }

    pub fn packages(&self) -> impl Iterator<Item = &Element> {
        self.model
            .elements()
            .filter(|element| matches!(element.payload, ElementPayload::Package(_)))
    }

    /// Records that package `from` references something declared in `to`.
    /// Self-references are suppressed.
    pub fn add_package_dependency(&mut self, from: EntityId, to: EntityId) {
        if from == to {
            return;
        }
        if let Some(element) = self.model.get_mut(from) {
            if let ElementPayload::Package(data) = &mut element.payload {
                data.dependencies.insert(to);
            }
        }
    }

    /// Turns recorded dependency sets into relationship edges. Only edges
    /// whose target package made it into the diagram are emitted.
    pub fn finalize(&mut self, filter: &DiagramFilter) {
        let pending = std::mem::take(&mut self.pending);
        for (from, target_namespace) in pending {
            if let Some(target) = self.model.find_id_by_name(&target_namespace) {
                self.add_package_dependency(from, target);
            }
        }
        if !filter.should_include_relationship(RelationshipKind::Dependency) {
            return;
        }
        let mut edges = Vec::new();
        for element in self.packages() {
            let ElementPayload::Package(data) = &element.payload else {
                continue;
            };
            for &target in &data.dependencies {
                if target != element.id && self.model.contains(target) {
                    edges.push(Relationship::new(
                        element.id,
                        target,
                        RelationshipKind::Dependency,
                    ));
                }
            }
        }
        for edge in edges {
            self.model.add_relationship(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::PackageData;

    fn open_filter() -> DiagramFilter {
        let config = Config::from_toml("[diagrams.d]\ntype = \"package\"\n").unwrap();
        DiagramFilter::from_config(&config.diagrams["d"]).unwrap()
    }

    fn package(namespace: &str, name: &str) -> Element {
        Element::new(
            QualifiedName::parse(namespace),
            name,
            ElementPayload::Package(PackageData::default()),
        )
    }

    #[test]
    fn test_dependencies_become_edges() {
        let mut diagram = PackageDiagram::new("d", QualifiedName::new());
        let a = diagram.model.add_element(package("app", "core")).unwrap();
        let b = diagram.model.add_element(package("app", "util")).unwrap();
        diagram.add_package_dependency(a, b);
        diagram.finalize(&open_filter());

        assert_eq!(diagram.model.relationships().len(), 1);
        let edge = &diagram.model.relationships()[0];
        assert_eq!((edge.source, edge.target), (a, b));
        assert_eq!(edge.kind, RelationshipKind::Dependency);
    }

    #[test]
    fn test_pending_dependency_resolves_by_namespace_name() {
        let mut diagram = PackageDiagram::new("d", QualifiedName::new());
        let a = diagram.model.add_element(package("app", "core")).unwrap();
        // Recorded before the target package exists.
        diagram.add_pending_dependency(a, "app::util");
        let b = diagram.model.add_element(package("app", "util")).unwrap();
        diagram.finalize(&open_filter());

        assert!(diagram
            .model
            .relationships()
            .iter()
            .any(|rel| rel.source == a && rel.target == b));
    }

    #[test]
    fn test_self_edges_suppressed() {
        let mut diagram = PackageDiagram::new("d", QualifiedName::new());
        let a = diagram.model.add_element(package("app", "core")).unwrap();
        diagram.add_package_dependency(a, a);
        diagram.finalize(&open_filter());
        assert!(diagram.model.relationships().is_empty());
    }

    #[test]
    fn test_edges_to_filtered_packages_are_dropped() {
        let mut diagram = PackageDiagram::new("d", QualifiedName::new());
        let a = diagram.model.add_element(package("app", "core")).unwrap();
        // Target package was never admitted into the diagram.
        let ghost = EntityId::from_name("app::detail");
        diagram.add_package_dependency(a, ghost);
        diagram.finalize(&open_filter());
        assert!(diagram.model.relationships().is_empty());
    }
}
