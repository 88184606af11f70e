//! Class diagram model and finalization.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::error::ModelError;
use crate::filter::{DiagramFilter, Filtered};
use crate::model::{
    Access, Element, ElementPayload, EntityId, QualifiedName, Relationship, RelationshipKind,
};

use super::DiagramModel;

/// A relationship discovered before its target (or even its source) was
/// admitted. Targets are recorded by canonical name and resolved against the
/// merged model during finalization; an edge whose endpoints never both made
/// it into the diagram disappears with them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingRelationship {
    pub source: EntityId,
    pub target_name: String,
    pub kind: RelationshipKind,
    pub label: Option<String>,
    pub access: Access,
}

/// Class diagram: records, enums and concepts plus the relationships the
/// traversal discovered between them.
#[derive(Debug, Default)]
pub struct ClassDiagram {
    pub model: DiagramModel,
    pending: Vec<PendingRelationship>,
    /// Elements whose filter verdict was deferred; re-tested at finalize.
    deferred: Vec<Element>,
}

impl ClassDiagram {
    pub fn new(name: impl Into<String>, using_namespace: QualifiedName) -> Self {
        Self {
            model: DiagramModel::new(name, using_namespace),
            pending: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn add_pending_relationship(&mut self, pending: PendingRelationship) {
        self.pending.push(pending);
    }

    pub fn defer_element(&mut self, element: Element) {
        self.deferred.push(element);
    }

    /// Unions a partial diagram produced by one translation-unit worker.
    pub fn merge_from(&mut self, partial: ClassDiagram) -> Result<(), ModelError> {
        self.model.merge_from(partial.model)?;
        self.pending.extend(partial.pending);
        self.deferred.extend(partial.deferred);
        Ok(())
    }

    /// Runs the post-processing passes. Deferred elements and pending
    /// relationships feed each other (an admitted element can complete the
    /// closure another deferred element's filter verdict hangs on), so the
    /// two resolve in one loop until neither makes progress. Then structural
    /// edges (extension, instantiation, nesting, friendship) are synthesized
    /// from element payloads, dependencies shadowed by a stronger edge
    /// between the same pair are dropped, and transitive extension shadows
    /// are reduced away.
    pub fn finalize(&mut self, filter: &DiagramFilter) -> Result<(), ModelError> {
        loop {
            let admitted = self.admit_deferred_pass(filter)?;
            let resolved = self.resolve_pending_pass(filter);
            if !admitted && !resolved {
                break;
            }
        }
        for element in std::mem::take(&mut self.deferred) {
            debug!(
                element = %element.full_name(),
                "still deferred after fix-point, dropped"
            );
        }
        self.pending.clear();
        self.resolve_structural_edges(filter);
        self.drop_covered_dependencies();
        self.reduce_inheritance();
        Ok(())
    }

    /// One pass over the deferred elements; returns whether any was
    /// admitted.
    fn admit_deferred_pass(&mut self, filter: &DiagramFilter) -> Result<bool, ModelError> {
        let mut admitted_any = false;
        let mut next = Vec::new();
        for element in std::mem::take(&mut self.deferred) {
            match filter.should_include_element(&element, &self.model) {
                Filtered::Include => {
                    self.model.add_element(element)?;
                    admitted_any = true;
                }
                Filtered::Defer => next.push(element),
                Filtered::Exclude => {}
            }
        }
        self.deferred = next;
        Ok(admitted_any)
    }

    /// One pass over the pending relationships; entries whose endpoints are
    /// not both admitted yet are kept for a later pass. Returns whether any
    /// edge was added.
    fn resolve_pending_pass(&mut self, filter: &DiagramFilter) -> bool {
        let mut resolved_any = false;
        let mut kept = Vec::new();
        for entry in std::mem::take(&mut self.pending) {
            if !filter.should_include_relationship(entry.kind) {
                continue;
            }
            let target = EntityId::from_name(&entry.target_name);
            if target == entry.source {
                // A type referencing itself is not an edge worth drawing.
                continue;
            }
            if !self.model.contains(entry.source) || !self.model.contains(target) {
                kept.push(entry);
                continue;
            }
            let mut relationship =
                Relationship::new(entry.source, target, entry.kind).with_access(entry.access);
            relationship.label = entry.label;
            self.model.add_relationship(relationship);
            resolved_any = true;
        }
        self.pending = kept;
        resolved_any
    }

    fn resolve_structural_edges(&mut self, filter: &DiagramFilter) {
        let mut edges: Vec<Relationship> = Vec::new();
        for element in self.model.elements() {
            let ElementPayload::Class(data) = &element.payload else {
                continue;
            };
            for base in &data.bases {
                if self.model.contains(base.id) {
                    edges.push(
                        Relationship::new(element.id, base.id, RelationshipKind::Extension)
                            .with_access(base.access),
                    );
                }
            }
            if let Some(primary) = data.specialization_of {
                if self.model.contains(primary) {
                    edges.push(Relationship::new(
                        element.id,
                        primary,
                        RelationshipKind::Instantiation,
                    ));
                } else {
                    debug!(
                        specialization = %element.full_name(),
                        "primary template not in diagram, instantiation edge skipped"
                    );
                }
            }
            if let Some(outer) = data.nested_in {
                if self.model.contains(outer) {
                    edges.push(Relationship::new(
                        element.id,
                        outer,
                        RelationshipKind::Nesting,
                    ));
                }
            }
            for friend in &data.friends {
                if self.model.contains(*friend) {
                    edges.push(Relationship::new(
                        element.id,
                        *friend,
                        RelationshipKind::Friendship,
                    ));
                }
            }
        }
        for edge in edges {
            if filter.should_include_relationship(edge.kind) {
                self.model.add_relationship(edge);
            }
        }
    }

    /// A dependency edge says nothing a stronger edge between the same pair
    /// does not already say.
    fn drop_covered_dependencies(&mut self) {
        let covered: HashSet<(EntityId, EntityId)> = self
            .model
            .relationships()
            .iter()
            .filter(|rel| rel.kind.covers_dependency())
            .map(|rel| (rel.source, rel.target))
            .collect();
        let kept: Vec<Relationship> = self
            .model
            .relationships()
            .iter()
            .filter(|rel| {
                rel.kind != RelationshipKind::Dependency
                    || !covered.contains(&(rel.source, rel.target))
            })
            .cloned()
            .collect();
        self.model.set_relationships(kept);
    }

    /// Removes a direct extension edge when the same pair is connected by a
    /// longer extension path; the direct edge is a shadow of the transitive
    /// one.
    fn reduce_inheritance(&mut self) {
        let extensions: Vec<(EntityId, EntityId)> = self
            .model
            .relationships()
            .iter()
            .filter(|rel| rel.kind == RelationshipKind::Extension)
            .map(|rel| (rel.source, rel.target))
            .collect();

        let mut shadowed: HashSet<(EntityId, EntityId)> = HashSet::new();
        for &(source, target) in &extensions {
            if has_path_excluding(&extensions, source, target, (source, target)) {
                shadowed.insert((source, target));
            }
        }
        if shadowed.is_empty() {
            return;
        }
        let kept: Vec<Relationship> = self
            .model
            .relationships()
            .iter()
            .filter(|rel| {
                rel.kind != RelationshipKind::Extension
                    || !shadowed.contains(&(rel.source, rel.target))
            })
            .cloned()
            .collect();
        self.model.set_relationships(kept);
    }
}

/// Depth-first reachability over extension edges, skipping one direct edge.
fn has_path_excluding(
    edges: &[(EntityId, EntityId)],
    from: EntityId,
    to: EntityId,
    excluded: (EntityId, EntityId),
) -> bool {
    let mut visited = HashSet::new();
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        for &(source, target) in edges {
            if source != current || (source, target) == excluded {
                continue;
            }
            if target == to {
                return true;
            }
            if visited.insert(target) {
                stack.push(target);
            }
        }
    }
    false
}
