//! Diagram models.
//!
//! Every diagram kind shares one arena: an insertion-ordered id→element map
//! plus a central relationship list. The arena is the single owner of all
//! elements; relationships and payload cross-references carry ids only, so
//! mutually-referencing entities and strongly-connected package graphs are
//! represented without ownership cycles. Navigation always goes through
//! [`DiagramModel::get`].

pub mod class;
pub mod include;
pub mod package;
pub mod sequence;

pub use class::ClassDiagram;
pub use include::IncludeDiagram;
pub use package::PackageDiagram;
pub use sequence::{Activity, Message, MessageKind, SequenceDiagram};

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ModelError;
use crate::model::id::canonicalize;
use crate::model::{Element, ElementPayload, EntityId, QualifiedName, Relationship, RelationshipKind};

/// Shared element arena and relationship store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagramModel {
    pub name: String,
    pub using_namespace: QualifiedName,
    elements: IndexMap<EntityId, Element>,
    relationships: Vec<Relationship>,
    #[serde(skip)]
    relationship_set: HashSet<Relationship>,
}

impl DiagramModel {
    pub fn new(name: impl Into<String>, using_namespace: QualifiedName) -> Self {
        Self {
            name: name.into(),
            using_namespace,
            ..Self::default()
        }
    }

    /// Adds an element, merging attributes when the entity is already known.
    ///
    /// Two distinct canonical names hashing to the same id is a broken model;
    /// the caller must treat the error as fatal.
    pub fn add_element(&mut self, element: Element) -> Result<EntityId, ModelError> {
        let id = element.id;
        if let Some(existing) = self.elements.get_mut(&id) {
            let existing_name = canonicalize(&existing.full_name());
            let incoming_name = canonicalize(&element.full_name());
            if existing_name != incoming_name {
                return Err(ModelError::IdCollision {
                    id,
                    existing: existing_name,
                    incoming: incoming_name,
                });
            }
            existing.merge_from(element);
        } else {
            self.elements.insert(id, element);
        }
        Ok(id)
    }

    /// Adds a relationship unless an identical edge is already recorded.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        if self.relationship_set.insert(relationship.clone()) {
            self.relationships.push(relationship);
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn find_by_name(&self, full_name: &str) -> Option<&Element> {
        let id = EntityId::from_name(full_name);
        self.elements.get(&id)
    }

    pub fn find_id_by_name(&self, full_name: &str) -> Option<EntityId> {
        self.find_by_name(full_name).map(|element| element.id)
    }

    /// Name of `id` rendered against the diagram's `using_namespace`.
    pub fn display_name(&self, id: EntityId) -> Option<String> {
        self.get(id)
            .map(|element| element.display_name(&self.using_namespace))
    }

    /// Replaces the relationship list wholesale; used by finalization passes.
    pub(crate) fn set_relationships(&mut self, relationships: Vec<Relationship>) {
        self.relationship_set = relationships.iter().cloned().collect();
        self.relationships = relationships;
    }

    /// Unions a partial model produced by one translation-unit worker.
    pub fn merge_from(&mut self, partial: DiagramModel) -> Result<(), ModelError> {
        for (_, element) in partial.elements {
            self.add_element(element)?;
        }
        for relationship in partial.relationships {
            self.add_relationship(relationship);
        }
        Ok(())
    }

    /// Transitive closure of elements deriving from `root`, root included.
    pub fn subclasses_of(&self, root: EntityId) -> HashSet<EntityId> {
        let mut result = HashSet::from([root]);
        for element in self.elements() {
            if self.parents_of(element.id).contains(&root) {
                result.insert(element.id);
            }
        }
        result
    }

    /// Transitive base-class closure of `root`, root included. Bases are
    /// taken both from class payloads and from extension edges, so the
    /// closure works before structural edges have been synthesized.
    pub fn parents_of(&self, root: EntityId) -> HashSet<EntityId> {
        let mut result = HashSet::from([root]);
        let mut frontier = vec![root];
        while let Some(current) = frontier.pop() {
            if let Some(ElementPayload::Class(data)) =
                self.get(current).map(|element| &element.payload)
            {
                for base in &data.bases {
                    if result.insert(base.id) {
                        frontier.push(base.id);
                    }
                }
            }
            for rel in &self.relationships {
                if rel.kind == RelationshipKind::Extension
                    && rel.source == current
                    && result.insert(rel.target)
                {
                    frontier.push(rel.target);
                }
            }
        }
        result
    }

    /// Elements `root` reaches through dependency-like edges, root included.
    pub fn dependencies_of(&self, root: EntityId) -> HashSet<EntityId> {
        let mut result = HashSet::from([root]);
        let mut frontier = vec![root];
        let followed = [
            RelationshipKind::Dependency,
            RelationshipKind::Association,
            RelationshipKind::Aggregation,
            RelationshipKind::Composition,
            RelationshipKind::Instantiation,
        ];
        while let Some(current) = frontier.pop() {
            for rel in &self.relationships {
                if followed.contains(&rel.kind)
                    && rel.source == current
                    && result.insert(rel.target)
                {
                    frontier.push(rel.target);
                }
            }
        }
        result
    }

}
