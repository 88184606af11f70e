//! Relationships between diagram elements.
//!
//! Relationships reference both endpoints by [`EntityId`], never by pointer;
//! the diagram's id index is the only way to navigate from an edge to an
//! element. That keeps mutually-referencing classes (A holds B, B holds A)
//! representable without ownership cycles.

use serde::{Deserialize, Serialize};

use super::{Access, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Extension,
    Composition,
    Aggregation,
    Association,
    Dependency,
    Instantiation,
    Friendship,
    Constraint,
    /// File-to-file edge in include diagrams.
    Includes,
    /// Inner type declared inside an outer type.
    Nesting,
}

impl RelationshipKind {
    /// Kinds that make a plain dependency between the same pair redundant.
    pub fn covers_dependency(self) -> bool {
        matches!(
            self,
            RelationshipKind::Extension
                | RelationshipKind::Composition
                | RelationshipKind::Aggregation
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::Extension => "extension",
            RelationshipKind::Composition => "composition",
            RelationshipKind::Aggregation => "aggregation",
            RelationshipKind::Association => "association",
            RelationshipKind::Dependency => "dependency",
            RelationshipKind::Instantiation => "instantiation",
            RelationshipKind::Friendship => "friendship",
            RelationshipKind::Constraint => "constraint",
            RelationshipKind::Includes => "includes",
            RelationshipKind::Nesting => "nesting",
        }
    }
}

/// A directed edge between two elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Relationship {
    pub source: EntityId,
    pub target: EntityId,
    pub kind: RelationshipKind,
    /// Set only when the relation is mediated by a named member.
    pub label: Option<String>,
    pub access: Access,
    pub multiplicity_source: Option<String>,
    pub multiplicity_target: Option<String>,
}

impl Relationship {
    pub fn new(source: EntityId, target: EntityId, kind: RelationshipKind) -> Self {
        Self {
            source,
            target,
            kind,
            label: None,
            access: Access::Public,
            multiplicity_source: None,
            multiplicity_target: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }
}
