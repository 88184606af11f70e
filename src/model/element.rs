//! The element: common header shared by every modeled entity plus a
//! kind-specific payload.
//!
//! Elements live in the diagram's id-indexed arena. Once created they are
//! never removed, only merged with later sightings of the same entity from
//! other translation units.

use std::path::PathBuf;

use indexmap::IndexSet;
use serde::Serialize;

use super::class::{ClassData, ConceptData, EnumData};
use super::{Access, EntityId, QualifiedName};

/// Presumed source position of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    /// The translation unit this sighting came from.
    pub translation_unit: PathBuf,
}

/// Namespace promoted to a first-class node in package diagrams.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageData {
    /// Ids of packages this package depends on. Self-references are never
    /// recorded.
    pub dependencies: IndexSet<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Header,
    Source,
}

/// Classification of a file against the configured path roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathClass {
    System,
    Project,
    External,
}

/// File node in include diagrams.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileData {
    pub path: PathBuf,
    pub file_kind: FileKind,
    pub path_class: PathClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Function,
    Method,
    Lambda,
    /// Free functions combined into one participant per source file.
    File,
}

/// Participant in sequence diagrams.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantData {
    pub kind: ParticipantKind,
    /// Stable symbol reference from the front-end.
    pub usr: String,
}

/// Kind-specific payload carried by an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementPayload {
    Class(ClassData),
    Enum(EnumData),
    Concept(ConceptData),
    Package(PackageData),
    File(FileData),
    Participant(ParticipantData),
}

impl ElementPayload {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ElementPayload::Class(data) if data.is_struct => "struct",
            ElementPayload::Class(_) => "class",
            ElementPayload::Enum(_) => "enum",
            ElementPayload::Concept(_) => "concept",
            ElementPayload::Package(_) => "package",
            ElementPayload::File(_) => "file",
            ElementPayload::Participant(_) => "participant",
        }
    }
}

/// A modeled entity.
#[derive(Debug, Clone, Serialize)]
pub struct Element {
    pub id: EntityId,
    /// Short name; template specializations keep their argument list here
    /// (`vector<int>`).
    pub name: String,
    pub namespace: QualifiedName,
    pub source_location: Option<SourceLocation>,
    pub comment: Option<String>,
    pub style: Option<String>,
    pub skip: bool,
    pub deprecated: bool,
    pub access: Access,
    pub is_forward_declaration: bool,
    pub payload: ElementPayload,
}

impl Element {
    /// Creates an element; the id is derived from the full qualified name,
    /// which is the identity contract the whole model relies on.
    pub fn new(
        namespace: QualifiedName,
        name: impl Into<String>,
        payload: ElementPayload,
    ) -> Self {
        let name = name.into();
        let full = if namespace.is_empty() {
            name.clone()
        } else {
            format!("{namespace}::{name}")
        };
        Self {
            id: EntityId::from_name(&full),
            name,
            namespace,
            source_location: None,
            comment: None,
            style: None,
            skip: false,
            deprecated: false,
            access: Access::Public,
            is_forward_declaration: false,
            payload,
        }
    }

    /// Fully-qualified display string (`ns::sub::Name<T>`).
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace, self.name)
        }
    }

    /// Qualified name with template arguments stripped; used for prefix
    /// matching in filters.
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::parse(&self.full_name())
    }

    /// Name rendered relative to the diagram's `using_namespace` root.
    pub fn display_name(&self, using_namespace: &QualifiedName) -> String {
        if using_namespace.is_empty() || !self.namespace.starts_with(using_namespace) {
            return self.full_name();
        }
        let relative = self.namespace.relative_to(using_namespace);
        if relative.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", relative, self.name)
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.payload.kind_name()
    }

    /// Merges a later sighting of the same entity.
    ///
    /// Attributes are unioned; a full declaration always wins over a forward
    /// one. The caller guarantees both sides share the canonical name (and
    /// therefore the id).
    pub fn merge_from(&mut self, other: Element) {
        debug_assert_eq!(self.id, other.id);
        if self.is_forward_declaration && !other.is_forward_declaration {
            self.source_location = other.source_location.or(self.source_location.take());
            self.is_forward_declaration = false;
        } else if self.source_location.is_none() {
            self.source_location = other.source_location;
        }
        if self.comment.is_none() {
            self.comment = other.comment;
        }
        if self.style.is_none() {
            self.style = other.style;
        }
        self.deprecated |= other.deprecated;
        match (&mut self.payload, other.payload) {
            (ElementPayload::Class(this), ElementPayload::Class(that)) => this.merge_from(that),
            (ElementPayload::Enum(this), ElementPayload::Enum(that)) => this.merge_from(that),
            (ElementPayload::Concept(this), ElementPayload::Concept(that)) => {
                this.merge_from(that)
            }
            (ElementPayload::Package(this), ElementPayload::Package(that)) => {
                this.dependencies.extend(that.dependencies);
            }
            // Mismatched payload kinds under one id can only happen when the
            // same name was modeled as two different things; keep the first.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::class::ClassData;

    fn class_element(namespace: &str, name: &str) -> Element {
        Element::new(
            QualifiedName::parse(namespace),
            name,
            ElementPayload::Class(ClassData::default()),
        )
    }

    #[test]
    fn test_id_matches_qualified_name_hash() {
        let element = class_element("app::core", "Widget");
        assert_eq!(element.id, EntityId::from_name("app::core::Widget"));
        assert_eq!(element.full_name(), "app::core::Widget");
    }

    #[test]
    fn test_display_name_relative_to_root() {
        let element = class_element("app::core::detail", "Impl");
        let root = QualifiedName::parse("app::core");
        assert_eq!(element.display_name(&root), "detail::Impl");

        let unrelated = QualifiedName::parse("other");
        assert_eq!(element.display_name(&unrelated), "app::core::detail::Impl");
    }

    #[test]
    fn test_merge_prefers_full_declaration() {
        let mut forward = class_element("app", "Widget");
        forward.is_forward_declaration = true;

        let mut full = class_element("app", "Widget");
        full.comment = Some("the widget".into());
        if let ElementPayload::Class(data) = &mut full.payload {
            data.is_abstract = true;
        }

        forward.merge_from(full);
        assert!(!forward.is_forward_declaration);
        assert_eq!(forward.comment.as_deref(), Some("the widget"));
        match &forward.payload {
            ElementPayload::Class(data) => assert!(data.is_abstract),
            _ => panic!("payload kind changed"),
        }
    }
}
