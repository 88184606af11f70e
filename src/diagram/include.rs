//! Include diagram model.
//!
//! A directed graph of files: translation units and every header reached
//! through the preprocessor, with `includes` edges in directive order. Nodes
//! are classified system/project/external against the configured roots.

use std::path::{Path, PathBuf};

use crate::model::{
    Element, ElementPayload, EntityId, FileData, FileKind, PathClass, QualifiedName,
    Relationship, RelationshipKind,
};

use super::DiagramModel;

#[derive(Debug, Default)]
pub struct IncludeDiagram {
    pub model: DiagramModel,
    /// Root the file labels are rendered relative to.
    pub relative_to: Option<PathBuf>,
}

impl IncludeDiagram {
    pub fn new(name: impl Into<String>, relative_to: Option<PathBuf>) -> Self {
        Self {
            model: DiagramModel::new(name, QualifiedName::new()),
            relative_to,
        }
    }

    /// Adds a file node keyed by its display label. Repeated sightings merge.
    pub fn add_file(
        &mut self,
        path: &Path,
        path_class: PathClass,
    ) -> Result<EntityId, crate::error::ModelError> {
        let label = self.label_for(path);
        let file_kind = classify_extension(path);
        let element = Element::new(
            QualifiedName::new(),
            label,
            ElementPayload::File(FileData {
                path: path.to_path_buf(),
                file_kind,
                path_class,
            }),
        );
        self.model.add_element(element)
    }

    pub fn add_include_edge(&mut self, from: EntityId, to: EntityId) {
        if from == to {
            return;
        }
        self.model
            .add_relationship(Relationship::new(from, to, RelationshipKind::Includes));
    }

    /// Unions a partial diagram produced by one translation-unit worker.
    pub fn merge_from(&mut self, partial: IncludeDiagram) -> Result<(), crate::error::ModelError> {
        self.model.merge_from(partial.model)
    }

    /// File label relative to the configured root; system headers keep their
    /// bare name.
    pub fn label_for(&self, path: &Path) -> String {
        if let Some(root) = &self.relative_to {
            if let Ok(stripped) = path.strip_prefix(root) {
                return stripped.to_string_lossy().replace('\\', "/");
            }
        }
        path.to_string_lossy().replace('\\', "/")
    }
}

fn classify_extension(path: &Path) -> FileKind {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("h" | "hh" | "hpp" | "hxx" | "inc") | None => FileKind::Header,
        _ => FileKind::Source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_relative_to_root() {
        let diagram = IncludeDiagram::new("d", Some(PathBuf::from("/src")));
        assert_eq!(diagram.label_for(Path::new("/src/lib/a.h")), "lib/a.h");
        assert_eq!(diagram.label_for(Path::new("/usr/include/vector")), "/usr/include/vector");
    }

    #[test]
    fn test_edges_and_kinds() {
        let mut diagram = IncludeDiagram::new("d", Some(PathBuf::from("/src")));
        let tu = diagram
            .add_file(Path::new("/src/main.cc"), PathClass::Project)
            .unwrap();
        let header = diagram
            .add_file(Path::new("/src/lib/a.h"), PathClass::Project)
            .unwrap();
        diagram.add_include_edge(tu, header);

        assert_eq!(diagram.model.element_count(), 2);
        assert_eq!(diagram.model.relationships().len(), 1);
        assert_eq!(
            diagram.model.relationships()[0].kind,
            RelationshipKind::Includes
        );

        let node = diagram.model.get(header).unwrap();
        match &node.payload {
            ElementPayload::File(data) => {
                assert_eq!(data.file_kind, FileKind::Header);
                assert_eq!(data.path_class, PathClass::Project);
            }
            _ => panic!("expected file payload"),
        }
    }

    #[test]
    fn test_repeated_file_merges() {
        let mut diagram = IncludeDiagram::new("d", None);
        let first = diagram
            .add_file(Path::new("/src/a.h"), PathClass::Project)
            .unwrap();
        let second = diagram
            .add_file(Path::new("/src/a.h"), PathClass::Project)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(diagram.model.element_count(), 1);
    }
}
