//! Include diagram traversal.
//!
//! Consumes the preprocessor include edges the front-end collected for a
//! translation unit and grows the file graph. File nodes are classified
//! against the diagram's root: under it is project, system search paths are
//! system, anything else external.

use std::path::Path;

use crate::config::DiagramConfig;
use crate::diagram::IncludeDiagram;
use crate::error::ModelError;
use crate::filter::DiagramFilter;
use crate::frontend::TranslationUnit;
use crate::model::PathClass;

pub struct IncludeDiagramVisitor<'a> {
    diagram: &'a mut IncludeDiagram,
    filter: &'a DiagramFilter,
    config: &'a DiagramConfig,
}

impl<'a> IncludeDiagramVisitor<'a> {
    pub fn new(
        diagram: &'a mut IncludeDiagram,
        filter: &'a DiagramFilter,
        config: &'a DiagramConfig,
    ) -> Self {
        Self {
            diagram,
            filter,
            config,
        }
    }

    pub fn visit_translation_unit(&mut self, tu: &TranslationUnit) -> Result<(), ModelError> {
        if !self.filter.should_include_path(&tu.path) {
            return Ok(());
        }
        let tu_class = self.classify(&tu.path, false);
        self.diagram.add_file(&tu.path, tu_class)?;

        for include in &tu.includes {
            if include.is_system && !self.config.generate_system_headers {
                continue;
            }
            if !self.filter.should_include_path(&include.path)
                || !self.filter.should_include_path(&include.from)
            {
                continue;
            }
            let from_class = self.classify(&include.from, false);
            let to_class = self.classify(&include.path, include.is_system);
            let from = self.diagram.add_file(&include.from, from_class)?;
            let to = self.diagram.add_file(&include.path, to_class)?;
            self.diagram.add_include_edge(from, to);
        }
        Ok(())
    }

    fn classify(&self, path: &Path, is_system: bool) -> PathClass {
        if is_system {
            return PathClass::System;
        }
        match &self.diagram.relative_to {
            Some(root) if path.starts_with(root) => PathClass::Project,
            Some(_) => PathClass::External,
            None => PathClass::Project,
        }
    }
}
