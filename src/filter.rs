//! Filter engine.
//!
//! Each diagram carries one [`DiagramFilter`] compiled from its config
//! `include`/`exclude` blocks. The traversal consults it twice: before an
//! element enters the diagram, and before a relationship is recorded. The
//! result is tri-valued: context predicates (`subclasses`, `specializations`,
//! `parents`, `dependencies`) cannot decide until their anchor element is in
//! the model, so a candidate may be deferred and re-tested later.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::config::{DiagramConfig, ElementTypeFilter, FilterBlock};
use crate::diagram::DiagramModel;
use crate::error::ConfigError;
use crate::model::{Access, Element, ElementPayload, QualifiedName, RelationshipKind};

/// Filter verdict for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filtered {
    Include,
    Exclude,
    /// The deciding predicate's anchor is not yet in the model; retry once
    /// more of the model exists.
    Defer,
}

/// Per-family vote inside one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vote {
    Matched,
    NotMatched,
    /// Context predicate with an unresolved anchor.
    Unknown,
}

#[derive(Debug, Default)]
struct CompiledBlock {
    namespaces: Vec<QualifiedName>,
    path_globs: Option<GlobSet>,
    element_names: Vec<String>,
    element_patterns: Vec<Regex>,
    element_types: Vec<ElementTypeFilter>,
    relationships: Vec<RelationshipKind>,
    access: Vec<Access>,
    subclasses: Vec<String>,
    specializations: Vec<String>,
    parents: Vec<String>,
    dependencies: Vec<String>,
}

impl CompiledBlock {
    fn compile(block: &FilterBlock) -> Result<Self, ConfigError> {
        let path_globs = if block.paths.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &block.paths {
                let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidGlob {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                builder.add(glob);
            }
            Some(builder.build().map_err(|e| ConfigError::InvalidGlob {
                pattern: block.paths.join(", "),
                message: e.to_string(),
            })?)
        };

        let mut element_names = Vec::new();
        let mut element_patterns = Vec::new();
        for entry in &block.elements {
            if let Some(pattern) = entry.strip_prefix("r:") {
                let regex =
                    Regex::new(pattern.trim()).map_err(|e| ConfigError::InvalidPattern {
                        pattern: entry.clone(),
                        message: e.to_string(),
                    })?;
                element_patterns.push(regex);
            } else {
                element_names.push(entry.clone());
            }
        }

        Ok(Self {
            namespaces: block.namespaces.iter().map(|ns| QualifiedName::parse(ns)).collect(),
            path_globs,
            element_names,
            element_patterns,
            element_types: block.element_types.clone(),
            relationships: block.relationships.clone(),
            access: block.access.clone(),
            subclasses: block.subclasses.clone(),
            specializations: block.specializations.clone(),
            parents: block.parents.clone(),
            dependencies: block.dependencies.clone(),
        })
    }

    fn has_element_predicates(&self) -> bool {
        !self.namespaces.is_empty()
            || self.path_globs.is_some()
            || !self.element_names.is_empty()
            || !self.element_patterns.is_empty()
            || !self.element_types.is_empty()
            || !self.subclasses.is_empty()
            || !self.specializations.is_empty()
            || !self.parents.is_empty()
            || !self.dependencies.is_empty()
    }

    /// Union vote over every predicate family that has entries.
    fn vote(&self, element: &Element, model: &DiagramModel) -> Vote {
        let mut saw_unknown = false;
        let mut saw_miss = false;

        let mut tally = |vote: Option<Vote>| -> bool {
            match vote {
                Some(Vote::Matched) => true,
                Some(Vote::Unknown) => {
                    saw_unknown = true;
                    false
                }
                Some(Vote::NotMatched) => {
                    saw_miss = true;
                    false
                }
                None => false,
            }
        };

        if tally(self.vote_namespaces(element))
            || tally(self.vote_paths(element))
            || tally(self.vote_element_names(element))
            || tally(self.vote_element_types(element))
            || tally(self.vote_context(&self.subclasses, element, model, ContextKind::Subclasses))
            || tally(self.vote_context(
                &self.specializations,
                element,
                model,
                ContextKind::Specializations,
            ))
            || tally(self.vote_context(&self.parents, element, model, ContextKind::Parents))
            || tally(self.vote_context(
                &self.dependencies,
                element,
                model,
                ContextKind::Dependencies,
            ))
        {
            return Vote::Matched;
        }
        if saw_unknown {
            Vote::Unknown
        } else if saw_miss {
            Vote::NotMatched
        } else {
            // No family had entries.
            Vote::NotMatched
        }
    }

    fn vote_namespaces(&self, element: &Element) -> Option<Vote> {
        if self.namespaces.is_empty() {
            return None;
        }
        let name = element.qualified_name();
        let matched = self.namespaces.iter().any(|ns| name.starts_with(ns));
        Some(if matched { Vote::Matched } else { Vote::NotMatched })
    }

    fn vote_paths(&self, element: &Element) -> Option<Vote> {
        let globs = self.path_globs.as_ref()?;
        let matched = element
            .source_location
            .as_ref()
            .is_some_and(|loc| globs.is_match(&loc.file));
        Some(if matched { Vote::Matched } else { Vote::NotMatched })
    }

    fn vote_element_names(&self, element: &Element) -> Option<Vote> {
        if self.element_names.is_empty() && self.element_patterns.is_empty() {
            return None;
        }
        let full_name = element.full_name();
        let matched = self.element_names.iter().any(|name| name == &full_name)
            || self
                .element_patterns
                .iter()
                .any(|pattern| pattern.is_match(&full_name));
        Some(if matched { Vote::Matched } else { Vote::NotMatched })
    }

    fn vote_element_types(&self, element: &Element) -> Option<Vote> {
        if self.element_types.is_empty() {
            return None;
        }
        let matched = self
            .element_types
            .iter()
            .any(|t| t.kind_name() == element.kind_name());
        Some(if matched { Vote::Matched } else { Vote::NotMatched })
    }

    /// Context predicates anchor on another element. Anchor ids derive from
    /// the configured names directly (identity is name-based), so an anchor
    /// matches its own element before that element is even admitted; a
    /// predicate is undecidable only when a closure walk dead-ends on an
    /// element the model does not hold yet.
    fn vote_context(
        &self,
        anchors: &[String],
        element: &Element,
        model: &DiagramModel,
        kind: ContextKind,
    ) -> Option<Vote> {
        if anchors.is_empty() {
            return None;
        }
        let mut undecided = false;
        for anchor in anchors {
            let anchor_id = crate::model::EntityId::from_name(anchor);
            if element.id == anchor_id {
                return Some(Vote::Matched);
            }
            let matched = match kind {
                ContextKind::Subclasses => {
                    let seeds = direct_bases(element);
                    let (contains, complete) = base_closure_contains(model, seeds, anchor_id);
                    if contains {
                        return Some(Vote::Matched);
                    }
                    undecided |= !complete;
                    false
                }
                ContextKind::Parents => {
                    let Some(anchor_element) = model.get(anchor_id) else {
                        undecided = true;
                        continue;
                    };
                    let seeds = direct_bases(anchor_element);
                    let (contains, complete) = base_closure_contains(model, seeds, element.id);
                    if contains {
                        return Some(Vote::Matched);
                    }
                    undecided |= !complete;
                    false
                }
                ContextKind::Dependencies => {
                    if model.contains(anchor_id) {
                        model.dependencies_of(anchor_id).contains(&element.id)
                    } else {
                        undecided = true;
                        continue;
                    }
                }
                ContextKind::Specializations => {
                    matches!(
                        &element.payload,
                        ElementPayload::Class(data)
                            if data.specialization_of == Some(anchor_id)
                    )
                }
            };
            if matched {
                return Some(Vote::Matched);
            }
        }
        Some(if undecided { Vote::Unknown } else { Vote::NotMatched })
    }
}

/// Direct base ids of a class candidate, from its payload.
fn direct_bases(element: &Element) -> Vec<crate::model::EntityId> {
    match &element.payload {
        ElementPayload::Class(data) => data.bases.iter().map(|base| base.id).collect(),
        _ => Vec::new(),
    }
}

/// Walks the base closure starting from `seeds` (payload bases plus
/// extension edges) looking for `anchor`. The second flag reports whether
/// the walk saw the whole closure: a frontier id missing from the model
/// leaves the answer provisional.
fn base_closure_contains(
    model: &DiagramModel,
    seeds: Vec<crate::model::EntityId>,
    anchor: crate::model::EntityId,
) -> (bool, bool) {
    use std::collections::HashSet;
    let mut complete = true;
    let mut visited: HashSet<crate::model::EntityId> = HashSet::new();
    let mut frontier = seeds;
    while let Some(current) = frontier.pop() {
        if current == anchor {
            return (true, complete);
        }
        if !visited.insert(current) {
            continue;
        }
        match model.get(current) {
            Some(element) => frontier.extend(direct_bases(element)),
            None => complete = false,
        }
        for rel in model.relationships() {
            if rel.kind == crate::model::RelationshipKind::Extension && rel.source == current {
                frontier.push(rel.target);
            }
        }
    }
    (false, complete)
}

#[derive(Debug, Clone, Copy)]
enum ContextKind {
    Subclasses,
    Specializations,
    Parents,
    Dependencies,
}

/// Compiled include/exclude filter of one diagram.
#[derive(Debug, Default)]
pub struct DiagramFilter {
    include: CompiledBlock,
    exclude: CompiledBlock,
}

impl DiagramFilter {
    pub fn from_config(config: &DiagramConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            include: CompiledBlock::compile(&config.include)?,
            exclude: CompiledBlock::compile(&config.exclude)?,
        })
    }

    /// Element admission: at least one include predicate matches (an empty
    /// include block admits everything) and no exclude predicate matches.
    pub fn should_include_element(&self, element: &Element, model: &DiagramModel) -> Filtered {
        let include_vote = if self.include.has_element_predicates() {
            self.include.vote(element, model)
        } else {
            Vote::Matched
        };
        let exclude_vote = if self.exclude.has_element_predicates() {
            self.exclude.vote(element, model)
        } else {
            Vote::NotMatched
        };
        match (include_vote, exclude_vote) {
            (_, Vote::Matched) => Filtered::Exclude,
            (Vote::Matched, Vote::NotMatched) => Filtered::Include,
            (Vote::Matched, Vote::Unknown) => Filtered::Defer,
            (Vote::Unknown, _) => Filtered::Defer,
            (Vote::NotMatched, _) => Filtered::Exclude,
        }
    }

    /// Early pruning for namespace traversal. A namespace is worth entering
    /// when it can still lead to an included element: it matches an include
    /// namespace, or is an ancestor of one.
    pub fn should_enter_namespace(&self, namespace: &QualifiedName) -> bool {
        if self
            .exclude
            .namespaces
            .iter()
            .any(|ns| namespace.starts_with(ns))
        {
            return false;
        }
        if self.include.namespaces.is_empty() {
            return true;
        }
        self.include
            .namespaces
            .iter()
            .any(|ns| namespace.starts_with(ns) || ns.starts_with(namespace))
    }

    /// Path admission for include diagrams.
    pub fn should_include_path(&self, path: &Path) -> bool {
        if let Some(globs) = &self.exclude.path_globs {
            if globs.is_match(path) {
                return false;
            }
        }
        match &self.include.path_globs {
            Some(globs) => globs.is_match(path),
            None => true,
        }
    }

    /// Member/method admission by access specifier.
    pub fn should_include_access(&self, access: Access) -> bool {
        if self.exclude.access.contains(&access) {
            return false;
        }
        self.include.access.is_empty() || self.include.access.contains(&access)
    }

    /// Relationship admission by kind.
    pub fn should_include_relationship(&self, kind: RelationshipKind) -> bool {
        if self.exclude.relationships.contains(&kind) {
            return false;
        }
        self.include.relationships.is_empty() || self.include.relationships.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiagramType;
    use crate::model::{ClassData, Element, ElementPayload, Relationship};

    fn diagram_config(toml: &str) -> DiagramConfig {
        let config = crate::config::Config::from_toml(toml).unwrap();
        config.diagrams.values().next().unwrap().clone()
    }

    fn class(namespace: &str, name: &str) -> Element {
        Element::new(
            QualifiedName::parse(namespace),
            name,
            ElementPayload::Class(ClassData::default()),
        )
    }

    fn filter_from(toml: &str) -> DiagramFilter {
        let config = diagram_config(toml);
        assert_eq!(config.diagram_type, DiagramType::Class);
        DiagramFilter::from_config(&config).unwrap()
    }

    #[test]
    fn test_empty_filter_admits_everything() {
        let filter = filter_from(
            r#"
[diagrams.d]
type = "class"
"#,
        );
        let model = DiagramModel::default();
        assert_eq!(
            filter.should_include_element(&class("any::ns", "T"), &model),
            Filtered::Include
        );
    }

    #[test]
    fn test_namespace_include_and_exclude() {
        let filter = filter_from(
            r#"
[diagrams.d]
type = "class"
[diagrams.d.include]
namespaces = ["app"]
[diagrams.d.exclude]
namespaces = ["app::detail"]
"#,
        );
        let model = DiagramModel::default();
        assert_eq!(
            filter.should_include_element(&class("app::core", "A"), &model),
            Filtered::Include
        );
        assert_eq!(
            filter.should_include_element(&class("app::detail", "C"), &model),
            Filtered::Exclude
        );
        assert_eq!(
            filter.should_include_element(&class("std", "vector"), &model),
            Filtered::Exclude
        );
    }

    #[test]
    fn test_element_name_and_pattern() {
        let filter = filter_from(
            r#"
[diagrams.d]
type = "class"
[diagrams.d.include]
elements = ["app::Widget", "r: ^app::Gadget.*$"]
"#,
        );
        let model = DiagramModel::default();
        assert_eq!(
            filter.should_include_element(&class("app", "Widget"), &model),
            Filtered::Include
        );
        assert_eq!(
            filter.should_include_element(&class("app", "GadgetImpl"), &model),
            Filtered::Include
        );
        assert_eq!(
            filter.should_include_element(&class("app", "Other"), &model),
            Filtered::Exclude
        );
    }

    #[test]
    fn test_subclasses_predicate_with_deferral() {
        let filter = filter_from(
            r#"
[diagrams.d]
type = "class"
[diagrams.d.include]
subclasses = ["app::Base"]
"#,
        );
        let mut model = DiagramModel::default();

        // The anchor matches itself before anything is in the model.
        assert_eq!(
            filter.should_include_element(&class("app", "Base"), &model),
            Filtered::Include
        );

        // Leaf deriving through an intermediate the model does not hold
        // yet: the walk dead-ends, decision deferred.
        let mut leaf = class("app", "Leaf");
        if let ElementPayload::Class(data) = &mut leaf.payload {
            data.bases.push(crate::model::BaseClass {
                id: crate::model::EntityId::from_name("app::Mid"),
                access: Access::Public,
                is_virtual: false,
            });
        }
        assert_eq!(
            filter.should_include_element(&leaf, &model),
            Filtered::Defer
        );

        // Once the intermediate is known the chain resolves.
        let base_id = model.add_element(class("app", "Base")).unwrap();
        let mid_id = model.add_element(class("app", "Mid")).unwrap();
        model.add_relationship(Relationship::new(
            mid_id,
            base_id,
            RelationshipKind::Extension,
        ));
        assert_eq!(
            filter.should_include_element(&leaf, &model),
            Filtered::Include
        );
        assert_eq!(
            filter.should_include_element(&class("app", "Unrelated"), &model),
            Filtered::Exclude
        );
    }

    #[test]
    fn test_namespace_entry_pruning() {
        let filter = filter_from(
            r#"
[diagrams.d]
type = "class"
[diagrams.d.include]
namespaces = ["a::b"]
"#,
        );
        // Ancestor of an included namespace must stay enterable.
        assert!(filter.should_enter_namespace(&QualifiedName::parse("a")));
        assert!(filter.should_enter_namespace(&QualifiedName::parse("a::b::c")));
        assert!(!filter.should_enter_namespace(&QualifiedName::parse("x")));
    }

    #[test]
    fn test_access_filter() {
        let filter = filter_from(
            r#"
[diagrams.d]
type = "class"
[diagrams.d.include]
access = ["public"]
"#,
        );
        assert!(filter.should_include_access(Access::Public));
        assert!(!filter.should_include_access(Access::Private));
    }

    #[test]
    fn test_include_monotonicity() {
        // Widening a non-empty include block never drops an element.
        let narrow = filter_from(
            r#"
[diagrams.d]
type = "class"
[diagrams.d.include]
namespaces = ["app"]
"#,
        );
        let wide = filter_from(
            r#"
[diagrams.d]
type = "class"
[diagrams.d.include]
namespaces = ["app", "lib"]
"#,
        );
        let model = DiagramModel::default();
        let candidates = [class("app", "A"), class("lib", "L"), class("std", "S")];
        for candidate in &candidates {
            if narrow.should_include_element(candidate, &model) == Filtered::Include {
                assert_eq!(
                    wide.should_include_element(candidate, &model),
                    Filtered::Include
                );
            }
        }
    }

    #[test]
    fn test_exclude_monotonicity() {
        // Adding an exclude predicate never admits more elements.
        let base = filter_from(
            r#"
[diagrams.d]
type = "class"
[diagrams.d.include]
namespaces = ["app"]
"#,
        );
        let narrowed = filter_from(
            r#"
[diagrams.d]
type = "class"
[diagrams.d.include]
namespaces = ["app"]
[diagrams.d.exclude]
element_types = ["enum"]
"#,
        );
        let model = DiagramModel::default();
        let candidates = [class("app", "A"), class("app::x", "B"), class("std", "S")];
        for candidate in &candidates {
            let before = base.should_include_element(candidate, &model);
            let after = narrowed.should_include_element(candidate, &model);
            if after == Filtered::Include {
                assert_eq!(before, Filtered::Include);
            }
        }
    }
}
