//! Class diagram traversal.
//!
//! Walks a translation unit's declaration tree and converts admitted
//! records, enums and concepts into elements. Relationships discovered along
//! the way (member types, method signatures, friendships, constraints) are
//! recorded as pending edges; the diagram resolves them once every
//! translation unit has been merged.

use std::collections::HashMap;

use tracing::debug;

use crate::config::DiagramConfig;
use crate::diagram::class::PendingRelationship;
use crate::diagram::ClassDiagram;
use crate::error::ModelError;
use crate::filter::{DiagramFilter, Filtered};
use crate::frontend::{
    ConceptDecl, Declaration, EnumDecl, MethodDecl, RecordDecl, RecordKind, TemplateParamDecl,
    TemplateParamDeclKind, TranslationUnit,
};
use crate::model::id::canonicalize;
use crate::model::{
    Access, ClassData, ClassMember, ClassMethod, ConceptData, Element, ElementPayload, EntityId,
    EnumData, MethodParameter, QualifiedName, RelationshipKind, TemplateParameter,
};
use crate::template_parser::parse_unexposed_template_params;
use crate::visitor::{find_relationships, RelationshipTarget};

pub struct ClassDiagramVisitor<'a> {
    diagram: &'a mut ClassDiagram,
    filter: &'a DiagramFilter,
    config: &'a DiagramConfig,
    /// Alias expansions seen in this translation unit, fed to the
    /// unexposed-argument parser.
    aliases: HashMap<String, String>,
}

impl<'a> ClassDiagramVisitor<'a> {
    pub fn new(
        diagram: &'a mut ClassDiagram,
        filter: &'a DiagramFilter,
        config: &'a DiagramConfig,
    ) -> Self {
        Self {
            diagram,
            filter,
            config,
            aliases: HashMap::new(),
        }
    }

    pub fn visit_translation_unit(&mut self, tu: &TranslationUnit) -> Result<(), ModelError> {
        self.aliases.clear();
        self.visit_declarations(&tu.declarations, &QualifiedName::new(), None)
    }

    fn visit_declarations(
        &mut self,
        declarations: &[Declaration],
        namespace: &QualifiedName,
        parent: Option<EntityId>,
    ) -> Result<(), ModelError> {
        for declaration in declarations {
            match declaration {
                Declaration::Namespace(ns) => {
                    let mut inner = namespace.clone();
                    if ns.is_anonymous {
                        // Anonymous namespace contents surface in the parent
                        // scope; the marker itself never names anything.
                    } else if ns.is_inline {
                        // Inline namespaces collapse into their parent.
                    } else {
                        inner.push(ns.name.as_str());
                    }
                    if !self.filter.should_enter_namespace(&inner) {
                        continue;
                    }
                    self.visit_declarations(&ns.declarations, &inner, None)?;
                }
                Declaration::Record(record) => {
                    self.visit_record(record, namespace, parent)?;
                }
                Declaration::Enum(decl) => {
                    self.visit_enum(decl, namespace, parent)?;
                }
                Declaration::Concept(decl) => {
                    self.visit_concept(decl, namespace)?;
                }
                Declaration::Alias(alias) => {
                    let full = namespace.appending(alias.name.as_str()).to_string();
                    self.aliases
                        .insert(alias.name.clone(), alias.aliased.canonical_name());
                    self.aliases.insert(full, alias.aliased.canonical_name());
                }
                Declaration::Function(_) => {
                    // Free functions carry no class-diagram content.
                }
            }
        }
        Ok(())
    }

    fn visit_record(
        &mut self,
        record: &RecordDecl,
        namespace: &QualifiedName,
        parent: Option<EntityId>,
    ) -> Result<(), ModelError> {
        let display_name = self.record_display_name(record);
        let mut element = Element::new(
            namespace.clone(),
            display_name,
            ElementPayload::Class(ClassData::default()),
        );
        element.access = record.access;
        element.comment = record.comment.clone();
        element.source_location = record.location.clone();
        element.is_forward_declaration = record.is_forward_declaration;

        let mut data = ClassData {
            is_struct: record.kind == RecordKind::Struct,
            is_union: record.kind == RecordKind::Union,
            is_abstract: record.is_abstract,
            is_template: !record.template_params.is_empty()
                || record.specialization_of.is_some(),
            nested_in: parent,
            ..ClassData::default()
        };

        for base in &record.bases {
            data.bases.push(crate::model::BaseClass {
                id: EntityId::from_name(&base.name),
                access: base.access,
                is_virtual: base.is_virtual,
            });
        }

        data.template_params = if record.specialization_of.is_some() {
            self.specialization_arguments(record)
        } else {
            record
                .template_params
                .iter()
                .map(convert_template_param)
                .collect()
        };
        data.specialization_of = record
            .specialization_of
            .as_deref()
            .map(EntityId::from_name);

        for friend in &record.friends {
            data.friends.push(EntityId::from_name(friend));
        }

        let source = element.id;
        let mut pending: Vec<PendingRelationship> = Vec::new();

        for field in &record.fields {
            if !self.filter.should_include_access(field.access) {
                continue;
            }
            data.members.push(ClassMember {
                name: field.name.clone(),
                type_name: field.type_.canonical_name(),
                access: field.access,
                is_static: field.is_static,
                is_const: field.is_const,
            });
            let mut targets = Vec::new();
            find_relationships(&field.type_, RelationshipKind::Composition, &mut targets);
            for target in targets {
                pending.push(self.pending_edge(source, target, Some(&field.name), field.access));
            }
        }

        for method in &record.methods {
            if !self.filter.should_include_access(method.access) {
                continue;
            }
            data.methods.push(self.convert_method(method));
            if self.skips_reference_traversal(method) {
                continue;
            }
            let mut targets = Vec::new();
            find_relationships(&method.return_type, RelationshipKind::Dependency, &mut targets);
            for parameter in &method.parameters {
                find_relationships(&parameter.type_, RelationshipKind::Dependency, &mut targets);
            }
            for mut target in targets {
                // A signature only uses the type; whatever the shape table
                // said, the class depends on it, nothing stronger.
                target.kind = RelationshipKind::Dependency;
                pending.push(self.pending_edge(source, target, None, method.access));
            }
        }

        // Constraint edges from constrained template parameters.
        for param in &record.template_params {
            if let Some(concept_name) = &param.constraint {
                let label = convert_template_param(param).to_string();
                pending.push(PendingRelationship {
                    source,
                    target_name: canonicalize(concept_name),
                    kind: RelationshipKind::Constraint,
                    label: (!label.is_empty()).then_some(label),
                    access: Access::Public,
                });
            }
        }

        element.payload = ElementPayload::Class(data);

        let admitted = match self.filter.should_include_element(&element, &self.diagram.model) {
            Filtered::Include => {
                self.diagram.model.add_element(element)?;
                true
            }
            Filtered::Defer => {
                self.diagram.defer_element(element);
                true
            }
            Filtered::Exclude => false,
        };

        if admitted {
            for entry in pending {
                self.diagram.add_pending_relationship(entry);
            }
            let inner = namespace.appending(record.name.as_str());
            self.visit_declarations(&record.nested, &inner, Some(source))?;
        } else if !record.nested.is_empty() {
            debug!(
                record = %record.name,
                "record excluded, nested declarations skipped with it"
            );
        }
        Ok(())
    }

    fn visit_enum(
        &mut self,
        decl: &EnumDecl,
        namespace: &QualifiedName,
        _parent: Option<EntityId>,
    ) -> Result<(), ModelError> {
        let mut element = Element::new(
            namespace.clone(),
            decl.name.as_str(),
            ElementPayload::Enum(EnumData {
                constants: decl.constants.clone(),
                is_scoped: decl.is_scoped,
                underlying_type: decl.underlying_type.clone(),
            }),
        );
        element.access = decl.access;
        element.comment = decl.comment.clone();
        element.source_location = decl.location.clone();

        match self.filter.should_include_element(&element, &self.diagram.model) {
            Filtered::Include => {
                self.diagram.model.add_element(element)?;
            }
            Filtered::Defer => self.diagram.defer_element(element),
            Filtered::Exclude => {}
        }
        Ok(())
    }

    fn visit_concept(
        &mut self,
        decl: &ConceptDecl,
        namespace: &QualifiedName,
    ) -> Result<(), ModelError> {
        let mut element = Element::new(
            namespace.clone(),
            decl.name.as_str(),
            ElementPayload::Concept(ConceptData {
                template_params: decl
                    .template_params
                    .iter()
                    .map(convert_template_param)
                    .collect(),
                requirements: decl.requirements.clone(),
            }),
        );
        element.comment = decl.comment.clone();
        element.source_location = decl.location.clone();

        match self.filter.should_include_element(&element, &self.diagram.model) {
            Filtered::Include => {
                self.diagram.model.add_element(element)?;
            }
            Filtered::Defer => self.diagram.defer_element(element),
            Filtered::Exclude => {}
        }
        Ok(())
    }

    /// Template identity: primaries render their parameter list
    /// (`G<T>`), specializations their canonical argument list
    /// (`G<int>`), plain records just their name.
    fn record_display_name(&self, record: &RecordDecl) -> String {
        if record.specialization_of.is_some() {
            let rendered = crate::model::render_template_arguments(
                &self.specialization_arguments(record),
            );
            return format!("{}{}", record.name, rendered);
        }
        if record.template_params.is_empty() {
            return record.name.clone();
        }
        // Unnamed parameters render their index-derived placeholder, so the
        // identity stays non-empty and distinct.
        let params: Vec<String> = record
            .template_params
            .iter()
            .map(|param| convert_template_param(param).to_string())
            .collect();
        format!("{}<{}>", record.name, params.join(","))
    }

    /// Arguments of a specialization, structured when the front-end exposed
    /// them and parsed from the raw string when it did not.
    fn specialization_arguments(&self, record: &RecordDecl) -> Vec<TemplateParameter> {
        if !record.template_arguments.is_empty() {
            return record
                .template_arguments
                .iter()
                .map(|qt| TemplateParameter::argument(canonicalize(&qt.canonical_name())))
                .collect();
        }
        if let Some(raw) = &record.unexposed_arguments {
            let aliases = &self.aliases;
            let resolve = move |name: &str| -> String {
                aliases
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| name.to_string())
            };
            return parse_unexposed_template_params(raw, &resolve);
        }
        Vec::new()
    }

    fn convert_method(&self, method: &MethodDecl) -> ClassMethod {
        let parameters = if self.config.generate_method_arguments {
            method
                .parameters
                .iter()
                .map(|param| MethodParameter {
                    name: param.name.clone(),
                    type_name: param.type_.canonical_name(),
                    default_value: param.default_value.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };
        ClassMethod {
            name: method.name.clone(),
            return_type: method.return_type.canonical_name(),
            parameters,
            access: method.access,
            is_static: method.is_static,
            is_const: method.is_const,
            is_virtual: method.is_virtual,
            is_pure_virtual: method.is_pure_virtual,
            is_defaulted: method.is_defaulted,
            is_deleted: method.is_deleted,
        }
    }

    /// Defaulted-but-not-spelled template methods reference nothing the user
    /// wrote; walking them is opt-in.
    fn skips_reference_traversal(&self, method: &MethodDecl) -> bool {
        method.is_template
            && method.is_defaulted
            && !method.is_explicitly_defaulted
            && !self.config.traverse_defaulted_methods
    }

    fn pending_edge(
        &self,
        source: EntityId,
        target: RelationshipTarget,
        member: Option<&str>,
        access: Access,
    ) -> PendingRelationship {
        PendingRelationship {
            source,
            target_name: canonicalize(&target.name),
            kind: target.kind,
            label: member.map(str::to_string),
            access,
        }
    }
}

fn convert_template_param(param: &TemplateParamDecl) -> TemplateParameter {
    use crate::model::TemplateParameterKind;
    let (kind, type_name) = match &param.kind {
        TemplateParamDeclKind::Type => (TemplateParameterKind::TemplateType, None),
        TemplateParamDeclKind::NonType { type_name } => {
            (TemplateParameterKind::NonTypeTemplate, Some(type_name.clone()))
        }
        TemplateParamDeclKind::Template => (TemplateParameterKind::TemplateTemplate, None),
    };
    TemplateParameter {
        kind,
        name: param.name.clone(),
        type_name,
        index_l: param.index_l,
        index_r: param.index_r,
        qualifier: param.qualifier.clone(),
        default_value: param.default_value.clone(),
        is_variadic: param.is_variadic,
        is_unexposed: false,
        params: Vec::new(),
    }
}
