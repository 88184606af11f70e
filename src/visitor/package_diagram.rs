//! Package diagram traversal.
//!
//! Namespaces become packages; anonymous and inline namespaces dissolve into
//! their parent. A declaration inside package `A` referencing a type whose
//! enclosing namespace is `B` records a pending `A -> B` dependency, resolved
//! once the merged model knows which packages were admitted.

use crate::diagram::PackageDiagram;
use crate::error::ModelError;
use crate::filter::{DiagramFilter, Filtered};
use crate::frontend::{Declaration, FunctionDecl, QualType, RecordDecl, TranslationUnit};
use crate::model::{
    Element, ElementPayload, EntityId, PackageData, QualifiedName, RelationshipKind,
};
use crate::visitor::find_relationships;

pub struct PackageDiagramVisitor<'a> {
    diagram: &'a mut PackageDiagram,
    filter: &'a DiagramFilter,
}

impl<'a> PackageDiagramVisitor<'a> {
    pub fn new(diagram: &'a mut PackageDiagram, filter: &'a DiagramFilter) -> Self {
        Self { diagram, filter }
    }

    pub fn visit_translation_unit(&mut self, tu: &TranslationUnit) -> Result<(), ModelError> {
        self.visit_declarations(&tu.declarations, &QualifiedName::new(), None)
    }

    fn visit_declarations(
        &mut self,
        declarations: &[Declaration],
        namespace: &QualifiedName,
        current_package: Option<EntityId>,
    ) -> Result<(), ModelError> {
        for declaration in declarations {
            match declaration {
                Declaration::Namespace(ns) => {
                    if ns.is_anonymous || ns.is_inline {
                        // Contents belong to the surrounding package.
                        self.visit_declarations(&ns.declarations, namespace, current_package)?;
                        continue;
                    }
                    let inner = namespace.appending(ns.name.as_str());
                    if !self.filter.should_enter_namespace(&inner) {
                        continue;
                    }
                    let mut element = Element::new(
                        namespace.clone(),
                        ns.name.as_str(),
                        ElementPayload::Package(PackageData::default()),
                    );
                    element.comment = ns.comment.clone();
                    let package_id = match self
                        .filter
                        .should_include_element(&element, &self.diagram.model)
                    {
                        Filtered::Include => Some(self.diagram.model.add_element(element)?),
                        // Package admission has no context predicates worth
                        // waiting on; an undecided package stays out.
                        Filtered::Defer | Filtered::Exclude => None,
                    };
                    self.visit_declarations(&ns.declarations, &inner, package_id)?;
                }
                Declaration::Record(record) => {
                    self.visit_record(record, namespace, current_package)?;
                }
                Declaration::Function(function) => {
                    self.visit_function(function, namespace, current_package);
                }
                Declaration::Alias(alias) => {
                    self.reference_type(&alias.aliased, namespace, current_package);
                }
                Declaration::Enum(_) | Declaration::Concept(_) => {}
            }
        }
        Ok(())
    }

    fn visit_record(
        &mut self,
        record: &RecordDecl,
        namespace: &QualifiedName,
        current_package: Option<EntityId>,
    ) -> Result<(), ModelError> {
        for base in &record.bases {
            self.reference_name(&base.name, namespace, current_package);
        }
        for field in &record.fields {
            self.reference_type(&field.type_, namespace, current_package);
        }
        for method in &record.methods {
            self.reference_type(&method.return_type, namespace, current_package);
            for parameter in &method.parameters {
                self.reference_type(&parameter.type_, namespace, current_package);
            }
        }
        // Nested records live in the same package as their parent.
        self.visit_declarations(&record.nested, namespace, current_package)
    }

    fn visit_function(
        &mut self,
        function: &FunctionDecl,
        namespace: &QualifiedName,
        current_package: Option<EntityId>,
    ) {
        self.reference_type(&function.return_type, namespace, current_package);
        for parameter in &function.parameters {
            self.reference_type(&parameter.type_, namespace, current_package);
        }
    }

    /// Records a pending dependency from the current package to the package
    /// enclosing every type `ty` references.
    fn reference_type(
        &mut self,
        ty: &QualType,
        namespace: &QualifiedName,
        current_package: Option<EntityId>,
    ) {
        let Some(from) = current_package else {
            return;
        };
        let mut targets = Vec::new();
        find_relationships(ty, RelationshipKind::Dependency, &mut targets);
        for target in targets {
            self.reference_named_package(&target.name, namespace, from);
        }
    }

    fn reference_name(
        &mut self,
        name: &str,
        namespace: &QualifiedName,
        current_package: Option<EntityId>,
    ) {
        if let Some(from) = current_package {
            self.reference_named_package(name, namespace, from);
        }
    }

    fn reference_named_package(
        &mut self,
        type_name: &str,
        namespace: &QualifiedName,
        from: EntityId,
    ) {
        let target_namespace = QualifiedName::parse(type_name).parent();
        if target_namespace.is_empty() || &target_namespace == namespace {
            return;
        }
        self.diagram
            .add_pending_dependency(from, target_namespace.to_string());
    }
}
