//! Front-end adapter interface.
//!
//! The C/C++ AST producer is an external collaborator. It hands the engine a
//! fully-resolved, traversable declaration tree per translation unit: every
//! declaration carries its qualified context, source location, USR and access
//! specifier, and every type reference arrives as a [`QualType`] value whose
//! shape the traversal can classify without talking back to the compiler.
//!
//! Anything the front-end could not resolve (dependent template arguments,
//! for instance) is surfaced verbatim as [`QualType::Unexposed`]; the
//! type-expression parser structures those strings on a best-effort basis.

use std::path::PathBuf;

use crate::compilation_database::CompileCommand;
use crate::error::FrontendError;
use crate::model::{Access, SourceLocation};

/// Produces translation units from compilation database entries.
///
/// Implementations wrap a compiler front-end; tests implement it in-process
/// with hand-built trees.
pub trait Frontend: Sync {
    fn parse(&self, command: &CompileCommand) -> Result<TranslationUnit, FrontendError>;
}

/// One parsed translation unit.
#[derive(Debug, Clone, Default)]
pub struct TranslationUnit {
    pub path: PathBuf,
    pub declarations: Vec<Declaration>,
    /// Preprocessor include edges, in directive order.
    pub includes: Vec<IncludeDirective>,
}

impl TranslationUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            declarations: Vec::new(),
            includes: Vec::new(),
        }
    }
}

/// A single `#include` discovered through the preprocessor hooks.
#[derive(Debug, Clone)]
pub struct IncludeDirective {
    /// Resolved absolute path of the included file.
    pub path: PathBuf,
    /// File that contains the directive.
    pub from: PathBuf,
    /// Angle-bracket include resolved inside a system search path.
    pub is_system: bool,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Namespace(NamespaceDecl),
    Record(RecordDecl),
    Enum(EnumDecl),
    Concept(ConceptDecl),
    Alias(AliasDecl),
    Function(FunctionDecl),
}

#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    /// Single scope token, not a qualified path.
    pub name: String,
    pub is_inline: bool,
    pub is_anonymous: bool,
    pub comment: Option<String>,
    pub declarations: Vec<Declaration>,
}

impl NamespaceDecl {
    pub fn new(name: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            name: name.into(),
            is_inline: false,
            is_anonymous: false,
            comment: None,
            declarations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Class,
    Struct,
    Union,
}

#[derive(Debug, Clone)]
pub struct BaseSpecifier {
    /// Qualified name of the base, template arguments included.
    pub name: String,
    pub access: Access,
    pub is_virtual: bool,
}

#[derive(Debug, Clone)]
pub enum TemplateParamDeclKind {
    Type,
    NonType { type_name: String },
    Template,
}

#[derive(Debug, Clone)]
pub struct TemplateParamDecl {
    pub kind: TemplateParamDeclKind,
    /// Parameter name; unnamed parameters are legal and identified by the
    /// depth/position pair instead.
    pub name: Option<String>,
    /// Template nesting depth as the front-end numbers it (0 for the
    /// declaration's own parameter list).
    pub index_l: Option<u32>,
    /// Position within that parameter list.
    pub index_r: Option<u32>,
    /// Qualifier spelled on the parameter (`const`, `&`, `&&`).
    pub qualifier: Option<String>,
    pub default_value: Option<String>,
    pub is_variadic: bool,
    /// Qualified name of the concept constraining this parameter, when one
    /// is spelled (`template <SortableRange R>`).
    pub constraint: Option<String>,
}

impl TemplateParamDecl {
    pub fn type_param(name: impl Into<String>) -> Self {
        Self {
            kind: TemplateParamDeclKind::Type,
            name: Some(name.into()),
            index_l: None,
            index_r: None,
            qualifier: None,
            default_value: None,
            is_variadic: false,
            constraint: None,
        }
    }

    /// An unnamed type parameter slot, identified by depth and position.
    pub fn unnamed_type_param(index_l: u32, index_r: u32) -> Self {
        Self {
            kind: TemplateParamDeclKind::Type,
            name: None,
            index_l: Some(index_l),
            index_r: Some(index_r),
            qualifier: None,
            default_value: None,
            is_variadic: false,
            constraint: None,
        }
    }
}

/// class / struct / union declaration.
#[derive(Debug, Clone)]
pub struct RecordDecl {
    pub usr: String,
    /// Short name without namespace or template arguments.
    pub name: String,
    pub kind: RecordKind,
    pub is_forward_declaration: bool,
    pub is_abstract: bool,
    /// Access within the enclosing record; `Access::None` at namespace scope.
    pub access: Access,
    pub comment: Option<String>,
    pub location: Option<SourceLocation>,
    pub bases: Vec<BaseSpecifier>,
    pub template_params: Vec<TemplateParamDecl>,
    /// For explicit and partial specializations: the primary template's
    /// display name with its parameter list (`ns::vector<T>`), which is the
    /// identity primaries are registered under.
    pub specialization_of: Option<String>,
    /// Resolved template arguments of a specialization.
    pub template_arguments: Vec<QualType>,
    /// Raw argument text when the front-end exposed no structure.
    pub unexposed_arguments: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    /// Qualified names of befriended types.
    pub friends: Vec<String>,
    /// Nested records and enums.
    pub nested: Vec<Declaration>,
}

impl RecordDecl {
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        let name = name.into();
        Self {
            usr: format!("c:@S@{name}"),
            name,
            kind,
            is_forward_declaration: false,
            is_abstract: false,
            access: Access::None,
            comment: None,
            location: None,
            bases: Vec::new(),
            template_params: Vec::new(),
            specialization_of: None,
            template_arguments: Vec::new(),
            unexposed_arguments: None,
            fields: Vec::new(),
            methods: Vec::new(),
            friends: Vec::new(),
            nested: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub type_: QualType,
    pub access: Access,
    pub is_static: bool,
    pub is_const: bool,
    pub comment: Option<String>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, type_: QualType, access: Access) -> Self {
        Self {
            name: name.into(),
            type_,
            access,
            is_static: false,
            is_const: false,
            comment: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub type_: QualType,
    pub default_value: Option<String>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, type_: QualType) -> Self {
        Self {
            name: name.into(),
            type_,
            default_value: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub usr: String,
    pub name: String,
    pub return_type: QualType,
    pub parameters: Vec<ParamDecl>,
    pub access: Access,
    pub is_static: bool,
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    /// The front-end considers the method defaulted (this includes
    /// implicitly-generated special members).
    pub is_defaulted: bool,
    /// `= default` spelled out in the source.
    pub is_explicitly_defaulted: bool,
    pub is_deleted: bool,
    pub is_template: bool,
    pub location: Option<SourceLocation>,
    pub body: Vec<Stmt>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: QualType, access: Access) -> Self {
        let name = name.into();
        Self {
            usr: format!("c:@F@{name}"),
            name,
            return_type,
            parameters: Vec::new(),
            access,
            is_static: false,
            is_const: false,
            is_virtual: false,
            is_pure_virtual: false,
            is_defaulted: false,
            is_explicitly_defaulted: false,
            is_deleted: false,
            is_template: false,
            location: None,
            body: Vec::new(),
        }
    }
}

/// Free function at namespace scope.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub usr: String,
    pub name: String,
    pub return_type: QualType,
    pub parameters: Vec<ParamDecl>,
    pub is_template: bool,
    pub comment: Option<String>,
    pub location: Option<SourceLocation>,
    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, return_type: QualType) -> Self {
        let name = name.into();
        Self {
            usr: format!("c:@F@{name}"),
            name,
            return_type,
            parameters: Vec::new(),
            is_template: false,
            comment: None,
            location: None,
            body: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub usr: String,
    pub name: String,
    pub is_scoped: bool,
    pub underlying_type: Option<String>,
    pub constants: Vec<String>,
    pub access: Access,
    pub comment: Option<String>,
    pub location: Option<SourceLocation>,
}

impl EnumDecl {
    pub fn new(name: impl Into<String>, constants: Vec<String>) -> Self {
        let name = name.into();
        Self {
            usr: format!("c:@E@{name}"),
            name,
            is_scoped: false,
            underlying_type: None,
            constants,
            access: Access::None,
            comment: None,
            location: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConceptDecl {
    pub usr: String,
    pub name: String,
    pub template_params: Vec<TemplateParamDecl>,
    pub requirements: Vec<String>,
    pub comment: Option<String>,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub struct AliasDecl {
    pub name: String,
    pub aliased: QualType,
    pub access: Access,
    pub location: Option<SourceLocation>,
}

// --- Statements (sequence diagrams) ---

#[derive(Debug, Clone)]
pub enum Stmt {
    Call(CallExpr),
    Lambda(LambdaExpr),
    Block(BlockStmt),
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    /// USR of the callee when the front-end resolved it.
    pub callee_usr: Option<String>,
    /// Qualified name of the callee as spelled at the call site.
    pub callee_name: String,
    pub return_type: Option<String>,
    pub location: Option<SourceLocation>,
}

impl CallExpr {
    pub fn new(callee_usr: impl Into<String>, callee_name: impl Into<String>) -> Self {
        Self {
            callee_usr: Some(callee_usr.into()),
            callee_name: callee_name.into(),
            return_type: None,
            location: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub usr: String,
    /// Display name, conventionally `file:line:column lambda`.
    pub name: String,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Conditional,
    Alternative,
    Loop,
}

#[derive(Debug, Clone)]
pub struct BlockStmt {
    pub kind: BlockKind,
    pub condition: Option<String>,
    pub body: Vec<Stmt>,
}

// --- Type classifier ---

/// A resolved type expression.
///
/// This is the classifier surface the traversal consumes: shape predicates,
/// component accessors and a canonical rendering. The front-end builds these
/// values; the engine never constructs one from source text except through
/// the unexposed-argument parser.
#[derive(Debug, Clone, PartialEq)]
pub enum QualType {
    /// Built-in type (`int`, `double`, `void`).
    Builtin(String),
    /// Named record type, qualified.
    Record { name: String },
    /// Named enum type, qualified.
    Enum { name: String },
    Pointer(Box<QualType>),
    LValueReference(Box<QualType>),
    RValueReference(Box<QualType>),
    Array(Box<QualType>),
    /// `name<arguments...>` with resolved arguments.
    TemplateSpecialization { name: String, arguments: Vec<QualType> },
    FunctionPrototype {
        return_type: Box<QualType>,
        parameters: Vec<QualType>,
    },
    /// Typedef or using-alias; `aliased` is the underlying type.
    Alias { name: String, aliased: Box<QualType> },
    /// Dependent or otherwise unresolved type, spelled verbatim.
    Unexposed(String),
}

impl QualType {
    pub fn void() -> Self {
        QualType::Builtin("void".into())
    }

    pub fn record(name: impl Into<String>) -> Self {
        QualType::Record { name: name.into() }
    }

    pub fn enum_(name: impl Into<String>) -> Self {
        QualType::Enum { name: name.into() }
    }

    pub fn pointer_to(inner: QualType) -> Self {
        QualType::Pointer(Box::new(inner))
    }

    pub fn reference_to(inner: QualType) -> Self {
        QualType::LValueReference(Box::new(inner))
    }

    pub fn specialization(name: impl Into<String>, arguments: Vec<QualType>) -> Self {
        QualType::TemplateSpecialization {
            name: name.into(),
            arguments,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, QualType::Pointer(_))
    }

    pub fn is_lvalue_reference(&self) -> bool {
        matches!(self, QualType::LValueReference(_))
    }

    pub fn is_rvalue_reference(&self) -> bool {
        matches!(self, QualType::RValueReference(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, QualType::Array(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, QualType::Enum { .. })
    }

    pub fn is_record(&self) -> bool {
        matches!(self, QualType::Record { .. })
    }

    pub fn is_template_specialization(&self) -> bool {
        matches!(self, QualType::TemplateSpecialization { .. })
    }

    pub fn is_function_prototype(&self) -> bool {
        matches!(self, QualType::FunctionPrototype { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, QualType::Builtin(name) if name == "void")
    }

    /// Pointee of a pointer or referent of a reference.
    pub fn pointee(&self) -> Option<&QualType> {
        match self {
            QualType::Pointer(inner)
            | QualType::LValueReference(inner)
            | QualType::RValueReference(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&QualType> {
        match self {
            QualType::Array(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn aliased(&self) -> Option<&QualType> {
        match self {
            QualType::Alias { aliased, .. } => Some(aliased),
            _ => None,
        }
    }

    pub fn template_arguments(&self) -> &[QualType] {
        match self {
            QualType::TemplateSpecialization { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// Canonical spelling used for member types and identity derivation.
    pub fn canonical_name(&self) -> String {
        match self {
            QualType::Builtin(name) => name.clone(),
            QualType::Record { name } | QualType::Enum { name } => name.clone(),
            QualType::Pointer(inner) => format!("{}*", inner.canonical_name()),
            QualType::LValueReference(inner) => format!("{}&", inner.canonical_name()),
            QualType::RValueReference(inner) => format!("{}&&", inner.canonical_name()),
            QualType::Array(inner) => format!("{}[]", inner.canonical_name()),
            QualType::TemplateSpecialization { name, arguments } => {
                let args: Vec<String> = arguments.iter().map(QualType::canonical_name).collect();
                format!("{}<{}>", name, args.join(","))
            }
            QualType::FunctionPrototype {
                return_type,
                parameters,
            } => {
                let params: Vec<String> =
                    parameters.iter().map(QualType::canonical_name).collect();
                format!("{}({})", return_type.canonical_name(), params.join(","))
            }
            QualType::Alias { name, .. } => name.clone(),
            QualType::Unexposed(spelling) => spelling.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name_rendering() {
        let vec_of_ptr = QualType::specialization(
            "std::vector",
            vec![QualType::pointer_to(QualType::record("app::Widget"))],
        );
        assert_eq!(vec_of_ptr.canonical_name(), "std::vector<app::Widget*>");

        let proto = QualType::FunctionPrototype {
            return_type: Box::new(QualType::void()),
            parameters: vec![QualType::Builtin("int".into())],
        };
        assert_eq!(proto.canonical_name(), "void(int)");
    }

    #[test]
    fn test_classifier_predicates() {
        let ptr = QualType::pointer_to(QualType::record("A"));
        assert!(ptr.is_pointer());
        assert_eq!(ptr.pointee(), Some(&QualType::record("A")));
        assert!(QualType::void().is_void());
        assert!(!QualType::Builtin("int".into()).is_void());
    }
}
