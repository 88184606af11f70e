//! Translation-unit traversal.
//!
//! One visitor per diagram kind walks the adapter's declaration tree and
//! feeds the diagram model, consulting the filter before every element and
//! relationship. The type-shape classification they all share lives here:
//! [`find_relationships`] turns a [`QualType`] into relationship targets
//! according to a fixed table, with the caller supplying the starting kind.

pub mod class_diagram;
pub mod include_diagram;
pub mod package_diagram;
pub mod sequence_diagram;

pub use class_diagram::ClassDiagramVisitor;
pub use include_diagram::IncludeDiagramVisitor;
pub use package_diagram::PackageDiagramVisitor;
pub use sequence_diagram::SequenceDiagramVisitor;

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::frontend::QualType;
use crate::model::RelationshipKind;

/// Owning smart pointers: holding through one of these is aggregation of the
/// pointee.
static OWNING_POINTERS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["std::unique_ptr", "std::shared_ptr"]));
/// Non-owning handles: association, like a raw pointer.
static WEAK_POINTERS: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from(["std::weak_ptr"]));

/// A relationship discovered while classifying a type expression. Targets
/// are canonical names; the diagram resolves them to ids once both endpoints
/// are known.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipTarget {
    pub name: String,
    pub kind: RelationshipKind,
    pub is_enum: bool,
}

/// Classifies `ty` and appends the relationships it implies.
///
/// `hint` is the kind the policy layer wants for a direct record reference
/// (composition for a by-value field, dependency for a parameter type); the
/// shape table overrides it where the shape itself decides:
///
/// - pointer and lvalue reference yield association to the pointee
/// - rvalue reference and array element yield aggregation
/// - enums always yield a dependency
/// - owning smart pointers turn their argument into aggregation, weak
///   pointers into association
/// - function prototypes yield a dependency per parameter and return type
/// - `void` and builtins yield nothing
pub fn find_relationships(ty: &QualType, hint: RelationshipKind, out: &mut Vec<RelationshipTarget>) {
    match ty {
        QualType::Builtin(_) => {}
        QualType::Unexposed(_) => {
            // Opaque text; the template parser keeps it renderable but no
            // relationship can be derived from it.
        }
        QualType::Record { name } => out.push(RelationshipTarget {
            name: name.clone(),
            kind: hint,
            is_enum: false,
        }),
        QualType::Enum { name } => out.push(RelationshipTarget {
            name: name.clone(),
            kind: RelationshipKind::Dependency,
            is_enum: true,
        }),
        QualType::Pointer(inner) | QualType::LValueReference(inner) => {
            find_relationships(inner, RelationshipKind::Association, out);
        }
        QualType::RValueReference(inner) => {
            find_relationships(inner, RelationshipKind::Aggregation, out);
        }
        QualType::Array(element) => {
            find_relationships(element, RelationshipKind::Aggregation, out);
        }
        QualType::Alias { aliased, .. } => {
            find_relationships(aliased, hint, out);
        }
        QualType::TemplateSpecialization { name, arguments } => {
            if OWNING_POINTERS.contains(&name.as_str()) {
                for argument in arguments {
                    find_relationships(argument, RelationshipKind::Aggregation, out);
                }
            } else if WEAK_POINTERS.contains(&name.as_str()) {
                for argument in arguments {
                    find_relationships(argument, RelationshipKind::Association, out);
                }
            } else {
                out.push(RelationshipTarget {
                    name: ty.canonical_name(),
                    kind: hint,
                    is_enum: false,
                });
                for argument in arguments {
                    find_relationships(argument, hint, out);
                }
            }
        }
        QualType::FunctionPrototype {
            return_type,
            parameters,
        } => {
            find_relationships(return_type, RelationshipKind::Dependency, out);
            for parameter in parameters {
                find_relationships(parameter, RelationshipKind::Dependency, out);
            }
        }
    }
}
