//! Common model primitives shared by every diagram kind.
//!
//! The model is language-agnostic: the traversal layer converts front-end
//! declarations into [`Element`]s and [`Relationship`]s, and everything
//! downstream (filters, finalization, emitters) works on these types alone.

pub mod class;
pub mod element;
pub mod id;
pub mod name;
pub mod relationship;
pub mod template_param;

pub use class::{BaseClass, ClassData, ClassMember, ClassMethod, ConceptData, EnumData,
    MethodParameter};
pub use element::{Element, ElementPayload, FileData, FileKind, PackageData, ParticipantData,
    ParticipantKind, PathClass, SourceLocation};
pub use id::EntityId;
pub use name::QualifiedName;
pub use relationship::{Relationship, RelationshipKind};
pub use template_param::{render_template_arguments, TemplateParameter, TemplateParameterKind};

use serde::{Deserialize, Serialize};

/// C++ access specifier. Free functions and namespace-scope entities have no
/// access specifier; absent access is treated as public.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
    None,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
            Access::None => "none",
        }
    }
}
