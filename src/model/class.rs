//! Payload types for class-diagram elements.

use serde::Serialize;

use super::{Access, EntityId, TemplateParameter};

/// A base class entry with its inheritance access and virtuality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseClass {
    pub id: EntityId,
    pub access: Access,
    pub is_virtual: bool,
}

/// A data member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMember {
    pub name: String,
    /// Type expression as the front-end spelled it (`std::vector<int>`).
    pub type_name: String,
    pub access: Access,
    pub is_static: bool,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodParameter {
    pub name: String,
    pub type_name: String,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMethod {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<MethodParameter>,
    pub access: Access,
    pub is_static: bool,
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_defaulted: bool,
    pub is_deleted: bool,
}

/// Class/struct/union payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassData {
    pub is_struct: bool,
    pub is_union: bool,
    pub is_abstract: bool,
    pub is_template: bool,
    pub bases: Vec<BaseClass>,
    pub members: Vec<ClassMember>,
    pub methods: Vec<ClassMethod>,
    pub template_params: Vec<TemplateParameter>,
    pub friends: Vec<EntityId>,
    /// For explicit/partial specializations, the primary template's id.
    pub specialization_of: Option<EntityId>,
    /// Enclosing record for nested types.
    pub nested_in: Option<EntityId>,
}

impl ClassData {
    /// Union-merges attributes discovered in another translation unit.
    ///
    /// A later, complete declaration fills in whatever a forward declaration
    /// left empty; nothing already recorded is discarded.
    pub fn merge_from(&mut self, other: ClassData) {
        self.is_struct |= other.is_struct;
        self.is_union |= other.is_union;
        self.is_abstract |= other.is_abstract;
        self.is_template |= other.is_template;
        if self.bases.is_empty() {
            self.bases = other.bases;
        }
        if self.members.is_empty() {
            self.members = other.members;
        }
        if self.methods.is_empty() {
            self.methods = other.methods;
        }
        if self.template_params.is_empty() {
            self.template_params = other.template_params;
        }
        for friend in other.friends {
            if !self.friends.contains(&friend) {
                self.friends.push(friend);
            }
        }
        self.specialization_of = self.specialization_of.or(other.specialization_of);
        self.nested_in = self.nested_in.or(other.nested_in);
    }
}

/// Enum payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnumData {
    pub constants: Vec<String>,
    pub is_scoped: bool,
    pub underlying_type: Option<String>,
}

impl EnumData {
    pub fn merge_from(&mut self, other: EnumData) {
        if self.constants.is_empty() {
            self.constants = other.constants;
        }
        self.is_scoped |= other.is_scoped;
        if self.underlying_type.is_none() {
            self.underlying_type = other.underlying_type;
        }
    }
}

/// C++20 concept payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConceptData {
    pub template_params: Vec<TemplateParameter>,
    /// Requirement expressions, kept as spelled.
    pub requirements: Vec<String>,
}

impl ConceptData {
    pub fn merge_from(&mut self, other: ConceptData) {
        if self.template_params.is_empty() {
            self.template_params = other.template_params;
        }
        if self.requirements.is_empty() {
            self.requirements = other.requirements;
        }
    }
}
