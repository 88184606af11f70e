//! Template parameter and argument tree.
//!
//! One type covers both sides of a template: the parameters a primary
//! declares (`template <typename T, int N>`) and the arguments a
//! specialization supplies (`vector<int>`). Arguments whose structure the
//! front-end reported only as a raw string are kept verbatim and flagged
//! [`TemplateParameter::is_unexposed`]; emitters render those as-is.
//!
//! Type parameters additionally carry the front-end's depth/position pair
//! (`index_l`/`index_r`) and an optional qualifier. Unnamed parameters are
//! legal C++; when no name exists the pair synthesizes the canonical
//! `type-parameter-<depth>-<position>` placeholder so nothing renders blank.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateParameterKind {
    /// A type parameter (`typename T`).
    TemplateType,
    /// A non-type parameter (`int N`).
    NonTypeTemplate,
    /// A template template parameter (`template <typename> class C`).
    TemplateTemplate,
    /// A concrete argument supplied at a use site (`int`, `std::string`).
    Argument,
}

/// A node in the template parameter/argument tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateParameter {
    pub kind: TemplateParameterKind,
    /// Parameter name (`T`, `N`); absent for arguments and unnamed
    /// parameters.
    pub name: Option<String>,
    /// Type text: the declared type of a non-type parameter, or the argument
    /// type itself.
    pub type_name: Option<String>,
    /// Template nesting depth of a type parameter (0 in the primary's own
    /// list, 1 inside a template template parameter's list).
    pub index_l: Option<u32>,
    /// Position within that parameter list.
    pub index_r: Option<u32>,
    /// Qualifier attached to the parameter (`const`, `&`, `&&`).
    pub qualifier: Option<String>,
    pub default_value: Option<String>,
    /// Pack expansion (`Ts...`).
    pub is_variadic: bool,
    /// Set when the front-end surfaced only a raw string for this argument.
    pub is_unexposed: bool,
    /// Nested arguments of a template argument (`vector<int>` holds `int`).
    pub params: Vec<TemplateParameter>,
}

impl TemplateParameter {
    pub fn type_parameter(name: impl Into<String>) -> Self {
        Self {
            kind: TemplateParameterKind::TemplateType,
            name: Some(name.into()),
            type_name: None,
            index_l: None,
            index_r: None,
            qualifier: None,
            default_value: None,
            is_variadic: false,
            is_unexposed: false,
            params: Vec::new(),
        }
    }

    /// An unnamed type parameter identified only by its depth/position pair.
    pub fn unnamed_type_parameter(index_l: u32, index_r: u32) -> Self {
        Self {
            kind: TemplateParameterKind::TemplateType,
            name: None,
            type_name: None,
            index_l: Some(index_l),
            index_r: Some(index_r),
            qualifier: None,
            default_value: None,
            is_variadic: false,
            is_unexposed: false,
            params: Vec::new(),
        }
    }

    pub fn non_type(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: TemplateParameterKind::NonTypeTemplate,
            name: Some(name.into()),
            type_name: Some(type_name.into()),
            index_l: None,
            index_r: None,
            qualifier: None,
            default_value: None,
            is_variadic: false,
            is_unexposed: false,
            params: Vec::new(),
        }
    }

    pub fn argument(type_name: impl Into<String>) -> Self {
        Self {
            kind: TemplateParameterKind::Argument,
            name: None,
            type_name: Some(type_name.into()),
            index_l: None,
            index_r: None,
            qualifier: None,
            default_value: None,
            is_variadic: false,
            is_unexposed: false,
            params: Vec::new(),
        }
    }

    /// An argument preserved verbatim from an unstructured front-end string.
    pub fn unexposed_argument(type_name: impl Into<String>) -> Self {
        let mut param = Self::argument(type_name);
        param.is_unexposed = true;
        param
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    /// Display text of this node without its children: the name, the type,
    /// or the index-derived placeholder for unnamed parameters.
    fn head(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if let Some(type_name) = &self.type_name {
            return type_name.clone();
        }
        match (self.index_l, self.index_r) {
            (Some(depth), Some(position)) => format!("type-parameter-{depth}-{position}"),
            _ => String::new(),
        }
    }
}

impl fmt::Display for TemplateParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.head();
        match &self.qualifier {
            // Word qualifiers (`const`, `volatile`) read as prefixes,
            // reference qualifiers as suffixes.
            Some(qualifier) if qualifier.chars().all(char::is_alphabetic) => {
                write!(f, "{qualifier} {head}")?
            }
            Some(qualifier) => write!(f, "{head}{qualifier}")?,
            None => write!(f, "{head}")?,
        }
        if !self.params.is_empty() {
            let children: Vec<String> = self.params.iter().map(ToString::to_string).collect();
            write!(f, "<{}>", children.join(","))?;
        }
        if self.is_variadic {
            write!(f, "...")?;
        }
        Ok(())
    }
}

/// Renders an argument list: `[int, std::string]` becomes `<int,std::string>`.
pub fn render_template_arguments(params: &[TemplateParameter]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("<{}>", rendered.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested() {
        let mut outer = TemplateParameter::argument("B");
        outer.params.push(TemplateParameter::argument("C"));
        outer.params.push(TemplateParameter::argument("D"));
        assert_eq!(outer.to_string(), "B<C,D>");
    }

    #[test]
    fn test_display_variadic() {
        let pack = TemplateParameter::type_parameter("Ts").variadic();
        assert_eq!(pack.to_string(), "Ts...");
    }

    #[test]
    fn test_unnamed_parameter_renders_index_placeholder() {
        let param = TemplateParameter::unnamed_type_parameter(0, 1);
        assert_eq!(param.to_string(), "type-parameter-0-1");
    }

    #[test]
    fn test_qualifier_placement() {
        let constant = TemplateParameter::unnamed_type_parameter(0, 0).with_qualifier("const");
        assert_eq!(constant.to_string(), "const type-parameter-0-0");

        let reference = TemplateParameter::type_parameter("T").with_qualifier("&&");
        assert_eq!(reference.to_string(), "T&&");
    }

    #[test]
    fn test_render_argument_list() {
        let args = vec![
            TemplateParameter::argument("int"),
            TemplateParameter::argument("std::string"),
        ];
        assert_eq!(render_template_arguments(&args), "<int,std::string>");
        assert_eq!(render_template_arguments(&[]), "");
    }
}
