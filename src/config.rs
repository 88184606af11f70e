//! Diagram configuration.
//!
//! Configuration is TOML deserialized with serde: a global section plus one
//! `[diagrams.<name>]` table per diagram. Filter blocks mirror the engine's
//! include/exclude semantics one-to-one, so the filter can be built straight
//! from the deserialized structs.
//!
//! ```toml
//! compilation_database_dir = "build"
//! output_directory = "docs/diagrams"
//!
//! [diagrams.core_classes]
//! type = "class"
//! glob = ["src/core/**/*.cc"]
//! using_namespace = "app::core"
//!
//! [diagrams.core_classes.include]
//! namespaces = ["app::core"]
//!
//! [diagrams.core_classes.exclude]
//! namespaces = ["app::core::detail"]
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{Access, RelationshipKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramType {
    Class,
    Sequence,
    Package,
    Include,
}

impl FromStr for DiagramType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(DiagramType::Class),
            "sequence" => Ok(DiagramType::Sequence),
            "package" => Ok(DiagramType::Package),
            "include" => Ok(DiagramType::Include),
            other => Err(ConfigError::UnknownDiagramType(other.to_string())),
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagramType::Class => "class",
            DiagramType::Sequence => "sequence",
            DiagramType::Package => "package",
            DiagramType::Include => "include",
        };
        write!(f, "{name}")
    }
}

impl<'de> Deserialize<'de> for DiagramType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DiagramType::from_str(&raw).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Output dialect of an emitted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(alias = "puml")]
    Plantuml,
    #[serde(alias = "mmd")]
    Mermaid,
    Json,
    Graphml,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Plantuml => "puml",
            OutputFormat::Mermaid => "mmd",
            OutputFormat::Json => "json",
            OutputFormat::Graphml => "graphml",
        }
    }
}

/// Element kinds accepted by the `element_types` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementTypeFilter {
    Class,
    Struct,
    Enum,
    Concept,
    Package,
    File,
    Participant,
}

impl ElementTypeFilter {
    pub fn kind_name(self) -> &'static str {
        match self {
            ElementTypeFilter::Class => "class",
            ElementTypeFilter::Struct => "struct",
            ElementTypeFilter::Enum => "enum",
            ElementTypeFilter::Concept => "concept",
            ElementTypeFilter::Package => "package",
            ElementTypeFilter::File => "file",
            ElementTypeFilter::Participant => "participant",
        }
    }
}

/// One include or exclude block. Every list is a union of predicates;
/// an absent list contributes nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterBlock {
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Globs evaluated against normalized source paths.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Fully-qualified names; `r: <regex>` entries match as patterns.
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub element_types: Vec<ElementTypeFilter>,
    #[serde(default)]
    pub relationships: Vec<RelationshipKind>,
    #[serde(default)]
    pub access: Vec<Access>,
    /// Roots whose transitive subclasses match.
    #[serde(default)]
    pub subclasses: Vec<String>,
    /// Primary templates whose specializations match.
    #[serde(default)]
    pub specializations: Vec<String>,
    /// Classes whose base-class closure matches.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Anchors whose direct dependencies match.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl FilterBlock {
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
            && self.paths.is_empty()
            && self.elements.is_empty()
            && self.element_types.is_empty()
            && self.relationships.is_empty()
            && self.access.is_empty()
            && self.subclasses.is_empty()
            && self.specializations.is_empty()
            && self.parents.is_empty()
            && self.dependencies.is_empty()
    }
}

/// Root of a sequence-diagram walk.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EntryPoint {
    /// Match by fully-qualified function name.
    Function { function: String },
    /// Match by front-end USR.
    Usr { usr: String },
    /// Match by declaration location.
    Location { file: PathBuf, line: u32 },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagramConfig {
    #[serde(rename = "type")]
    pub diagram_type: DiagramType,
    /// Translation-unit selection patterns; empty selects every entry of the
    /// compilation database.
    #[serde(default)]
    pub glob: Vec<String>,
    /// Namespace the diagram renders names relative to.
    pub using_namespace: Option<String>,
    #[serde(default)]
    pub include: FilterBlock,
    #[serde(default)]
    pub exclude: FilterBlock,
    /// Sequence-diagram entry points.
    #[serde(default)]
    pub start_from: Vec<EntryPoint>,
    /// Include-diagram root; file nodes are labelled relative to it.
    pub relative_to: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub generate_method_arguments: bool,
    #[serde(default)]
    pub generate_packages: bool,
    #[serde(default)]
    pub generate_system_headers: bool,
    #[serde(default = "default_true")]
    pub generate_condition_statements: bool,
    /// Raw layout directives appended verbatim to the rendered diagram.
    #[serde(default)]
    pub layout: Vec<String>,
    #[serde(default)]
    pub fold_repeated_activities: bool,
    /// Fold free functions into one participant per source file. Only
    /// meaningful for single-language translation units.
    #[serde(default)]
    pub combine_free_functions_into_file_participants: bool,
    #[serde(default)]
    pub inline_lambda_messages: bool,
    /// Walk references out of defaulted (but not explicitly defaulted)
    /// template methods. Off by default: such methods are usually
    /// compiler-generated noise, but callers relying on them lose edges.
    #[serde(default)]
    pub traverse_defaulted_methods: bool,
}

/// Top-level configuration: global settings plus named diagrams.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub compilation_database_dir: Option<PathBuf>,
    pub output_directory: Option<PathBuf>,
    #[serde(default)]
    pub add_compile_flags: Vec<String>,
    #[serde(default)]
    pub remove_compile_flags: Vec<String>,
    /// Compiler to interrogate for implicit include paths.
    pub query_driver: Option<String>,
    /// Free-form values surfaced to emitters under dotted paths.
    #[serde(default)]
    pub user_data: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub allow_empty_diagrams: bool,
    #[serde(default)]
    pub no_metadata: bool,
    /// Worker pool size; defaults to hardware concurrency.
    pub worker_count: Option<usize>,
    /// Output dialects to emit for every diagram.
    #[serde(default = "default_generators")]
    pub generators: Vec<OutputFormat>,
    #[serde(default)]
    pub diagrams: IndexMap<String, DiagramConfig>,
}

fn default_generators() -> Vec<OutputFormat> {
    vec![OutputFormat::Plantuml]
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
compilation_database_dir = "build"
output_directory = "docs/diagrams"
add_compile_flags = ["-DNDEBUG"]
allow_empty_diagrams = true
generators = ["plantuml", "json"]

[user_data]
"project.name" = "demo"

[diagrams.core]
type = "class"
glob = ["src/**/*.cc"]
using_namespace = "app"

[diagrams.core.include]
namespaces = ["app"]
access = ["public", "protected"]

[diagrams.core.exclude]
namespaces = ["app::detail"]

[diagrams.flows]
type = "sequence"
start_from = [{ function = "app::main()" }, { usr = "c:@F@run" }]
"#,
        )
        .unwrap();

        assert_eq!(config.compilation_database_dir, Some(PathBuf::from("build")));
        assert_eq!(config.generators, [OutputFormat::Plantuml, OutputFormat::Json]);
        assert_eq!(config.diagrams.len(), 2);

        let core = &config.diagrams["core"];
        assert_eq!(core.diagram_type, DiagramType::Class);
        assert_eq!(core.include.namespaces, ["app"]);
        assert_eq!(core.include.access, [Access::Public, Access::Protected]);
        assert!(core.generate_method_arguments);

        let flows = &config.diagrams["flows"];
        assert_eq!(
            flows.start_from[0],
            EntryPoint::Function {
                function: "app::main()".to_string()
            }
        );
        assert_eq!(
            flows.start_from[1],
            EntryPoint::Usr {
                usr: "c:@F@run".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_diagram_type_is_rejected() {
        let err = Config::from_toml(
            r#"
[diagrams.bad]
type = "flowchart"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unknown diagram type 'flowchart'"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml(
            r#"
[diagrams.d]
type = "package"
"#,
        )
        .unwrap();
        assert!(!config.allow_empty_diagrams);
        assert_eq!(config.generators, [OutputFormat::Plantuml]);
        let d = &config.diagrams["d"];
        assert!(d.include.is_empty());
        assert!(d.exclude.is_empty());
        assert!(!d.traverse_defaulted_methods);
    }
}
