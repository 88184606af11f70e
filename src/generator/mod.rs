//! Diagram emitters.
//!
//! Each emitter is a pure function of the finalized diagram plus its config:
//! it builds the output text with `fmt::Write` and never touches the model.
//! Artifacts are named `<diagram_name>.<ext>`; a metadata block carrying the
//! tool version and the config hash is prepended unless disabled.

pub mod graphml;
pub mod json;
pub mod mermaid;
pub mod plantuml;

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::config::{Config, OutputFormat};
use crate::model::{Access, RelationshipKind};

/// Tool/config provenance prepended to artifacts.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub enabled: bool,
    pub version: &'static str,
    pub config_hash: String,
}

impl Metadata {
    pub fn from_config(config: &Config) -> Self {
        let mut hasher = FxHasher::default();
        hasher.write(format!("{config:?}").as_bytes());
        Self {
            enabled: !config.no_metadata,
            version: env!("CARGO_PKG_VERSION"),
            config_hash: format!("{:016x}", hasher.finish()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            version: env!("CARGO_PKG_VERSION"),
            config_hash: String::new(),
        }
    }

    /// Renders the block with the given line-comment prefix (`'` for
    /// PlantUML, `%%` for Mermaid).
    pub fn comment_block(&self, prefix: &str) -> String {
        if !self.enabled {
            return String::new();
        }
        format!(
            "{prefix} Generated with umlgen {}\n{prefix} Config hash: {}\n",
            self.version, self.config_hash
        )
    }
}

pub fn artifact_file_name(diagram_name: &str, format: OutputFormat) -> String {
    format!("{}.{}", diagram_name, format.extension())
}

/// Member/method visibility prefix shared by the PlantUML and Mermaid
/// dialects.
pub(crate) fn access_prefix(access: Access) -> &'static str {
    match access {
        Access::Public | Access::None => "+",
        Access::Protected => "#",
        Access::Private => "-",
    }
}

/// Arrow between element aliases, PlantUML dialect. Mermaid shares every
/// arrow except nesting, which it lacks.
pub(crate) fn plantuml_arrow(kind: RelationshipKind) -> &'static str {
    match kind {
        RelationshipKind::Extension => "--|>",
        RelationshipKind::Composition => "*--",
        RelationshipKind::Aggregation => "o--",
        RelationshipKind::Association => "-->",
        RelationshipKind::Dependency => "..>",
        RelationshipKind::Instantiation => "..|>",
        RelationshipKind::Friendship => "<..",
        RelationshipKind::Constraint => "..>",
        RelationshipKind::Includes => "..>",
        RelationshipKind::Nesting => "+--",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        assert_eq!(artifact_file_name("core", OutputFormat::Plantuml), "core.puml");
        assert_eq!(artifact_file_name("core", OutputFormat::Mermaid), "core.mmd");
        assert_eq!(artifact_file_name("core", OutputFormat::Json), "core.json");
        assert_eq!(artifact_file_name("core", OutputFormat::Graphml), "core.graphml");
    }

    #[test]
    fn test_metadata_block() {
        let metadata = Metadata {
            enabled: true,
            version: "0.1.0",
            config_hash: "abc".to_string(),
        };
        let block = metadata.comment_block("'");
        assert!(block.starts_with("' Generated with umlgen 0.1.0"));
        assert!(block.contains("' Config hash: abc"));
        assert!(Metadata::disabled().comment_block("'").is_empty());
    }

    #[test]
    fn test_metadata_hash_is_stable() {
        let config = Config::from_toml("[diagrams.d]\ntype = \"class\"\n").unwrap();
        let a = Metadata::from_config(&config);
        let b = Metadata::from_config(&config);
        assert_eq!(a.config_hash, b.config_hash);
    }
}
