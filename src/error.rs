use std::path::PathBuf;

use thiserror::Error;

use crate::model::EntityId;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}': {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Unknown diagram type '{0}'")]
    UnknownDiagramType(String),

    #[error("No diagram named '{0}' in the configuration")]
    MissingDiagram(String),

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("Invalid element pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("user_data path '{0}' traverses a non-object value")]
    InvalidUserDataPath(String),

    #[error("Diagram '{0}' admitted no elements (set allow_empty_diagrams to emit it anyway)")]
    EmptyDiagram(String),
}

#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("Failed to parse translation unit '{path}': {message}")]
    ParseFailure { path: PathBuf, message: String },

    #[error("Compilation database not found in '{0}'")]
    CompilationDatabaseNotFound(PathBuf),

    #[error("Malformed compilation database '{0}': {1}")]
    MalformedCompilationDatabase(PathBuf, #[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Id collision: '{existing}' and '{incoming}' both hash to {id}")]
    IdCollision {
        id: EntityId,
        existing: String,
        incoming: String,
    },

    #[error("Nested declaration '{nested}' has no parent element in the diagram")]
    MissingParent { nested: String },

    #[error("Specialization '{specialization}' never resolved to a primary template")]
    UnresolvedSpecialization { specialization: String },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to render diagram '{diagram}': {source}")]
    Format {
        diagram: String,
        #[source]
        source: std::fmt::Error,
    },

    #[error("Failed to write artifact '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize diagram '{diagram}': {source}")]
    Serialize {
        diagram: String,
        #[source]
        source: serde_json::Error,
    },
}
