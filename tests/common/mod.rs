//! Shared test fixtures: an in-process front-end that serves hand-built
//! translation units, and compilation-database helpers.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use umlgen::compilation_database::CompilationDatabase;
use umlgen::error::FrontendError;
use umlgen::frontend::{Frontend, TranslationUnit};
use umlgen::model::SourceLocation;
use umlgen::CompileCommand;

/// Serves pre-built translation units keyed by file path.
#[derive(Default)]
pub struct MockFrontend {
    units: HashMap<PathBuf, TranslationUnit>,
    failing: HashSet<PathBuf>,
}

impl MockFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: TranslationUnit) -> Self {
        self.units.insert(unit.path.clone(), unit);
        self
    }

    /// Marks a path as unparseable; requests for it report a parse failure.
    pub fn with_failure(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.insert(path.into());
        self
    }
}

impl Frontend for MockFrontend {
    fn parse(&self, command: &CompileCommand) -> Result<TranslationUnit, FrontendError> {
        if self.failing.contains(&command.file) {
            return Err(FrontendError::ParseFailure {
                path: command.file.clone(),
                message: "syntax error".to_string(),
            });
        }
        self.units
            .get(&command.file)
            .cloned()
            .ok_or_else(|| FrontendError::ParseFailure {
                path: command.file.clone(),
                message: "no such translation unit".to_string(),
            })
    }
}

/// A compilation database covering the given files.
pub fn database(files: &[&str]) -> CompilationDatabase {
    let entries: Vec<String> = files
        .iter()
        .map(|file| {
            format!(
                r#"{{"directory": "/build", "file": "{file}", "command": "clang++ -c {file}"}}"#
            )
        })
        .collect();
    let json = format!("[{}]", entries.join(","));
    CompilationDatabase::from_json(&json, Path::new("test")).unwrap()
}

pub fn location(file: &str, line: u32) -> SourceLocation {
    SourceLocation {
        file: PathBuf::from(file),
        line,
        column: 1,
        translation_unit: PathBuf::from(file),
    }
}
