//! Compilation database loading.
//!
//! A `compile_commands.json` file enumerates every translation unit of the
//! build. Loading normalizes entries into [`CompileCommand`]s, applies the
//! configured flag adjustments, and lets diagram configs narrow the set of
//! translation units with glob patterns.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSetBuilder};
use serde::Deserialize;

use crate::error::{ConfigError, FrontendError};

/// One entry of the compilation database, flags already split.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileCommand {
    /// Absolute path of the translation unit's main file.
    pub file: PathBuf,
    /// Working directory the command runs in.
    pub directory: PathBuf,
    /// Compiler arguments, command name included.
    pub arguments: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    directory: PathBuf,
    file: PathBuf,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    arguments: Option<Vec<String>>,
}

/// The loaded database.
#[derive(Debug, Clone, Default)]
pub struct CompilationDatabase {
    commands: Vec<CompileCommand>,
}

impl CompilationDatabase {
    /// Loads `compile_commands.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, FrontendError> {
        let path = dir.join("compile_commands.json");
        let content = fs::read_to_string(&path)
            .map_err(|_| FrontendError::CompilationDatabaseNotFound(dir.to_path_buf()))?;
        Self::from_json(&content, &path)
    }

    pub fn from_json(content: &str, origin: &Path) -> Result<Self, FrontendError> {
        let raw: Vec<RawEntry> = serde_json::from_str(content)
            .map_err(|e| FrontendError::MalformedCompilationDatabase(origin.to_path_buf(), e))?;
        let commands = raw
            .into_iter()
            .map(|entry| {
                let arguments = match (entry.arguments, entry.command) {
                    (Some(args), _) => args,
                    (None, Some(command)) => split_command(&command),
                    (None, None) => Vec::new(),
                };
                let file = if entry.file.is_absolute() {
                    entry.file
                } else {
                    entry.directory.join(&entry.file)
                };
                CompileCommand {
                    file,
                    directory: entry.directory,
                    arguments,
                }
            })
            .collect();
        Ok(Self { commands })
    }

    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Adds and removes compiler flags on every entry.
    pub fn adjust_flags(&mut self, add: &[String], remove: &[String]) {
        for command in &mut self.commands {
            command.arguments.retain(|arg| !remove.contains(arg));
            command.arguments.extend(add.iter().cloned());
        }
    }

    /// Selects the translation units matching the diagram's glob patterns.
    ///
    /// An empty pattern list selects everything.
    pub fn select(&self, globs: &[String]) -> Result<Vec<CompileCommand>, ConfigError> {
        if globs.is_empty() {
            return Ok(self.commands.clone());
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in globs {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| ConfigError::InvalidGlob {
            pattern: globs.join(", "),
            message: e.to_string(),
        })?;
        Ok(self
            .commands
            .iter()
            .filter(|command| set.is_match(&command.file))
            .cloned()
            .collect())
    }
}

/// Splits a shell-style command line into arguments. Quoting is honored;
/// escapes beyond `\"` inside double quotes are not, which matches what
/// build systems actually emit into compilation databases.
fn split_command(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes: Option<char> = None;
    let mut chars = command.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\'' => match in_quotes {
                Some(open) if open == ch => in_quotes = None,
                Some(_) => current.push(ch),
                None => in_quotes = Some(ch),
            },
            '\\' if in_quotes == Some('"') && chars.peek() == Some(&'"') => {
                current.push(chars.next().unwrap());
            }
            c if c.is_whitespace() && in_quotes.is_none() => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {
            "directory": "/build",
            "file": "/src/a.cc",
            "command": "clang++ -std=c++17 -I/src/include -c /src/a.cc"
        },
        {
            "directory": "/build",
            "file": "b.cc",
            "arguments": ["clang++", "-c", "b.cc"]
        }
    ]"#;

    #[test]
    fn test_load_both_entry_shapes() {
        let db = CompilationDatabase::from_json(FIXTURE, Path::new("test")).unwrap();
        assert_eq!(db.commands().len(), 2);
        assert_eq!(db.commands()[0].file, PathBuf::from("/src/a.cc"));
        assert_eq!(
            db.commands()[0].arguments,
            ["clang++", "-std=c++17", "-I/src/include", "-c", "/src/a.cc"]
        );
        // Relative file resolved against the entry directory.
        assert_eq!(db.commands()[1].file, PathBuf::from("/build/b.cc"));
    }

    #[test]
    fn test_adjust_flags() {
        let mut db = CompilationDatabase::from_json(FIXTURE, Path::new("test")).unwrap();
        db.adjust_flags(
            &["-DNDEBUG".to_string()],
            &["-std=c++17".to_string()],
        );
        assert!(!db.commands()[0].arguments.contains(&"-std=c++17".to_string()));
        assert!(db.commands()[0].arguments.contains(&"-DNDEBUG".to_string()));
    }

    #[test]
    fn test_select_by_glob() {
        let db = CompilationDatabase::from_json(FIXTURE, Path::new("test")).unwrap();
        let selected = db.select(&["/src/**/*.cc".to_string()]).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].file, PathBuf::from("/src/a.cc"));

        let all = db.select(&[]).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_split_command_quoting() {
        assert_eq!(
            split_command(r#"clang++ -DNAME="two words" -c a.cc"#),
            ["clang++", "-DNAME=two words", "-c", "a.cc"]
        );
    }

    #[test]
    fn test_missing_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = CompilationDatabase::load(dir.path()).unwrap_err();
        assert!(matches!(err, FrontendError::CompilationDatabaseNotFound(_)));
    }
}
