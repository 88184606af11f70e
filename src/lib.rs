//! # umlgen - UML diagram models from C/C++ codebases
//!
//! umlgen ingests a codebase described by a compilation database, consumes
//! its translation units through a front-end adapter, and produces UML-style
//! diagrams as textual artifacts. It uses a pipeline approach:
//!
//! 1. **Configuration**: a TOML file names the diagrams and their filters
//! 2. **Traversal**: each translation unit's declaration tree is walked into
//!    a language-agnostic diagram model, in parallel across units
//! 3. **Merge & finalize**: partial models are unioned by entity id, then
//!    normalized (relationship dedup, inheritance reduction, sequence
//!    folding)
//! 4. **Emission**: PlantUML, MermaidJS, JSON and GraphML renderers turn the
//!    finalized model into artifacts
//!
//! ## Quick Start
//!
//! ```ignore
//! use umlgen::{Config, GenerationPipeline};
//!
//! let config = Config::load("uml.toml".as_ref())?;
//! let pipeline = GenerationPipeline::new(config, &frontend);
//! pipeline.run()?;
//! ```
//!
//! The C/C++ front-end itself is a collaborator behind the
//! [`frontend::Frontend`] trait: anything able to deliver a resolved
//! declaration tree per translation unit can drive the engine.
//!
//! ## Modules
//!
//! - [`model`]: language-agnostic model primitives (elements, relationships,
//!   qualified names, entity ids)
//! - [`frontend`]: the adapter data model consumed from the AST producer
//! - [`visitor`]: per-diagram translation-unit traversal
//! - [`filter`]: include/exclude filter engine
//! - [`template_parser`]: parser for unexposed template argument strings
//! - [`diagram`]: diagram models and their finalization passes
//! - [`generator`]: textual emitters
//! - [`context`]: structured-context assembly for templates and JSON
//! - [`pipeline`]: worker-pool orchestration over the compilation database

pub mod compilation_database;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod diagram;
pub mod error;
pub mod filter;
pub mod frontend;
pub mod generator;
pub mod model;
pub mod pipeline;
pub mod template_parser;
pub mod visitor;

// Re-exports for convenience
pub use crate::compilation_database::{CompilationDatabase, CompileCommand};
pub use crate::config::{Config, DiagramConfig, DiagramType, OutputFormat};
pub use crate::frontend::{Frontend, TranslationUnit};
pub use crate::pipeline::{BuiltDiagram, GenerationPipeline, GenerationSummary};
