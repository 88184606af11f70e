//! Generation pipeline.
//!
//! Orchestrates the whole run: load the compilation database, select
//! translation units per diagram, parse and traverse them on a worker pool,
//! merge the partial diagrams serially, finalize, and emit artifacts.
//!
//! Translation units are independent: each worker owns its traversal state
//! and produces a partial diagram. The merge phase takes an exclusive lock
//! on the global model and unions partials one by one; merging is idempotent
//! per entity id. Cancellation is cooperative: the stop token is checked
//! between translation units, an in-flight unit always finishes.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::compilation_database::{CompilationDatabase, CompileCommand};
use crate::config::{Config, DiagramConfig, DiagramType, OutputFormat};
use crate::diagram::{
    ClassDiagram, DiagramModel, IncludeDiagram, PackageDiagram, SequenceDiagram,
};
use crate::error::{ConfigError, FrontendError, ModelError, RenderError};
use crate::filter::DiagramFilter;
use crate::frontend::Frontend;
use crate::generator::{self, Metadata};
use crate::model::QualifiedName;
use crate::visitor::{
    ClassDiagramVisitor, IncludeDiagramVisitor, PackageDiagramVisitor, SequenceDiagramVisitor,
};

/// A finalized diagram of any kind.
#[derive(Debug)]
pub enum BuiltDiagram {
    Class(ClassDiagram),
    Sequence(SequenceDiagram),
    Package(PackageDiagram),
    Include(IncludeDiagram),
}

impl BuiltDiagram {
    pub fn model(&self) -> &DiagramModel {
        match self {
            BuiltDiagram::Class(d) => &d.model,
            BuiltDiagram::Sequence(d) => &d.model,
            BuiltDiagram::Package(d) => &d.model,
            BuiltDiagram::Include(d) => &d.model,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BuiltDiagram::Sequence(d) => d.is_empty(),
            other => other.model().is_empty(),
        }
    }
}

/// What one run produced; per-translation-unit failures are local and
/// reported here rather than aborting the run.
#[derive(Debug, Default)]
pub struct GenerationSummary {
    pub diagrams_emitted: usize,
    pub tu_failures: Vec<(PathBuf, String)>,
}

enum TuOutcome {
    Done(BuiltDiagram),
    Skipped,
    Failed(PathBuf, FrontendError),
    /// Broken model invariant (id collision); fatal.
    Fatal(ModelError),
}

pub struct GenerationPipeline<'f> {
    config: Config,
    frontend: &'f dyn Frontend,
    cancel: Arc<AtomicBool>,
}

impl<'f> GenerationPipeline<'f> {
    pub fn new(config: Config, frontend: &'f dyn Frontend) -> Self {
        Self {
            config,
            frontend,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared stop token; setting it stops the run between translation
    /// units.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds one named diagram from the given compilation database.
    pub fn build_diagram(
        &self,
        name: &str,
        database: &CompilationDatabase,
    ) -> Result<(BuiltDiagram, Vec<(PathBuf, String)>)> {
        let diagram_config = self
            .config
            .diagrams
            .get(name)
            .ok_or_else(|| ConfigError::MissingDiagram(name.to_string()))?;
        let filter = DiagramFilter::from_config(diagram_config)?;
        let entries = database.select(&diagram_config.glob)?;
        info!(
            diagram = name,
            translation_units = entries.len(),
            "building diagram"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count.unwrap_or(0))
            .build()
            .context("failed to build worker pool")?;

        let outcomes: Vec<TuOutcome> = pool.install(|| {
            entries
                .par_iter()
                .map(|entry| self.process_translation_unit(name, diagram_config, &filter, entry))
                .collect()
        });

        // Serial merge phase: exclusive lock on the global model, partials
        // unioned in completion order.
        let global = Mutex::new(new_diagram(name, diagram_config));
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                TuOutcome::Done(partial) => {
                    let mut guard = global.lock();
                    merge_diagram(&mut guard, partial)?;
                }
                TuOutcome::Skipped => {}
                TuOutcome::Failed(path, error) => {
                    error!(tu = %path.display(), %error, "translation unit failed, skipped");
                    failures.push((path, error.to_string()));
                }
                TuOutcome::Fatal(error) => {
                    return Err(error).context("diagram model is inconsistent");
                }
            }
        }

        let mut diagram = global.into_inner();
        finalize_diagram(&mut diagram, diagram_config, &filter)?;

        if diagram.is_empty() {
            if self.config.allow_empty_diagrams {
                warn!(diagram = name, "diagram admitted no elements");
            } else {
                return Err(ConfigError::EmptyDiagram(name.to_string()).into());
            }
        }
        Ok((diagram, failures))
    }

    /// Runs every configured diagram and writes the requested artifacts.
    pub fn run(&self) -> Result<GenerationSummary> {
        let database_dir = self
            .config
            .compilation_database_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let mut database = CompilationDatabase::load(&database_dir)?;
        database.adjust_flags(
            &self.config.add_compile_flags,
            &self.config.remove_compile_flags,
        );

        let output_directory = self
            .config
            .output_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("diagrams"));
        fs::create_dir_all(&output_directory).map_err(|source| RenderError::Io {
            path: output_directory.clone(),
            source,
        })?;

        let metadata = Metadata::from_config(&self.config);
        let user_data = crate::context::user_data_value(&self.config.user_data)?;
        let mut summary = GenerationSummary::default();

        let names: Vec<String> = self.config.diagrams.keys().cloned().collect();
        for name in names {
            if self.cancel.load(Ordering::Relaxed) {
                warn!("generation cancelled");
                break;
            }
            let (diagram, failures) = self.build_diagram(&name, &database)?;
            summary.tu_failures.extend(failures);

            let diagram_config = &self.config.diagrams[&name];
            for format in &self.config.generators {
                let text = render(&diagram, diagram_config, *format, &metadata, &user_data)?;
                let path = output_directory.join(generator::artifact_file_name(&name, *format));
                fs::write(&path, text).map_err(|source| RenderError::Io {
                    path: path.clone(),
                    source,
                })?;
                info!(artifact = %path.display(), "wrote diagram");
            }
            summary.diagrams_emitted += 1;
        }

        if !summary.tu_failures.is_empty() {
            warn!(
                count = summary.tu_failures.len(),
                "some translation units failed to parse"
            );
        }
        Ok(summary)
    }

    fn process_translation_unit(
        &self,
        name: &str,
        diagram_config: &DiagramConfig,
        filter: &DiagramFilter,
        entry: &CompileCommand,
    ) -> TuOutcome {
        if self.cancel.load(Ordering::Relaxed) {
            return TuOutcome::Skipped;
        }
        let tu = match self.frontend.parse(entry) {
            Ok(tu) => tu,
            Err(error) => return TuOutcome::Failed(entry.file.clone(), error),
        };

        let mut partial = new_diagram(name, diagram_config);
        let visited = match &mut partial {
            BuiltDiagram::Class(diagram) => {
                ClassDiagramVisitor::new(diagram, filter, diagram_config)
                    .visit_translation_unit(&tu)
            }
            BuiltDiagram::Sequence(diagram) => {
                SequenceDiagramVisitor::new(diagram, filter, diagram_config)
                    .visit_translation_unit(&tu)
            }
            BuiltDiagram::Package(diagram) => {
                PackageDiagramVisitor::new(diagram, filter).visit_translation_unit(&tu)
            }
            BuiltDiagram::Include(diagram) => {
                IncludeDiagramVisitor::new(diagram, filter, diagram_config)
                    .visit_translation_unit(&tu)
            }
        };
        match visited {
            Ok(()) => TuOutcome::Done(partial),
            Err(error) => TuOutcome::Fatal(error),
        }
    }
}

fn new_diagram(name: &str, config: &DiagramConfig) -> BuiltDiagram {
    let using_namespace = config
        .using_namespace
        .as_deref()
        .map(QualifiedName::parse)
        .unwrap_or_default();
    match config.diagram_type {
        DiagramType::Class => BuiltDiagram::Class(ClassDiagram::new(name, using_namespace)),
        DiagramType::Sequence => {
            BuiltDiagram::Sequence(SequenceDiagram::new(name, using_namespace))
        }
        DiagramType::Package => BuiltDiagram::Package(PackageDiagram::new(name, using_namespace)),
        DiagramType::Include => {
            BuiltDiagram::Include(IncludeDiagram::new(name, config.relative_to.clone()))
        }
    }
}

fn merge_diagram(global: &mut BuiltDiagram, partial: BuiltDiagram) -> Result<(), ModelError> {
    match (global, partial) {
        (BuiltDiagram::Class(global), BuiltDiagram::Class(partial)) => global.merge_from(partial),
        (BuiltDiagram::Sequence(global), BuiltDiagram::Sequence(partial)) => {
            global.merge_from(partial)
        }
        (BuiltDiagram::Package(global), BuiltDiagram::Package(partial)) => {
            global.merge_from(partial)
        }
        (BuiltDiagram::Include(global), BuiltDiagram::Include(partial)) => {
            global.merge_from(partial)
        }
        _ => unreachable!("partial diagrams share their diagram's kind"),
    }
}

fn finalize_diagram(
    diagram: &mut BuiltDiagram,
    config: &DiagramConfig,
    filter: &DiagramFilter,
) -> Result<(), ModelError> {
    match diagram {
        BuiltDiagram::Class(diagram) => diagram.finalize(filter)?,
        BuiltDiagram::Sequence(diagram) => diagram.finalize(config),
        BuiltDiagram::Package(diagram) => diagram.finalize(filter),
        BuiltDiagram::Include(_) => {}
    }
    Ok(())
}

/// Dispatches to the emitter for `format`.
pub fn render(
    diagram: &BuiltDiagram,
    config: &DiagramConfig,
    format: OutputFormat,
    metadata: &Metadata,
    user_data: &serde_json::Value,
) -> Result<String, RenderError> {
    use crate::generator::{graphml, json, mermaid, plantuml};
    match (diagram, format) {
        (BuiltDiagram::Class(d), OutputFormat::Plantuml) => {
            plantuml::render_class(d, config, metadata)
        }
        (BuiltDiagram::Class(d), OutputFormat::Mermaid) => {
            mermaid::render_class(d, config, metadata)
        }
        (BuiltDiagram::Package(d), OutputFormat::Plantuml) => {
            plantuml::render_package(d, config, metadata)
        }
        (BuiltDiagram::Package(d), OutputFormat::Mermaid) => {
            mermaid::render_package(d, config, metadata)
        }
        (BuiltDiagram::Include(d), OutputFormat::Plantuml) => {
            plantuml::render_include(d, config, metadata)
        }
        (BuiltDiagram::Include(d), OutputFormat::Mermaid) => {
            mermaid::render_include(d, config, metadata)
        }
        (BuiltDiagram::Sequence(d), OutputFormat::Plantuml) => {
            plantuml::render_sequence(d, config, metadata)
        }
        (BuiltDiagram::Sequence(d), OutputFormat::Mermaid) => {
            mermaid::render_sequence(d, config, metadata)
        }
        (BuiltDiagram::Sequence(d), OutputFormat::Json) => {
            json::render_sequence(d, metadata, user_data)
        }
        (other, OutputFormat::Json) => {
            json::render_model(other.model(), diagram_type_of(other), metadata, user_data)
        }
        (other, OutputFormat::Graphml) => graphml::render_model(other.model(), metadata),
    }
}

fn diagram_type_of(diagram: &BuiltDiagram) -> DiagramType {
    match diagram {
        BuiltDiagram::Class(_) => DiagramType::Class,
        BuiltDiagram::Sequence(_) => DiagramType::Sequence,
        BuiltDiagram::Package(_) => DiagramType::Package,
        BuiltDiagram::Include(_) => DiagramType::Include,
    }
}
