//! MermaidJS emitter.
//!
//! Class and sequence diagrams map onto Mermaid's native diagram types;
//! package and include graphs render as flowcharts, which is the closest
//! dialect Mermaid offers for plain directed graphs.

use std::collections::HashSet;
use std::fmt::Write;

use crate::config::DiagramConfig;
use crate::diagram::sequence::MessageKind;
use crate::diagram::{ClassDiagram, IncludeDiagram, PackageDiagram, SequenceDiagram};
use crate::error::RenderError;
use crate::model::{ElementPayload, EntityId, RelationshipKind};

use super::{access_prefix, Metadata};

fn alias(id: EntityId) -> String {
    format!("C_{:019}", id.value())
}

fn format_error(diagram: &str) -> impl Fn(std::fmt::Error) -> RenderError + '_ {
    move |source| RenderError::Format {
        diagram: diagram.to_string(),
        source,
    }
}

fn arrow(kind: RelationshipKind) -> &'static str {
    match kind {
        RelationshipKind::Extension => "--|>",
        RelationshipKind::Composition => "*--",
        RelationshipKind::Aggregation => "o--",
        RelationshipKind::Association => "-->",
        RelationshipKind::Instantiation => "..|>",
        // Mermaid has no dedicated notation for the rest.
        _ => "..>",
    }
}

pub fn render_class(
    diagram: &ClassDiagram,
    config: &DiagramConfig,
    metadata: &Metadata,
) -> Result<String, RenderError> {
    let model = &diagram.model;
    let err = format_error(&model.name);
    let mut out = String::new();
    out.push_str(&metadata.comment_block("%%"));
    out.push_str("classDiagram\n");

    for element in model.elements() {
        if element.skip {
            continue;
        }
        let display = element.display_name(&model.using_namespace);
        let id = alias(element.id);
        writeln!(out, "  class {id}[\"{display}\"]").map_err(&err)?;
        match &element.payload {
            ElementPayload::Class(data) => {
                for member in &data.members {
                    writeln!(
                        out,
                        "  {id} : {}{} {}",
                        access_prefix(member.access),
                        member.type_name,
                        member.name
                    )
                    .map_err(&err)?;
                }
                for method in &data.methods {
                    writeln!(
                        out,
                        "  {id} : {}{}() {}",
                        access_prefix(method.access),
                        method.name,
                        method.return_type
                    )
                    .map_err(&err)?;
                }
            }
            ElementPayload::Enum(data) => {
                writeln!(out, "  <<enumeration>> {id}").map_err(&err)?;
                for constant in &data.constants {
                    writeln!(out, "  {id} : {constant}").map_err(&err)?;
                }
            }
            ElementPayload::Concept(_) => {
                writeln!(out, "  <<concept>> {id}").map_err(&err)?;
            }
            _ => {}
        }
    }

    for rel in model.relationships() {
        write!(out, "  {} {} {}", alias(rel.source), arrow(rel.kind), alias(rel.target))
            .map_err(&err)?;
        if let Some(label) = &rel.label {
            write!(out, " : {label}").map_err(&err)?;
        }
        writeln!(out).map_err(&err)?;
    }
    for hint in &config.layout {
        writeln!(out, "{hint}").map_err(&err)?;
    }
    Ok(out)
}

pub fn render_package(
    diagram: &PackageDiagram,
    _config: &DiagramConfig,
    metadata: &Metadata,
) -> Result<String, RenderError> {
    let model = &diagram.model;
    let err = format_error(&model.name);
    let mut out = String::new();
    out.push_str(&metadata.comment_block("%%"));
    out.push_str("flowchart LR\n");
    for element in diagram.packages() {
        writeln!(
            out,
            "  {}[\"{}\"]",
            alias(element.id),
            element.display_name(&model.using_namespace)
        )
        .map_err(&err)?;
    }
    for rel in model.relationships() {
        writeln!(out, "  {} -.-> {}", alias(rel.source), alias(rel.target)).map_err(&err)?;
    }
    Ok(out)
}

pub fn render_include(
    diagram: &IncludeDiagram,
    _config: &DiagramConfig,
    metadata: &Metadata,
) -> Result<String, RenderError> {
    let model = &diagram.model;
    let err = format_error(&model.name);
    let mut out = String::new();
    out.push_str(&metadata.comment_block("%%"));
    out.push_str("flowchart LR\n");
    for element in model.elements() {
        writeln!(out, "  {}[\"{}\"]", alias(element.id), element.name).map_err(&err)?;
    }
    for rel in model.relationships() {
        writeln!(out, "  {} -.-> {}", alias(rel.source), alias(rel.target)).map_err(&err)?;
    }
    Ok(out)
}

pub fn render_sequence(
    diagram: &SequenceDiagram,
    _config: &DiagramConfig,
    metadata: &Metadata,
) -> Result<String, RenderError> {
    let model = &diagram.model;
    let err = format_error(&model.name);
    let mut out = String::new();
    out.push_str(&metadata.comment_block("%%"));
    out.push_str("sequenceDiagram\n");
    for element in model.elements() {
        if element.skip {
            continue;
        }
        writeln!(
            out,
            "  participant {} as {}",
            alias(element.id),
            element.display_name(&model.using_namespace)
        )
        .map_err(&err)?;
    }
    let mut visited: HashSet<&str> = HashSet::new();
    for entry in diagram.entry_points() {
        emit_activity(&mut out, diagram, entry, &mut visited).map_err(&err)?;
    }
    Ok(out)
}

fn emit_activity<'d>(
    out: &mut String,
    diagram: &'d SequenceDiagram,
    usr: &str,
    visited: &mut HashSet<&'d str>,
) -> std::fmt::Result {
    let Some((key, activity)) = diagram.sequences().get_key_value(usr) else {
        return Ok(());
    };
    if !visited.insert(key.as_str()) {
        return Ok(());
    }
    for message in &activity.messages {
        match message.kind {
            MessageKind::Call => {
                writeln!(
                    out,
                    "  {} ->> {} : {}",
                    alias(message.from),
                    alias(message.to),
                    message.name
                )?;
                emit_activity(out, diagram, &message.to_usr, visited)?;
            }
            MessageKind::Return => {
                writeln!(
                    out,
                    "  {} -->> {} : {}",
                    alias(message.from),
                    alias(message.to),
                    message.return_type
                )?;
            }
            MessageKind::ConditionalBegin => writeln!(out, "  alt {}", message.name)?,
            MessageKind::ConditionalElse => writeln!(out, "  else {}", message.name)?,
            MessageKind::ConditionalEnd | MessageKind::LoopEnd => writeln!(out, "  end")?,
            MessageKind::LoopBegin => writeln!(out, "  loop {}", message.name)?,
        }
    }
    Ok(())
}
