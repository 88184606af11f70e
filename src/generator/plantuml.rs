//! PlantUML emitter.

use std::collections::HashSet;
use std::fmt::Write;

use crate::config::DiagramConfig;
use crate::diagram::sequence::MessageKind;
use crate::diagram::{ClassDiagram, IncludeDiagram, PackageDiagram, SequenceDiagram};
use crate::error::RenderError;
use crate::model::{ElementPayload, EntityId, Relationship, RelationshipKind};

use super::{access_prefix, plantuml_arrow, Metadata};

fn alias(id: EntityId) -> String {
    format!("C_{:019}", id.value())
}

fn format_error(diagram: &str) -> impl Fn(std::fmt::Error) -> RenderError + '_ {
    move |source| RenderError::Format {
        diagram: diagram.to_string(),
        source,
    }
}

fn header(out: &mut String, metadata: &Metadata) {
    out.push_str("@startuml\n");
    out.push_str(&metadata.comment_block("'"));
}

fn footer(out: &mut String, config: &DiagramConfig) {
    for hint in &config.layout {
        out.push_str(hint);
        out.push('\n');
    }
    out.push_str("@enduml\n");
}

pub fn render_class(
    diagram: &ClassDiagram,
    config: &DiagramConfig,
    metadata: &Metadata,
) -> Result<String, RenderError> {
    let model = &diagram.model;
    let err = format_error(&model.name);
    let mut out = String::new();
    header(&mut out, metadata);

    for element in model.elements() {
        if element.skip {
            continue;
        }
        let display = element.display_name(&model.using_namespace);
        let id = alias(element.id);
        match &element.payload {
            ElementPayload::Class(data) => {
                let keyword = if data.is_abstract { "abstract class" } else { "class" };
                writeln!(out, "{keyword} \"{display}\" as {id} {{").map_err(&err)?;
                for member in &data.members {
                    let stat = if member.is_static { "{static} " } else { "" };
                    writeln!(
                        out,
                        "  {}{}{} : {}",
                        access_prefix(member.access),
                        stat,
                        member.name,
                        member.type_name
                    )
                    .map_err(&err)?;
                }
                for method in &data.methods {
                    let params: Vec<String> = method
                        .parameters
                        .iter()
                        .map(|p| format!("{} {}", p.type_name, p.name))
                        .collect();
                    let qualifier = if method.is_pure_virtual {
                        " {abstract}"
                    } else if method.is_static {
                        " {static}"
                    } else {
                        ""
                    };
                    writeln!(
                        out,
                        "  {}{}({}) : {}{}",
                        access_prefix(method.access),
                        method.name,
                        params.join(", "),
                        method.return_type,
                        qualifier
                    )
                    .map_err(&err)?;
                }
                writeln!(out, "}}").map_err(&err)?;
            }
            ElementPayload::Enum(data) => {
                writeln!(out, "enum \"{display}\" as {id} {{").map_err(&err)?;
                for constant in &data.constants {
                    writeln!(out, "  {constant}").map_err(&err)?;
                }
                writeln!(out, "}}").map_err(&err)?;
            }
            ElementPayload::Concept(_) => {
                writeln!(out, "class \"{display}\" as {id} <<concept>>").map_err(&err)?;
            }
            _ => {}
        }
    }

    for relationship in model.relationships() {
        write_relationship(&mut out, relationship).map_err(&err)?;
    }

    footer(&mut out, config);
    Ok(out)
}

fn write_relationship(out: &mut String, rel: &Relationship) -> std::fmt::Result {
    let arrow = plantuml_arrow(rel.kind);
    let (left, right) = match rel.kind {
        // `outer +-- inner`; the nesting edge points inner -> outer.
        RelationshipKind::Nesting => (alias(rel.target), alias(rel.source)),
        _ => (alias(rel.source), alias(rel.target)),
    };
    write!(out, "{left} ")?;
    if let Some(multiplicity) = &rel.multiplicity_source {
        write!(out, "\"{multiplicity}\" ")?;
    }
    write!(out, "{arrow} ")?;
    if let Some(multiplicity) = &rel.multiplicity_target {
        write!(out, "\"{multiplicity}\" ")?;
    }
    write!(out, "{right}")?;
    match (&rel.label, rel.kind) {
        (_, RelationshipKind::Friendship) => write!(out, " : <<friend>>")?,
        (Some(label), _) => write!(out, " : {}{}", access_prefix(rel.access), label)?,
        (None, _) => {}
    }
    writeln!(out)
}

pub fn render_package(
    diagram: &PackageDiagram,
    config: &DiagramConfig,
    metadata: &Metadata,
) -> Result<String, RenderError> {
    let model = &diagram.model;
    let err = format_error(&model.name);
    let mut out = String::new();
    header(&mut out, metadata);

    for element in diagram.packages() {
        if element.skip {
            continue;
        }
        writeln!(
            out,
            "package \"{}\" as {}",
            element.display_name(&model.using_namespace),
            alias(element.id)
        )
        .map_err(&err)?;
    }
    for relationship in model.relationships() {
        writeln!(
            out,
            "{} ..> {}",
            alias(relationship.source),
            alias(relationship.target)
        )
        .map_err(&err)?;
    }

    footer(&mut out, config);
    Ok(out)
}

pub fn render_include(
    diagram: &IncludeDiagram,
    config: &DiagramConfig,
    metadata: &Metadata,
) -> Result<String, RenderError> {
    let model = &diagram.model;
    let err = format_error(&model.name);
    let mut out = String::new();
    header(&mut out, metadata);

    for element in model.elements() {
        writeln!(out, "file \"{}\" as {}", element.name, alias(element.id)).map_err(&err)?;
    }
    for relationship in model.relationships() {
        writeln!(
            out,
            "{} ..> {}",
            alias(relationship.source),
            alias(relationship.target)
        )
        .map_err(&err)?;
    }

    footer(&mut out, config);
    Ok(out)
}

pub fn render_sequence(
    diagram: &SequenceDiagram,
    config: &DiagramConfig,
    metadata: &Metadata,
) -> Result<String, RenderError> {
    let model = &diagram.model;
    let err = format_error(&model.name);
    let mut out = String::new();
    header(&mut out, metadata);

    for element in model.elements() {
        if element.skip {
            continue;
        }
        writeln!(
            out,
            "participant \"{}\" as {}",
            element.display_name(&model.using_namespace),
            alias(element.id)
        )
        .map_err(&err)?;
    }

    let mut visited: HashSet<&str> = HashSet::new();
    for entry in diagram.entry_points() {
        emit_activity(&mut out, diagram, entry, &mut visited).map_err(&err)?;
    }

    footer(&mut out, config);
    Ok(out)
}

/// Emits an activity's messages, descending into callee activities right
/// after their call line so the text reads in execution order.
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
                    "{} -> {} : {}",
                    alias(message.from),
                    alias(message.to),
                    message.name
                )?;
                emit_activity(out, diagram, &message.to_usr, visited)?;
            }
            MessageKind::Return => {
                writeln!(
                    out,
                    "{} --> {} : {}",
                    alias(message.from),
                    alias(message.to),
                    message.return_type
                )?;
            }
            MessageKind::ConditionalBegin => writeln!(out, "alt {}", message.name)?,
            MessageKind::ConditionalElse => writeln!(out, "else {}", message.name)?,
            MessageKind::ConditionalEnd | MessageKind::LoopEnd => writeln!(out, "end")?,
            MessageKind::LoopBegin => writeln!(out, "loop {}", message.name)?,
        }
    }
    Ok(())
}
