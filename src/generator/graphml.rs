//! GraphML emitter.
//!
//! Nodes and edges of the shared model rendered as GraphML with `label`,
//! `kind` and `type` data keys. Hand-written XML: the structure is flat and
//! fixed, and escaping is the only subtlety.

use std::fmt::Write;

use crate::diagram::DiagramModel;
use crate::error::RenderError;
use crate::generator::Metadata;

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_model(model: &DiagramModel, metadata: &Metadata) -> Result<String, RenderError> {
    let err = |source| RenderError::Format {
        diagram: model.name.clone(),
        source,
    };
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">\n");
    if metadata.enabled {
        writeln!(
            out,
            "  <desc>Generated with umlgen {} (config hash {})</desc>",
            metadata.version, metadata.config_hash
        )
        .map_err(err)?;
    }
    out.push_str("  <key id=\"label\" for=\"node\" attr.name=\"label\" attr.type=\"string\"/>\n");
    out.push_str("  <key id=\"kind\" for=\"node\" attr.name=\"kind\" attr.type=\"string\"/>\n");
    out.push_str("  <key id=\"type\" for=\"edge\" attr.name=\"type\" attr.type=\"string\"/>\n");
    writeln!(out, "  <graph id=\"{}\" edgedefault=\"directed\">", escape(&model.name))
        .map_err(err)?;

    for element in model.elements() {
        if element.skip {
            continue;
        }
        writeln!(out, "    <node id=\"n{}\">", element.id).map_err(err)?;
        writeln!(
            out,
            "      <data key=\"label\">{}</data>",
            escape(&element.display_name(&model.using_namespace))
        )
        .map_err(err)?;
        writeln!(
            out,
            "      <data key=\"kind\">{}</data>",
            element.kind_name()
        )
        .map_err(err)?;
        out.push_str("    </node>\n");
    }
    for (index, rel) in model.relationships().iter().enumerate() {
        writeln!(
            out,
            "    <edge id=\"e{}\" source=\"n{}\" target=\"n{}\">",
            index, rel.source, rel.target
        )
        .map_err(err)?;
        writeln!(
            out,
            "      <data key=\"type\">{}</data>",
            rel.kind.as_str()
        )
        .map_err(err)?;
        out.push_str("    </edge>\n");
    }
    out.push_str("  </graph>\n</graphml>\n");
    Ok(out)
}
