//! JSON emitter: the serialized diagram context plus a metadata object,
//! pretty-printed. Downstream tooling re-reads this; field names are part of
//! the crate's stable surface.

use serde_json::{json, Value};

use crate::config::DiagramType;
use crate::diagram::{DiagramModel, SequenceDiagram};
use crate::error::RenderError;
use crate::{context, generator::Metadata};

pub fn render_model(
    model: &DiagramModel,
    diagram_type: DiagramType,
    metadata: &Metadata,
    user_data: &Value,
) -> Result<String, RenderError> {
    let mut value = context::diagram_context(model, diagram_type)?;
    attach_extras(&mut value, metadata, user_data);
    to_pretty(model, value)
}

pub fn render_sequence(
    diagram: &SequenceDiagram,
    metadata: &Metadata,
    user_data: &Value,
) -> Result<String, RenderError> {
    let mut value = context::sequence_context(diagram)?;
    attach_extras(&mut value, metadata, user_data);
    to_pretty(&diagram.model, value)
}

fn attach_extras(value: &mut Value, metadata: &Metadata, user_data: &Value) {
    if metadata.enabled {
        value["metadata"] = json!({
            "tool": format!("umlgen {}", metadata.version),
            "config_hash": metadata.config_hash,
        });
    }
    if user_data.as_object().is_some_and(|map| !map.is_empty()) {
        value["user_data"] = user_data.clone();
    }
}

fn to_pretty(model: &DiagramModel, value: Value) -> Result<String, RenderError> {
    let mut text =
        serde_json::to_string_pretty(&value).map_err(|source| RenderError::Serialize {
            diagram: model.name.clone(),
            source,
        })?;
    text.push('\n');
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QualifiedName;

    #[test]
    fn test_output_is_valid_json() {
        let model = DiagramModel::new("d", QualifiedName::new());
        let out =
            render_model(&model, DiagramType::Class, &Metadata::disabled(), &json!({})).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["name"], "d");
        assert!(parsed.get("metadata").is_none());
        assert!(parsed.get("user_data").is_none());
    }

    #[test]
    fn test_metadata_and_user_data_attached() {
        let model = DiagramModel::new("d", QualifiedName::new());
        let metadata = Metadata {
            enabled: true,
            version: "0.1.0",
            config_hash: "cafe".to_string(),
        };
        let user_data = json!({"project": {"name": "demo"}});
        let out = render_model(&model, DiagramType::Class, &metadata, &user_data).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["metadata"]["config_hash"], "cafe");
        assert_eq!(parsed["user_data"]["project"]["name"], "demo");
    }
}
