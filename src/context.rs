//! Context assembly for text templates.
//!
//! Emitters and user-supplied templates consume diagrams as structured data
//! with stable field names. This module serializes a diagram model into a
//! `serde_json::Value` tree and merges the config's free-form `user_data`
//! entries into it under their dotted paths.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::config::DiagramType;
use crate::diagram::{DiagramModel, SequenceDiagram};
use crate::error::{ConfigError, RenderError};

/// Serializes the shared model surface: name, namespace root, elements with
/// their display names, relationships.
pub fn diagram_context(
    model: &DiagramModel,
    diagram_type: DiagramType,
) -> Result<Value, RenderError> {
    let serialize_err = |source| RenderError::Serialize {
        diagram: model.name.clone(),
        source,
    };

    let mut elements = Vec::new();
    for element in model.elements() {
        if element.skip {
            continue;
        }
        let mut value = serde_json::to_value(element).map_err(serialize_err)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "display_name".to_string(),
                json!(element.display_name(&model.using_namespace)),
            );
        }
        elements.push(value);
    }

    let relationships = serde_json::to_value(model.relationships()).map_err(serialize_err)?;

    Ok(json!({
        "name": model.name,
        "diagram_type": diagram_type.to_string(),
        "using_namespace": model.using_namespace.to_string(),
        "elements": elements,
        "relationships": relationships,
    }))
}

/// Sequence diagrams additionally expose their activity map.
pub fn sequence_context(diagram: &SequenceDiagram) -> Result<Value, RenderError> {
    let mut context = diagram_context(&diagram.model, DiagramType::Sequence)?;
    let sequences = serde_json::to_value(diagram.sequences()).map_err(|source| {
        RenderError::Serialize {
            diagram: diagram.model.name.clone(),
            source,
        }
    })?;
    context["sequences"] = sequences;
    Ok(context)
}

/// Inserts `value` at the dotted `path` (`a.b.c` traverses objects `a` then
/// `b`). Traversing through anything other than an object or an absent slot
/// is an error: overwriting a scalar some other entry put there is almost
/// certainly a config mistake.
pub fn insert_user_data(root: &mut Value, path: &str, value: Value) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidUserDataPath(path.to_string());
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segment.is_empty() {
            return Err(invalid());
        }
        let map = match current {
            Value::Object(map) => map,
            Value::Null => {
                *current = Value::Object(Map::new());
                match current {
                    Value::Object(map) => map,
                    _ => unreachable!(),
                }
            }
            _ => return Err(invalid()),
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return Ok(());
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Err(invalid())
}

/// Applies every configured `user_data` entry to the context.
pub fn apply_user_data(
    root: &mut Value,
    user_data: &IndexMap<String, Value>,
) -> Result<(), ConfigError> {
    for (path, value) in user_data {
        insert_user_data(root, path, value.clone())?;
    }
    Ok(())
}

/// Builds the object the config's `user_data` entries describe. Bad paths
/// are configuration errors and surface before any artifact is written.
pub fn user_data_value(user_data: &IndexMap<String, Value>) -> Result<Value, ConfigError> {
    let mut root = Value::Object(Map::new());
    apply_user_data(&mut root, user_data)?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassData, Element, ElementPayload, QualifiedName};

    #[test]
    fn test_diagram_context_shape() {
        let mut model = DiagramModel::new("core", QualifiedName::parse("app"));
        model
            .add_element(Element::new(
                QualifiedName::parse("app::sub"),
                "Widget",
                ElementPayload::Class(ClassData::default()),
            ))
            .unwrap();

        let context = diagram_context(&model, DiagramType::Class).unwrap();
        assert_eq!(context["name"], "core");
        assert_eq!(context["diagram_type"], "class");
        assert_eq!(context["using_namespace"], "app");
        assert_eq!(context["elements"][0]["name"], "Widget");
        assert_eq!(context["elements"][0]["display_name"], "sub::Widget");
        assert!(context["elements"][0]["id"].is_string());
    }

    #[test]
    fn test_skipped_elements_are_omitted() {
        let mut model = DiagramModel::new("d", QualifiedName::new());
        let mut element = Element::new(
            QualifiedName::new(),
            "Hidden",
            ElementPayload::Class(ClassData::default()),
        );
        element.skip = true;
        model.add_element(element).unwrap();

        let context = diagram_context(&model, DiagramType::Class).unwrap();
        assert_eq!(context["elements"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_insert_user_data_nested_path() {
        let mut root = json!({});
        insert_user_data(&mut root, "a.b.c", json!(42)).unwrap();
        assert_eq!(root["a"]["b"]["c"], 42);

        // Sibling insert reuses the intermediate objects.
        insert_user_data(&mut root, "a.b.d", json!("x")).unwrap();
        assert_eq!(root["a"]["b"]["c"], 42);
        assert_eq!(root["a"]["b"]["d"], "x");
    }

    #[test]
    fn test_insert_user_data_rejects_non_object_leaf() {
        let mut root = json!({"a": {"b": 7}});
        let err = insert_user_data(&mut root, "a.b.c", json!(1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUserDataPath(_)));
    }
}
