//! Structured-output declarations.
//!
//! A [`SchemaNode`] describes the JSON shape we want a model to answer in.
//! Providers disagree on the dialect, so the same tree renders to Gemini's
//! OpenAPI subset or to strict JSON Schema.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object {
        description: Option<String>,
        /// Ordered; Gemini emits fields in this order.
        properties: Vec<(String, SchemaNode)>,
    },
    Array {
        description: Option<String>,
        items: Box<SchemaNode>,
        min_items: Option<u32>,
        max_items: Option<u32>,
    },
    String { description: Option<String> },
    Integer { description: Option<String> },
    Boolean { description: Option<String> },
}

/// A named schema attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: SchemaNode,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

impl SchemaNode {
    pub fn object() -> Self {
        Self::Object {
            description: None,
            properties: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::String { description: None }
    }

    pub fn integer() -> Self {
        Self::Integer { description: None }
    }

    pub fn boolean() -> Self {
        Self::Boolean { description: None }
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::Array {
            description: None,
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// Add a property to an object node. All properties are required.
    /// No-op on non-object nodes.
    pub fn property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        if let Self::Object { properties, .. } = &mut self {
            properties.push((name.into(), node));
        }
        self
    }

    /// Bound the length of an array node. No-op on other nodes.
    pub fn length(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        if let Self::Array {
            min_items,
            max_items,
            ..
        } = &mut self
        {
            *min_items = min;
            *max_items = max;
        }
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            Self::Object { description, .. }
            | Self::Array { description, .. }
            | Self::String { description }
            | Self::Integer { description }
            | Self::Boolean { description } => *description = text,
        }
        self
    }

    fn description(&self) -> Option<&str> {
        match self {
            Self::Object { description, .. }
            | Self::Array { description, .. }
            | Self::String { description }
            | Self::Integer { description }
            | Self::Boolean { description } => description.as_deref(),
        }
    }

    /// Render as a Gemini `responseSchema`.
    pub fn to_gemini(&self) -> Value {
        let mut out = Map::new();
        match self {
            Self::Object { properties, .. } => {
                out.insert("type".into(), json!("OBJECT"));
                let mut props = Map::new();
                for (name, node) in properties {
                    props.insert(name.clone(), node.to_gemini());
                }
                let names: Vec<&str> = properties.iter().map(|(n, _)| n.as_str()).collect();
                out.insert("properties".into(), Value::Object(props));
                out.insert("required".into(), json!(names));
                out.insert("propertyOrdering".into(), json!(names));
            }
            Self::Array {
                items,
                min_items,
                max_items,
                ..
            } => {
                out.insert("type".into(), json!("ARRAY"));
                out.insert("items".into(), items.to_gemini());
                if let Some(min) = min_items {
                    out.insert("minItems".into(), json!(min));
                }
                if let Some(max) = max_items {
                    out.insert("maxItems".into(), json!(max));
                }
            }
            Self::String { .. } => {
                out.insert("type".into(), json!("STRING"));
            }
            Self::Integer { .. } => {
                out.insert("type".into(), json!("INTEGER"));
            }
            Self::Boolean { .. } => {
                out.insert("type".into(), json!("BOOLEAN"));
            }
        }
        if let Some(d) = self.description() {
            out.insert("description".into(), json!(d));
        }
        Value::Object(out)
    }

    /// Render as strict JSON Schema (OpenAI `response_format`).
    pub fn to_json_schema(&self) -> Value {
        let mut out = Map::new();
        match self {
            Self::Object { properties, .. } => {
                out.insert("type".into(), json!("object"));
                let mut props = Map::new();
                for (name, node) in properties {
                    props.insert(name.clone(), node.to_json_schema());
                }
                let names: Vec<&str> = properties.iter().map(|(n, _)| n.as_str()).collect();
                out.insert("properties".into(), Value::Object(props));
                out.insert("required".into(), json!(names));
                out.insert("additionalProperties".into(), json!(false));
            }
            Self::Array { items, .. } => {
                out.insert("type".into(), json!("array"));
                out.insert("items".into(), items.to_json_schema());
            }
            Self::String { .. } => {
                out.insert("type".into(), json!("string"));
            }
            Self::Integer { .. } => {
                out.insert("type".into(), json!("integer"));
            }
            Self::Boolean { .. } => {
                out.insert("type".into(), json!("boolean"));
            }
        }
        if let Some(d) = self.description() {
            out.insert("description".into(), json!(d));
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> SchemaNode {
        SchemaNode::object()
            .property("name", SchemaNode::string().describe("Full name"))
            .property("age", SchemaNode::integer())
            .property(
                "tags",
                SchemaNode::array(SchemaNode::string()).length(Some(1), Some(3)),
            )
    }

    #[test]
    fn gemini_dialect() {
        let v = person().to_gemini();
        assert_eq!(v["type"], "OBJECT");
        assert_eq!(v["properties"]["name"]["description"], "Full name");
        assert_eq!(v["propertyOrdering"], json!(["name", "age", "tags"]));
        assert_eq!(v["properties"]["tags"]["type"], "ARRAY");
        assert_eq!(v["properties"]["tags"]["maxItems"], 3);
    }

    #[test]
    fn json_schema_dialect_is_strict() {
        let v = person().to_json_schema();
        assert_eq!(v["type"], "object");
        assert_eq!(v["additionalProperties"], false);
        assert_eq!(v["required"], json!(["name", "age", "tags"]));
        assert!(v["properties"]["tags"].get("maxItems").is_none());
    }

    #[test]
    fn property_on_scalar_is_ignored() {
        let node = SchemaNode::string().property("x", SchemaNode::integer());
        assert_eq!(node, SchemaNode::string());
    }
}
