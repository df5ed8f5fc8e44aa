//! Output shapes requested from the model.
//!
//! Property names here must match the serde field names of the types the
//! responses are parsed into.

use diagramlens_core::{ResponseSchema, SchemaNode};

pub const EXPLANATION_SCHEMA: &str = "diagram_explanation";
pub const QUIZ_SCHEMA: &str = "diagram_quiz";

pub fn explanation_schema() -> ResponseSchema {
    let component = SchemaNode::object()
        .property("name", SchemaNode::string().describe("Label of the element"))
        .property(
            "description",
            SchemaNode::string().describe("What the element does, one or two sentences"),
        );

    ResponseSchema::new(
        EXPLANATION_SCHEMA,
        SchemaNode::object()
            .property("title", SchemaNode::string().describe("Short name for the diagram"))
            .property(
                "summary",
                SchemaNode::string().describe(
                    "Overview in markdown: ## headings, * bullets, 1. steps, **bold** only",
                ),
            )
            .property("components", SchemaNode::array(component))
            .property(
                "relationships",
                SchemaNode::array(SchemaNode::string())
                    .describe("How the components interact, in flow order"),
            )
            .property(
                "key_takeaways",
                SchemaNode::array(SchemaNode::string()).describe("Points worth remembering"),
            ),
    )
}

pub fn quiz_schema(count: u32) -> ResponseSchema {
    let question = SchemaNode::object()
        .property("question", SchemaNode::string())
        .property(
            "options",
            SchemaNode::array(SchemaNode::string())
                .length(Some(2), Some(6))
                .describe("Answer choices, exactly one correct"),
        )
        .property(
            "correct_index",
            SchemaNode::integer().describe("Zero-based index of the correct option"),
        )
        .property(
            "explanation",
            SchemaNode::string().describe("Why the correct option is right"),
        );

    ResponseSchema::new(
        QUIZ_SCHEMA,
        SchemaNode::object().property(
            "questions",
            SchemaNode::array(question).length(Some(1), Some(count.max(1))),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_schema_bounds_question_count() {
        let v = quiz_schema(5).schema.to_gemini();
        assert_eq!(v["properties"]["questions"]["maxItems"], 5);
        let item = &v["properties"]["questions"]["items"];
        assert_eq!(item["properties"]["correct_index"]["type"], "INTEGER");
    }

    #[test]
    fn explanation_schema_fields_match_type() {
        let v = explanation_schema().schema.to_json_schema();
        let required: Vec<&str> = v["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            ["title", "summary", "components", "relationships", "key_takeaways"]
        );
    }
}
