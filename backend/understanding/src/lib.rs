pub mod json;
pub mod prompts;
pub mod schemas;
pub mod tutor;

pub use json::{extract_json, parse_structured};
pub use schemas::{explanation_schema, quiz_schema};
pub use tutor::{DiagramTutor, GenerationSettings};
