pub mod error;
pub mod schema;
pub mod traits;
pub mod types;

pub use error::{LensError, LensResult};
pub use schema::{ResponseSchema, SchemaNode};
pub use traits::{Content, ModelProvider, ModelRequest, ModelResponse, Part};
pub use types::{ChatRole, ChatTurn, DiagramComponent, Explanation, QuizQuestion};
