pub mod chat;
pub mod quiz;
pub mod sessions;

use diagramlens_core::LensError;
use uuid::Uuid;

/// Path ids that are not UUIDs can never name a session.
pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid, LensError> {
    Uuid::parse_str(raw).map_err(|_| LensError::SessionNotFound(raw.to_string()))
}
