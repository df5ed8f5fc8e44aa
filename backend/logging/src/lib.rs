//! Structured logging for DiagramLens.
//!
//! Console and rolling-file output, secret and image redaction, and the
//! study event log.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{StudyEvent, StudyEventEntry, StudyEventLogger};
pub use logger::{init_logger, LOG_FILE_PREFIX};
pub use redact::redact_sensitive_data;
