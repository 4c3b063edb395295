//! Request context carried into mutating operations for audit logging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for the current request.
///
/// Transport layers build one per inbound operation so that every log line
/// a mutation emits can be correlated back to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Correlation ID for the request.
    pub request_id: Uuid,
    /// Free-form label for who is acting (user name, job name, ...).
    pub actor: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor: actor.into(),
            request_time: Utc::now(),
        }
    }

    /// Context for work the application does on its own behalf.
    pub fn system() -> Self {
        Self::new("system")
    }
}
