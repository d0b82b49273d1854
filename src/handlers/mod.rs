//! Resource endpoints. One module per collection, each composing the filter
//! builder, the auth context and the shared database helpers.

pub mod centres;
pub mod chercheurs;
pub mod export;
pub mod provinces;
pub mod publications;
pub mod stats;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `?id=` parameter carried by PUT and DELETE requests.
#[derive(Debug, Deserialize)]
pub struct IdParam {
    pub id: Option<Uuid>,
}

impl IdParam {
    /// Missing id is a validation failure caught before any database call.
    pub fn require(&self, resource: &str) -> Result<Uuid, ApiError> {
        self.id
            .ok_or_else(|| ApiError::bad_request(format!("{} ID required", resource)))
    }
}
