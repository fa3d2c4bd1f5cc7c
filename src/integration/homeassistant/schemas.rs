//! Home Assistant API Schemas
//! Body of `POST /api/states/<entity_id>`.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State reported for a sensor without a value.
pub const UNKNOWN_STATE: &str = "unknown";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StateCreateOrUpdate {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<HashMap<String, String>>,
}
