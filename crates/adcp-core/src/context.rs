use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::principal::Protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// A conversation handle scoped to `(tenant_id, principal_id, protocol)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContextRecord {
    pub context_id: String,
    pub tenant_id: String,
    pub principal_id: String,
    pub protocol: Protocol,
    #[serde(default)]
    pub state: BTreeMap<String, Value>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ContextRecord {
    pub fn new(context_id: String, tenant_id: String, principal_id: String, protocol: Protocol) -> Self {
        Self {
            context_id,
            tenant_id,
            principal_id,
            protocol,
            state: BTreeMap::new(),
            messages: Vec::new(),
        }
    }

    /// `context/clear`: empty the message log, keep the same `context_id`.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
