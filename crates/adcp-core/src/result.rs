use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskResultStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// The uniform return type of every Task Executor operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskResult {
    pub status: TaskResultStatus,
    pub message: String,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl TaskResult {
    pub fn completed(message: impl Into<String>) -> Self {
        Self {
            status: TaskResultStatus::Completed,
            message: message.into(),
            data: BTreeMap::new(),
            error: None,
            task_id: None,
        }
    }

    pub fn failed(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: TaskResultStatus::Failed,
            message: message.into(),
            data: BTreeMap::new(),
            error: Some(error_code.into()),
            task_id: None,
        }
    }

    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            status: TaskResultStatus::Pending,
            message: message.into(),
            data: BTreeMap::new(),
            error: None,
            task_id: None,
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.insert(key.into(), v);
        }
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskResultStatus::Failed
    }
}
