use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::flows::FlowState;

/// Reserved key holding the checkout flow state.
pub const FLOW_STATE_KEY: &str = "flowState";

/// Per-session key/value data. The platform stores it between turns and
/// sends it back with every request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionState {
    values: BTreeMap<String, Value>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_as<T>(&self, key: &str) -> Result<Option<T>, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        self.values.get(key).cloned().map(serde_json::from_value).transpose()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Stored flow state; a session that never stored one is at `Start`.
    pub fn flow_state(&self) -> Result<FlowState, serde_json::Error> {
        Ok(self.get_as(FLOW_STATE_KEY)?.unwrap_or_default())
    }

    pub fn set_flow_state(&mut self, state: FlowState) {
        self.values.insert(FLOW_STATE_KEY.to_owned(), Value::String(state.as_str().to_owned()));
    }

    pub fn apply(&mut self, changes: impl IntoIterator<Item = SessionChange>) {
        for change in changes {
            match change {
                SessionChange::Set { key, value } => {
                    self.values.insert(key, value);
                }
                SessionChange::Remove { key } => {
                    self.values.remove(&key);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for SessionState {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionChange {
    Set { key: String, value: Value },
    Remove { key: String },
}
