//! Action id namespacing
//!
//! Every client on the session bus receives every `ActionInvoked` signal. Action ids
//! are therefore sent as `{app_name}_{id}` and only ids carrying this manager's
//! prefix are accepted back.

use super::request::ActionPair;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCodec {
    prefix: String,
}

impl ActionCodec {
    pub fn new(app_name: &str) -> Self {
        Self {
            prefix: format!("{}_", app_name),
        }
    }

    pub fn encode_id(&self, action_id: &str) -> String {
        format!("{}{}", self.prefix, action_id)
    }

    /// Flattens pairs into `[app_id1, label1, app_id2, label2, ...]`
    pub fn encode(&self, actions: &[ActionPair]) -> Vec<String> {
        actions
            .iter()
            .flat_map(|pair| [self.encode_id(&pair.id), pair.label.clone()])
            .collect()
    }

    /// Strips the namespace; `None` when the id belongs to another client
    pub fn decode<'a>(&self, action_key: &'a str) -> Option<&'a str> {
        action_key.strip_prefix(self.prefix.as_str())
    }
}
