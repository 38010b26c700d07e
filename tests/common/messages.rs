//! Frame message builders

use serde_json::{json, Value};

pub fn init_debug(graph: Value) -> Value {
    json!({ "type": "INIT_DEBUG", "payload": { "actionSequences": graph } })
}

pub fn debug(payload: Value) -> Value {
    json!({ "type": "DEBUG", "payload": payload })
}

pub fn change_url(path: &str) -> Value {
    json!({ "type": "CHANGE_URL", "payload": path })
}
