use super::event::{sse_label_for, Event};

/// Encode one Server-Sent Events frame: `event: <label>\ndata: <json>\n\n`.
///
/// `error` is relabelled `agent_error` on the transport; the payload keeps
/// its own `type` untouched.
pub fn to_sse_frame(event_type: &str, payload: &serde_json::Value) -> String {
    let data = serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string());
    format!("event: {}\ndata: {}\n\n", sse_label_for(event_type), data)
}

impl Event {
    /// JSON payload of this event, including its `type` field.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn to_sse_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.sse_label(), self.to_json())
    }
}
