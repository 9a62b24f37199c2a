use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Event carried by one `data:` frame of an agent run stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// Token(s) to append to the in-flight agent message
    Chunk { content: String },

    /// The agent finished; its message is now frozen
    RunComplete,

    /// Server-side failure reported inside the stream. Not fatal to the stream.
    Error { message: String },

    /// Any other `type`, ignored by consumers
    Other { kind: String },
}

#[derive(Error, Debug)]
pub enum EventDecodeError {
    #[error("Invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),
}

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    payload: Option<RawPayload>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    details: Option<RawDetails>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDetails {
    #[serde(default)]
    message: Option<String>,
}

impl RawEvent {
    fn into_event(self) -> AgentEvent {
        let kind = self.kind.unwrap_or_default();

        if kind == "error" || self.error.is_some() {
            return AgentEvent::Error {
                message: error_text(self.error, self.details),
            };
        }

        match kind.as_str() {
            "agent_chunk" => AgentEvent::Chunk {
                content: self.payload.and_then(|p| p.content).unwrap_or_default(),
            },
            "agent_run_complete" => AgentEvent::RunComplete,
            _ => AgentEvent::Other { kind },
        }
    }
}

// `error` wins over `details.message`
fn error_text(error: Option<Value>, details: Option<RawDetails>) -> String {
    let from_error = error.and_then(|value| match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Object(map) => {
            let message = map.get("message").and_then(Value::as_str).map(str::to_string);
            Some(message.unwrap_or_else(|| Value::Object(map).to_string()))
        }
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    });

    from_error
        .or_else(|| details.and_then(|d| d.message).filter(|m| !m.is_empty()))
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Decode the JSON body of one `data:` frame
pub fn decode_event(data: &str) -> Result<AgentEvent, EventDecodeError> {
    let raw: RawEvent = serde_json::from_str(data)?;
    Ok(raw.into_event())
}
