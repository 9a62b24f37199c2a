use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Agent,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::User => "user",
            Role::Agent => "agent",
            Role::System => "system",
        };
        f.write_str(label)
    }
}

/// One turn in a conversation.
///
/// `ts` is the creation instant in epoch milliseconds and doubles as the key
/// of the in-flight agent message. Content only changes while `streaming`
/// is set; once a message is finished it is frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    pub ts: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub streaming: bool,
}

impl Message {
    pub fn user(content: impl Into<String>, ts: i64) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            ts,
            streaming: false,
        }
    }

    /// Empty agent message that receives streamed chunks
    pub fn agent_placeholder(ts: i64) -> Self {
        Self {
            role: Role::Agent,
            content: String::new(),
            ts,
            streaming: true,
        }
    }

    pub fn system(content: impl Into<String>, ts: i64) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            ts,
            streaming: false,
        }
    }

    /// Append a chunk. Returns false (and leaves content untouched) once the
    /// message has been finished.
    pub fn append(&mut self, chunk: &str) -> bool {
        if !self.streaming {
            return false;
        }
        self.content.push_str(chunk);
        true
    }

    /// Freeze the content
    pub fn finish(&mut self) {
        self.streaming = false;
    }
}
