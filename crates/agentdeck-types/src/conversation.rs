use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Titles longer than this are cut and suffixed with `...`
pub const TITLE_MAX_CHARS: usize = 60;

/// In-memory conversation owned by a playground session
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub agent_name: String,
    pub messages: Vec<Message>,
    pub uploaded_files: Vec<String>,
    /// Last local change, or the stored value for a loaded conversation
    /// (None when the store did not report one)
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_name: agent_name.into(),
            messages: Vec::new(),
            uploaded_files: Vec::new(),
            updated_at: Some(Utc::now()),
        }
    }

    /// Rebuild a conversation from a stored snapshot.
    ///
    /// Nothing loaded from storage is still receiving chunks, so every
    /// message comes back finished.
    pub fn from_snapshot(snapshot: ConversationSnapshot) -> Self {
        let messages = snapshot
            .messages
            .into_iter()
            .map(|mut msg| {
                msg.finish();
                msg
            })
            .collect();

        Self {
            id: snapshot.conversation_id,
            agent_name: snapshot.agent_name,
            messages,
            uploaded_files: snapshot.uploaded_files,
            updated_at: snapshot.updated_at,
        }
    }

    pub fn title(&self) -> Option<String> {
        derive_title(&self.messages)
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Body sent to the conversation store
    pub fn to_payload(&self) -> ConversationPayload {
        ConversationPayload {
            conversation_id: self.id.clone(),
            agent_name: self.agent_name.clone(),
            messages: self.messages.clone(),
            uploaded_files: self.uploaded_files.clone(),
            title: self.title(),
        }
    }

    /// Add file names, keeping order and skipping ones already recorded
    pub fn record_uploads<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.uploaded_files.contains(&name) {
                self.uploaded_files.push(name);
            }
        }
    }
}

/// Title from the first user turn: whitespace collapsed, cut at
/// [`TITLE_MAX_CHARS`] characters.
pub fn derive_title(messages: &[Message]) -> Option<String> {
    let first = messages.iter().find(|m| m.role == Role::User)?;
    let collapsed = first.content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    if collapsed.chars().count() > TITLE_MAX_CHARS {
        let cut: String = collapsed.chars().take(TITLE_MAX_CHARS).collect();
        Some(format!("{}...", cut.trim_end()))
    } else {
        Some(collapsed)
    }
}

/// Persistence payload (upsert)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPayload {
    pub conversation_id: String,
    pub agent_name: String,
    pub messages: Vec<Message>,
    pub uploaded_files: Vec<String>,
    pub title: Option<String>,
}

/// Full conversation as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    #[serde(default, alias = "id")]
    pub conversation_id: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub uploaded_files: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ConversationPayload> for ConversationSnapshot {
    fn from(payload: ConversationPayload) -> Self {
        Self {
            conversation_id: payload.conversation_id,
            agent_name: payload.agent_name,
            messages: payload.messages,
            uploaded_files: payload.uploaded_files,
            title: payload.title,
            updated_at: None,
        }
    }
}

/// History list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(alias = "id")]
    pub conversation_id: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    #[serde(alias = "limit")]
    pub page_size: u32,
    #[serde(alias = "total_items", alias = "total_count")]
    pub total: u64,
    pub total_pages: u32,
}

/// One page of history, whatever shape the store answered with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPage {
    pub items: Vec<ConversationSummary>,
    pub pagination: Pagination,
}

impl ConversationPage {
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination {
                page,
                page_size,
                total: 0,
                total_pages: 0,
            },
        }
    }

    pub fn has_next(&self) -> bool {
        self.pagination.page < self.pagination.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_first_user_message() {
        let messages = vec![
            Message::system("ready", 1),
            Message::user("  What is\n the   weather? ", 2),
            Message::user("second", 3),
        ];
        assert_eq!(derive_title(&messages).as_deref(), Some("What is the weather?"));
    }

    #[test]
    fn test_title_truncated() {
        let long = "a".repeat(TITLE_MAX_CHARS + 10);
        let title = derive_title(&[Message::user(long, 1)]).unwrap();
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_title_absent_without_user_turn() {
        assert_eq!(derive_title(&[Message::system("Error: down", 1)]), None);
        assert_eq!(derive_title(&[]), None);
    }

    #[test]
    fn test_payload_shape() {
        let mut conv = Conversation::new("conv_1", "demo");
        conv.messages.push(Message::user("Hello", 1));
        conv.messages.push(Message::agent_placeholder(2));
        conv.record_uploads(["notes.md", "notes.md", "faq.txt"]);

        let value = serde_json::to_value(conv.to_payload()).unwrap();
        assert_eq!(value["conversation_id"], "conv_1");
        assert_eq!(value["agent_name"], "demo");
        assert_eq!(value["title"], "Hello");
        assert_eq!(value["uploaded_files"], serde_json::json!(["notes.md", "faq.txt"]));
        assert_eq!(value["messages"][1]["streaming"], true);
        assert!(value["messages"][0].get("streaming").is_none());
    }

    #[test]
    fn test_snapshot_messages_come_back_finished() {
        let json = r#"{
            "id": "conv_9",
            "agent_name": "demo",
            "messages": [
                {"role": "user", "content": "hi", "ts": 1},
                {"role": "agent", "content": "par", "ts": 2, "streaming": true}
            ]
        }"#;
        let snapshot: ConversationSnapshot = serde_json::from_str(json).unwrap();
        let conv = Conversation::from_snapshot(snapshot);

        assert_eq!(conv.id, "conv_9");
        assert!(conv.messages.iter().all(|m| !m.streaming));
        assert!(conv.uploaded_files.is_empty());
        assert_eq!(conv.updated_at, None);
    }

    #[test]
    fn test_snapshot_without_timestamp_rebuilds_identically() {
        let snapshot: ConversationSnapshot = Conversation::new("conv_3", "demo")
            .to_payload()
            .into();

        let first = Conversation::from_snapshot(snapshot.clone());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = Conversation::from_snapshot(snapshot);

        assert_eq!(first, second);
    }

    #[test]
    fn test_has_next() {
        let mut page = ConversationPage::empty(1, 20);
        assert!(!page.has_next());
        page.pagination.total_pages = 3;
        assert!(page.has_next());
    }
}
