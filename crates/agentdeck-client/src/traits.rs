use agentdeck_types::{AgentDefinition, AgentSummary, ConversationPage, ConversationPayload, ConversationSnapshot};
use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Raw response body of a streamed run, one item per transport read
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Body of a run request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub agent_name: String,
    pub prompt: String,
    pub conversation_id: String,
}

impl RunRequest {
    pub fn new(
        agent_name: impl Into<String>,
        prompt: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            prompt: prompt.into(),
            conversation_id: conversation_id.into(),
        }
    }
}

/// Starts agent runs and hands back the unparsed SSE body.
///
/// An `Err` from `run_stream` means nothing was received (connect failure,
/// non-2xx status). Errors inside the stream are body read failures.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run_stream(&self, request: RunRequest) -> Result<ByteStream>;
}

/// Read-only view of the agents configured on the runtime
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>>;

    async fn get_agent(&self, name: &str) -> Result<AgentDefinition>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

/// Conversation snapshots keyed by conversation id
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Upsert a snapshot
    async fn save_conversation(&self, payload: &ConversationPayload) -> Result<()>;

    /// One page of history, already normalized
    async fn list_conversations(&self, paging: PageRequest) -> Result<ConversationPage>;

    async fn get_conversation(&self, id: &str) -> Result<ConversationSnapshot>;

    async fn delete_conversation(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Document uploads into an agent knowledge collection
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn upload_knowledge(&self, collection: &str, files: Vec<UploadFile>) -> Result<()>;
}
