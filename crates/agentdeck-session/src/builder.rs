use agentdeck_client::{AgentDirectory, AgentRuntime, ConversationStore, KnowledgeBase};
use std::sync::Arc;

use crate::error::{Result, SessionError};
use crate::session::{ChatSession, Collaborators};

pub struct ChatSessionBuilder {
    runtime: Option<Arc<dyn AgentRuntime>>,
    directory: Option<Arc<dyn AgentDirectory>>,
    store: Option<Arc<dyn ConversationStore>>,
    knowledge: Option<Arc<dyn KnowledgeBase>>,
    agent: Option<String>,
}

impl ChatSessionBuilder {
    pub fn new() -> Self {
        Self {
            runtime: None,
            directory: None,
            store: None,
            knowledge: None,
            agent: None,
        }
    }

    /// Use one client (typically `HttpClient`) for every collaborator
    pub fn client<C>(self, client: Arc<C>) -> Self
    where
        C: AgentRuntime + AgentDirectory + ConversationStore + KnowledgeBase + 'static,
    {
        self.runtime(client.clone())
            .directory(client.clone())
            .store(client.clone())
            .knowledge(client)
    }

    pub fn runtime(mut self, runtime: Arc<dyn AgentRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn AgentDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn knowledge(mut self, knowledge: Arc<dyn KnowledgeBase>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Agent preselected for the first submit
    pub fn agent(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.agent = if name.trim().is_empty() { None } else { Some(name) };
        self
    }

    /// Build the session. Spawns the persistence worker, so this must run
    /// inside a tokio runtime.
    pub fn build(self) -> Result<ChatSession> {
        let collaborators = Collaborators {
            runtime: self.runtime.ok_or(SessionError::MissingCollaborator("runtime"))?,
            directory: self.directory.ok_or(SessionError::MissingCollaborator("directory"))?,
            store: self.store.ok_or(SessionError::MissingCollaborator("store"))?,
            knowledge: self.knowledge.ok_or(SessionError::MissingCollaborator("knowledge"))?,
        };

        Ok(ChatSession::new_with_parts(collaborators, self.agent))
    }
}

impl Default for ChatSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
