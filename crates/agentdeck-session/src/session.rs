use agentdeck_client::{
    agent_event_stream, AgentDirectory, AgentRuntime, ConversationStore, KnowledgeBase,
    PageRequest, RunRequest, UploadFile,
};
use agentdeck_types::{AgentDefinition, AgentEvent, AgentSummary, Conversation, ConversationPage, Message};
use chrono::Utc;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::builder::ChatSessionBuilder;
use crate::cancel::CancelHandle;
use crate::error::{Result, SessionError};
use crate::persister::Persister;
use crate::updates::SessionUpdate;

/// System message appended when the user cancels a run
pub const CANCELLED_MESSAGE: &str = "Run cancelled by user.";

/// How a submitted run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The stream ended normally (possibly after in-stream error events)
    Completed,
    /// Cancelled by the user; the partial agent reply was discarded
    Cancelled,
    /// Transport failure; an error message replaced the agent reply
    Failed,
}

pub(crate) struct Collaborators {
    pub(crate) runtime: Arc<dyn AgentRuntime>,
    pub(crate) directory: Arc<dyn AgentDirectory>,
    pub(crate) store: Arc<dyn ConversationStore>,
    pub(crate) knowledge: Arc<dyn KnowledgeBase>,
}

struct ActiveRun {
    placeholder_ts: i64,
}

enum Step {
    Cancelled,
    Next(Option<anyhow::Result<AgentEvent>>),
}

/// A playground chat session against one agent runtime.
///
/// The session owns the message list. During a run only the placeholder
/// agent message created by that run receives chunks, and every transition
/// (sent, completed, errored, cancelled) queues a conversation save that
/// never blocks the run and never rolls back local state.
pub struct ChatSession {
    collaborators: Collaborators,
    persister: Persister,
    cancel: CancelHandle,
    subscribers: Vec<mpsc::UnboundedSender<SessionUpdate>>,
    agent: Option<String>,
    conversation: Option<Conversation>,
    active_run: Option<ActiveRun>,
    last_ts: i64,
}

impl ChatSession {
    pub fn builder() -> ChatSessionBuilder {
        ChatSessionBuilder::new()
    }

    pub(crate) fn new_with_parts(collaborators: Collaborators, agent: Option<String>) -> Self {
        let persister = Persister::spawn(Arc::clone(&collaborators.store));

        Self {
            collaborators,
            persister,
            cancel: CancelHandle::new(),
            subscribers: Vec::new(),
            agent,
            conversation: None,
            active_run: None,
            last_ts: 0,
        }
    }

    pub fn agent(&self) -> Option<&str> {
        self.agent.as_deref()
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation.as_ref().map(|c| c.id.as_str())
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation
            .as_ref()
            .map(|c| c.messages.as_slice())
            .unwrap_or(&[])
    }

    pub fn uploaded_files(&self) -> &[String] {
        self.conversation
            .as_ref()
            .map(|c| c.uploaded_files.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_running(&self) -> bool {
        self.active_run.is_some()
    }

    /// Handle for cancelling runs from another task (e.g. a Ctrl-C listener)
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Wait for every queued conversation save to be attempted
    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    // ------------------------------------------------------------------
    // Runs
    // ------------------------------------------------------------------

    /// Submit to the currently selected agent
    pub async fn send(&mut self, prompt: &str) -> Result<RunOutcome> {
        let agent = self.agent.clone().ok_or(SessionError::NoAgentSelected)?;
        self.submit(prompt, &agent).await
    }

    /// Run `agent_name` on `prompt` and stream the reply into the session.
    ///
    /// Precondition failures are returned as errors and change nothing.
    /// Everything that goes wrong after the user message is recorded ends up
    /// in the message list instead, and the outcome says how the run ended.
    pub async fn submit(&mut self, prompt: &str, agent_name: &str) -> Result<RunOutcome> {
        self.ensure_idle()?;
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        let agent_name = agent_name.trim();
        if agent_name.is_empty() {
            return Err(SessionError::NoAgentSelected);
        }

        self.agent = Some(agent_name.to_string());
        let conversation_id = self.ensure_conversation(agent_name);

        let user_ts = self.next_ts();
        self.push_message(Message::user(prompt, user_ts));
        self.persist();

        let placeholder_ts = self.next_ts();
        self.push_message(Message::agent_placeholder(placeholder_ts));

        let token = self.cancel.arm();
        self.active_run = Some(ActiveRun { placeholder_ts });

        tracing::info!(agent = %agent_name, conversation_id = %conversation_id, "Starting agent run");

        let request = RunRequest::new(agent_name, prompt, conversation_id);
        let outcome = self.drive(request, placeholder_ts, token).await;

        self.cancel.disarm();
        self.active_run = None;

        tracing::info!(?outcome, "Agent run finished");
        self.notify(SessionUpdate::RunFinished(outcome));

        Ok(outcome)
    }

    /// Cancel a run that was left in progress (its submit future was
    /// dropped). Returns false when nothing was running.
    ///
    /// While `submit` is being awaited, use [`CancelHandle::cancel`] instead.
    pub fn cancel(&mut self) -> bool {
        let Some(run) = self.active_run.take() else {
            return false;
        };

        self.cancel.cancel();
        self.cancel.disarm();
        self.apply_cancel(run.placeholder_ts);
        self.notify(SessionUpdate::RunFinished(RunOutcome::Cancelled));
        true
    }

    async fn drive(
        &mut self,
        request: RunRequest,
        placeholder_ts: i64,
        token: CancellationToken,
    ) -> RunOutcome {
        let runtime = Arc::clone(&self.collaborators.runtime);

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = runtime.run_stream(request) => Some(result),
        };

        let bytes = match opened {
            None => {
                self.apply_cancel(placeholder_ts);
                return RunOutcome::Cancelled;
            }
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                self.apply_transport_failure(placeholder_ts, &e);
                return RunOutcome::Failed;
            }
        };

        let mut events = agent_event_stream(bytes);

        loop {
            let step = tokio::select! {
                biased;
                _ = token.cancelled() => Step::Cancelled,
                item = events.next() => Step::Next(item),
            };

            match step {
                Step::Cancelled => {
                    // whatever the transport still buffers goes with the stream
                    drop(events);
                    self.apply_cancel(placeholder_ts);
                    return RunOutcome::Cancelled;
                }
                Step::Next(Some(Ok(event))) => self.apply_event(placeholder_ts, event),
                Step::Next(Some(Err(e))) => {
                    self.apply_transport_failure(placeholder_ts, &e);
                    return RunOutcome::Failed;
                }
                Step::Next(None) => {
                    self.finish_stream(placeholder_ts);
                    return RunOutcome::Completed;
                }
            }
        }
    }

    fn apply_event(&mut self, placeholder_ts: i64, event: AgentEvent) {
        match event {
            AgentEvent::Chunk { content } => {
                if content.is_empty() {
                    return;
                }
                let appended = self
                    .streaming_message_mut(placeholder_ts)
                    .map(|message| message.append(&content))
                    .unwrap_or(false);

                if appended {
                    self.notify(SessionUpdate::ChunkAppended {
                        ts: placeholder_ts,
                        content,
                    });
                } else {
                    tracing::debug!("Ignoring chunk for a finished agent message");
                }
            }
            AgentEvent::RunComplete => {
                if self.finish_placeholder(placeholder_ts) {
                    tracing::debug!("Agent message complete");
                }
                self.persist();
            }
            AgentEvent::Error { message } => {
                tracing::warn!("Agent reported an error: {}", message);
                let ts = self.next_ts();
                self.push_message(Message::system(format!("Error: {}", message), ts));
                self.persist();
            }
            AgentEvent::Other { kind } => {
                tracing::debug!(kind = %kind, "Ignoring event");
            }
        }
    }

    fn apply_cancel(&mut self, placeholder_ts: i64) {
        self.remove_placeholder(placeholder_ts);
        let ts = self.next_ts();
        self.push_message(Message::system(CANCELLED_MESSAGE, ts));
        self.persist();
        tracing::info!("Agent run cancelled by user");
    }

    fn apply_transport_failure(&mut self, placeholder_ts: i64, error: &anyhow::Error) {
        tracing::error!("Agent run failed: {:#}", error);
        self.remove_placeholder(placeholder_ts);
        let ts = self.next_ts();
        self.push_message(Message::system(format!("Error: {:#}", error), ts));
        self.persist();
    }

    fn finish_stream(&mut self, placeholder_ts: i64) {
        // no agent_run_complete: freeze what arrived so only one message
        // can ever be streaming
        if self.finish_placeholder(placeholder_ts) {
            tracing::warn!("Stream ended before the run completed");
            self.persist();
        }
    }

    // ------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------

    pub async fn list_agents(&self) -> Result<Vec<AgentSummary>> {
        self.collaborators
            .directory
            .list_agents()
            .await
            .map_err(SessionError::Directory)
    }

    /// Make `name` the target of [`ChatSession::send`]
    pub async fn select_agent(&mut self, name: &str) -> Result<AgentDefinition> {
        self.ensure_idle()?;

        let definition = self
            .collaborators
            .directory
            .get_agent(name)
            .await
            .map_err(|reason| SessionError::AgentNotFound {
                name: name.to_string(),
                reason,
            })?;

        self.agent = Some(definition.name.clone());
        Ok(definition)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// One page of saved conversations. A failing store yields an empty page.
    pub async fn open_history(&self, page: u32, page_size: u32) -> ConversationPage {
        let request = PageRequest::new(page, page_size);

        match self.collaborators.store.list_conversations(request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to list conversations: {:#}", e);
                ConversationPage::empty(request.page, request.page_size)
            }
        }
    }

    /// Replace the whole session state with a stored conversation
    pub async fn load_conversation(&mut self, id: &str) -> Result<()> {
        self.ensure_idle()?;

        let snapshot = self
            .collaborators
            .store
            .get_conversation(id)
            .await
            .map_err(SessionError::Store)?;

        let mut conversation = Conversation::from_snapshot(snapshot);
        if conversation.id.is_empty() {
            conversation.id = id.to_string();
        }

        self.last_ts = conversation
            .messages
            .iter()
            .map(|m| m.ts)
            .fold(self.last_ts, i64::max);
        self.agent = if conversation.agent_name.is_empty() {
            None
        } else {
            Some(conversation.agent_name.clone())
        };

        let conversation_id = conversation.id.clone();
        tracing::info!(
            conversation_id = %conversation_id,
            messages = conversation.messages.len(),
            "Conversation loaded"
        );
        self.conversation = Some(conversation);
        self.notify(SessionUpdate::ConversationLoaded { conversation_id });

        Ok(())
    }

    /// Start over with an empty conversation, keeping the selected agent
    pub fn new_conversation(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.clear_conversation();
        Ok(())
    }

    /// Delete a stored conversation. Returns whether the store confirmed.
    ///
    /// Deleting the active conversation resets the session first, whatever
    /// the store answers.
    pub async fn delete_conversation(&mut self, id: &str) -> Result<bool> {
        self.ensure_idle()?;

        if self.conversation_id() == Some(id) {
            self.clear_conversation();
        }

        match self.collaborators.store.delete_conversation(id).await {
            Ok(()) => {
                tracing::info!(conversation_id = %id, "Conversation deleted");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(conversation_id = %id, "Failed to delete conversation: {:#}", e);
                Ok(false)
            }
        }
    }

    // ------------------------------------------------------------------
    // Knowledge
    // ------------------------------------------------------------------

    /// Upload files into `collection` and record their names on the
    /// conversation. Returns the recorded names.
    pub async fn upload_files<P: AsRef<Path>>(
        &mut self,
        collection: &str,
        paths: &[P],
    ) -> Result<Vec<String>> {
        self.ensure_idle()?;
        let agent = self.agent.clone().ok_or(SessionError::NoAgentSelected)?;

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let bytes = tokio::fs::read(path).await.map_err(|source| SessionError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            files.push(UploadFile { name, bytes });
        }

        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        if names.is_empty() {
            return Ok(names);
        }

        self.collaborators
            .knowledge
            .upload_knowledge(collection, files)
            .await
            .map_err(SessionError::Upload)?;

        self.ensure_conversation(&agent);
        if let Some(conversation) = self.conversation.as_mut() {
            conversation.record_uploads(names.iter().cloned());
            conversation.touch();
        }
        self.persist();

        tracing::info!(collection = %collection, files = names.len(), "Knowledge uploaded");
        Ok(names)
    }

    // ------------------------------------------------------------------
    // State helpers
    // ------------------------------------------------------------------

    fn ensure_idle(&self) -> Result<()> {
        if self.active_run.is_some() {
            return Err(SessionError::RunInProgress);
        }
        Ok(())
    }

    /// Create the conversation on first use; returns its id
    fn ensure_conversation(&mut self, agent_name: &str) -> String {
        let conversation = match self.conversation.take() {
            Some(conversation) => conversation,
            // Session clock keeps ids unique even within one millisecond
            None => Conversation::new(format!("conv_{}", self.next_ts()), agent_name),
        };
        let conversation = self.conversation.insert(conversation);
        conversation.agent_name = agent_name.to_string();
        conversation.id.clone()
    }

    fn clear_conversation(&mut self) {
        self.conversation = None;
        self.notify(SessionUpdate::ConversationCleared);
    }

    /// Strictly increasing epoch milliseconds, so the placeholder key never
    /// collides with a message created in the same millisecond
    fn next_ts(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_ts = now.max(self.last_ts + 1);
        self.last_ts
    }

    fn push_message(&mut self, message: Message) {
        let Some(conversation) = self.conversation.as_mut() else {
            tracing::debug!("No conversation to append to");
            return;
        };
        conversation.messages.push(message.clone());
        conversation.touch();
        self.notify(SessionUpdate::MessageAppended(message));
    }

    fn streaming_message_mut(&mut self, ts: i64) -> Option<&mut Message> {
        self.conversation
            .as_mut()?
            .messages
            .iter_mut()
            .find(|m| m.ts == ts && m.streaming)
    }

    fn finish_placeholder(&mut self, ts: i64) -> bool {
        let finished = self
            .streaming_message_mut(ts)
            .map(|message| message.finish())
            .is_some();

        if finished {
            self.notify(SessionUpdate::MessageFinished { ts });
        }
        finished
    }

    /// Drop the placeholder if it is still streaming
    fn remove_placeholder(&mut self, ts: i64) {
        let Some(conversation) = self.conversation.as_mut() else {
            return;
        };
        let before = conversation.messages.len();
        conversation.messages.retain(|m| !(m.ts == ts && m.streaming));

        if conversation.messages.len() != before {
            self.notify(SessionUpdate::MessageRemoved { ts });
        }
    }

    fn persist(&self) {
        match &self.conversation {
            Some(conversation) => self.persister.save(conversation.to_payload()),
            None => tracing::debug!("Nothing to persist yet"),
        }
    }

    fn notify(&mut self, update: SessionUpdate) {
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }
}
