#![allow(dead_code)]

use agentdeck_client::{
    AgentDirectory, AgentRuntime, ByteStream, ConversationStore, KnowledgeBase, PageRequest,
    RunRequest, UploadFile,
};
use agentdeck_session::{CancelHandle, ChatSession};
use agentdeck_types::{
    AgentDefinition, AgentSummary, ConversationPage, ConversationPayload, ConversationSnapshot,
    ConversationSummary, Pagination,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::Poll;

pub fn chunk(text: &str) -> String {
    format!(
        "data: {{\"type\":\"agent_chunk\",\"payload\":{{\"content\":{}}}}}\n",
        serde_json::to_string(text).unwrap()
    )
}

pub fn complete() -> String {
    "data: {\"type\":\"agent_run_complete\"}\n".to_string()
}

pub fn error_event(message: &str) -> String {
    format!(
        "data: {{\"type\":\"error\",\"error\":{}}}\n",
        serde_json::to_string(message).unwrap()
    )
}

/// One transport read per argument
pub fn reads(parts: &[String]) -> Vec<Vec<u8>> {
    parts.iter().map(|p| p.as_bytes().to_vec()).collect()
}

/// What the fake runtime does for one run
pub enum Script {
    /// Deliver the reads, then end the body
    Body(Vec<Vec<u8>>),
    /// Deliver the reads, then fail the body
    FailAfter(Vec<Vec<u8>>, String),
    /// Refuse the request before any byte is sent
    Refuse(String),
    /// Fire the session's cancel handle when the request arrives, then
    /// deliver the reads (which must be ignored) and stall
    CancelOnOpen(Vec<Vec<u8>>),
    /// Deliver the reads, fire the cancel handle, then stall
    CancelAfter(Vec<Vec<u8>>),
    /// Deliver the reads, then stall forever
    Hang(Vec<Vec<u8>>),
}

#[derive(Default)]
pub struct ScriptedRuntime {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<RunRequest>>,
    cancel: Mutex<Option<CancelHandle>>,
}

impl ScriptedRuntime {
    pub fn push(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn attach(&self, handle: CancelHandle) {
        *self.cancel.lock().unwrap() = Some(handle);
    }

    pub fn requests(&self) -> Vec<RunRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn handle(&self) -> CancelHandle {
        self.cancel
            .lock()
            .unwrap()
            .clone()
            .expect("cancel handle attached")
    }
}

fn stalled(reads: Vec<Vec<u8>>, cancel: Option<CancelHandle>) -> ByteStream {
    let mut reads = reads.into_iter();
    let mut fired = false;

    Box::pin(futures::stream::poll_fn(move |_cx| {
        if let Some(read) = reads.next() {
            return Poll::Ready(Some(Ok(read)));
        }
        if !fired {
            fired = true;
            if let Some(handle) = &cancel {
                handle.cancel();
            }
        }
        Poll::Pending
    }))
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn run_stream(&self, request: RunRequest) -> Result<ByteStream> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("a script for every run");

        match script {
            Script::Body(reads) => {
                let items: Vec<Result<Vec<u8>>> = reads.into_iter().map(Ok).collect();
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Script::FailAfter(reads, error) => {
                let mut items: Vec<Result<Vec<u8>>> = reads.into_iter().map(Ok).collect();
                items.push(Err(anyhow!(error)));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Script::Refuse(error) => Err(anyhow!(error)),
            Script::CancelOnOpen(reads) => {
                self.handle().cancel();
                Ok(stalled(reads, None))
            }
            Script::CancelAfter(reads) => Ok(stalled(reads, Some(self.handle()))),
            Script::Hang(reads) => Ok(stalled(reads, None)),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    saves: Mutex<Vec<ConversationPayload>>,
    stored: Mutex<HashMap<String, ConversationSnapshot>>,
    deleted: Mutex<Vec<String>>,
    fail_saves: Mutex<bool>,
    fail_reads: Mutex<bool>,
}

impl MemoryStore {
    pub fn saves(&self) -> Vec<ConversationPayload> {
        self.saves.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn insert(&self, snapshot: ConversationSnapshot) {
        self.stored
            .lock()
            .unwrap()
            .insert(snapshot.conversation_id.clone(), snapshot);
    }

    pub fn fail_saves(&self) {
        *self.fail_saves.lock().unwrap() = true;
    }

    pub fn fail_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }

    fn reads_fail(&self) -> bool {
        *self.fail_reads.lock().unwrap()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn save_conversation(&self, payload: &ConversationPayload) -> Result<()> {
        if *self.fail_saves.lock().unwrap() {
            return Err(anyhow!("store offline"));
        }
        self.saves.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn list_conversations(&self, paging: PageRequest) -> Result<ConversationPage> {
        if self.reads_fail() {
            return Err(anyhow!("store offline"));
        }
        let stored = self.stored.lock().unwrap();
        let items: Vec<ConversationSummary> = stored
            .values()
            .map(|s| ConversationSummary {
                conversation_id: s.conversation_id.clone(),
                agent_name: s.agent_name.clone(),
                title: s.title.clone(),
                updated_at: s.updated_at,
                message_count: Some(s.messages.len()),
            })
            .collect();
        let total = items.len() as u64;

        Ok(ConversationPage {
            items,
            pagination: Pagination {
                page: paging.page,
                page_size: paging.page_size,
                total,
                total_pages: 1,
            },
        })
    }

    async fn get_conversation(&self, id: &str) -> Result<ConversationSnapshot> {
        if self.reads_fail() {
            return Err(anyhow!("store offline"));
        }
        self.stored
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("conversation {} not found", id))
    }

    async fn delete_conversation(&self, id: &str) -> Result<()> {
        if self.reads_fail() {
            return Err(anyhow!("store offline"));
        }
        self.stored.lock().unwrap().remove(id);
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    agents: Mutex<Vec<AgentDefinition>>,
}

impl FakeDirectory {
    pub fn add(&self, name: &str, description: &str) {
        let definition: AgentDefinition = serde_json::from_value(serde_json::json!({
            "name": name,
            "description": description,
            "instructions": "Be helpful.",
        }))
        .unwrap();
        self.agents.lock().unwrap().push(definition);
    }
}

#[async_trait]
impl AgentDirectory for FakeDirectory {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>> {
        Ok(self.agents.lock().unwrap().iter().map(|a| a.summary()).collect())
    }

    async fn get_agent(&self, name: &str) -> Result<AgentDefinition> {
        self.agents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found"))
    }
}

#[derive(Default)]
pub struct FakeKnowledge {
    uploads: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeKnowledge {
    pub fn uploads(&self) -> Vec<(String, Vec<String>)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeBase for FakeKnowledge {
    async fn upload_knowledge(&self, collection: &str, files: Vec<UploadFile>) -> Result<()> {
        let names = files.into_iter().map(|f| f.name).collect();
        self.uploads
            .lock()
            .unwrap()
            .push((collection.to_string(), names));
        Ok(())
    }
}

pub struct Harness {
    pub runtime: Arc<ScriptedRuntime>,
    pub store: Arc<MemoryStore>,
    pub directory: Arc<FakeDirectory>,
    pub knowledge: Arc<FakeKnowledge>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            runtime: Arc::new(ScriptedRuntime::default()),
            store: Arc::new(MemoryStore::default()),
            directory: Arc::new(FakeDirectory::default()),
            knowledge: Arc::new(FakeKnowledge::default()),
        }
    }

    pub fn session(&self) -> ChatSession {
        let session = ChatSession::builder()
            .runtime(self.runtime.clone())
            .directory(self.directory.clone())
            .store(self.store.clone())
            .knowledge(self.knowledge.clone())
            .build()
            .unwrap();
        self.runtime.attach(session.cancel_handle());
        session
    }
}
