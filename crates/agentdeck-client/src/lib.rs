pub mod buffer_utils;
pub mod config;
pub mod http;
pub mod listing;
pub mod streaming;
pub mod traits;

pub use traits::{
    AgentDirectory,
    AgentRuntime,
    ByteStream,
    ConversationStore,
    KnowledgeBase,
    PageRequest,
    RunRequest,
    UploadFile,
};

pub use buffer_utils::{parse_sse_stream, AgentEventParser, LineBuffer, SseLineParser};
pub use config::ClientConfig;
pub use http::HttpClient;
pub use listing::{AgentListResponse, ConversationListResponse};
pub use streaming::{agent_event_stream, EventStream};
