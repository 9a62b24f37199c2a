pub mod agent;
pub mod conversation;
pub mod events;
pub mod message;

pub use agent::{AgentDefinition, AgentSummary};
pub use conversation::{
    derive_title, Conversation, ConversationPage, ConversationPayload, ConversationSnapshot,
    ConversationSummary, Pagination,
};
pub use events::{decode_event, AgentEvent, EventDecodeError};
pub use message::{Message, Role};
