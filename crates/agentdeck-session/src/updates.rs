use agentdeck_types::Message;

use crate::session::RunOutcome;

/// Incremental change notifications for a host UI
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    MessageAppended(Message),
    ChunkAppended { ts: i64, content: String },
    MessageFinished { ts: i64 },
    MessageRemoved { ts: i64 },
    RunFinished(RunOutcome),
    ConversationLoaded { conversation_id: String },
    ConversationCleared,
}
