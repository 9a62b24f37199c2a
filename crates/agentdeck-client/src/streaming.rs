use agentdeck_types::AgentEvent;
use anyhow::Result;
use futures::Stream;
use std::pin::Pin;

use crate::buffer_utils::{parse_sse_stream, AgentEventParser};
use crate::traits::ByteStream;

/// Typed events of one agent run, in arrival order
pub type EventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent>> + Send>>;

/// Parse a run body into agent events
pub fn agent_event_stream(bytes: ByteStream) -> EventStream {
    parse_sse_stream(bytes, AgentEventParser)
}
