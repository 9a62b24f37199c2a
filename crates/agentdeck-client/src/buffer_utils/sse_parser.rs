use agentdeck_types::{decode_event, AgentEvent};
use anyhow::Result;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use super::buffering::LineBuffer;
use crate::traits::ByteStream;

/// Strategy for turning the payload of a `data:` field into an event
pub trait SseLineParser: Send {
    type Event: Send;

    /// Parse the text after `data:`
    fn parse_data_line(&self, data: &str) -> Result<Self::Event>;
}

/// Parses agent runtime frames (`agent_chunk`, `agent_run_complete`, `error`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentEventParser;

impl SseLineParser for AgentEventParser {
    type Event = AgentEvent;

    fn parse_data_line(&self, data: &str) -> Result<AgentEvent> {
        Ok(decode_event(data)?)
    }
}

/// Value of a `data:` field, with the single optional leading space removed.
/// None for blank lines, comments and other SSE fields.
pub fn data_field(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Generic SSE stream parser over a raw byte stream.
///
/// Only complete lines are parsed. Lines that fail to decode or parse are
/// logged and skipped; the stream yields `Err` only when the transport fails,
/// and ends right after that.
pub fn parse_sse_stream<P>(
    bytes: ByteStream,
    parser: P,
) -> Pin<Box<dyn Stream<Item = Result<P::Event>> + Send>>
where
    P: SseLineParser + 'static,
    P::Event: 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = bytes;
        let mut buffer = LineBuffer::with_capacity(4096);

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend(&chunk);

                    while let Some(line_result) = buffer.next_line() {
                        let line = match line_result {
                            Ok(line) => line,
                            Err(e) => {
                                tracing::warn!("Skipping undecodable stream line: {}", e);
                                continue;
                            }
                        };

                        let data = match data_field(&line) {
                            Some(data) => data.trim(),
                            None => continue,
                        };
                        if data.is_empty() {
                            continue;
                        }

                        match parser.parse_data_line(data) {
                            Ok(event) => yield Ok(event),
                            Err(e) => {
                                tracing::warn!(line = %data, "Skipping malformed event line: {}", e);
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }

        if !buffer.is_empty() {
            let tail = buffer.take_remainder();
            tracing::debug!(bytes = tail.len(), "Dropping unterminated trailing line");
        }
    })
}
