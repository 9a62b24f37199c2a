mod buffering;
mod sse_parser;

pub use buffering::LineBuffer;
pub use sse_parser::{data_field, parse_sse_stream, AgentEventParser, SseLineParser};
