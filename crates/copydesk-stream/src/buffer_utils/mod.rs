mod buffering;
mod sse_parser;

pub use buffering::FrameBuffer;
pub use sse_parser::{
    decode_event_stream, decode_sse_stream, frame_data, EventStream, GenerationEventParser,
    SseFrameParser,
};
