pub mod buffer_utils;
pub mod client;
pub mod config;
pub mod error;

pub use buffer_utils::{decode_event_stream, decode_sse_stream, EventStream, FrameBuffer, SseFrameParser};
pub use client::{EventSink, GenerationClient, GenerationClientBuilder, GenerationTransport};
pub use config::StreamConfig;
pub use error::{Result, StreamError};

pub use tokio_util::sync::CancellationToken;
