use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::pin::Pin;

use copydesk_types::GenerationEvent;

use super::buffering::FrameBuffer;
use crate::error::StreamError;

pub type EventStream<E> = Pin<Box<dyn Stream<Item = Result<E, StreamError>> + Send>>;

/// Strategy for turning the `data:` payload of one frame into an event
pub trait SseFrameParser: Send {
    type Event: Send + 'static;

    fn parse_data(&self, data: &str) -> Result<Self::Event, serde_json::Error>;

    /// Whether this event ends the stream
    fn is_terminal(&self, _event: &Self::Event) -> bool {
        false
    }
}

/// Parser for the generation protocol: one JSON `GenerationEvent` per frame
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationEventParser;

impl SseFrameParser for GenerationEventParser {
    type Event = GenerationEvent;

    fn parse_data(&self, data: &str) -> Result<GenerationEvent, serde_json::Error> {
        serde_json::from_str(data)
    }

    fn is_terminal(&self, event: &GenerationEvent) -> bool {
        event.is_terminal()
    }
}

/// Payload of a frame: its `data:` lines joined by `\n`.
/// Returns `None` for frames carrying no data (comments, keep-alives).
pub fn frame_data(frame: &str) -> Option<String> {
    let mut data: Option<String> = None;

    for line in frame.lines() {
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);

        match data.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }

    data
}

/// Generic SSE decoder over a byte stream.
///
/// Events come out in arrival order. Frames that are not valid UTF-8 or
/// whose payload does not parse are dropped and the stream continues.
/// Decoding stops after the first terminal event; a transport error is
/// yielded once and ends the stream.
pub fn decode_sse_stream<S, B, E, P>(bytes: S, parser: P) -> EventStream<P::Event>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    P: SseFrameParser + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut buffer = FrameBuffer::with_capacity(8192);
        let mut closed = false;

        'read: loop {
            let frame_result = match buffer.next_frame() {
                Some(frame) => frame,
                None if closed => match buffer.finish() {
                    Some(frame) => frame,
                    None => break 'read,
                },
                None => {
                    match byte_chunks.next().await {
                        Some(Ok(bytes)) => buffer.extend(bytes.as_ref()),
                        Some(Err(e)) => {
                            yield Err(StreamError::Unknown(format!("Stream error: {}", e)));
                            break 'read;
                        }
                        None => closed = true,
                    }
                    continue 'read;
                }
            };

            let frame = match frame_result {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping frame with invalid UTF-8");
                    continue 'read;
                }
            };

            let Some(data) = frame_data(&frame) else {
                continue 'read;
            };

            match parser.parse_data(&data) {
                Ok(event) => {
                    let terminal = parser.is_terminal(&event);
                    yield Ok(event);
                    if terminal {
                        break 'read;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, data = %data, "Skipping malformed frame");
                }
            }
        }
    })
}

/// Decode a generation event stream from raw response bytes
pub fn decode_event_stream<S, B, E>(bytes: S) -> EventStream<GenerationEvent>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    decode_sse_stream(bytes, GenerationEventParser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<&'static [u8], String>> {
        stream::iter(parts.iter().map(|&p| Ok(p.as_bytes())).collect::<Vec<_>>())
    }

    async fn collect(parts: &[&'static str]) -> Vec<GenerationEvent> {
        decode_event_stream(chunks(parts))
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[test]
    fn test_frame_data() {
        assert_eq!(frame_data("data: {}").as_deref(), Some("{}"));
        assert_eq!(frame_data("data:{}").as_deref(), Some("{}"));
        assert_eq!(frame_data("event: x\ndata: a\ndata: b").as_deref(), Some("a\nb"));
        assert_eq!(frame_data(": keep-alive"), None);
    }

    #[tokio::test]
    async fn test_frames_spanning_chunks() {
        let events = collect(&[
            "data: {\"type\":\"chu",
            "nk\",\"content\":\"Hel\"}\n\ndata: {\"type\":\"chunk\",",
            "\"content\":\"lo\"}\n",
            "\n",
        ])
        .await;

        assert_eq!(
            events,
            vec![GenerationEvent::chunk("Hel"), GenerationEvent::chunk("lo")]
        );
    }

    #[tokio::test]
    async fn test_several_frames_in_one_chunk() {
        let events = collect(&[
            "data: {\"type\":\"status\",\"status\":\"thinking\"}\n\ndata: {\"type\":\"chunk\",\"content\":\"x\"}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_skipped() {
        let events = collect(&[
            "data: {\"type\":\"chunk\",\"content\":\"a\"}\n\n",
            "data: {not json\n\n",
            "data: {\"type\":\"chunk\",\"content\":\"b\"}\n\n",
        ])
        .await;

        assert_eq!(
            events,
            vec![GenerationEvent::chunk("a"), GenerationEvent::chunk("b")]
        );
    }

    #[tokio::test]
    async fn test_nothing_after_terminal_event() {
        let events = collect(&[
            "data: {\"type\":\"error\",\"error\":\"boom\"}\n\n",
            "data: {\"type\":\"chunk\",\"content\":\"late\"}\n\n",
        ])
        .await;

        assert_eq!(events, vec![GenerationEvent::error("boom")]);
    }

    #[tokio::test]
    async fn test_unterminated_last_frame_is_flushed() {
        let events = collect(&["data: {\"type\":\"done\",\"ok\":true}"]).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_terminal());
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let bytes = stream::iter(vec![
            Ok::<&'static [u8], String>(&b"data: {\"type\":\"chunk\",\"content\":\"a\"}\n\n"[..]),
            Err("connection reset".to_string()),
            Ok(&b"data: {\"type\":\"chunk\",\"content\":\"b\"}\n\n"[..]),
        ]);

        let results: Vec<_> = decode_event_stream(bytes).collect().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(StreamError::Unknown(_))));
    }
}
