//! Server-sent event frame decoding for the streaming messages API.

use serde::Deserialize;

/// One decoded event frame: the `event:` name and the joined `data:`
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFrame {
    pub event: String,
    pub data: String,
}

/// Incremental SSE decoder. Bytes are fed in as they arrive; complete
/// frames (terminated by a blank line) are drained out.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the response body and collect any completed frames.
    pub fn feed(&mut self, chunk: &str) -> Vec<EventFrame> {
        self.buffer.push_str(chunk);
        let mut frames = Vec::new();

        while let Some(boundary) = self.buffer.find("\n\n") {
            let raw: String = self.buffer.drain(..boundary + 2).collect();
            if let Some(frame) = parse_frame(&raw) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_frame(raw: &str) -> Option<EventFrame> {
    let mut event = String::new();
    let mut data_lines = Vec::new();
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim_start());
        }
    }
    if event.is_empty() && data_lines.is_empty() {
        return None;
    }
    Some(EventFrame {
        event,
        data: data_lines.join("\n"),
    })
}

/// The subset of streaming message event payloads the client acts on.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: Delta },
    #[serde(rename = "message_stop")]
    MessageStop,
    #[serde(rename = "error")]
    Error { error: ApiErrorBody },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Delta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_split_on_blank_lines_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder
            .feed("event: content_block_delta\ndata: {\"a\"")
            .is_empty());
        let frames = decoder.feed(":1}\n\nevent: message_stop\ndata: {}\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, "content_block_delta");
        assert_eq!(frames[0].data, "{\"a\":1}");
        assert_eq!(frames[1].event, "message_stop");
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed("data: first\ndata: second\n\n");
        assert_eq!(frames[0].data, "first\nsecond");
    }

    #[test]
    fn stream_event_decoding() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#,
        )
        .unwrap();
        match event {
            StreamEvent::ContentBlockDelta {
                delta: Delta::TextDelta { text },
            } => assert_eq!(text, "Hi"),
            other => panic!("unexpected event: {other:?}"),
        }

        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"message_start","message":{}}"#).unwrap();
        assert!(matches!(event, StreamEvent::Other));
    }
}
