use tracing::debug;

use crate::client::StreamEvent;

const DATA_PREFIX: &str = "data: ";

/// Splits a server-sent-event byte stream into [`StreamEvent`]s.
///
/// Chunks may end mid-line (or mid UTF-8 sequence); the tail is kept until the
/// next newline arrives. Lines without the `data: ` prefix and payloads that
/// are not valid JSON events are dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            events.extend(parse_line(&line));
        }
        events
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(line: &[u8]) -> Option<StreamEvent> {
    let text = String::from_utf8_lossy(line);
    let payload = text
        .trim_end_matches(&['\r', '\n'][..])
        .strip_prefix(DATA_PREFIX)?;

    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("Skipping malformed event: {} ({})", payload, e);
            None
        }
    }
}
