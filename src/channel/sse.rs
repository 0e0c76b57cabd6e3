use futures::StreamExt;
use reqwest::header::ACCEPT;
use tokio::sync::mpsc;

use async_trait::async_trait;

use super::transport::{ChannelError, RealtimeTransport, TransportSignal};
use super::RealtimeEvent;

/// Event name assumed when the server omits the `event:` field.
const DEFAULT_EVENT_NAME: &str = "notification";

/// Server-Sent Events transport against a fixed origin.
pub struct SseTransport {
    url: String,
    client: reqwest::Client,
}

impl SseTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            // No request timeout: the stream is held open indefinitely.
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RealtimeTransport for SseTransport {
    async fn open(&self) -> Result<mpsc::UnboundedReceiver<TransportSignal>, ChannelError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ChannelError::Http { status, message });
        }

        tracing::info!("connected to event stream at {}", self.url);

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(TransportSignal::Connected);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        // Events are separated by a blank line.
                        while let Some(boundary) = buffer.find("\n\n") {
                            let block = buffer[..boundary].to_string();
                            buffer.drain(..boundary + 2);
                            if let Some(signal) = parse_sse_block(&block) {
                                if tx.send(signal).is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(TransportSignal::ConnectError(format!(
                            "stream error: {e}"
                        )));
                        break;
                    }
                }
            }

            let _ = tx.send(TransportSignal::Disconnected);
        });

        Ok(rx)
    }
}

/// Parse one SSE event block into a transport signal.
///
/// Multi-line `data:` fields are joined with newlines before JSON parsing, and
/// payloads that do not decode as a realtime event are dropped with a warning.
fn parse_sse_block(block: &str) -> Option<TransportSignal> {
    let mut name = DEFAULT_EVENT_NAME.to_string();
    let mut data = String::new();

    for raw_line in block.lines() {
        let line = raw_line.trim_end();
        if let Some(rest) = line.strip_prefix("event:") {
            name = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            let chunk = rest.trim();
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(chunk);
        }
    }

    if data.is_empty() {
        return None;
    }

    match serde_json::from_str::<RealtimeEvent>(&data) {
        Ok(event) => Some(TransportSignal::Event { name, event }),
        Err(e) => {
            tracing::warn!("dropping unparseable realtime payload: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::channel::Severity;

    use super::*;

    #[test]
    fn parses_named_event_with_json_data() {
        let block = "event: notification\ndata: {\"type\":\"success\",\"message\":\"Order shipped\"}";
        match parse_sse_block(block) {
            Some(TransportSignal::Event { name, event }) => {
                assert_eq!(name, "notification");
                assert_eq!(event.severity, Severity::Success);
                assert_eq!(event.message, "Order shipped");
            }
            other => panic!("expected event signal, got {other:?}"),
        }
    }

    #[test]
    fn event_name_defaults_when_omitted() {
        let block = "data: {\"message\":\"hello\"}";
        match parse_sse_block(block) {
            Some(TransportSignal::Event { name, .. }) => assert_eq!(name, "notification"),
            other => panic!("expected event signal, got {other:?}"),
        }
    }

    #[test]
    fn joins_multi_line_data() {
        let block = "data: {\"message\":\ndata: \"split\"}";
        assert!(parse_sse_block(block).is_some());
    }

    #[test]
    fn empty_block_yields_nothing() {
        assert!(parse_sse_block("event: ping").is_none());
        assert!(parse_sse_block("").is_none());
    }

    #[test]
    fn garbage_data_is_dropped() {
        assert!(parse_sse_block("data: not json").is_none());
    }
}
