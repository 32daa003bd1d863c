use futures::stream::{BoxStream, Stream};
use futures_util::StreamExt;
use nk_core::{Error, Result};

/// Incremental decoder for `text/event-stream` bodies.
///
/// Bytes may arrive split anywhere, including in the middle of a line or of
/// a UTF-8 sequence, so lines are only decoded once their newline has been
/// seen.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect the `data:` payloads it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&String::from_utf8_lossy(&line)) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line the server did not terminate.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&String::from_utf8_lossy(&rest))
    }
}

fn data_payload(line: &str) -> Option<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.is_empty() || data == "[DONE]" {
        None
    } else {
        Some(data.to_string())
    }
}

/// Turn a byte stream into a stream of `data:` payloads.
pub fn data_events<S, B, E>(body: S) -> BoxStream<'static, Result<String>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    let stream = async_stream::try_stream! {
        let mut decoder = SseDecoder::new();
        futures_util::pin_mut!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| -> Error { e.into() })?;
            for payload in decoder.push(chunk.as_ref()) {
                yield payload;
            }
        }
        if let Some(payload) = decoder.finish() {
            yield payload;
        }
    };
    stream.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        assert_eq!(decoder.push(b"1}\r\n\r\ndata: two\n"), vec!["{\"a\":1}", "two"]);
        assert!(decoder.push(b": keep-alive\nevent: ping\n").is_empty());
        assert!(decoder.push(b"data: [DONE]\n").is_empty());
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_decoder_keeps_split_characters() {
        let bytes = "data: café\n".as_bytes();
        let split = bytes.len() - 2;
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec!["café"]);

        let bytes = "data: ☀️ sunny".as_bytes();
        assert!(decoder.push(&bytes[..8]).is_empty());
        assert!(decoder.push(&bytes[8..]).is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("☀️ sunny"));
    }

    #[test]
    fn test_decoder_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data:last").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("last"));
    }

    #[tokio::test]
    async fn test_data_events() {
        let body = stream::iter(vec![
            Ok::<_, Error>(b"data: one\n\nda".to_vec()),
            Ok(b"ta: two\n\n".to_vec()),
        ]);
        let events: Vec<String> = data_events(body)
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(events, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_data_events_stops_at_transport_error() {
        let body = stream::iter(vec![
            Ok(b"data: one\n".to_vec()),
            Err(Error::Inference("connection reset".to_string())),
            Ok(b"data: never\n".to_vec()),
        ]);
        let events: Vec<Result<String>> = data_events(body).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_err());
    }
}
