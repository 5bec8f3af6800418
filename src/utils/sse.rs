//! Line framing for server-sent event bodies.

use memchr::memchr;

/// Accumulates body chunks and yields complete, trimmed, non-empty lines.
/// Chunks may split lines (and UTF-8 sequences) anywhere.
#[derive(Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        self.drain_lines(false)
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<String> {
        self.drain_lines(true)
    }

    fn drain_lines(&mut self, flush: bool) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(relative) = memchr(b'\n', &self.buffer[start..]) {
            let newline = start + relative;
            push_line(&self.buffer[start..newline], &mut lines);
            start = newline + 1;
        }

        if flush {
            push_line(&self.buffer[start..], &mut lines);
            self.buffer.clear();
        } else if start > 0 {
            self.buffer.drain(..start);
        }

        lines
    }
}

fn push_line(bytes: &[u8], lines: &mut Vec<String>) {
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
        Err(err) => tracing::warn!("dropping non UTF-8 stream line: {err}"),
    }
}

/// Payload of a `data:` line; `event:`, `id:` and comment lines yield `None`.
pub fn sse_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_split_across_chunks_are_joined() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"event: response.output_text.delta\nda").len() == 1);
        let lines = buffer.push(b"ta: {\"delta\":\"Hi\"}\r\n\r\n");
        assert_eq!(lines, vec!["data: {\"delta\":\"Hi\"}".to_string()]);
        assert!(buffer.finish().is_empty());
    }

    #[test]
    fn multibyte_characters_survive_chunk_boundaries() {
        let mut buffer = SseLineBuffer::default();
        let line = "data: caf\u{e9}\n".as_bytes();
        let (head, tail) = line.split_at(10);
        assert!(buffer.push(head).is_empty());
        assert_eq!(buffer.push(tail), vec!["data: caf\u{e9}".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: [DONE]").is_empty());
        assert_eq!(buffer.finish(), vec!["data: [DONE]".to_string()]);
    }

    #[test]
    fn data_payload_accepts_both_spacings() {
        assert_eq!(sse_data_payload("data: {}"), Some("{}"));
        assert_eq!(sse_data_payload("data:{}"), Some("{}"));
        assert_eq!(sse_data_payload("event: response.completed"), None);
    }
}
