/// Reassembles `data:` payloads from a server-sent event byte stream whose
/// chunks may split lines (and multi-byte characters) anywhere.
#[derive(Debug, Default)]
pub struct DataLines {
    buffer: Vec<u8>,
}

impl DataLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns the complete `data:` payloads, `[DONE]`
    /// markers excluded.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();

            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }
            payloads.push(data.to_string());
        }
        payloads
    }
}
