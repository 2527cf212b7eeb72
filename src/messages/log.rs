/// Ordered sequence of message payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    entries: Vec<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, content: String) {
        self.entries.push(content);
    }

    /// Returns a copy of the current content, in insertion order.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.clone()
    }

    /// Replaces the whole content (snapshot-on-join).
    pub fn replace(&mut self, entries: Vec<String>) {
        self.entries = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
