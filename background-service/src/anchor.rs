use std::collections::HashMap;

/// Last-seen result fullname per search term.
///
/// Lives only in memory and is owned by the poll cycle, so it needs no
/// synchronisation. Entries are never removed.
#[derive(Debug, Default, Clone)]
pub struct AnchorTracker {
    anchors: HashMap<String, String>,
}

impl AnchorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.anchors.get(term).map(String::as_str)
    }

    pub fn set(&mut self, term: &str, id: &str) {
        self.anchors.insert(term.to_string(), id.to_string());
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
