//! Committed-line history with copy-out recall.

/// Result of a forward recall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardRecall {
    /// A copy of the next stored entry.
    Entry(Vec<char>),
    /// Browsing moved past the newest entry: start a fresh, empty line.
    Fresh,
}

/// Append-only store of committed buffers plus a browse position.
///
/// Entries are copied in and copied out; callers never hold a reference into the
/// store, so editing a recalled buffer cannot alter history.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Vec<char>>,
    browse: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &[char]> {
        self.entries.iter().map(Vec::as_slice)
    }

    /// Current browse position; equals `len()` when not browsing.
    pub fn browse_position(&self) -> usize {
        self.browse
    }

    /// Park the browse position one past the newest entry.
    pub fn reset_browse(&mut self) {
        self.browse = self.entries.len();
    }

    /// Append a copy of `buffer` unless an identical entry exists anywhere in the store.
    pub fn record_if_new(&mut self, buffer: &[char]) -> bool {
        if self.entries.iter().any(|entry| entry.as_slice() == buffer) {
            return false;
        }
        self.entries.push(buffer.to_vec());
        true
    }

    /// Step back one entry. `None` when already at the oldest entry or the store is empty.
    pub fn recall_backward(&mut self) -> Option<Vec<char>> {
        if self.browse == 0 {
            return None;
        }
        self.browse = self.browse.min(self.entries.len()) - 1;
        self.entries.get(self.browse).cloned()
    }

    /// Step forward one entry, or park past the end and hand back a fresh line.
    pub fn recall_forward(&mut self) -> ForwardRecall {
        if self.browse + 1 < self.entries.len() {
            self.browse += 1;
            return ForwardRecall::Entry(self.entries[self.browse].clone());
        }
        self.browse = self.entries.len();
        ForwardRecall::Fresh
    }
}

#[cfg(test)]
mod tests {
    use super::{ForwardRecall, History};

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn duplicates_anywhere_are_rejected() {
        let mut history = History::new();
        assert!(history.record_if_new(&chars("one")));
        assert!(history.record_if_new(&chars("two")));
        assert!(!history.record_if_new(&chars("one")));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn backward_on_empty_store_is_none() {
        let mut history = History::new();
        history.reset_browse();
        assert_eq!(history.recall_backward(), None);
        assert_eq!(history.browse_position(), 0);
    }

    #[test]
    fn backward_then_forward_walks_entries() {
        let mut history = History::new();
        history.record_if_new(&chars("a"));
        history.record_if_new(&chars("b"));
        history.reset_browse();

        assert_eq!(history.recall_backward(), Some(chars("b")));
        assert_eq!(history.recall_backward(), Some(chars("a")));
        assert_eq!(history.recall_backward(), None);
        assert_eq!(history.recall_forward(), ForwardRecall::Entry(chars("b")));
        assert_eq!(history.recall_forward(), ForwardRecall::Fresh);
        assert_eq!(history.browse_position(), 2);
    }

    #[test]
    fn recalled_copy_is_isolated_from_store() {
        let mut history = History::new();
        history.record_if_new(&chars("abc"));
        history.reset_browse();

        let mut recalled = history.recall_backward().expect("entry");
        recalled.push('X');
        assert!(history.record_if_new(&recalled));

        let stored: Vec<String> = history.entries().map(|e| e.iter().collect()).collect();
        assert_eq!(stored, vec!["abc".to_string(), "abcX".to_string()]);
    }

    #[test]
    fn forward_without_browsing_yields_fresh_line() {
        let mut history = History::new();
        history.record_if_new(&chars("a"));
        history.reset_browse();
        assert_eq!(history.recall_forward(), ForwardRecall::Fresh);
        assert_eq!(history.browse_position(), 1);
    }
}
