//! Tab-completion cycling over a candidate set.

use crate::error::CompletionError;

/// Direction of one cycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Shift reverses the cycle.
    pub fn from_shift(shift: bool) -> Self {
        if shift {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

/// Cyclic, direction-aware traversal of the candidates that contain a fragment.
///
/// The fragment itself is appended to a working copy of the candidate set, so it takes
/// part in the cycle as the "what was typed" entry. The cursor starts on that entry:
/// a forward step lands on candidate 0, a backward step on the last candidate.
#[derive(Debug, Clone)]
pub struct CompletionCycle {
    entries: Vec<String>,
    fragment: String,
    needle: String,
    index: usize,
}

impl CompletionCycle {
    pub fn new(candidates: &[String], fragment: &str) -> Self {
        let mut entries = Vec::with_capacity(candidates.len() + 1);
        entries.extend(candidates.iter().cloned());
        entries.push(fragment.to_string());
        let index = entries.len() - 1;
        Self {
            entries,
            fragment: fragment.to_string(),
            needle: fragment.to_lowercase(),
            index,
        }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Advance to the next entry containing the fragment, case-insensitively.
    ///
    /// Visits each entry at most once per call; a full pass without a hit reports
    /// `NoMatch` and leaves the cursor where it was.
    pub fn next_match(&mut self, direction: Direction) -> Result<&str, CompletionError> {
        let len = self.entries.len();
        let mut index = self.index;
        for _ in 0..len {
            index = match direction {
                Direction::Forward => (index + 1) % len,
                Direction::Backward => (index + len - 1) % len,
            };
            if self.entries[index].to_lowercase().contains(&self.needle) {
                self.index = index;
                return Ok(&self.entries[index]);
            }
        }
        Err(CompletionError::NoMatch {
            fragment: self.fragment.clone(),
        })
    }
}

/// Contiguous non-whitespace run immediately left of `cursor`.
pub fn fragment_before(buffer: &[char], cursor: usize) -> String {
    let end = cursor.min(buffer.len());
    let start = buffer[..end]
        .iter()
        .rposition(|ch| ch.is_whitespace())
        .map_or(0, |idx| idx + 1);
    buffer[start..end].iter().collect()
}
