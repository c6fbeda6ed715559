//! Bounded history of recently focused window titles.
//!
//! The coach prompt includes the last few titles so the model can comment on
//! where the user's attention has been drifting, not just where it is now.

use std::collections::VecDeque;

/// FIFO of the most recent window titles, oldest first.
///
/// Pushing past capacity evicts the oldest entry. Duplicate titles are kept
/// as-is; revisiting a window is part of the story the prompt tells.
#[derive(Debug)]
pub struct TitleHistory {
    titles: VecDeque<String>,
    capacity: usize,
}

impl TitleHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            titles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a title, dropping the oldest entry if the buffer is full.
    ///
    /// A capacity of zero means the history stays empty.
    pub fn push(&mut self, title: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.titles.len() == self.capacity {
            self.titles.pop_front();
        }
        self.titles.push_back(title.to_string());
    }

    /// Current contents, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.titles.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}
