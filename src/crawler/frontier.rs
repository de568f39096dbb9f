//! FIFO frontier of pending fetch tasks
//!
//! Tasks are keyed by handler name plus normalized URL; a key that was ever
//! queued is not queued again within the same run, which keeps
//! self-referential "next" links from looping.

use crate::crawler::FetchTask;
use crate::url::normalize_url;
use std::collections::{HashSet, VecDeque};
use tracing::trace;

pub struct Frontier {
    queue: VecDeque<FetchTask>,
    seen: HashSet<(String, String)>,
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Queues a task; returns false if an equivalent task was already queued
    pub fn push(&mut self, task: FetchTask) -> bool {
        let key = match normalize_url(task.url.as_str()) {
            Ok(normalized) => normalized.to_string(),
            Err(_) => task.url.to_string(),
        };
        if !self.seen.insert((task.handler.clone(), key)) {
            trace!(url = %task.url, handler = %task.handler, "Skipping duplicate task");
            return false;
        }
        self.queue.push_back(task);
        true
    }

    pub fn pop(&mut self) -> Option<FetchTask> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}
