//! Breadth-first crawl frontier
//!
//! A plain FIFO queue: tasks are fetched in discovery order, which keeps the
//! traversal level by level since every task of depth `d` is queued before
//! any task of depth `d + 1` it leads to.

use crate::state::UrlId;
use std::collections::VecDeque;
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Arena ID of the URL
    pub id: UrlId,

    /// The normalized URL to fetch
    pub url: Url,

    /// Discovery depth (0 = seed)
    pub depth: u32,

    /// Arena ID of the referring page
    pub referrer: Option<UrlId>,
}

/// FIFO queue of pending crawl tasks
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task to the back of the queue
    pub fn push(&mut self, task: CrawlTask) {
        self.queue.push_back(task);
    }

    /// Takes the oldest task
    pub fn pop(&mut self) -> Option<CrawlTask> {
        self.queue.pop_front()
    }

    /// Removes and returns every remaining task
    pub fn drain(&mut self) -> impl Iterator<Item = CrawlTask> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(index: usize, path: &str, depth: u32) -> CrawlTask {
        CrawlTask {
            id: UrlId::from_index(index),
            url: Url::parse(&format!("https://example.com{}", path)).unwrap(),
            depth,
            referrer: None,
        }
    }

    #[test]
    fn test_new_frontier_is_empty() {
        let mut frontier = Frontier::new();
        assert!(frontier.is_empty());
        assert_eq!(frontier.len(), 0);
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new();
        frontier.push(task(0, "/", 0));
        frontier.push(task(1, "/a", 1));
        frontier.push(task(2, "/b", 1));

        assert_eq!(frontier.pop().unwrap().url.path(), "/");
        assert_eq!(frontier.pop().unwrap().url.path(), "/a");
        assert_eq!(frontier.pop().unwrap().url.path(), "/b");
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_drain() {
        let mut frontier = Frontier::new();
        frontier.push(task(0, "/x", 1));
        frontier.push(task(1, "/y", 1));

        let drained: Vec<CrawlTask> = frontier.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(frontier.is_empty());
    }
}
