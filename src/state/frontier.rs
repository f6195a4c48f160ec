use std::collections::{HashSet, VecDeque};

/// Per-site crawl frontier
///
/// Holds the visited set (URLs already dispatched, whatever their outcome)
/// and the frontier (URLs discovered but not yet dispatched). The two sets
/// never overlap: a URL moves from the frontier to the visited set when it
/// is taken for a wave, and a URL already in either set is never offered
/// again.
#[derive(Debug, Default)]
pub struct CrawlFrontier {
    visited: HashSet<String>,
    pending: VecDeque<String>,
    pending_set: HashSet<String>,
}

impl CrawlFrontier {
    /// Creates a frontier holding only the seed URL
    pub fn new(seed: impl Into<String>) -> Self {
        let mut frontier = Self::default();
        frontier.offer(seed.into());
        frontier
    }

    /// Adds a discovered URL unless it was already visited or queued
    ///
    /// Returns true if the URL was added.
    pub fn offer(&mut self, url: String) -> bool {
        if self.visited.contains(&url) || self.pending_set.contains(&url) {
            return false;
        }
        self.pending_set.insert(url.clone());
        self.pending.push_back(url);
        true
    }

    /// Takes up to `max` URLs in discovery order and marks them visited
    pub fn take_wave(&mut self, max: usize) -> Vec<String> {
        let count = max.min(self.pending.len());
        let wave: Vec<String> = self.pending.drain(..count).collect();
        for url in &wave {
            self.pending_set.remove(url);
            self.visited.insert(url.clone());
        }
        wave
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Returns true when no URL is both visited and pending
    pub fn is_disjoint(&self) -> bool {
        self.pending_set.is_disjoint(&self.visited)
    }
}
