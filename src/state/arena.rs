//! Interned URL storage for a crawl session
//!
//! Every URL the session learns about is interned once and addressed by a
//! small integer ID. The arena doubles as the visited set: insertion is a
//! compare-and-insert, so a URL can only ever be queued once.

use super::page_state::UrlState;
use std::collections::HashMap;
use url::Url;

/// Index of a URL inside a [`UrlArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlId(usize);

impl UrlId {
    /// Creates an ID from a raw arena index
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw arena index
    pub fn index(self) -> usize {
        self.0
    }
}

/// Everything the session knows about one URL
#[derive(Debug, Clone)]
pub struct UrlEntry {
    /// Normalized URL
    pub url: Url,

    /// Link depth at which the URL was first discovered (0 = seed)
    pub depth: u32,

    /// The page that first linked here
    pub referrer: Option<UrlId>,

    /// Current crawl state
    pub state: UrlState,
}

/// Arena of interned URLs
#[derive(Debug, Default)]
pub struct UrlArena {
    entries: Vec<UrlEntry>,
    index: HashMap<String, UrlId>,
}

impl UrlArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a URL if it is not known yet
    ///
    /// Returns `Ok(id)` for a newly created entry and `Err(existing_id)` when
    /// the URL was already interned, in which case the existing entry is left
    /// untouched.
    pub fn insert(
        &mut self,
        url: Url,
        depth: u32,
        referrer: Option<UrlId>,
        state: UrlState,
    ) -> Result<UrlId, UrlId> {
        if let Some(&existing) = self.index.get(url.as_str()) {
            return Err(existing);
        }

        let id = UrlId::from_index(self.entries.len());
        self.index.insert(url.as_str().to_string(), id);
        self.entries.push(UrlEntry {
            url,
            depth,
            referrer,
            state,
        });
        Ok(id)
    }

    /// Looks up the ID of an already normalized URL
    pub fn lookup(&self, url: &Url) -> Option<UrlId> {
        self.index.get(url.as_str()).copied()
    }

    pub fn get(&self, id: UrlId) -> &UrlEntry {
        &self.entries[id.index()]
    }

    pub fn url(&self, id: UrlId) -> &Url {
        &self.entries[id.index()].url
    }

    pub fn state(&self, id: UrlId) -> UrlState {
        self.entries[id.index()].state
    }

    pub fn set_state(&mut self, id: UrlId, state: UrlState) {
        self.entries[id.index()].state = state;
    }

    /// Re-queues an entry found again at a shallower depth
    pub fn requeue(&mut self, id: UrlId, depth: u32, referrer: Option<UrlId>) {
        let entry = &mut self.entries[id.index()];
        entry.depth = depth;
        entry.referrer = referrer;
        entry.state = UrlState::Queued;
    }

    /// Resolves the referrer of an entry to its URL
    pub fn referrer_url(&self, id: UrlId) -> Option<&Url> {
        self.get(id).referrer.map(|r| self.url(r))
    }

    /// Iterates entries in interning order
    pub fn iter(&self) -> impl Iterator<Item = (UrlId, &UrlEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (UrlId::from_index(i), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
