use serde::Deserialize;
use tracing::debug;

use crate::error::{EngineError, Result};

/// One hero video together with the link shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistEntry {
    pub src: String,
    pub link_href: String,
    pub link_text: String,
}

impl PlaylistEntry {
    pub fn new(
        src: impl Into<String>,
        link_href: impl Into<String>,
        link_text: impl Into<String>,
    ) -> Self {
        Self {
            src: src.into(),
            link_href: link_href.into(),
            link_text: link_text.into(),
        }
    }
}

/// Ordered, non-empty rotation of hero videos that wraps at the end.
///
/// # Example
/// ```
/// use engine::{Playlist, PlaylistEntry};
///
/// let mut playlist = Playlist::new(vec![
///     PlaylistEntry::new("a.mp4", "a.html", "A"),
///     PlaylistEntry::new("b.mp4", "b.html", "B"),
/// ])
/// .expect("non-empty playlist");
///
/// assert_eq!(playlist.advance().src, "b.mp4");
/// assert_eq!(playlist.advance().src, "a.mp4");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
    index: usize,
}

impl Playlist {
    pub fn new(entries: Vec<PlaylistEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(EngineError::EmptyPlaylist);
        }
        Ok(Self { entries, index: 0 })
    }

    pub fn current(&self) -> &PlaylistEntry {
        &self.entries[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves to the next entry, wrapping to the first after the last.
    pub fn advance(&mut self) -> &PlaylistEntry {
        self.index = (self.index + 1) % self.entries.len();
        debug!(index = self.index, src = %self.entries[self.index].src, "playlist advanced");
        &self.entries[self.index]
    }
}
