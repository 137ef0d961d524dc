//! Multi-pattern string search.
//!
//! [`AhoCorasick`] compiles a set of patterns into a trie with failure
//! links, then reports every occurrence of every pattern, overlapping ones
//! included, in a single left-to-right pass over the text.
//!
//! ```
//! use multiscan::AhoCorasick;
//!
//! let ac = AhoCorasick::new(["he", "she", "his", "hers"]).unwrap();
//! let found: Vec<(usize, usize)> = ac
//!     .search("ahishers")
//!     .iter()
//!     .map(|m| (m.pattern_id, m.start))
//!     .collect();
//! assert_eq!(found, vec![(2, 1), (0, 4), (1, 3), (3, 4)]);
//! ```
//!
//! Offsets are byte offsets. Patterns and text are matched on their UTF-8
//! bytes, so a match of a `&str` pattern in `&str` text always lands on
//! character boundaries.

mod ahocorasick;
mod automaton;
mod config;
mod error;
mod stream;
mod transitions;

pub use automaton::{AhoCorasick, Builder, FindIter};
pub use config::{Backing, Config, DENSE_AUTO_LIMIT};
pub use error::BuildError;
pub use stream::StreamSearcher;

use serde::Serialize;

/// Compact pattern id stored in every state's output list. The public API
/// speaks `usize` indices only.
pub(crate) type PatternID = u32;

/// One occurrence of a pattern in some text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Match {
    /// Index of the matched pattern in the sequence given at build time.
    pub pattern_id: usize,
    /// Byte offset of the first byte of the occurrence.
    pub start: usize,
    /// Byte offset one past the last byte of the occurrence.
    pub end: usize,
}

impl Match {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}
