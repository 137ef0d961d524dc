use std::fmt;
use std::iter::FusedIterator;

use tracing::debug;

use crate::ahocorasick::{Nfa, ROOT};
use crate::config::{Backing, Config};
use crate::error::BuildError;
use crate::stream::StreamSearcher;
use crate::transitions::{Dense, Sparse, StateID};
use crate::{Match, PatternID};

#[derive(Clone)]
enum Imp {
    Dense(Nfa<Dense>),
    Sparse(Nfa<Sparse>),
}

macro_rules! dispatch {
    ($imp:expr, $nfa:ident => $body:expr) => {
        match $imp {
            Imp::Dense($nfa) => $body,
            Imp::Sparse($nfa) => $body,
        }
    };
}

/// A compiled set of patterns.
///
/// Immutable once built; share it freely across threads; every search
/// keeps its own state.
#[derive(Clone)]
pub struct AhoCorasick {
    imp: Imp,
    config: Config,
}

impl AhoCorasick {
    /// Build with the default [`Config`]: case sensitive, automatic backing.
    pub fn new<I, P>(patterns: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Builder::new().build(patterns)
    }

    pub fn with_config<I, P>(config: Config, patterns: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Builder { config }.build(patterns)
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Every occurrence of every pattern, overlapping ones included.
    ///
    /// Ordered by end offset; occurrences ending at the same offset are
    /// ordered by pattern id.
    pub fn search<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> Vec<Match> {
        self.find_iter(haystack).collect()
    }

    /// Lazy form of [`AhoCorasick::search`].
    pub fn find_iter<'a, 'h, H: AsRef<[u8]> + ?Sized>(&'a self, haystack: &'h H) -> FindIter<'a, 'h> {
        FindIter { ac: self, haystack: haystack.as_ref(), pos: 0, state: ROOT, next_match: 0 }
    }

    /// Whether any pattern occurs in `haystack`. Stops at the first match.
    pub fn is_match<H: AsRef<[u8]> + ?Sized>(&self, haystack: &H) -> bool {
        self.find_iter(haystack).next().is_some()
    }

    /// Searcher for text that arrives in chunks.
    pub fn stream(&self) -> StreamSearcher<'_> {
        StreamSearcher::new(self)
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// The backing actually in use; never [`Backing::Auto`].
    pub fn backing(&self) -> Backing {
        match self.imp {
            Imp::Dense(_) => Backing::Dense,
            Imp::Sparse(_) => Backing::Sparse,
        }
    }

    pub fn pattern_count(&self) -> usize {
        dispatch!(&self.imp, nfa => nfa.pattern_count())
    }

    /// Byte length of pattern `pattern_id`, or `None` if out of range.
    pub fn pattern_len(&self, pattern_id: usize) -> Option<usize> {
        (pattern_id < self.pattern_count())
            .then(|| dispatch!(&self.imp, nfa => nfa.pattern_len(pattern_id)))
    }

    pub fn state_count(&self) -> usize {
        dispatch!(&self.imp, nfa => nfa.state_count())
    }

    /// Heap memory held by the automaton.
    pub fn heap_bytes(&self) -> usize {
        dispatch!(&self.imp, nfa => nfa.heap_bytes())
    }

    #[inline]
    pub(crate) fn start_state(&self) -> StateID {
        ROOT
    }

    #[inline]
    pub(crate) fn next_state(&self, id: StateID, byte: u8) -> StateID {
        dispatch!(&self.imp, nfa => nfa.next_state(id, byte))
    }

    #[inline]
    pub(crate) fn matches(&self, id: StateID) -> &[PatternID] {
        dispatch!(&self.imp, nfa => nfa.matches(id))
    }

    /// Match for a stored output id ending at `end`.
    #[inline]
    pub(crate) fn match_ending_at(&self, pattern_id: PatternID, end: usize) -> Match {
        // Stored ids are u32 and never narrower than usize on supported targets.
        let pattern_id = pattern_id as usize;
        let len = dispatch!(&self.imp, nfa => nfa.pattern_len(pattern_id));
        Match { pattern_id, start: end - len, end }
    }
}

impl fmt::Debug for AhoCorasick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AhoCorasick")
            .field("case_sensitive", &self.config.case_sensitive)
            .field("backing", &self.backing())
            .field("patterns", &self.pattern_count())
            .field("states", &self.state_count())
            .finish()
    }
}

/// Configures and builds an [`AhoCorasick`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold ASCII letters in patterns and text when `yes` is false.
    pub fn case_sensitive(&mut self, yes: bool) -> &mut Self {
        self.config.case_sensitive = yes;
        self
    }

    pub fn backing(&mut self, backing: Backing) -> &mut Self {
        self.config.backing = backing;
        self
    }

    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    /// Insert every pattern, then compute failure links. Pattern ids are
    /// positions in `patterns`.
    pub fn build<I, P>(&self, patterns: I) -> Result<AhoCorasick, BuildError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let patterns: Vec<P> = patterns.into_iter().collect();
        let total_len: usize = patterns.iter().map(|p| p.as_ref().len()).sum();
        let backing = self.config.backing.resolve(total_len);
        let byte_map = self.config.byte_map();
        let imp = match backing {
            Backing::Sparse => Imp::Sparse(Nfa::new(&patterns, byte_map)?),
            Backing::Dense | Backing::Auto => Imp::Dense(Nfa::new(&patterns, byte_map)?),
        };
        let ac = AhoCorasick { imp, config: self.config };
        debug!(
            patterns = ac.pattern_count(),
            states = ac.state_count(),
            backing = ?ac.backing(),
            case_sensitive = ac.config.case_sensitive,
            heap_bytes = ac.heap_bytes(),
            "built automaton"
        );
        Ok(ac)
    }
}

/// Iterator over all matches in a haystack, from [`AhoCorasick::find_iter`].
#[derive(Debug)]
pub struct FindIter<'a, 'h> {
    ac: &'a AhoCorasick,
    haystack: &'h [u8],
    /// Bytes consumed so far.
    pos: usize,
    state: StateID,
    /// Index into the current state's matches of the next one to report.
    next_match: usize,
}

impl Iterator for FindIter<'_, '_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        loop {
            if let Some(&pattern_id) = self.ac.matches(self.state).get(self.next_match) {
                self.next_match += 1;
                return Some(self.ac.match_ending_at(pattern_id, self.pos));
            }
            let &byte = self.haystack.get(self.pos)?;
            self.state = self.ac.next_state(self.state, byte);
            self.pos += 1;
            self.next_match = 0;
        }
    }
}

impl FusedIterator for FindIter<'_, '_> {}
