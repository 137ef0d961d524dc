//! Search over text that arrives in pieces.

use std::io::{self, Read};
use std::ops::ControlFlow;

use crate::Match;
use crate::automaton::AhoCorasick;
use crate::transitions::StateID;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Carries the automaton state from one chunk to the next, so an
/// occurrence split across a chunk boundary is still found. Offsets are
/// relative to the start of the whole stream.
#[derive(Debug, Clone)]
pub struct StreamSearcher<'a> {
    ac: &'a AhoCorasick,
    state: StateID,
    offset: usize,
}

impl<'a> StreamSearcher<'a> {
    pub(crate) fn new(ac: &'a AhoCorasick) -> Self {
        Self { ac, state: ac.start_state(), offset: 0 }
    }

    /// Consume `chunk`, calling `on_match` for each match that ends in it.
    pub fn feed_with<F: FnMut(Match)>(&mut self, chunk: &[u8], mut on_match: F) {
        let _ = self.try_feed_with(chunk, |m| {
            on_match(m);
            ControlFlow::Continue(())
        });
    }

    /// Like [`feed_with`](Self::feed_with), but stops as soon as `on_match`
    /// breaks. Bytes after the one that completed the breaking match are
    /// left unconsumed.
    pub fn try_feed_with<F>(&mut self, chunk: &[u8], mut on_match: F) -> ControlFlow<()>
    where
        F: FnMut(Match) -> ControlFlow<()>,
    {
        for &byte in chunk {
            self.state = self.ac.next_state(self.state, byte);
            self.offset += 1;
            for &pattern_id in self.ac.matches(self.state) {
                on_match(self.ac.match_ending_at(pattern_id, self.offset))?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Consume `chunk` and collect the matches that end in it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Match> {
        let mut found = Vec::new();
        self.feed_with(chunk, |m| found.push(m));
        found
    }

    /// Feed what `reader` yields until it is exhausted or `on_match`
    /// breaks. Returns the number of bytes read.
    pub fn feed_reader<R, F>(&mut self, mut reader: R, mut on_match: F) -> io::Result<usize>
    where
        R: Read,
        F: FnMut(Match) -> ControlFlow<()>,
    {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let mut total = 0;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => return Ok(total),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            total += n;
            if self.try_feed_with(&buf[..n], &mut on_match).is_break() {
                return Ok(total);
            }
        }
    }

    /// Bytes consumed since creation or the last [`reset`](Self::reset).
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Forget all consumed input.
    pub fn reset(&mut self) {
        self.state = self.ac.start_state();
        self.offset = 0;
    }

    pub fn automaton(&self) -> &'a AhoCorasick {
        self.ac
    }
}
