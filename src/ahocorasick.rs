//! Trie construction, failure links and state transitions.
//!
//! States live in one arena and refer to each other by [`StateID`]. Slot
//! [`FAIL`] is a sentinel that is never entered; [`ROOT`] is the start state.

use std::collections::VecDeque;

use tracing::trace;

use crate::PatternID;
use crate::error::BuildError;
use crate::transitions::{FAIL, StateID, Transitions};

/// Start state. Every byte without an explicit transition loops back here.
pub const ROOT: StateID = 1;

/// Automaton state.
#[derive(Clone)]
pub struct Node<T> {
    /// Patterns recognized on entering this state, own and inherited through
    /// the failure chain, in ascending id order.
    pub matches: Vec<PatternID>,
    /// Transitions to other states.
    pub transitions: T,
    /// State to resume from when no transition exists.
    pub fail: StateID,
}

/// Trie with failure links over some transition table `T`.
#[derive(Clone)]
pub struct Nfa<T> {
    nodes: Vec<Node<T>>,
    pattern_lens: Vec<usize>,
    byte_map: [u8; 256],
}

impl<T: Transitions> Nfa<T> {
    /// Build the automaton for `patterns`. `byte_map` is applied to every
    /// pattern byte here and to every text byte in [`Nfa::next_state`].
    pub fn new<P: AsRef<[u8]>>(patterns: &[P], byte_map: [u8; 256]) -> Result<Self, BuildError> {
        let mut nfa = Self {
            nodes: Vec::new(),
            pattern_lens: Vec::with_capacity(patterns.len()),
            byte_map,
        };
        nfa.build_trie(patterns)?;
        nfa.encode_root_to_root();
        nfa.encode_trie_failure();
        debug_assert!(nfa.nodes.iter().all(|n| n.fail != FAIL));
        Ok(nfa)
    }

    /// Follow `byte` from state `id`, falling back along failure links.
    #[inline]
    pub fn next_state(&self, mut id: StateID, byte: u8) -> StateID {
        let byte = self.byte_map[byte as usize];
        loop {
            let node = &self.nodes[id as usize];
            let next = node.transitions.get(byte);
            if next != FAIL {
                return next;
            }
            // Every failure chain, the sentinel's included, reaches ROOT,
            // which has a transition for every byte.
            id = node.fail;
        }
    }

    /// Patterns recognized in state `id`.
    #[inline]
    pub fn matches(&self, id: StateID) -> &[PatternID] {
        &self.nodes[id as usize].matches
    }

    pub fn pattern_len(&self, pattern_id: usize) -> usize {
        self.pattern_lens[pattern_id]
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_lens.len()
    }

    /// Number of reachable states, ROOT included.
    pub fn state_count(&self) -> usize {
        self.nodes.len() - ROOT as usize
    }

    #[cfg(test)]
    pub fn node(&self, id: StateID) -> &Node<T> {
        &self.nodes[id as usize]
    }

    pub fn heap_bytes(&self) -> usize {
        let nodes: usize = self
            .nodes
            .iter()
            .map(|n| n.transitions.heap_bytes() + n.matches.capacity() * size_of::<PatternID>())
            .sum();
        nodes
            + self.nodes.capacity() * size_of::<Node<T>>()
            + self.pattern_lens.capacity() * size_of::<usize>()
    }

    //>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>
    // Trie
    //<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<

    /// Build a trie with a node for each byte in patterns.
    fn build_trie<P: AsRef<[u8]>>(&mut self, patterns: &[P]) -> Result<(), BuildError> {
        if PatternID::try_from(patterns.len()).is_err() {
            return Err(BuildError::PatternOverflow { limit: u64::from(PatternID::MAX) });
        }
        // FAIL, ROOT. The sentinel is never entered, but a walk started
        // there resumes at ROOT like any other.
        for _ in 0..2 {
            let id = self.add_node()?;
            self.nodes[id as usize].fail = ROOT;
        }

        for (id, pattern) in (0..).zip(patterns) {
            let pattern = pattern.as_ref();
            self.pattern_lens.push(pattern.len());
            // An empty pattern would match at every offset, including inside
            // empty text. It keeps its id but is never reported.
            if pattern.is_empty() {
                trace!(pattern_id = id, "skipping empty pattern");
                continue;
            }
            let mut current = ROOT;
            for &byte in pattern {
                let byte = self.byte_map[byte as usize];
                let next = self.nodes[current as usize].transitions.get(byte);
                current = if next == FAIL {
                    let new = self.add_node()?;
                    self.nodes[current as usize].transitions.set(byte, new);
                    new
                } else {
                    next
                };
            }
            // Ids are pushed in ascending order, so own matches stay sorted.
            self.nodes[current as usize].matches.push(id);
        }
        Ok(())
    }

    /// Encode ROOT->FAIL transitions as ROOT->ROOT.
    fn encode_root_to_root(&mut self) {
        let root = &mut self.nodes[ROOT as usize].transitions;
        for byte in 0..=u8::MAX {
            if root.get(byte) == FAIL {
                root.set(byte, ROOT);
            }
        }
    }

    /// Compute the failure link of every state and inherit the matches of
    /// its failure target, in breadth-first order so that every target is
    /// final before anything copies from it.
    fn encode_trie_failure(&mut self) {
        let mut queue: VecDeque<StateID> = VecDeque::new();
        let mut edges: Vec<(u8, StateID)> = Vec::new();

        // Depth one always fails to ROOT.
        edges.extend(self.nodes[ROOT as usize].transitions.iter());
        for &(_, id) in &edges {
            // Avoid infinite loop...
            if id == ROOT {
                continue;
            }
            self.nodes[id as usize].fail = ROOT;
            queue.push_back(id);
        }

        while let Some(id) = queue.pop_front() {
            edges.clear();
            edges.extend(self.nodes[id as usize].transitions.iter());
            for &(byte, next_id) in &edges {
                queue.push_back(next_id);

                // Longest proper suffix of next_id's prefix that is also in the trie.
                let fail_id = {
                    let mut fail_id = self.nodes[id as usize].fail;
                    while self.nodes[fail_id as usize].transitions.get(byte) == FAIL {
                        fail_id = self.nodes[fail_id as usize].fail;
                    }
                    self.nodes[fail_id as usize].transitions.get(byte)
                };
                let fail_id = if fail_id == next_id { ROOT } else { fail_id };
                self.nodes[next_id as usize].fail = fail_id;

                if self.nodes[fail_id as usize].matches.is_empty() {
                    continue;
                }
                // Shadow fail_id and next_id Node equivalents.
                let (fail_node, next_node) = if fail_id < next_id {
                    let (left, right) = self.nodes.split_at_mut(next_id as usize);
                    (&left[fail_id as usize], &mut right[0])
                } else {
                    let (left, right) = self.nodes.split_at_mut(fail_id as usize);
                    (&right[0], &mut left[next_id as usize])
                };
                next_node.matches.extend_from_slice(&fail_node.matches);
                next_node.matches.sort_unstable();
            }
        }
    }

    /// Add a Node and return its id.
    fn add_node(&mut self) -> Result<StateID, BuildError> {
        let id = StateID::try_from(self.nodes.len())
            .map_err(|_| BuildError::StateOverflow { limit: u64::from(StateID::MAX) })?;
        self.nodes.push(Node { matches: vec![], transitions: T::default(), fail: FAIL });
        Ok(id)
    }
} // impl Nfa

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::transitions::{Dense, Sparse};

    const IDENTITY: [u8; 256] = {
        let mut map = [0u8; 256];
        let mut i = 0;
        while i < 256 {
            map[i] = i as u8;
            i += 1;
        }
        map
    };

    fn build<T: Transitions>(patterns: &[&str]) -> Nfa<T> {
        Nfa::new(patterns, IDENTITY).unwrap()
    }

    /// State reached from ROOT by explicit trie edges only.
    #[track_caller]
    fn state<T: Transitions>(nfa: &Nfa<T>, prefix: &str) -> StateID {
        prefix.bytes().fold(ROOT, |id, byte| {
            let next = nfa.node(id).transitions.get(byte);
            assert!(next != FAIL && next != ROOT, "{prefix:?} is not in the trie");
            next
        })
    }

    /// Every (pattern, end) pair, as the searcher would produce them.
    fn run<T: Transitions>(nfa: &Nfa<T>, haystack: &str) -> Vec<(PatternID, usize)> {
        let mut id = ROOT;
        let mut found = Vec::new();
        for (i, byte) in haystack.bytes().enumerate() {
            id = nfa.next_state(id, byte);
            found.extend(nfa.matches(id).iter().map(|&p| (p, i + 1)));
        }
        found
    }

    fn failure_links<T: Transitions>() {
        let nfa = build::<T>(&["he", "she", "his", "hers"]);
        assert_eq!(nfa.node(state(&nfa, "h")).fail, ROOT);
        assert_eq!(nfa.node(state(&nfa, "sh")).fail, state(&nfa, "h"));
        assert_eq!(nfa.node(state(&nfa, "she")).fail, state(&nfa, "he"));
        assert_eq!(nfa.node(state(&nfa, "his")).fail, state(&nfa, "s"));
        assert_eq!(nfa.node(state(&nfa, "hers")).fail, state(&nfa, "s"));
        assert_eq!(nfa.node(ROOT).fail, ROOT);
    }

    #[test]
    fn failure_links_dense() {
        failure_links::<Dense>();
    }

    #[test]
    fn failure_links_sparse() {
        failure_links::<Sparse>();
    }

    #[test]
    fn outputs_inherited_from_failure_target() {
        let nfa = build::<Dense>(&["he", "she", "his", "hers"]);
        assert_eq!(nfa.matches(state(&nfa, "she")), &[0, 1]);
        assert_eq!(nfa.matches(state(&nfa, "he")), &[0]);
        assert_eq!(nfa.matches(state(&nfa, "hers")), &[3]);
    }

    #[test]
    fn repeated_byte_does_not_fail_to_itself() {
        let nfa = build::<Sparse>(&["aaa"]);
        assert_eq!(nfa.node(state(&nfa, "a")).fail, ROOT);
        assert_eq!(nfa.node(state(&nfa, "aa")).fail, state(&nfa, "a"));
        assert_eq!(nfa.node(state(&nfa, "aaa")).fail, state(&nfa, "aa"));
        for id in ROOT + 1..=state(&nfa, "aaa") {
            assert_ne!(nfa.node(id).fail, id);
        }
    }

    /// Distance from ROOT of every state, by walking trie edges.
    fn depths<T: Transitions>(nfa: &Nfa<T>) -> Vec<usize> {
        let mut depth = vec![0; nfa.state_count() + ROOT as usize];
        let mut queue = VecDeque::from([ROOT]);
        while let Some(id) = queue.pop_front() {
            for (_, next) in nfa.node(id).transitions.iter().filter(|&(_, next)| next != ROOT) {
                depth[next as usize] = depth[id as usize] + 1;
                queue.push_back(next);
            }
        }
        depth
    }

    #[test]
    fn failure_targets_are_shallower() {
        let nfa = build::<Dense>(&["abcab", "bcabc", "cab", "ab", "b", "abababab"]);
        let depth = depths(&nfa);
        for id in ROOT + 1..(nfa.state_count() as StateID + ROOT) {
            let fail = nfa.node(id).fail;
            assert!(depth[fail as usize] < depth[id as usize], "state {id} fails to {fail}");
        }
    }

    #[test]
    fn walk_from_sentinel_resumes_at_root() {
        let nfa = build::<Dense>(&["ab"]);
        assert_eq!(nfa.node(FAIL).fail, ROOT);
        assert_eq!(nfa.next_state(FAIL, b'a'), state(&nfa, "a"));
        assert_eq!(nfa.next_state(FAIL, b'z'), ROOT);

        let nfa = build::<Sparse>(&["ab"]);
        assert_eq!(nfa.next_state(FAIL, b'a'), state(&nfa, "a"));
    }

    #[test]
    fn outputs_monotone_along_failure_chains() {
        // Deep and wide: every suffix of a long word plus a fan of prefixes.
        let word = "abracadabra";
        let mut owned: Vec<String> = (0..word.len()).map(|i| word[i..].to_string()).collect();
        owned.extend((1..=word.len()).map(|i| word[..i].to_string()));
        owned.extend(["cad", "dab", "bra", "ra", "a"].map(String::from));
        let patterns: Vec<&str> = owned.iter().map(String::as_str).collect();
        let nfa = build::<Sparse>(&patterns);

        for id in ROOT..(nfa.state_count() as StateID + ROOT) {
            let mut child = id;
            while child != ROOT {
                let parent = nfa.node(child).fail;
                let outputs = nfa.matches(child);
                assert!(
                    nfa.matches(parent).iter().all(|p| outputs.contains(p)),
                    "state {child} lost outputs of its failure target {parent}"
                );
                child = parent;
            }
        }
    }

    #[test]
    fn root_is_total() {
        let nfa = build::<Sparse>(&["x"]);
        for byte in 0..=u8::MAX {
            assert_ne!(nfa.node(ROOT).transitions.get(byte), FAIL);
        }
        assert_eq!(nfa.next_state(ROOT, b'q'), ROOT);
    }

    #[test]
    fn empty_set_is_root_only() {
        let nfa = build::<Dense>(&[]);
        assert_eq!(nfa.state_count(), 1);
        assert_eq!(nfa.pattern_count(), 0);
        assert!(run(&nfa, "anything").is_empty());
    }

    #[test]
    fn empty_pattern_keeps_id_without_matching() {
        let nfa = build::<Dense>(&["", "b"]);
        assert_eq!(nfa.pattern_count(), 2);
        assert_eq!(nfa.pattern_len(0), 0);
        assert!(nfa.matches(ROOT).is_empty());
        assert_eq!(run(&nfa, "abc"), vec![(1, 2)]);
    }

    #[test]
    fn duplicates_share_a_state() {
        let nfa = build::<Dense>(&["ab", "ab"]);
        assert_eq!(nfa.matches(state(&nfa, "ab")), &[0, 1]);
        assert_eq!(run(&nfa, "xab"), vec![(0, 3), (1, 3)]);
    }

    #[test]
    fn nfa_basics() {
        let haystack = "abc def ghi jkl mno pqr abc";
        let patterns = ["bc", "ghi", "o p", "qr"];
        let expected = [(0, 3), (1, 11), (2, 21), (3, 23), (0, 27)];
        assert_eq!(run(&build::<Dense>(&patterns), haystack), expected);
        assert_eq!(run(&build::<Sparse>(&patterns), haystack), expected);
    }

    #[test]
    fn byte_map_applies_to_patterns_and_text() {
        let mut folded = IDENTITY;
        folded[b'A' as usize] = b'a';
        let nfa: Nfa<Dense> = Nfa::new(&["Aa"], folded).unwrap();
        assert_eq!(run(&nfa, "aAaA"), vec![(0, 2), (0, 3), (0, 4)]);
    }
}
