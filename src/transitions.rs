//! Per-state transition tables.
//!
//! Both tables map a byte to a state id and answer [`FAIL`] for a byte with
//! no explicit transition. Which one an automaton uses is a [`Backing`]
//! choice and never changes what it matches.
//!
//! [`Backing`]: crate::Backing

/// Id of a state in the automaton's node arena.
pub type StateID = u32;

/// Sentinel for "no transition". Slot 0 of the arena is never entered.
pub const FAIL: StateID = 0;

pub trait Transitions: Clone + Default {
    /// Transition on `byte`, or [`FAIL`].
    fn get(&self, byte: u8) -> StateID;

    fn set(&mut self, byte: u8, to: StateID);

    /// Explicit transitions in ascending byte order.
    fn iter(&self) -> impl Iterator<Item = (u8, StateID)> + '_;

    /// Heap memory owned by this table.
    fn heap_bytes(&self) -> usize;
}

/// One slot for each of the 256 byte values.
#[derive(Clone)]
pub struct Dense(Box<[StateID; 256]>);

impl Default for Dense {
    fn default() -> Self {
        Self(Box::new([FAIL; 256]))
    }
}

impl Transitions for Dense {
    #[inline]
    fn get(&self, byte: u8) -> StateID {
        self.0[byte as usize]
    }

    fn set(&mut self, byte: u8, to: StateID) {
        self.0[byte as usize] = to;
    }

    fn iter(&self) -> impl Iterator<Item = (u8, StateID)> + '_ {
        (0..=u8::MAX).zip(self.0.iter().copied()).filter(|&(_, to)| to != FAIL)
    }

    fn heap_bytes(&self) -> usize {
        std::mem::size_of::<[StateID; 256]>()
    }
}

/// Transitions that exist, kept sorted by byte.
#[derive(Clone, Default)]
pub struct Sparse(Vec<(u8, StateID)>);

impl Transitions for Sparse {
    #[inline]
    fn get(&self, byte: u8) -> StateID {
        match self.0.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(i) => self.0[i].1,
            Err(_) => FAIL,
        }
    }

    fn set(&mut self, byte: u8, to: StateID) {
        match self.0.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(i) => self.0[i].1 = to,
            Err(i) => self.0.insert(i, (byte, to)),
        }
    }

    fn iter(&self) -> impl Iterator<Item = (u8, StateID)> + '_ {
        self.0.iter().copied()
    }

    fn heap_bytes(&self) -> usize {
        self.0.capacity() * std::mem::size_of::<(u8, StateID)>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<T: Transitions>() {
        let mut t = T::default();
        assert_eq!(t.get(b'a'), FAIL);
        t.set(b'z', 7);
        t.set(b'a', 3);
        t.set(0xFF, 9);
        assert_eq!(t.get(b'a'), 3);
        assert_eq!(t.get(b'z'), 7);
        assert_eq!(t.get(0xFF), 9);
        assert_eq!(t.get(b'b'), FAIL);
        t.set(b'a', 4);
        assert_eq!(t.iter().collect::<Vec<_>>(), vec![(b'a', 4), (b'z', 7), (0xFF, 9)]);
    }

    #[test]
    fn dense_get_set_iter() {
        exercise::<Dense>();
    }

    #[test]
    fn sparse_get_set_iter() {
        exercise::<Sparse>();
    }

    #[test]
    fn dense_is_a_fixed_kilobyte() {
        assert_eq!(Dense::default().heap_bytes(), 1024);
        assert_eq!(Sparse::default().heap_bytes(), 0);
    }
}
