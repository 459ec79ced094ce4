//! Interning arenas: every value is stored once and referred to by a small
//! typed handle.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops;

/// Typed handle on a value stored in an [`Arena`].
pub struct Idx<T> {
    raw: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> Idx<T> {
    pub(crate) fn new(idx: usize) -> Self {
        Self {
            raw: u32::try_from(idx).expect("arena overflow"),
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.raw as usize
    }
}

impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Idx<T> {}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Idx<T> {}

impl<T> PartialOrd for Idx<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Idx<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Idx<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.raw)
    }
}

impl<T> fmt::Display for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.raw)
    }
}

/// An identity map: equal values always get the same handle.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
    ids: BTreeMap<T, Idx<T>>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            ids: BTreeMap::new(),
        }
    }
}

impl<T: Ord + Clone> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle of `value`, storing it first if needed.
    pub fn intern(&mut self, value: T) -> Idx<T> {
        if let Some(idx) = self.ids.get(&value) {
            return *idx;
        }
        let idx = Idx::new(self.items.len());
        self.items.push(value.clone());
        self.ids.insert(value, idx);
        idx
    }

    /// Returns the handle of `value` if it has already been stored.
    pub fn lookup(&self, value: &T) -> Option<Idx<T>> {
        self.ids.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Idx<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (Idx::new(i), item))
    }
}

impl<T> ops::Index<Idx<T>> for Arena<T> {
    type Output = T;

    fn index(&self, idx: Idx<T>) -> &T {
        &self.items[idx.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_an_identity_map() {
        let mut arena = Arena::new();
        let a = arena.intern("a".to_string());
        let b = arena.intern("b".to_string());
        assert_ne!(a, b);
        assert_eq!(arena.intern("a".to_string()), a);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena[b], "b");
        assert_eq!(arena.lookup(&"b".to_string()), Some(b));
        assert_eq!(arena.lookup(&"c".to_string()), None);
        assert_eq!(
            arena.iter().map(|(idx, _)| idx.index()).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }
}
