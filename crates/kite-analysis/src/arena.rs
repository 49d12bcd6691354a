//! Append-only arena storage with typed keys.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for typed arena keys.
pub trait ArenaKey: Copy + Eq + std::hash::Hash + std::fmt::Debug {
    fn from_usize(idx: usize) -> Self;
    fn as_usize(&self) -> usize;
}

/// An append-only arena. Entries are never removed, so a key stays valid for
/// the lifetime of the arena.
#[derive(Debug)]
pub struct Arena<K: ArenaKey, V> {
    vec: Vec<V>,
    _marker: PhantomData<K>,
}

impl<K: ArenaKey, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Arena<K, V> {
    pub fn new() -> Self {
        Self {
            vec: Vec::new(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn insert(&mut self, value: V) -> K {
        let idx = self.vec.len();
        self.vec.push(value);
        K::from_usize(idx)
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.vec.get(key.as_usize())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.vec
            .iter()
            .enumerate()
            .map(|(i, v)| (K::from_usize(i), v))
    }
}

impl<K: ArenaKey, V> Index<K> for Arena<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, key: K) -> &Self::Output {
        &self.vec[key.as_usize()]
    }
}

impl<K: ArenaKey, V> IndexMut<K> for Arena<K, V> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        &mut self.vec[key.as_usize()]
    }
}

/// Defines one or more typed arena keys.
#[macro_export]
macro_rules! define_key {
    ($($(#[$attr:meta])* $vis:vis struct $name:ident;)*) => {
        $(
            $(#[$attr])*
            #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            #[repr(transparent)]
            $vis struct $name(u32);

            impl $name {
                #[inline]
                pub fn raw(&self) -> u32 {
                    self.0
                }
            }

            impl $crate::arena::ArenaKey for $name {
                #[inline]
                fn from_usize(idx: usize) -> Self {
                    Self(idx as u32)
                }

                #[inline]
                fn as_usize(&self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_key! {
        struct TestKey;
    }

    #[test]
    fn test_insert_and_index() {
        let mut arena: Arena<TestKey, String> = Arena::new();
        let a = arena.insert("a".to_string());
        let b = arena.insert("b".to_string());
        assert_eq!(arena[a], "a");
        arena[b].push('!');
        assert_eq!(arena.get(b).map(String::as_str), Some("b!"));
        assert_eq!(arena.len(), 2);
        assert_eq!(b.raw(), 1);
    }

    #[test]
    fn test_iter_yields_keys_in_order() {
        let mut arena: Arena<TestKey, i32> = Arena::new();
        for v in [10, 20, 30] {
            arena.insert(v);
        }
        let keys: Vec<u32> = arena.iter().map(|(k, _)| k.raw()).collect();
        assert_eq!(keys, vec![0, 1, 2]);
        assert!(arena.get(TestKey::from_usize(3)).is_none());
    }
}
