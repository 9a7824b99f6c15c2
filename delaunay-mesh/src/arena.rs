use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Append-only storage with stable ids. Removed slots are tombstoned, never reused, so an
/// id keeps referring to the same element (or to nothing) for the arena's whole life.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    data: Vec<Option<T>>,
    live: usize,
}

#[derive(Debug)]
pub struct ArenaId<Tag> {
    ix: usize,
    tag: PhantomData<Tag>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            data: vec![],
            live: 0,
        }
    }

    pub fn push(&mut self, v: T) -> ArenaId<T> {
        self.data.push(Some(v));
        self.live += 1;
        ArenaId::new(self.data.len() - 1)
    }

    pub fn remove(&mut self, id: ArenaId<T>) -> Option<T> {
        let v = self.data.get_mut(id.ix)?.take();
        if v.is_some() {
            self.live -= 1;
        }
        v
    }

    pub fn get(&self, id: ArenaId<T>) -> Option<&T> {
        self.data.get(id.ix)?.as_ref()
    }

    pub fn get_mut(&mut self, id: ArenaId<T>) -> Option<&mut T> {
        self.data.get_mut(id.ix)?.as_mut()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaId<T>, &T)> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(ix, v)| v.as_ref().map(|v| (ArenaId::new(ix), v)))
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena::new()
    }
}

impl<T> Index<ArenaId<T>> for Arena<T> {
    type Output = T;

    fn index(&self, ix: ArenaId<T>) -> &Self::Output {
        self.get(ix).expect("arena id refers to a removed element")
    }
}

impl<T> IndexMut<ArenaId<T>> for Arena<T> {
    fn index_mut(&mut self, ix: ArenaId<T>) -> &mut T {
        self.get_mut(ix)
            .expect("arena id refers to a removed element")
    }
}

impl<Tag> ArenaId<Tag> {
    fn new(ix: usize) -> Self {
        ArenaId {
            ix,
            tag: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.ix
    }
}

impl<T> Copy for ArenaId<T> {}
impl<T> Clone for ArenaId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for ArenaId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ix == other.ix
    }
}
impl<T> Eq for ArenaId<T> {}

impl<T> Hash for ArenaId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ix.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_ids_are_not_reused() {
        let mut arena = Arena::new();
        let a = arena.push("a");
        let b = arena.push("b");

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.remove(a), None);
        assert!(arena.get(a).is_none());

        let c = arena.push("c");
        assert_ne!(a, c);
        assert_eq!(arena.len(), 2);

        let live: Vec<_> = arena.iter().map(|(id, v)| (id.index(), *v)).collect();
        assert_eq!(live, vec![(b.index(), "b"), (c.index(), "c")]);
    }
}
