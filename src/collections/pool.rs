use std::{
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
    marker::PhantomData,
    slice::Iter,
};

/// A generational index into a `Pool`.
///
/// Handles to removed slots never resolve again, even once the slot is reused.
pub struct Handle<T> {
    index: usize,
    epoch: usize,
    marker: PhantomData<fn() -> T>,
}

// FIXME: https://github.com/rust-lang/rust/issues/26925
impl<T> Copy for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Handle<T> {
        *self
    }
}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, rhs: &Handle<T>) -> bool {
        self.index == rhs.index && self.epoch == rhs.epoch
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.epoch.hash(state);
    }
}

impl<T> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.epoch)
    }
}

#[derive(Debug)]
struct Entry<T> {
    epoch: usize,
    data: Option<T>,
}

#[derive(Debug)]
pub struct Pool<T> {
    entries: Vec<Entry<T>>,
    free_list: Vec<usize>,
}

impl<T> Default for Pool<T> {
    #[inline]
    fn default() -> Pool<T> {
        Pool {
            entries: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<T> Pool<T> {
    pub fn register(&mut self, data: T) -> Handle<T> {
        if let Some(index) = self.free_list.pop() {
            let entry = &mut self.entries[index];
            entry.epoch += 1;
            entry.data = Some(data);
            Handle {
                index,
                epoch: entry.epoch,
                marker: PhantomData,
            }
        } else {
            let index = self.entries.len();
            self.entries.push(Entry {
                epoch: 1,
                data: Some(data),
            });
            Handle {
                index,
                epoch: 1,
                marker: PhantomData,
            }
        }
    }

    pub fn try_remove(&mut self, handle: Handle<T>) -> Option<T> {
        let entry = self.entries.get_mut(handle.index)?;
        if entry.epoch != handle.epoch || entry.data.is_none() {
            return None;
        }
        self.free_list.push(handle.index);
        entry.data.take()
    }

    #[inline]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.try_get(handle).is_some()
    }

    pub fn try_get(&self, handle: Handle<T>) -> Option<&T> {
        self.entries
            .get(handle.index)
            .filter(|entry| entry.epoch == handle.epoch)
            .and_then(|entry| entry.data.as_ref())
    }

    pub fn try_get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.entries
            .get_mut(handle.index)
            .filter(|entry| entry.epoch == handle.epoch)
            .and_then(|entry| entry.data.as_mut())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len() - self.free_list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn iter(&self) -> PoolIter<T> {
        PoolIter {
            inner: self.entries.iter(),
        }
    }
}

pub struct PoolIter<'a, T: 'a> {
    inner: Iter<'a, Entry<T>>,
}

impl<'a, T> Iterator for PoolIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(next) = self.inner.next() {
                if next.data.is_some() {
                    return next.data.as_ref();
                }
            } else {
                return None;
            }
        }
    }
}
