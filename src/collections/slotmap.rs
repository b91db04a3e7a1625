use std::fmt;

/// Handle into a [`SlotMap`]. A slot reused after a removal gets a new
/// generation, so stale keys miss instead of reaching the new occupant.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    index: u32,
    generation: u32,
}

impl Key {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

const NIL: u32 = u32::MAX;

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    // Err holds the next free slot
    value: Result<T, u32>,
}

#[derive(Debug)]
pub struct SlotMap<T> {
    head: u32,
    len: usize,
    entries: Vec<Entry<T>>,
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotMap<T> {
    pub fn new() -> Self {
        Self { head: NIL, len: 0, entries: vec![] }
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn get(&self, key: Key) -> Option<&T> {
        self.entries
            .get(key.index())
            .filter(|e| e.generation == key.generation)
            .and_then(|e| e.value.as_ref().ok())
    }
    pub fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        self.entries
            .get_mut(key.index())
            .filter(|e| e.generation == key.generation)
            .and_then(|e| e.value.as_mut().ok())
    }
    pub fn contains(&self, key: Key) -> bool {
        self.get(key).is_some()
    }
    pub fn insert(&mut self, value: T) -> Key {
        self.len += 1;
        if let Some(entry) = self.entries.get_mut(self.head as usize) {
            let index = self.head;
            if let Err(next) = core::mem::replace(&mut entry.value, Ok(value)) {
                self.head = next;
            }
            return Key { index, generation: entry.generation };
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry { generation: 0, value: Ok(value) });
        Key { index, generation: 0 }
    }
    pub fn remove(&mut self, key: Key) -> Option<T> {
        let entry = self.entries.get_mut(key.index())?;
        if entry.generation != key.generation || entry.value.is_err() {
            return None;
        }
        entry.generation = entry.generation.wrapping_add(1);
        let old = core::mem::replace(&mut entry.value, Err(self.head));
        self.head = key.index;
        self.len -= 1;
        old.ok()
    }
}

pub struct IterMut<'a, T> {
    entries: core::iter::Enumerate<core::slice::IterMut<'a, Entry<T>>>,
}
impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = (Key, &'a mut T);
    fn next(&mut self) -> Option<Self::Item> {
        for (i, e) in self.entries.by_ref() {
            if let Ok(v) = &mut e.value {
                return Some((Key { index: i as u32, generation: e.generation }, v));
            }
        }
        None
    }
}

pub struct Iter<'a, T> {
    entries: core::iter::Enumerate<core::slice::Iter<'a, Entry<T>>>,
}
impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Key, &'a T);
    fn next(&mut self) -> Option<Self::Item> {
        for (i, e) in self.entries.by_ref() {
            if let Ok(v) = &e.value {
                return Some((Key { index: i as u32, generation: e.generation }, v));
            }
        }
        None
    }
}

impl<T> SlotMap<T> {
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { entries: self.entries.iter().enumerate() }
    }
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut { entries: self.entries.iter_mut().enumerate() }
    }
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.iter().map(|(k, _)| k)
    }
}
