use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Name to value map for passing data between scenes. Last writer wins.
#[derive(Default)]
pub struct ScratchStore {
    values: HashMap<String, Box<dyn Any>>,
}

impl ScratchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when an existing value was replaced.
    pub fn store<T: Any>(&mut self, key: impl Into<String>, value: T) -> bool {
        self.values.insert(key.into(), Box::new(value)).is_some()
    }

    /// `None` when the key is absent or holds a value of another type.
    pub fn retrieve<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref::<T>()
    }

    pub fn retrieve_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut::<T>()
    }

    /// Removes and returns the value only if it has type `T`.
    pub fn take<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.values.get(key)?.is::<T>() {
            return None;
        }
        let boxed = self.values.remove(key)?;
        boxed.downcast::<T>().ok().map(|value| *value)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Debug for ScratchStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("ScratchStore").field("keys", &keys).finish()
    }
}
