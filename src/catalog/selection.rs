use serde::{Deserialize, Serialize};

/// Distinct species ids picked by the trainer, in the order they were picked.
///
/// Full sets ignore additions; a pick has to be removed before another can
/// take its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    ids: Vec<u32>,
    capacity: usize,
}

impl SelectionSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Removes `id` if present, otherwise adds it when there is room.
    /// Returns whether the set changed.
    pub fn toggle(&mut self, id: u32) -> bool {
        if let Some(pos) = self.ids.iter().position(|&selected| selected == id) {
            self.ids.remove(pos);
            true
        } else if self.ids.len() < self.capacity {
            self.ids.push(id);
            true
        } else {
            false
        }
    }

    /// Replaces the contents, dropping duplicates and anything past capacity.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = u32>) {
        self.ids.clear();
        for id in ids {
            if self.ids.len() == self.capacity {
                break;
            }
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
