use serde::{Deserialize, Serialize};

/// Stable handle to an organism. The generation field invalidates stale references.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

/// Arena-based organism storage with generational indices and free list.
///
/// The scheduler owns one arena per species; everything else holds `EntityId`s.
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    count: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            count: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            count: 0,
        }
    }

    pub fn spawn(&mut self, value: T) -> EntityId {
        self.count += 1;
        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            self.slots[idx] = Some(value);
            EntityId {
                index,
                generation: self.generations[idx],
            }
        } else {
            // Grow the arena
            let index = self.slots.len() as u32;
            self.slots.push(Some(value));
            self.generations.push(0);
            EntityId {
                index,
                generation: 0,
            }
        }
    }

    /// Remove and return the value; stale or unknown ids yield `None`.
    pub fn despawn(&mut self, id: EntityId) -> Option<T> {
        let idx = id.index as usize;
        if idx < self.slots.len() && self.generations[idx] == id.generation {
            let value = self.slots[idx].take()?;
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.free_list.push(id.index);
            self.count -= 1;
            Some(value)
        } else {
            None
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        let idx = id.index as usize;
        if idx < self.slots.len() && self.generations[idx] == id.generation {
            self.slots[idx].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let idx = id.index as usize;
        if idx < self.slots.len() && self.generations[idx] == id.generation {
            self.slots[idx].as_mut()
        } else {
            None
        }
    }

    /// Borrow two distinct live entries mutably at once.
    pub fn get2_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut T, &mut T)> {
        if a.index == b.index || self.get(a).is_none() || self.get(b).is_none() {
            return None;
        }
        let (lo, hi, swapped) = if a.index < b.index {
            (a.index as usize, b.index as usize, false)
        } else {
            (b.index as usize, a.index as usize, true)
        };
        let (head, tail) = self.slots.split_at_mut(hi);
        let first = head[lo].as_mut()?;
        let second = tail[0].as_mut()?;
        if swapped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over (id, &T) for all live entries.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        let generations = &self.generations;
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            slot.as_ref().map(|value| {
                (
                    EntityId {
                        index: i as u32,
                        generation: generations[i],
                    },
                    value,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        let generations = &self.generations;
        self.slots.iter_mut().enumerate().filter_map(move |(i, slot)| {
            slot.as_mut().map(|value| {
                (
                    EntityId {
                        index: i as u32,
                        generation: generations[i],
                    },
                    value,
                )
            })
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Update-or-despawn pass: every entry the predicate rejects is removed
    /// and returned.
    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) -> Vec<(EntityId, T)> {
        let doomed: Vec<EntityId> = self
            .iter_mut()
            .filter_map(|(id, value)| (!keep(value)).then_some(id))
            .collect();
        doomed
            .into_iter()
            .filter_map(|id| self.despawn(id).map(|value| (id, value)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
