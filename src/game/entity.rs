//! Entity Handles
//!
//! Entities are generational indices. A slot is recycled once its entity is
//! destroyed, and the generation bump makes stale handles harmless: a bullet
//! that still remembers its dead owner won't resolve to whatever Met
//! took over the slot.

use serde::{Serialize, Deserialize};
use std::fmt;

/// Handle to a game entity: slot index plus the generation of that slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Only the allocator (and tests) mint handles.
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Placeholder for "no entity" (unset owner, no target)
    pub const NULL: Entity = Entity { index: u32::MAX, generation: 0 };

    pub fn is_null(&self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index, self.generation)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u32,
    occupied: bool,
}

/// Hands out entity slots and tracks which handles are still alive.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    slots: Vec<Slot>,
    /// Vacant slot indices, reused most-recent first
    vacant: Vec<u32>,
    live: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self { slots: Vec::new(), vacant: Vec::new(), live: 0 }
    }

    pub fn allocate(&mut self) -> Entity {
        let index = match self.vacant.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.occupied = true;
        self.live += 1;
        Entity::new(index, slot.generation)
    }

    /// Release an entity's slot. Returns false for dead or stale handles,
    /// so a double destroy is a no-op.
    pub fn free(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slot_mut(entity) else {
            return false;
        };
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(entity.index);
        self.live -= 1;
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == entity.generation)
    }

    pub fn alive_count(&self) -> u32 {
        self.live
    }

    fn slot_mut(&mut self, entity: Entity) -> Option<&mut Slot> {
        self.slots
            .get_mut(entity.index as usize)
            .filter(|slot| slot.occupied && slot.generation == entity.generation)
    }

    /// Kill every entity at once (level unload).
    pub fn clear(&mut self) {
        self.vacant.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.occupied {
                slot.occupied = false;
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.vacant.push(index as u32);
        }
        self.live = 0;
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_free() {
        let mut alloc = EntityAllocator::new();

        let megaman = alloc.allocate();
        let met = alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);

        assert!(alloc.free(megaman));
        assert_eq!(alloc.alive_count(), 1);
        assert!(!alloc.is_alive(megaman));
        assert!(alloc.is_alive(met));
    }

    #[test]
    fn test_double_free_is_rejected() {
        let mut alloc = EntityAllocator::new();
        let bullet = alloc.allocate();
        assert!(alloc.free(bullet));
        assert!(!alloc.free(bullet));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn test_recycled_slot_gets_new_generation() {
        let mut alloc = EntityAllocator::new();

        let old = alloc.allocate();
        alloc.free(old);

        let recycled = alloc.allocate();
        assert_eq!(recycled.index(), old.index());
        assert_ne!(recycled.generation(), old.generation());
        assert!(!alloc.is_alive(old));
        assert!(alloc.is_alive(recycled));
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        alloc.free(b);
        alloc.clear();

        assert!(!alloc.is_alive(a));
        assert!(!alloc.is_alive(b));
        assert_eq!(alloc.alive_count(), 0);

        // Both slots come back
        let c = alloc.allocate();
        let d = alloc.allocate();
        assert_ne!(c.index(), d.index());
        assert_eq!(alloc.alive_count(), 2);
    }

    #[test]
    fn test_null_entity() {
        let alloc = EntityAllocator::new();
        assert!(!alloc.is_alive(Entity::NULL));
        assert!(Entity::NULL.is_null());
        assert_eq!(Entity::default(), Entity::NULL);
    }
}
