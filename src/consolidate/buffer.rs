//! The sliding window buffer.
//!
//! The original tool keeps a `std::list<Variant*>` of raw, heap-owned
//! pointers (front = most recently inserted). We replace the pointer chasing
//! with a generational arena of [`Variant`] cells addressed by stable
//! [`VariantId`]s, adapted from `ActiveSet<T>`'s slab style (see
//! `manish59-grit`), plus a `VecDeque<VariantId>` that records front-to-back
//! insertion order. This gives the pending multi-allelic container a stable
//! way to be referenced while still allowing removal from either end.

use std::collections::VecDeque;

use super::variant::Variant;

/// A stable handle into a [`VariantArena`]. Generation-tagged so that a
/// handle into a removed, since-reused slot is detected rather than silently
/// aliasing an unrelated variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantId {
    index: usize,
    generation: u32,
}

enum Slot {
    Occupied { variant: Variant, generation: u32 },
    Vacant { generation: u32 },
}

/// Arena storage for buffered [`Variant`]s.
#[derive(Default)]
struct VariantArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl VariantArena {
    fn insert(&mut self, variant: Variant) -> VariantId {
        if let Some(index) = self.free.pop() {
            let generation = match &self.slots[index] {
                Slot::Vacant { generation } => *generation,
                Slot::Occupied { .. } => unreachable!("free list pointed at an occupied slot"),
            };
            self.slots[index] = Slot::Occupied { variant, generation };
            VariantId { index, generation }
        } else {
            let index = self.slots.len();
            self.slots.push(Slot::Occupied {
                variant,
                generation: 0,
            });
            VariantId {
                index,
                generation: 0,
            }
        }
    }

    fn remove(&mut self, id: VariantId) -> Variant {
        let slot = std::mem::replace(
            &mut self.slots[id.index],
            Slot::Vacant {
                generation: id.generation.wrapping_add(1),
            },
        );
        self.free.push(id.index);
        match slot {
            Slot::Occupied { variant, generation } if generation == id.generation => variant,
            _ => panic!("stale VariantId passed to VariantArena::remove"),
        }
    }

    fn get(&self, id: VariantId) -> &Variant {
        match &self.slots[id.index] {
            Slot::Occupied { variant, generation } if *generation == id.generation => variant,
            _ => panic!("stale VariantId passed to VariantArena::get"),
        }
    }

    fn get_mut(&mut self, id: VariantId) -> &mut Variant {
        match &mut self.slots[id.index] {
            Slot::Occupied { variant, generation } if *generation == id.generation => variant,
            _ => panic!("stale VariantId passed to VariantArena::get_mut"),
        }
    }
}

/// Ordered sequence of buffered variants, front = most recently inserted.
#[derive(Default)]
pub struct WindowBuffer {
    arena: VariantArena,
    /// Front-to-back insertion order; the tail is the oldest entry.
    order: VecDeque<VariantId>,
}

impl WindowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn push_front(&mut self, variant: Variant) -> VariantId {
        let id = self.arena.insert(variant);
        self.order.push_front(id);
        id
    }

    /// Ids in front-to-back order, snapshotted at call time so that a
    /// container spawned mid-walk (pushed to the front) is never visited
    /// during the walk that spawned it — it only interacts with later
    /// input, matching the original's iterator-stability behavior.
    pub fn ids_front_to_back(&self) -> Vec<VariantId> {
        self.order.iter().copied().collect()
    }

    pub fn back_id(&self) -> Option<VariantId> {
        self.order.back().copied()
    }

    pub fn pop_back(&mut self) -> Option<Variant> {
        let id = self.order.pop_back()?;
        Some(self.arena.remove(id))
    }

    pub fn get(&self, id: VariantId) -> &Variant {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: VariantId) -> &mut Variant {
        self.arena.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::variant::VariantState;
    use crate::vcf::VariantRecord;

    fn variant(pos1: usize) -> Variant {
        Variant::new(
            0,
            pos1 as i64,
            pos1 as i64,
            VariantState::Snp,
            VariantRecord::new_site("chr1", pos1, "A", vec!["C".to_string()]).unwrap(),
        )
    }

    #[test]
    fn push_front_then_pop_back_is_fifo() {
        let mut buf = WindowBuffer::new();
        buf.push_front(variant(100));
        buf.push_front(variant(200));
        buf.push_front(variant(300));

        assert_eq!(buf.pop_back().unwrap().beg1, 100);
        assert_eq!(buf.pop_back().unwrap().beg1, 200);
        assert_eq!(buf.pop_back().unwrap().beg1, 300);
        assert!(buf.is_empty());
    }

    #[test]
    fn front_to_back_order_matches_insertion() {
        let mut buf = WindowBuffer::new();
        buf.push_front(variant(100));
        buf.push_front(variant(200));
        let ids = buf.ids_front_to_back();
        assert_eq!(buf.get(ids[0]).beg1, 200);
        assert_eq!(buf.get(ids[1]).beg1, 100);
    }

    #[test]
    fn reused_slot_gets_a_fresh_generation() {
        let mut buf = WindowBuffer::new();
        let id_a = buf.push_front(variant(100));
        buf.pop_back();
        let id_b = buf.push_front(variant(200));
        assert_eq!(buf.get(id_b).beg1, 200);
        assert_ne!(id_a, id_b);
    }
}
