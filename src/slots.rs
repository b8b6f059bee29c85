use alloc::vec::Vec;

use crate::probe::distance;

/// An occupied slot.
///
/// `hash` is the full digest computed when the key was inserted, cached so
/// growth never has to call the hasher again. `home` is always
/// `hash & (capacity - 1)` for the capacity of the store holding the entry.
#[derive(Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u64,
    pub(crate) home: usize,
    pub(crate) key: K,
    pub(crate) value: V,
}

pub(crate) type Slot<K, V> = Option<Entry<K, V>>;

/// Fixed-capacity slot array.
///
/// The length of `slots` is always a power of two. The store does not track
/// how many slots are occupied; `HashTable` owns that count.
#[derive(Clone)]
pub(crate) struct SlotStore<K, V> {
    slots: Vec<Slot<K, V>>,
    mask: usize,
}

impl<K, V> SlotStore<K, V> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            mask: capacity - 1,
        }
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    pub(crate) fn home_of(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Index `offset` slots after `base`, wrapping at the capacity.
    #[inline(always)]
    pub(crate) fn wrap(&self, base: usize, offset: usize) -> usize {
        base.wrapping_add(offset) & self.mask
    }

    #[inline(always)]
    pub(crate) fn get(&self, index: usize) -> Option<&Entry<K, V>> {
        self.slots[index].as_ref()
    }

    /// The entry at `index`, which the caller knows is occupied.
    #[inline(always)]
    pub(crate) fn occupied(&self, index: usize) -> &Entry<K, V> {
        match &self.slots[index] {
            Some(entry) => entry,
            None => unreachable!("slot {index} is empty"),
        }
    }

    #[inline(always)]
    pub(crate) fn occupied_mut(&mut self, index: usize) -> &mut Entry<K, V> {
        match &mut self.slots[index] {
            Some(entry) => entry,
            None => unreachable!("slot {index} is empty"),
        }
    }

    #[inline(always)]
    pub(crate) fn is_empty_at(&self, index: usize) -> bool {
        self.slots[index].is_none()
    }

    /// Stores `entry` at `index`, which must be empty.
    pub(crate) fn set(&mut self, index: usize, entry: Entry<K, V>) -> &mut Entry<K, V> {
        debug_assert!(self.slots[index].is_none());
        self.slots[index].insert(entry)
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.slots.swap(a, b);
    }

    /// Empties the slot at `index`, which the caller knows is occupied.
    pub(crate) fn take_occupied(&mut self, index: usize) -> Entry<K, V> {
        match self.slots[index].take() {
            Some(entry) => entry,
            None => unreachable!("slot {index} is empty"),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Replaces the backing array with `new_capacity` empty slots and returns
    /// the previous contents, paired with each entry's old offset from home.
    pub(crate) fn rebuild(
        &mut self,
        new_capacity: usize,
    ) -> impl Iterator<Item = (usize, Entry<K, V>)> + use<K, V> {
        let old_capacity = self.capacity();
        let old = core::mem::replace(self, Self::new(new_capacity));
        old.slots
            .into_iter()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.map(|entry| (distance(entry.home, index, old_capacity), entry))
            })
    }

    pub(crate) fn as_slice(&self) -> &[Slot<K, V>] {
        &self.slots
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Slot<K, V>] {
        &mut self.slots
    }

    pub(crate) fn into_vec(self) -> Vec<Slot<K, V>> {
        self.slots
    }
}
