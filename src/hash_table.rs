#[cfg(any(test, feature = "stats"))]
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::ops::Index;
use core::ops::IndexMut;

use crate::DefaultHashBuilder;
use crate::config::Config;
use crate::error::ConfigError;
use crate::error::InsertError;
use crate::observer::Event;
use crate::observer::NoopObserver;
use crate::observer::Observer;
use crate::probe::Location;
use crate::probe::distance;
use crate::probe::locate;
use crate::slots::Entry as SlotEntry;
use crate::slots::Slot;
use crate::slots::SlotStore;

/// Where a key lives, or where it will go once inserted.
enum Placement {
    Occupied(usize),
    Vacant { index: usize, home: usize },
}

/// A hash map using hopscotch hashing.
///
/// Every entry lives fewer than `hop_limit` slots after its home bucket
/// (`hash mod capacity`), so a lookup inspects at most `add_limit` slots.
/// When an insertion finds a hole too far from its home, occupied slots in
/// between are hopped forward into the hole until it is close enough. If no
/// hole exists in the probe window, or hopping gets stuck, the table doubles.
///
/// The table never shrinks.
///
/// # Examples
///
/// ```rust
/// use hopscotch_table::HashTable;
///
/// let mut table = HashTable::new();
/// table.insert("f", 1);
/// table.insert("p", 1);
/// assert_eq!(table.insert("f", 2), Some(1));
///
/// assert_eq!(table.get("f"), Some(&2));
/// assert!(table.erase("p"));
/// assert!(!table.erase("p"));
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Clone)]
pub struct HashTable<K, V, S = DefaultHashBuilder, O = NoopObserver> {
    slots: SlotStore<K, V>,
    len: usize,
    hop_limit: usize,
    add_limit: usize,
    hash_builder: S,
    observer: O,
}

impl<K, V, S, O> Debug for HashTable<K, V, S, O>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<K, V> HashTable<K, V, DefaultHashBuilder, NoopObserver> {
    /// Creates an empty table with [`DEFAULT_CAPACITY`](crate::DEFAULT_CAPACITY)
    /// slots and the default hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with at least `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` cannot be rounded up to a power of two.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hopscotch_table::HashTable;
    ///
    /// let table: HashTable<u32, u32> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Creates an empty table from `config` with the default hasher.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashTable<K, V, S, NoopObserver> {
    /// Creates an empty table with the default capacity that hashes keys
    /// with `hash_builder`.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::from_valid_config(Config::default(), hash_builder, NoopObserver)
    }

    /// Creates an empty table with at least `capacity` slots that hashes keys
    /// with `hash_builder`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` cannot be rounded up to a power of two.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        match Self::with_config_and_hasher(
            Config::default().with_initial_capacity(capacity),
            hash_builder,
        ) {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates an empty table from `config` that hashes keys with
    /// `hash_builder`.
    pub fn with_config_and_hasher(config: Config, hash_builder: S) -> Result<Self, ConfigError> {
        Self::with_config_hasher_and_observer(config, hash_builder, NoopObserver)
    }
}

impl<K, V, S, O> HashTable<K, V, S, O> {
    /// Creates an empty table from `config` that hashes keys with
    /// `hash_builder` and reports structural changes to `observer`.
    pub fn with_config_hasher_and_observer(
        config: Config,
        hash_builder: S,
        observer: O,
    ) -> Result<Self, ConfigError> {
        Ok(Self::from_valid_config(
            config.validate()?,
            hash_builder,
            observer,
        ))
    }

    fn from_valid_config(config: Config, hash_builder: S, observer: O) -> Self {
        Self {
            slots: SlotStore::new(config.initial_capacity()),
            len: 0,
            hop_limit: config.hop_limit(),
            add_limit: config.add_limit(),
            hash_builder,
            observer,
        }
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots. Always a power of two, and never
    /// decreases over the lifetime of the table.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the neighborhood width.
    pub fn hop_limit(&self) -> usize {
        self.hop_limit
    }

    /// Returns the probe window width.
    pub fn add_limit(&self) -> usize {
        self.add_limit
    }

    /// Returns the table's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the table's observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Removes every entry, keeping the capacity.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
    }

    /// Returns an iterator over the entries in slot order.
    ///
    /// The order depends only on the current slot layout, so it changes
    /// whenever an insertion hops or grows, or an entry is erased. The
    /// iterator is double-ended: `rev()` walks the slots from the end.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hopscotch_table::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// for c in 'a'..='e' {
    ///     table.insert(c, c as u32);
    /// }
    ///
    /// let forward: Vec<char> = table.iter().map(|(k, _)| *k).collect();
    /// let mut backward: Vec<char> = table.iter().rev().map(|(k, _)| *k).collect();
    /// backward.reverse();
    /// assert_eq!(forward, backward);
    /// assert_eq!(forward.len(), 5);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.as_slice().iter(),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the entries in slot order with mutable
    /// references to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            slots: self.slots.as_mut_slice().iter_mut(),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the keys in slot order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in slot order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values in slot
    /// order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes every entry and yields them in slot order.
    ///
    /// Entries the iterator has not yielded when it is dropped are dropped
    /// too; the table is empty afterwards either way.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hopscotch_table::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.insert(1, "a");
    /// table.insert(2, "b");
    ///
    /// let mut drained: Vec<(i32, &str)> = table.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, [(1, "a"), (2, "b")]);
    /// assert!(table.is_empty());
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        let remaining = core::mem::take(&mut self.len);
        Drain {
            slots: self.slots.as_mut_slice().iter_mut(),
            remaining,
        }
    }

    /// Places a new entry in the empty slot at `index`.
    fn place(
        &mut self,
        index: usize,
        home: usize,
        hash: u64,
        key: K,
        value: V,
    ) -> &mut SlotEntry<K, V>
    where
        O: Observer,
    {
        self.len += 1;
        self.observer.on_event(Event::Insert { home, index });
        self.slots.set(
            index,
            SlotEntry {
                hash,
                home,
                key,
                value,
            },
        )
    }

    /// Walks the hole at `hole` backward toward `home` until it sits inside
    /// the neighborhood of `home`.
    ///
    /// Each step moves the first entry in the `hop_limit - 1` slots before
    /// the hole that may legally live in the hole. Returns the final hole, or
    /// `None` when no such entry exists.
    fn hop(&mut self, home: usize, mut hole: usize) -> Option<usize>
    where
        O: Observer,
    {
        let capacity = self.slots.capacity();
        loop {
            let offset = distance(home, hole, capacity);
            if offset < self.hop_limit {
                return Some(hole);
            }

            let start = offset - (self.hop_limit - 1);
            let movable = (start..offset)
                .map(|off| self.slots.wrap(home, off))
                .find(|&candidate| {
                    self.slots.get(candidate).is_some_and(|entry| {
                        distance(entry.home, hole, capacity) < self.hop_limit
                    })
                })?;

            self.slots.swap(movable, hole);
            self.observer.on_event(Event::Hop {
                from: movable,
                to: hole,
            });
            hole = movable;
        }
    }

    /// Doubles the capacity, keeping every entry at the same offset from its
    /// recomputed home.
    ///
    /// The home bucket under the doubled capacity is either the old home or
    /// the old home plus the old capacity, so an entry that was at `p` lands
    /// on `p` or `p + old_capacity`. Distinct old slots therefore never
    /// collide, and offsets (and with them the neighborhood invariant) carry
    /// over unchanged.
    fn grow(&mut self) -> Result<(), InsertError>
    where
        O: Observer,
    {
        let old_capacity = self.slots.capacity();
        let new_capacity = old_capacity
            .checked_mul(2)
            .ok_or(InsertError::CapacityOverflow {
                capacity: old_capacity,
            })?;

        for (offset, mut entry) in self.slots.rebuild(new_capacity) {
            entry.home = self.slots.home_of(entry.hash);
            let target = self.slots.wrap(entry.home, offset);
            assert!(
                self.slots.is_empty_at(target),
                "growth moved two entries to slot {target}"
            );
            self.slots.set(target, entry);
        }

        self.observer.on_event(Event::Grow {
            old_capacity,
            new_capacity,
        });

        Ok(())
    }

    /// Finds the slot holding a matching key, or makes room for one, hopping
    /// and growing as needed.
    fn prepare(&mut self, hash: u64, eq: impl Fn(&K) -> bool) -> Result<Placement, InsertError>
    where
        O: Observer,
    {
        loop {
            let (home, location) = locate(&self.slots, hash, self.add_limit, &eq);
            let hole = match location {
                Location::Found(index) => return Ok(Placement::Occupied(index)),
                Location::Vacant(hole) => hole,
                Location::Full => {
                    self.grow_for(hash, home)?;
                    continue;
                }
            };

            if let Some(index) = self.hop(home, hole) {
                return Ok(Placement::Vacant { index, home });
            }
            self.grow_for(hash, home)?;
        }
    }

    /// Grows the table to make room for a key with digest `hash`, unless the
    /// neighborhood of `home` is already filled with entries whose digests
    /// agree with it in every bit a home bucket can use.
    fn grow_for(&mut self, hash: u64, home: usize) -> Result<(), InsertError>
    where
        O: Observer,
    {
        let same_digest = (0..self.hop_limit.min(self.slots.capacity()))
            .filter_map(|off| self.slots.get(self.slots.wrap(home, off)))
            .filter(|entry| entry.hash as usize == hash as usize)
            .count();
        if same_digest >= self.hop_limit {
            return Err(InsertError::SaturatedNeighborhood {
                hash,
                hop_limit: self.hop_limit,
            });
        }

        self.grow()
    }
}

impl<K, V, S, O> HashTable<K, V, S, O>
where
    K: Hash + Eq,
    S: BuildHasher,
    O: Observer,
{
    /// Inserts a key-value pair, returning the previous value if the key was
    /// already present. An existing entry keeps its slot; only the value is
    /// replaced.
    ///
    /// # Panics
    ///
    /// Panics where [`try_insert`](HashTable::try_insert) would return an
    /// error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hopscotch_table::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// assert_eq!(table.insert("q", 1), None);
    /// assert_eq!(table.insert("q", 2), Some(1));
    /// assert_eq!(table["q"], 2);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(previous) => previous,
            Err(err) => panic!("{err}"),
        }
    }

    /// Inserts a key-value pair, returning the previous value if the key was
    /// already present.
    ///
    /// Fails if the table would have to grow past `usize::MAX` slots, or if
    /// `hop_limit` keys already share this key's digest (growing cannot
    /// separate identical digests). On failure the key is not inserted, but
    /// the table may already have grown, and hops may already have moved
    /// other entries to new slots within their neighborhoods.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use core::hash::BuildHasherDefault;
    /// use core::hash::Hasher;
    ///
    /// use hopscotch_table::Config;
    /// use hopscotch_table::HashTable;
    /// use hopscotch_table::InsertError;
    ///
    /// #[derive(Default)]
    /// struct Constant;
    ///
    /// impl Hasher for Constant {
    ///     fn finish(&self) -> u64 {
    ///         7
    ///     }
    ///     fn write(&mut self, _: &[u8]) {}
    /// }
    ///
    /// let mut table = HashTable::with_config_and_hasher(
    ///     Config::default().with_hop_limit(2),
    ///     BuildHasherDefault::<Constant>::default(),
    /// )
    /// .unwrap();
    /// assert!(table.try_insert(1, ()).is_ok());
    /// assert!(table.try_insert(2, ()).is_ok());
    /// assert!(matches!(
    ///     table.try_insert(3, ()),
    ///     Err(InsertError::SaturatedNeighborhood { .. })
    /// ));
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        let hash = self.hash_builder.hash_one(&key);
        match self.prepare(hash, |k| *k == key)? {
            Placement::Occupied(index) => Ok(Some(core::mem::replace(
                &mut self.slots.occupied_mut(index).value,
                value,
            ))),
            Placement::Vacant { index, home } => {
                self.place(index, home, hash, key, value);
                Ok(None)
            }
        }
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// Finding room for a vacant key happens here, so the table may already
    /// have hopped or grown when this returns, even if the entry is never
    /// inserted.
    ///
    /// # Panics
    ///
    /// Panics where [`try_entry`](HashTable::try_entry) would return an
    /// error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hopscotch_table::HashTable;
    ///
    /// let mut counts = HashTable::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts["a"], 2);
    /// assert_eq!(counts["b"], 1);
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S, O> {
        match self.try_entry(key) {
            Ok(entry) => entry,
            Err(err) => panic!("{err}"),
        }
    }

    /// Gets the entry for `key`, failing where
    /// [`try_insert`](HashTable::try_insert) would.
    pub fn try_entry(&mut self, key: K) -> Result<Entry<'_, K, V, S, O>, InsertError> {
        let hash = self.hash_builder.hash_one(&key);
        Ok(match self.prepare(hash, |k| *k == key)? {
            Placement::Occupied(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Placement::Vacant { index, home } => Entry::Vacant(VacantEntry {
                table: self,
                key,
                hash,
                home,
                index,
            }),
        })
    }

    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.len == 0 {
            return None;
        }

        let hash = self.hash_builder.hash_one(key);
        match locate(&self.slots, hash, self.add_limit, |k| k.borrow() == key) {
            (_, Location::Found(index)) => Some(index),
            _ => None,
        }
    }

    /// Returns a reference to the value for `key`, or `None` if absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hopscotch_table::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.insert(String::from("C"), 1);
    /// assert_eq!(table.get("C"), Some(&1));
    /// assert_eq!(table.get("not present"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key)
            .map(|index| &self.slots.occupied(index).value)
    }

    /// Returns the stored key and its value for `key`, or `None` if absent.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).map(|index| {
            let entry = self.slots.occupied(index);
            (&entry.key, &entry.value)
        })
    }

    /// Returns a mutable reference to the value for `key`, or `None` if
    /// absent.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        Some(&mut self.slots.occupied_mut(index).value)
    }

    /// Returns `true` if the table contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    /// Removes `key`, returning `true` if it was present. Erasing an absent
    /// key is a no-op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hopscotch_table::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.insert("f", 1);
    /// assert!(table.erase("f"));
    /// assert!(!table.erase("f"));
    /// assert!(!table.contains_key("f"));
    /// ```
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        let entry = self.take_at(index);
        Some((entry.key, entry.value))
    }

    /// Grows the table until it has at least `len() + additional` slots.
    ///
    /// # Panics
    ///
    /// Panics if the required capacity overflows `usize`.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.len.saturating_add(additional);
        while self.slots.capacity() < required {
            if let Err(err) = self.grow() {
                panic!("{err}");
            }
        }
    }
}

impl<K, V, S, O> HashTable<K, V, S, O>
where
    O: Observer,
{
    fn take_at(&mut self, index: usize) -> SlotEntry<K, V> {
        let entry = self.slots.take_occupied(index);
        self.len -= 1;
        self.observer.on_event(Event::Erase { index });
        entry
    }
}

#[cfg(any(test, feature = "stats"))]
impl<K, V, S, O> HashTable<K, V, S, O> {
    /// Counts entries by their offset from home.
    ///
    /// Bin `i` holds the number of entries stored `i` slots after their home
    /// bucket; there are `hop_limit` bins.
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let capacity = self.slots.capacity();
        let mut counts = alloc::vec![0usize; self.hop_limit];
        for (index, slot) in self.slots.as_slice().iter().enumerate() {
            if let Some(entry) = slot {
                counts[distance(entry.home, index, capacity)] += 1;
            }
        }
        ProbeHistogram { counts }
    }

    /// Returns population and load statistics.
    pub fn debug_stats(&self) -> DebugStats {
        let capacity = self.slots.capacity();
        DebugStats {
            populated: self.len,
            capacity,
            hop_limit: self.hop_limit,
            add_limit: self.add_limit,
            load_factor: self.len as f64 / capacity as f64,
            total_bytes: capacity * core::mem::size_of::<Slot<K, V>>(),
        }
    }
}

/// Entries per offset from home. See [`HashTable::probe_histogram`].
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    /// `counts[i]` is the number of entries `i` slots after their home.
    pub counts: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Pretty-prints the histogram as horizontal bars on stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        let total: usize = self.counts.iter().sum();
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        println!("probe histogram ({total} entries):");
        let max_bar = 60usize;
        for (offset, &count) in self.counts.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{offset:>2} | {} ({count})", "█".repeat(width));
        }
    }
}

/// Debug statistics for hash table analysis.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries in the table
    pub populated: usize,
    /// Number of slots
    pub capacity: usize,
    /// Neighborhood width
    pub hop_limit: usize,
    /// Probe window width
    pub add_limit: usize,
    /// populated / capacity
    pub load_factor: f64,
    /// Bytes used by the slot array
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Limits: hop {} / probe window {}",
            self.hop_limit, self.add_limit
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

impl<K, V, S, O> Default for HashTable<K, V, S, O>
where
    S: Default,
    O: Default,
{
    fn default() -> Self {
        Self::from_valid_config(Config::default(), S::default(), O::default())
    }
}

impl<K, V, S, O> PartialEq for HashTable<K, V, S, O>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    O: Observer,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, S, O> Eq for HashTable<K, V, S, O>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    O: Observer,
{
}

impl<K, Q, V, S, O> Index<&Q> for HashTable<K, V, S, O>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
    O: Observer,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if `key` is not present. Use [`HashTable::get`] when absence is
    /// an expected outcome.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in HashTable")
    }
}

impl<K, Q, V, S, O> IndexMut<&Q> for HashTable<K, V, S, O>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
    O: Observer,
{
    /// # Panics
    ///
    /// Panics if `key` is not present.
    fn index_mut(&mut self, key: &Q) -> &mut V {
        self.get_mut(key).expect("key not present in HashTable")
    }
}

impl<K, V, S, O> Extend<(K, V)> for HashTable<K, V, S, O>
where
    K: Hash + Eq,
    S: BuildHasher,
    O: Observer,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S, O> FromIterator<(K, V)> for HashTable<K, V, S, O>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    O: Observer + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<'a, K, V, S, O> IntoIterator for &'a HashTable<K, V, S, O> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, O> IntoIterator for &'a mut HashTable<K, V, S, O> {
    type IntoIter = IterMut<'a, K, V>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S, O> IntoIterator for HashTable<K, V, S, O> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.len,
            slots: self.slots.into_vec().into_iter(),
        }
    }
}

/// A view into a single entry in the table, which may be vacant or occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, K, V, S, O> {
    /// The key is absent; room for it has been made.
    Vacant(VacantEntry<'a, K, V, S, O>),
    /// The key is present.
    Occupied(OccupiedEntry<'a, K, V, S, O>),
}

impl<'a, K, V, S, O> Entry<'a, K, V, S, O>
where
    O: Observer,
{
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, S, O> Entry<'a, K, V, S, O>
where
    V: Default,
    O: Observer,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry. The slot it will fill is already reserved
/// within the key's neighborhood.
pub struct VacantEntry<'a, K, V, S, O> {
    table: &'a mut HashTable<K, V, S, O>,
    key: K,
    hash: u64,
    home: usize,
    index: usize,
}

impl<'a, K, V, S, O> VacantEntry<'a, K, V, S, O>
where
    O: Observer,
{
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the table and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry {
            table,
            key,
            hash,
            home,
            index,
        } = self;
        &mut table.place(index, home, hash, key, value).value
    }
}

/// A view into an occupied entry.
pub struct OccupiedEntry<'a, K, V, S, O> {
    table: &'a mut HashTable<K, V, S, O>,
    index: usize,
}

impl<'a, K, V, S, O> OccupiedEntry<'a, K, V, S, O>
where
    O: Observer,
{
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.table.slots.occupied(self.index).key
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.table.slots.occupied(self.index).value
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.table.slots.occupied_mut(self.index).value
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.table.slots.occupied_mut(self.index).value
    }

    /// Replaces the value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the table and returns the value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the table and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        let entry = self.table.take_at(self.index);
        (entry.key, entry.value)
    }
}

/// An iterator over the entries of a [`HashTable`] in slot order.
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots.find_map(Option::as_ref)?;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.next_back() {
            if let Some(entry) = slot {
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }
        }
        None
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of a [`HashTable`] in slot order.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(entry) = slot {
                self.remaining -= 1;
                return Some((&entry.key, &mut entry.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.next_back() {
            if let Some(entry) = slot {
                self.remaining -= 1;
                return Some((&entry.key, &mut entry.value));
            }
        }
        None
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a [`HashTable`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`HashTable`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a [`HashTable`].
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// An owning iterator over the entries of a [`HashTable`] in slot order.
pub struct IntoIter<K, V> {
    slots: alloc::vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((entry.key, entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.next_back() {
            if let Some(entry) = slot {
                self.remaining -= 1;
                return Some((entry.key, entry.value));
            }
        }
        None
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// A draining iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Drop for Drain<'_, K, V> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(entry) = slot.take() {
                self.remaining -= 1;
                return Some((entry.key, entry.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Drain<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.next_back() {
            if let Some(entry) = slot.take() {
                self.remaining -= 1;
                return Some((entry.key, entry.value));
            }
        }
        None
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}
impl<K, V> FusedIterator for Drain<'_, K, V> {}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::BuildHasherDefault;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::DEFAULT_CAPACITY;
    use crate::DEFAULT_HOP_LIMIT;

    #[derive(Clone)]
    struct SipHashBuilder {
        k0: u64,
        k1: u64,
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    /// Hashes a `u64` key to itself, so tests choose home buckets directly.
    #[derive(Default)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | b as u64;
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
    }

    type Identity = BuildHasherDefault<IdentityHasher>;

    #[derive(Default)]
    struct ConstantHasher;

    impl Hasher for ConstantHasher {
        fn finish(&self) -> u64 {
            7
        }

        fn write(&mut self, _: &[u8]) {}
    }

    #[derive(Default, Clone)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl Observer for Recorder {
        fn on_event(&mut self, event: Event) {
            self.events.push(event);
        }
    }

    fn identity_table(capacity: usize) -> HashTable<u64, u64, Identity, Recorder> {
        HashTable::with_config_hasher_and_observer(
            Config::default().with_initial_capacity(capacity),
            Identity::default(),
            Recorder::default(),
        )
        .unwrap()
    }

    fn assert_invariants<K, V, S, O>(table: &HashTable<K, V, S, O>)
    where
        K: Hash + Eq,
        S: BuildHasher,
        O: Observer,
    {
        let capacity = table.capacity();
        assert!(capacity.is_power_of_two());
        assert!(table.len() <= capacity);

        let mut occupied = 0;
        for (index, slot) in table.slots.as_slice().iter().enumerate() {
            if let Some(entry) = slot {
                occupied += 1;
                let hash = table.hash_builder.hash_one(&entry.key);
                assert_eq!(entry.hash, hash);
                assert_eq!(entry.home, hash as usize & (capacity - 1));
                assert!(
                    distance(entry.home, index, capacity) < table.hop_limit,
                    "entry at {index} is too far from home {}",
                    entry.home
                );
                assert_eq!(table.find_index(&entry.key), Some(index));
            }
        }
        assert_eq!(occupied, table.len());
    }

    #[test]
    fn insert_and_get() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        for k in 0..32u64 {
            assert_eq!(table.insert(k, k * 2), None);
            assert_eq!(table.get(&k), Some(&(k * 2)), "{:#?}", table);
        }
        assert_eq!(table.len(), 32);
        assert_invariants(&table);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        let mut capacity = table.capacity();
        for k in 0..20000u64 {
            table.insert(k, k as i32);
            assert!(table.capacity() >= capacity);
            assert!(table.capacity().is_power_of_two());
            capacity = table.capacity();
        }

        assert_eq!(table.len(), 20000);
        assert!(table.capacity() > DEFAULT_CAPACITY);
        for k in 0..20000u64 {
            assert_eq!(table.get(&k), Some(&(k as i32)));
        }
        assert_invariants(&table);
    }

    #[test]
    fn last_insert_wins() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        for round in 0..3u64 {
            for k in 0..100u64 {
                table.insert(k, k + round);
            }
        }
        assert_eq!(table.len(), 100);
        for k in 0..100u64 {
            assert_eq!(table[&k], k + 2);
        }
    }

    #[test]
    fn single_character_keys() {
        let mut table = HashTable::new();
        for c in 'a'..='z' {
            table.insert(c.to_string(), c as i32);
            assert_invariants(&table);
        }
        assert_eq!(table.len(), 26);
        for c in 'a'..='z' {
            assert_eq!(table.get(c.to_string().as_str()), Some(&(c as i32)));
        }
    }

    #[test]
    fn overwrite_erase_reinsert() {
        let mut table = HashTable::new();
        for c in ('a'..='z').chain('A'..='Z') {
            table.insert(c.to_string(), c as i32);
        }

        for key in ["f", "p", "q", "C"] {
            table.insert(key.to_string(), 1);
        }
        let before = table.len();
        for key in ["f", "p", "q", "C"] {
            assert_eq!(table.insert(key.to_string(), 2), Some(1));
        }
        assert_eq!(table.len(), before);
        for key in ["f", "p", "q", "C"] {
            assert_eq!(table.get(key), Some(&2));
        }

        assert!(table.erase("f"));
        assert!(table.erase("C"));
        assert!(!table.erase("f"));
        assert!(!table.contains_key("f"));
        assert_eq!(table.len(), before - 2);

        table.insert("f".to_string(), 3);
        assert!(table.contains_key("f"));
        assert_eq!(table.get("f"), Some(&3));
        assert_invariants(&table);
    }

    #[test]
    fn erase_absent_key_leaves_table_unchanged() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        for k in 0..50u64 {
            table.insert(k, k);
        }
        let snapshot = table.clone();
        assert!(!table.erase(&1000));
        assert_eq!(table.remove(&1000), None);
        assert!(table == snapshot);
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            snapshot.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn get_on_empty_table() {
        let table: HashTable<String, i32> = HashTable::new();
        assert_eq!(table.get("not present"), None);
        assert!(!table.contains_key("this key is not in the map"));
    }

    #[test]
    #[should_panic(expected = "key not present")]
    fn index_panics_on_absent_key() {
        let mut table = HashTable::new();
        table.insert(1u32, 1u32);
        let _ = table[&2];
    }

    #[test]
    fn index_mut_updates_value() {
        let mut table = HashTable::new();
        table.insert("a".to_string(), 1);
        table["a"] = 1000;
        assert_eq!(table.get("a"), Some(&1000));
    }

    #[test]
    fn hop_moves_blocking_entry() {
        let mut table = identity_table(16);
        for k in 0..5u64 {
            table.insert(k, k);
        }
        table.observer.events.clear();

        // Home 0; slots 0..5 are full, so the first hole is at offset 5.
        table.insert(16, 16);

        assert_eq!(
            table.observer().events,
            [
                Event::Hop { from: 1, to: 5 },
                Event::Insert { home: 0, index: 1 }
            ]
        );
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.get(&1), Some(&1));
        assert_eq!(table.get(&16), Some(&16));
        assert_invariants(&table);
    }

    #[test]
    fn hop_chains_across_several_entries() {
        let mut table = identity_table(32);
        // Homes 0,0,1,1,2,2,3 fill slots 0..7; the hole for home 0 is at 7.
        for k in [0u64, 32, 1, 33, 2, 34, 3] {
            table.insert(k, k);
        }
        assert_invariants(&table);
        table.observer.events.clear();

        table.insert(64, 64);
        assert_eq!(
            table.observer().events,
            [
                Event::Hop { from: 6, to: 7 },
                Event::Hop { from: 4, to: 6 },
                Event::Insert { home: 0, index: 4 }
            ]
        );
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.len(), 8);
        assert_invariants(&table);
    }

    #[test]
    fn failed_hop_grows() {
        let mut table = identity_table(16);
        for k in [0u64, 16, 32, 48, 64] {
            table.insert(k, k);
        }
        table.observer.events.clear();

        table.insert(80, 80);

        assert_eq!(table.capacity(), 32);
        assert!(table.observer().events.contains(&Event::Grow {
            old_capacity: 16,
            new_capacity: 32
        }));
        for k in [0u64, 16, 32, 48, 64, 80] {
            assert_eq!(table.get(&k), Some(&k));
        }
        assert_invariants(&table);
    }

    #[test]
    fn growth_preserves_offsets() {
        let mut table = identity_table(16);
        // Home 15 for all three; the last two wrap to slots 0 and 1.
        for k in [15u64, 31, 47] {
            table.insert(k, k);
        }
        let offsets: Vec<(u64, usize)> = table
            .slots
            .as_slice()
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| (e.key, distance(e.home, i, 16))))
            .collect();

        table.reserve(29);
        assert_eq!(table.capacity(), 32);

        for (key, offset) in offsets {
            let index = table.find_index(&key).unwrap();
            let entry = table.slots.occupied(index);
            assert_eq!(distance(entry.home, index, 32), offset);
        }
        assert_invariants(&table);
    }

    #[test]
    fn growth_lands_on_old_slot_or_its_mirror() {
        let mut table = identity_table(16);
        // Homes 14, 15, 0 and 5 crowd together; some neighborhoods wrap.
        for k in [14u64, 30, 46, 15, 31, 0, 16, 5, 21, 37] {
            table.insert(k, k);
        }
        assert_eq!(table.capacity(), 16);
        let before: Vec<(u64, usize)> = table
            .keys()
            .map(|k| (*k, table.find_index(k).unwrap()))
            .collect();
        table.observer.events.clear();

        table.reserve(22);

        assert_eq!(
            table.observer().events,
            [Event::Grow {
                old_capacity: 16,
                new_capacity: 32
            }]
        );
        for (key, old_index) in before {
            let index = table.find_index(&key).unwrap();
            assert!(
                index == old_index || index == old_index + 16,
                "{key} moved from {old_index} to {index}"
            );
        }
        assert_eq!(table.len(), 10);
        assert_invariants(&table);
    }

    #[test]
    fn full_probe_window_grows() {
        let mut table = identity_table(8);
        for k in 0..8u64 {
            table.insert(k, k);
        }
        assert_eq!(table.capacity(), 8);

        table.insert(8, 8);
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.len(), 9);
        assert_invariants(&table);
    }

    #[test]
    fn identical_digests_saturate() {
        let mut table: HashTable<u32, u32, BuildHasherDefault<ConstantHasher>> =
            HashTable::with_hasher(BuildHasherDefault::default());
        for k in 0..DEFAULT_HOP_LIMIT as u32 {
            assert_eq!(table.try_insert(k, k), Ok(None));
        }
        assert_eq!(
            table.try_insert(99, 99),
            Err(InsertError::SaturatedNeighborhood {
                hash: 7,
                hop_limit: DEFAULT_HOP_LIMIT
            })
        );
        assert_eq!(table.len(), DEFAULT_HOP_LIMIT);
        assert_eq!(table.try_insert(3, 30), Ok(Some(3)));
        assert_invariants(&table);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn digests_equal_in_usize_bits_saturate() {
        let mut table = identity_table(16);
        // Home buckets only see the low 32 bits, so these never separate.
        for k in 0..DEFAULT_HOP_LIMIT as u64 {
            table.insert((k << 32) | 7, k);
        }
        let key = (99u64 << 32) | 7;
        assert_eq!(
            table.try_insert(key, 99),
            Err(InsertError::SaturatedNeighborhood {
                hash: key,
                hop_limit: DEFAULT_HOP_LIMIT
            })
        );
        assert_invariants(&table);
    }

    #[test]
    #[should_panic(expected = "already share digest")]
    fn insert_panics_when_saturated() {
        let mut table: HashTable<u32, (), BuildHasherDefault<ConstantHasher>> =
            HashTable::with_hasher(BuildHasherDefault::default());
        for k in 0..=DEFAULT_HOP_LIMIT as u32 {
            table.insert(k, ());
        }
    }

    #[test]
    fn tiny_tables_grow() {
        let mut table = HashTable::with_config_and_hasher(
            Config::default().with_initial_capacity(0),
            SipHashBuilder::default(),
        )
        .unwrap();
        assert_eq!(table.capacity(), 1);
        for k in 0..100u32 {
            table.insert(k, k);
            assert_invariants(&table);
        }
        assert_eq!(table.len(), 100);
    }

    #[test]
    fn custom_limits() {
        let mut table = HashTable::with_config_and_hasher(
            Config::default().with_hop_limit(2).with_add_limit(4),
            SipHashBuilder::default(),
        )
        .unwrap();
        for k in 0..2000u32 {
            table.insert(k, k);
        }
        assert_eq!(table.len(), 2000);
        assert_invariants(&table);
        assert!(table.probe_histogram().counts.len() == 2);
    }

    #[test]
    fn erase_reports_slot() {
        let mut table = identity_table(16);
        table.insert(3, 3);
        assert!(table.erase(&3));
        assert_eq!(
            table.observer().events,
            [
                Event::Insert { home: 3, index: 3 },
                Event::Erase { index: 3 }
            ]
        );
    }

    #[test]
    fn iteration_in_slot_order() {
        let mut table = identity_table(16);
        for k in [9u64, 2, 14, 5] {
            table.insert(k, k * 10);
        }

        let forward: Vec<(u64, u64)> = table.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(forward, [(2, 20), (5, 50), (9, 90), (14, 140)]);

        let backward: Vec<u64> = table.keys().rev().copied().collect();
        assert_eq!(backward, [14, 9, 5, 2]);

        let mut iter = table.iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next(), Some((&2, &20)));
        assert_eq!(iter.next_back(), Some((&14, &140)));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next(), Some((&5, &50)));
        assert_eq!(iter.next_back(), Some((&9, &90)));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn iter_mut_and_values_mut() {
        let mut table = HashTable::new();
        for c in 'a'..='z' {
            table.insert(c.to_string(), 0);
        }

        for (count, (_, value)) in table.iter_mut().enumerate() {
            *value = count as i32 + 1;
        }
        let mut values: Vec<i32> = table.values().copied().collect();
        values.sort();
        assert_eq!(values, (1..=26).collect::<Vec<_>>());

        if let Some((_, first)) = table.iter_mut().next() {
            *first = -1;
        }
        if let Some((_, last)) = table.iter_mut().next_back() {
            *last = -2;
        }
        assert_eq!(table.values().next(), Some(&-1));
        assert_eq!(table.values().next_back(), Some(&-2));

        for value in table.values_mut() {
            *value = 7;
        }
        assert!(table.values().all(|&v| v == 7));
    }

    #[test]
    fn drain_empties_table() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        for k in 10..20u64 {
            table.insert(k, k + 1);
        }

        let mut drained: Vec<(u64, u64)> = table.drain().collect();
        drained.sort();
        assert_eq!(drained, (10..20).map(|k| (k, k + 1)).collect::<Vec<_>>());
        assert!(table.is_empty());
        for k in 10..20u64 {
            assert!(table.get(&k).is_none());
        }
        assert_invariants(&table);
    }

    #[test]
    fn dropped_drain_still_empties() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        for k in 0..10u64 {
            table.insert(k, k.to_string());
        }
        {
            let mut drain = table.drain();
            assert_eq!(drain.len(), 10);
            drain.next();
            drain.next_back();
        }
        assert!(table.is_empty());
        assert!(table.iter().next().is_none());
        table.insert(3, "three".to_string());
        assert_invariants(&table);
    }

    #[test]
    fn into_iter_yields_everything() {
        let table: HashTable<u64, u64, SipHashBuilder> = (0..100u64).map(|k| (k, k)).collect();
        let mut owned: Vec<(u64, u64)> = table.into_iter().collect();
        owned.sort();
        assert_eq!(owned.len(), 100);
        assert_eq!(owned[42], (42, 42));
    }

    #[test]
    fn entry_api() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        *table.entry("a".to_string()).or_insert(1) += 10;
        assert_eq!(table.get("a"), Some(&11));

        table.entry("a".to_string()).and_modify(|v| *v *= 2).or_insert(0);
        assert_eq!(table.get("a"), Some(&22));

        assert_eq!(*table.entry("b".to_string()).or_default(), 0);
        assert_eq!(*table.entry("c".to_string()).or_insert_with(|| 5), 5);

        match table.entry("a".to_string()) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), "a");
                assert_eq!(entry.insert(1), 22);
                assert_eq!(entry.remove_entry(), ("a".to_string(), 1));
            }
            Entry::Vacant(_) => unreachable!(),
        }
        assert!(!table.contains_key("a"));

        match table.entry("z".to_string()) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), "z");
                assert_eq!(entry.into_key(), "z");
            }
            Entry::Occupied(_) => unreachable!(),
        }
        assert!(!table.contains_key("z"));
        assert_eq!(table.len(), 2);
        assert_invariants(&table);
    }

    #[test]
    fn vacant_entry_triggers_growth() {
        let mut table = identity_table(8);
        for k in 0..8u64 {
            table.insert(k, k);
        }
        match table.entry(8) {
            Entry::Vacant(entry) => {
                assert_eq!(*entry.insert(80), 80);
            }
            Entry::Occupied(_) => unreachable!(),
        }
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.get(&8), Some(&80));
        assert_invariants(&table);
    }

    #[test]
    fn remove_entry_and_get_key_value() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        table.insert("key".to_string(), vec![1, 2, 3]);
        assert_eq!(
            table.get_key_value("key"),
            Some((&"key".to_string(), &vec![1, 2, 3]))
        );
        if let Some(v) = table.get_mut("key") {
            v.push(4);
        }
        assert_eq!(
            table.remove_entry("key"),
            Some(("key".to_string(), vec![1, 2, 3, 4]))
        );
        assert!(table.is_empty());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        for k in 0..200u64 {
            table.insert(k, k);
        }
        let capacity = table.capacity();
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert!(table.iter().next().is_none());
        table.insert(1, 1);
        assert_invariants(&table);
    }

    #[test]
    fn reserve_grows_to_power_of_two() {
        let mut table: HashTable<u64, u64> = HashTable::new();
        table.reserve(100);
        assert_eq!(table.capacity(), 128);
        table.reserve(10);
        assert_eq!(table.capacity(), 128);
    }

    #[test]
    fn equality_ignores_layout() {
        let a: HashTable<u64, u64, SipHashBuilder> = (0..64u64).map(|k| (k, k)).collect();
        let b: HashTable<u64, u64, SipHashBuilder> = (0..64u64).rev().map(|k| (k, k)).collect();
        assert!(a == b);

        let mut c = a.clone();
        c.insert(1, 100);
        assert!(a != c);
    }

    #[test]
    fn debug_formats_as_map() {
        let mut table = HashTable::new();
        table.insert(1u8, "one");
        assert_eq!(alloc::format!("{:?}", table), "{1: \"one\"}");
    }

    #[test]
    fn probe_histogram_counts_every_entry() {
        let mut table = HashTable::with_hasher(SipHashBuilder::default());
        for k in 0..1000u64 {
            table.insert(k, ());
        }
        let histogram = table.probe_histogram();
        assert_eq!(histogram.counts.len(), DEFAULT_HOP_LIMIT);
        assert_eq!(histogram.counts.iter().sum::<usize>(), 1000);

        let stats = table.debug_stats();
        assert_eq!(stats.populated, 1000);
        assert_eq!(stats.capacity, table.capacity());
        assert!(stats.load_factor > 0.0 && stats.load_factor <= 1.0);
    }
}
