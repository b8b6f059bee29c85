/// Structural changes reported to an [`Observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A new entry was placed at `index`; its home bucket is `home`.
    Insert {
        /// Home bucket of the new entry
        home: usize,
        /// Slot the entry was placed in
        index: usize,
    },
    /// An entry moved from `from` into the hole at `to` to bring that hole
    /// closer to the home of a pending insertion.
    Hop {
        /// Slot the entry left, which becomes the new hole
        from: usize,
        /// Hole the entry moved into
        to: usize,
    },
    /// The table doubled and every entry was rehomed.
    Grow {
        /// Slot count before growth
        old_capacity: usize,
        /// Slot count after growth
        new_capacity: usize,
    },
    /// The entry at `index` was removed.
    Erase {
        /// Slot that was cleared
        index: usize,
    },
}

/// Receives table events as they happen.
///
/// Observers see events after the table has applied them and cannot affect
/// the table. Any `FnMut(Event)` closure is an observer.
///
/// # Examples
///
/// ```rust
/// use hopscotch_table::Config;
/// use hopscotch_table::Event;
/// use hopscotch_table::HashTable;
/// use hopscotch_table::DefaultHashBuilder;
///
/// let mut grows = 0;
/// let mut table = HashTable::with_config_hasher_and_observer(
///     Config::default().with_initial_capacity(4),
///     DefaultHashBuilder::default(),
///     |event: Event| {
///         if let Event::Grow { .. } = event {
///             grows += 1;
///         }
///     },
/// )
/// .unwrap();
///
/// for i in 0..64 {
///     table.insert(i, i);
/// }
/// drop(table);
/// assert!(grows >= 4);
/// ```
pub trait Observer {
    /// Called once per event.
    fn on_event(&mut self, event: Event);
}

/// The default observer. Ignores every event and compiles away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    #[inline(always)]
    fn on_event(&mut self, _event: Event) {}
}

impl<F> Observer for F
where
    F: FnMut(Event),
{
    #[inline]
    fn on_event(&mut self, event: Event) {
        self(event)
    }
}

/// Forwards events to the [`log`] crate.
///
/// Growth is logged at `debug` level; insertions, hops and erasures at
/// `trace`.
#[cfg(feature = "log")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogObserver;

#[cfg(feature = "log")]
impl Observer for LogObserver {
    fn on_event(&mut self, event: Event) {
        match event {
            Event::Insert { home, index } => {
                log::trace!("insert at {index} (home {home})");
            }
            Event::Hop { from, to } => {
                log::trace!("hop {from} -> {to}");
            }
            Event::Grow {
                old_capacity,
                new_capacity,
            } => {
                log::debug!("grow {old_capacity} -> {new_capacity} slots");
            }
            Event::Erase { index } => {
                log::trace!("erase at {index}");
            }
        }
    }
}
