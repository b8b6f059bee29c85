use crate::slots::SlotStore;

/// Forward distance from `home` to `index`, wrapping at `capacity`.
#[inline(always)]
pub(crate) fn distance(home: usize, index: usize, capacity: usize) -> usize {
    if index >= home {
        index - home
    } else {
        capacity + index - home
    }
}

/// Outcome of scanning the probe window of a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Location {
    /// The key lives at this index.
    Found(usize),
    /// The key is absent; this is the first empty slot in the window.
    Vacant(usize),
    /// The key is absent and every slot in the window is occupied.
    Full,
}

/// Scan the `add_limit`-wide window starting at the home bucket of `hash`.
///
/// Returns the home bucket alongside the outcome. The scan stops at the first
/// matching entry but otherwise runs the whole window, so an empty slot ahead
/// of a match never hides the match.
#[inline]
pub(crate) fn locate<K, V>(
    store: &SlotStore<K, V>,
    hash: u64,
    add_limit: usize,
    eq: impl Fn(&K) -> bool,
) -> (usize, Location) {
    let home = store.home_of(hash);
    let window = add_limit.min(store.capacity());

    let mut hole = None;
    for offset in 0..window {
        let probe = store.wrap(home, offset);
        match store.get(probe) {
            Some(entry) => {
                if entry.home == home && entry.hash == hash && eq(&entry.key) {
                    return (home, Location::Found(probe));
                }
            }
            None => {
                hole.get_or_insert(probe);
            }
        }
    }

    match hole {
        Some(hole) => (home, Location::Vacant(hole)),
        None => (home, Location::Full),
    }
}
