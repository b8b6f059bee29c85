use thiserror::Error;

/// Rejected [`Config`](crate::Config) values.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The neighborhood must hold at least the home bucket itself.
    #[error("hop limit must be at least 1")]
    ZeroHopLimit,

    /// Entries may live anywhere in their neighborhood, so the probe window
    /// has to cover all of it for lookups to find them.
    #[error("hop limit {hop_limit} exceeds probe window {add_limit}")]
    HopLimitExceedsProbeWindow {
        /// Requested neighborhood width
        hop_limit: usize,
        /// Requested probe window width
        add_limit: usize,
    },

    /// The initial capacity cannot be rounded up to a power of two.
    #[error("initial capacity {requested} cannot be rounded to a power of two")]
    CapacityOverflow {
        /// Requested initial capacity
        requested: usize,
    },
}

/// Reasons an insertion could not place its entry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// Doubling the table would overflow `usize`.
    #[error("capacity overflow: cannot grow beyond {capacity} slots")]
    CapacityOverflow {
        /// Capacity of the table when growth was attempted
        capacity: usize,
    },

    /// `hop_limit` entries already share this digest (compared as `usize`,
    /// the bits home buckets are taken from). They share a home bucket at
    /// every capacity, so growing the table can never make room.
    #[error("{hop_limit} keys already share digest {hash:#018x}")]
    SaturatedNeighborhood {
        /// The shared digest
        hash: u64,
        /// Neighborhood width of the table
        hop_limit: usize,
    },
}
