use crate::error::ConfigError;

/// Number of slots a table starts with when no capacity is requested.
pub const DEFAULT_CAPACITY: usize = 32;

/// Default neighborhood width: an entry always lives fewer than this many
/// slots after its home bucket.
pub const DEFAULT_HOP_LIMIT: usize = 5;

/// Default probe window width used when searching for a key or a hole.
pub const DEFAULT_ADD_LIMIT: usize = 8;

/// Construction-time parameters of a [`HashTable`](crate::HashTable).
///
/// # Examples
///
/// ```rust
/// use hopscotch_table::Config;
///
/// let config = Config::default().with_initial_capacity(100).with_hop_limit(4);
/// assert_eq!(config.validate().unwrap().initial_capacity(), 128);
///
/// assert!(Config::default().with_hop_limit(9).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    initial_capacity: usize,
    hop_limit: usize,
    add_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            hop_limit: DEFAULT_HOP_LIMIT,
            add_limit: DEFAULT_ADD_LIMIT,
        }
    }
}

impl Config {
    /// Sets the number of slots the table starts with. Rounded up to a power
    /// of two by [`validate`](Config::validate).
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the neighborhood width.
    pub fn with_hop_limit(mut self, hop_limit: usize) -> Self {
        self.hop_limit = hop_limit;
        self
    }

    /// Sets the probe window width.
    pub fn with_add_limit(mut self, add_limit: usize) -> Self {
        self.add_limit = add_limit;
        self
    }

    /// Requested initial capacity.
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Neighborhood width.
    pub fn hop_limit(&self) -> usize {
        self.hop_limit
    }

    /// Probe window width.
    pub fn add_limit(&self) -> usize {
        self.add_limit
    }

    /// Checks the limits and rounds the initial capacity up to a power of two
    /// (zero becomes one).
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.hop_limit == 0 {
            return Err(ConfigError::ZeroHopLimit);
        }
        if self.hop_limit > self.add_limit {
            return Err(ConfigError::HopLimitExceedsProbeWindow {
                hop_limit: self.hop_limit,
                add_limit: self.add_limit,
            });
        }

        let initial_capacity = self.initial_capacity.checked_next_power_of_two().ok_or(
            ConfigError::CapacityOverflow {
                requested: self.initial_capacity,
            },
        )?;

        Ok(Self {
            initial_capacity,
            ..self
        })
    }
}
