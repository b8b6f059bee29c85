#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod config;
mod error;
mod observer;
mod probe;
mod slots;

/// The hopscotch hash table and its iterator and entry types.
pub mod hash_table;

pub use config::Config;
pub use config::DEFAULT_ADD_LIMIT;
pub use config::DEFAULT_CAPACITY;
pub use config::DEFAULT_HOP_LIMIT;
pub use error::ConfigError;
pub use error::InsertError;
pub use hash_table::Entry;
pub use hash_table::HashTable;
#[cfg(feature = "log")]
pub use observer::LogObserver;
pub use observer::Event;
pub use observer::NoopObserver;
pub use observer::Observer;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hasher builder used when none is given: foldhash's fast hasher with
        /// a fixed seed, so digests are deterministic across runs.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder used when none is given.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder default hasher when neither the `foldhash` nor the
        /// `std` feature is enabled. It has no values, so tables must be
        /// built with an explicit hasher via [`HashTable::with_hasher`] or
        /// similar.
        pub type DefaultHashBuilder = NoDefaultHasher;

        /// An uninhabited hasher builder. See [`DefaultHashBuilder`].
        #[derive(Debug, Clone, Copy)]
        pub enum NoDefaultHasher {}

        impl core::hash::Hasher for NoDefaultHasher {
            fn finish(&self) -> u64 {
                match *self {}
            }

            fn write(&mut self, _bytes: &[u8]) {
                match *self {}
            }
        }

        impl core::hash::BuildHasher for NoDefaultHasher {
            type Hasher = NoDefaultHasher;

            fn build_hasher(&self) -> Self::Hasher {
                match *self {}
            }
        }
    }
}
