//! Key-value persistence: the store abstraction, key schemes, and the
//! error taxonomy used by everything that reads or writes portal chain
//! state to disk.

mod error;
mod keys;
mod store;

pub use error::StoreError;
pub use keys::{
    best_state_key, block_index_key, block_index_value, block_key, height_shard_key,
    shard_block_key, shard_committee_key,
};
pub use store::{load, store_new, KvStore, MemoryStore};
