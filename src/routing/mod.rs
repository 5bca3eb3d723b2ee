//! URL-space routing primitives
//!
//! - `BloomFilter`: bounded-memory membership for the scheduled-set
//! - `shard_for`: deterministic URL-to-peer assignment

mod bloom;
mod shard;

pub use bloom::BloomFilter;
pub use shard::shard_for;
