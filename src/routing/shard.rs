//! Shard assignment over a static peer fleet
//!
//! Each node owns a deterministic slice of the URL space: a URL belongs to
//! shard `hash(canonical) mod N` for a fleet of `N` peers. The peer list is
//! static for the lifetime of a run, so plain modulo hashing is enough; there
//! is no ring to rebalance.

use xxhash_rust::xxh3::xxh3_64;

use crate::net::Url;

/// Shard index owning `url` in a fleet of `num_shards` peers.
pub fn shard_for(url: &Url, num_shards: usize) -> usize {
    debug_assert!(num_shards > 0);
    (xxh3_64(url.as_str().as_bytes()) % num_shards as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_deterministic() {
        let url = Url::parse("https://example.com/a").unwrap();
        assert_eq!(shard_for(&url, 3), shard_for(&url, 3));
    }

    #[test]
    fn equivalent_spellings_share_a_shard() {
        // Hashing runs over the canonical form, so the explicit default port
        // routes identically to the implicit one.
        let a = Url::parse("https://example.com:443/a").unwrap();
        let b = Url::parse("https://example.com/a").unwrap();
        assert_eq!(shard_for(&a, 5), shard_for(&b, 5));
    }

    #[test]
    fn all_shards_are_reachable() {
        let mut seen = [false; 3];
        for i in 0..100 {
            let url = Url::parse(&format!("http://host{i}.test/")).unwrap();
            seen[shard_for(&url, 3)] = true;
        }
        assert!(seen.iter().all(|&s| s), "some shard never selected: {seen:?}");
    }
}
