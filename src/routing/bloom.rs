//! Bloom filter backing the scheduled-set
//!
//! Fixed-size probabilistic membership with bounded memory. The bit vector is
//! sized from an expected element count and a target false positive rate, and
//! queries use the double-hash scheme `h_i = h1 + i * h2` over an xxh3 128-bit
//! digest. A positive answer may be wrong; a negative answer never is.

use std::io::{self, Read, Write};

use xxhash_rust::xxh3::xxh3_128;

/// Fixed-size Bloom filter over byte keys
#[derive(Debug, Clone)]
pub struct BloomFilter {
    /// Bit array, packed MSB-first
    bits: Vec<u8>,
    /// Number of usable bits
    num_bits: usize,
    /// Number of probes per key
    num_hashes: u32,
    /// Inserted-element counter, kept for observability only
    size: usize,
}

impl BloomFilter {
    /// Create a filter sized for `expected_size` elements at the given false
    /// positive rate.
    ///
    /// Bits `m = ceil(-n * ln p / ln(2)^2)`, probes `k = round(m/n * ln 2)`.
    pub fn new(expected_size: usize, false_positive_rate: f64) -> Self {
        let n = expected_size.max(1) as f64;
        let m = (-n * false_positive_rate.ln() / (2.0_f64.ln() * 2.0_f64.ln())).ceil() as usize;
        let num_bits = m.max(8);
        let k = ((num_bits as f64 / n) * 2.0_f64.ln()).round() as u32;

        Self {
            bits: vec![0u8; (num_bits + 7) / 8],
            num_bits,
            num_hashes: k.max(1),
            size: 0,
        }
    }

    /// Two independent 64-bit hashes derived from one xxh3-128 digest.
    fn hash_pair(key: &[u8]) -> (u64, u64) {
        let digest = xxh3_128(key);
        ((digest >> 64) as u64, digest as u64)
    }

    fn bit_index(&self, h1: u64, h2: u64, i: u32) -> usize {
        (h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.num_bits as u64) as usize
    }

    /// Insert a key. Idempotent with respect to bit state.
    pub fn insert(&mut self, key: &[u8]) {
        let (h1, h2) = Self::hash_pair(key);
        for i in 0..self.num_hashes {
            let bit = self.bit_index(h1, h2, i);
            self.bits[bit / 8] |= 1 << (7 - bit % 8);
        }
        self.size += 1;
    }

    /// Whether a key is probably contained. `false` is definitive.
    pub fn contains(&self, key: &[u8]) -> bool {
        let (h1, h2) = Self::hash_pair(key);
        (0..self.num_hashes).all(|i| {
            let bit = self.bit_index(h1, h2, i);
            self.bits[bit / 8] & (1 << (7 - bit % 8)) != 0
        })
    }

    /// Number of insertions performed (not deduplicated; observability only).
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Reset all bits and the insertion counter.
    pub fn clear(&mut self) {
        self.bits.fill(0);
        self.size = 0;
    }

    /// Size of the serialized bit stream in bytes.
    pub fn byte_len(&self) -> usize {
        self.bits.len()
    }

    /// Write the raw bit stream: exactly `ceil(m/8)` bytes, MSB-first.
    ///
    /// The stream carries no header; the reader must be constructed with the
    /// same `(expected_size, false_positive_rate)` pair.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.bits)
    }

    /// Read a bit stream previously produced by [`write_to`](Self::write_to)
    /// into this filter, replacing its contents.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        reader.read_exact(&mut self.bits)?;
        self.size = 0;
        Ok(())
    }
}
