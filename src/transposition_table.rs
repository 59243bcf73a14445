//! A fixed-size cache of score bounds, indexed by board key

/// Base-2 logarithm of the requested number of table slots
pub const LOG_SIZE: u32 = 24;

/// Number of slots actually allocated, the smallest prime at least
/// `2^LOG_SIZE` so slot indices spread over the whole key
pub(crate) const TABLE_SIZE: usize = next_prime(1 << LOG_SIZE) as usize;

const fn has_factor(n: u64, min: u64, max: u64) -> bool {
    if min * min > n {
        false
    } else if min + 1 >= max {
        n % min == 0
    } else {
        // split the range to keep the recursion depth logarithmic
        has_factor(n, min, (min + max) / 2) || has_factor(n, (min + max) / 2, max)
    }
}

pub(crate) const fn next_prime(n: u64) -> u64 {
    if has_factor(n, 2, n) {
        next_prime(n + 1)
    } else {
        n
    }
}

/// A transposition table mapping position keys to one-byte score bounds
///
/// # Notes
/// The table is open-addressed with no collision resolution: `put` always
/// overwrites the slot. Each slot keeps only a truncated partial key; a
/// colliding key fails the partial-key compare on `get` and reads as a miss,
/// so a lost entry costs a re-search but never a wrong score. With 49 board
/// bits and 24 index bits, 25 bits of key are not implied by the slot index,
/// making `u32` the smallest partial key that verifies hits.
///
/// The value `0` means "empty slot" and must never be stored.
pub struct TranspositionTable {
    keys: Vec<u32>,
    values: Vec<u8>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self {
            keys: vec![0; TABLE_SIZE],
            values: vec![0; TABLE_SIZE],
        }
    }

    fn index(key: u64) -> usize {
        (key % TABLE_SIZE as u64) as usize
    }

    /// Stores a value for a key, overwriting whatever occupied the slot
    pub fn put(&mut self, key: u64, value: u8) {
        let index = Self::index(key);
        self.keys[index] = key as u32;
        self.values[index] = value;
    }

    /// Returns the value stored for a key, or `0` if the slot is empty or
    /// was taken over by a colliding key
    pub fn get(&self, key: u64) -> u8 {
        let index = Self::index(key);
        if self.keys[index] == key as u32 {
            self.values[index]
        } else {
            0
        }
    }

    /// Clears every slot
    pub fn reset(&mut self) {
        self.keys.fill(0);
        self.values.fill(0);
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
