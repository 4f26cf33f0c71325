//! This module provides a deterministic hasher and `HashMap` and `HashSet` variants that use
//! it. The hashing data structures in the standard library are not deterministic:
//!
//! > By default, HashMap uses a hashing algorithm selected to provide
//! > resistance against HashDoS attacks. The algorithm is randomly seeded, and a
//! > reasonable best-effort is made to generate this seed from a high quality,
//! > secure source of randomness provided by the host without blocking the program.
//!
//! Name lookups in the world and the RNG registry use these maps so that two runs with the same
//! seed behave identically.
//!
//! The `hash_str` free function is used in `crate::random` to derive per-stream seeds.

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use xxhash_rust::xxh3::xxh3_64;

/// A convenience method to compute a stable hash of a `&str`.
#[must_use]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_strings() {
        let a = hash_str("hello");
        let b = hash_str("hello");
        let c = hash_str("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn maps_are_default_constructible() {
        let mut map: HashMap<&str, u32> = HashMap::default();
        map.insert("a", 1);
        assert_eq!(map.get("a"), Some(&1));
    }
}
